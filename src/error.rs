// src/error.rs
//! Application error types with structured error handling.
//!
//! Error types form the vocabulary for failure modes in the collector.
//! The retry loop never inspects error text directly; it asks
//! [`classify_error`] which of three recovery paths applies.

use crate::collector::CollectionResult;
use crate::constants::QUOTA_ERROR_MARKER;
use std::fmt;
use thiserror::Error;

/// YouTube Data API error reasons as a typed vocabulary.
///
/// The API reports a machine-readable `reason` inside `error.errors[]`.
/// Encoding it here keeps recovery decisions out of string matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YouTubeErrorReason {
    /// The key's daily quota is spent
    QuotaExceeded,
    /// Legacy spelling of quota exhaustion still returned by some endpoints
    DailyLimitExceeded,
    /// Too many requests in a short window
    RateLimitExceeded,
    /// Per-user request rate exceeded
    UserRateLimitExceeded,
    /// The API key is invalid, expired or revoked
    KeyInvalid,
    /// The key lacks access to the requested resource
    Forbidden,
    /// Request parameters were rejected
    BadRequest,
    /// The requested resource does not exist
    NotFound,
    /// Transient failure inside YouTube
    BackendError,
    /// HTTP status code fallback when the error body is unparseable
    HttpStatus(u16),
    /// A reason this client doesn't recognize yet
    Unknown(String),
}

impl YouTubeErrorReason {
    /// Parse a YouTube API `reason` string into the typed vocabulary.
    pub fn from_api_reason(reason: &str) -> Self {
        match reason {
            "quotaExceeded" => Self::QuotaExceeded,
            "dailyLimitExceeded" => Self::DailyLimitExceeded,
            "rateLimitExceeded" => Self::RateLimitExceeded,
            "userRateLimitExceeded" => Self::UserRateLimitExceeded,
            "keyInvalid" | "keyExpired" => Self::KeyInvalid,
            "forbidden" => Self::Forbidden,
            "badRequest" | "invalidParameter" | "missingRequiredParameter" => Self::BadRequest,
            "notFound" | "videoNotFound" | "channelNotFound" => Self::NotFound,
            "backendError" | "internalError" => Self::BackendError,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Create from an HTTP status code when the error body is unparseable.
    pub fn from_http_status(status: u16) -> Self {
        Self::HttpStatus(status)
    }

    /// Whether this reason means the current key has no quota left.
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded | Self::DailyLimitExceeded)
    }

    /// Whether this reason is transient and worth retrying with the same key.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded | Self::UserRateLimitExceeded | Self::BackendError
        )
    }
}

impl fmt::Display for YouTubeErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuotaExceeded => write!(f, "quotaExceeded"),
            Self::DailyLimitExceeded => write!(f, "dailyLimitExceeded"),
            Self::RateLimitExceeded => write!(f, "rateLimitExceeded"),
            Self::UserRateLimitExceeded => write!(f, "userRateLimitExceeded"),
            Self::KeyInvalid => write!(f, "keyInvalid"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::BadRequest => write!(f, "badRequest"),
            Self::NotFound => write!(f, "notFound"),
            Self::BackendError => write!(f, "backendError"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(reason) => write!(f, "{}", reason),
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("YouTube API returned an error ({reason}, HTTP {status}): {message}")]
    YouTubeService {
        status: u16,
        reason: YouTubeErrorReason,
        message: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Upstream call to {endpoint} failed after {attempts} attempt(s): {source}")]
    UpstreamFailure {
        endpoint: String,
        attempts: u32,
        #[source]
        source: Box<AppError>,
    },

    #[error("All {credentials} API credential(s) exhausted their quota")]
    CredentialsExhausted {
        credentials: usize,
        /// Items accumulated before the abort, present only when the caller opted in.
        partial: Option<Box<CollectionResult>>,
    },

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Validation(#[from] crate::types::ValidationError),
}

impl AppError {
    /// True for the fatal "every credential is out of quota" condition.
    pub fn is_credentials_exhausted(&self) -> bool {
        matches!(self, Self::CredentialsExhausted { .. })
    }

    /// True for remote failures that could not be recovered by retrying.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamFailure { .. }
                | Self::YouTubeService { .. }
                | Self::Network(_)
                | Self::MalformedResponse(_)
        )
    }

    /// Takes the partial result out of a credentials-exhausted error, if any.
    pub fn into_partial(self) -> Option<CollectionResult> {
        match self {
            Self::CredentialsExhausted { partial, .. } => partial.map(|boxed| *boxed),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

/// The recovery path an error calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Retry the same call with the same credential after a pause.
    Transient,
    /// Rotate to the next credential and retry immediately.
    QuotaExceeded,
    /// Give up and propagate.
    Fatal,
}

/// Classifies an error into the recovery path the retry loop should take.
///
/// Quota detection keeps the provider's textual marker as a fallback so
/// that quota messages without a structured reason still rotate keys.
pub fn classify_error(error: &AppError) -> ErrorClass {
    match error {
        AppError::Network(_) | AppError::MalformedResponse(_) => ErrorClass::Transient,
        AppError::YouTubeService {
            status,
            reason,
            message,
        } => {
            if reason.is_quota() || mentions_quota(&reason.to_string()) || mentions_quota(message)
            {
                ErrorClass::QuotaExceeded
            } else if reason.is_retryable() || matches!(status, 408 | 429 | 500..=599) {
                ErrorClass::Transient
            } else {
                ErrorClass::Fatal
            }
        }
        _ => ErrorClass::Fatal,
    }
}

/// Only provider-reported text is checked; local error text can echo
/// request parameters such as the search keyword.
fn mentions_quota(text: &str) -> bool {
    text.to_ascii_lowercase().contains(QUOTA_ERROR_MARKER)
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;
