use super::ValidationError;
use std::fmt;

/// A YouTube Data API key.
///
/// The key is an opaque secret: it is validated for shape only and is
/// redacted whenever it is displayed or logged.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Create a new API key with validation
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();
        let trimmed = key.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::InvalidApiKey {
                reason: "API key cannot be empty".to_string(),
            });
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidApiKey {
                reason: "API key must not contain whitespace".to_string(),
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Get the API key as a string reference
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses a comma-separated key list, preserving rotation order.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, ValidationError> {
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Self::new)
            .collect()
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Redact API key in display
        let visible: String = self.0.chars().take(4).collect();
        write!(f, "{}...", visible)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", self)
    }
}
