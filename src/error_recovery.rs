// src/error_recovery.rs
//! Retry with credential failover for YouTube API operations.

use crate::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};
use crate::credentials::CredentialPool;
use crate::error::{classify_error, AppError, ErrorClass};
use crate::types::ApiKey;
use std::time::Duration;

/// How often and how patiently a transient failure is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per credential, including the first.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Runs remote calls with the pool's current key, rotating on quota errors.
///
/// This is the only component that advances the [`CredentialPool`]. A
/// rotation always completes before the next attempt reads the key.
#[derive(Debug)]
pub struct RetryingInvoker {
    pool: CredentialPool,
    policy: RetryPolicy,
}

impl RetryingInvoker {
    pub fn new(pool: CredentialPool, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    pub fn pool(&self) -> &CredentialPool {
        &self.pool
    }

    /// Invokes `call` until it succeeds, fails fatally, or keys run out.
    ///
    /// `endpoint` is only used to label logs and the upstream error.
    pub fn invoke<T, F>(&mut self, endpoint: &str, mut call: F) -> Result<T, AppError>
    where
        F: FnMut(&ApiKey) -> Result<T, AppError>,
    {
        let mut attempt = 0u32;

        loop {
            let error = match call(self.pool.current().key) {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            match classify_error(&error) {
                ErrorClass::QuotaExceeded => {
                    log::warn!(
                        "{}: quota exceeded on credential {}/{}",
                        endpoint,
                        self.pool.current().index + 1,
                        self.pool.len()
                    );
                    if !self.pool.rotate() {
                        return Err(AppError::CredentialsExhausted {
                            credentials: self.pool.len(),
                            partial: None,
                        });
                    }
                    attempt = 0;
                }
                ErrorClass::Transient => {
                    attempt += 1;
                    if attempt >= self.policy.max_attempts {
                        log::warn!(
                            "{}: giving up after {} attempt(s): {}",
                            endpoint,
                            attempt,
                            error
                        );
                        return Err(AppError::UpstreamFailure {
                            endpoint: endpoint.to_string(),
                            attempts: attempt,
                            source: Box::new(error),
                        });
                    }
                    log::warn!(
                        "{}: attempt {} failed, retrying after {:?}: {}",
                        endpoint,
                        attempt,
                        self.policy.delay,
                        error
                    );
                    std::thread::sleep(self.policy.delay);
                }
                ErrorClass::Fatal => return Err(error),
            }
        }
    }
}
