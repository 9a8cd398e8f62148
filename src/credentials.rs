//! Ordered pool of API keys with one-way rotation.

use crate::types::{ApiKey, ValidationError};

/// The key currently in use, together with its position in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credential<'a> {
    pub index: usize,
    pub key: &'a ApiKey,
}

/// Holds the API keys of one engine in rotation-priority order.
///
/// The index only ever moves forward. Once the last key is active,
/// [`rotate`](Self::rotate) keeps answering `false` and changes nothing.
#[derive(Debug)]
pub struct CredentialPool {
    keys: Vec<ApiKey>,
    index: usize,
}

impl CredentialPool {
    pub fn new(keys: Vec<ApiKey>) -> Result<Self, ValidationError> {
        if keys.is_empty() {
            return Err(ValidationError::EmptyField("credentials"));
        }
        Ok(Self { keys, index: 0 })
    }

    pub fn current(&self) -> Credential<'_> {
        Credential {
            index: self.index,
            key: &self.keys[self.index],
        }
    }

    /// Switches to the next key. Returns `false` when already on the last one.
    pub fn rotate(&mut self) -> bool {
        if self.index + 1 >= self.keys.len() {
            return false;
        }
        self.index += 1;
        log::info!(
            "Rotated to API credential {}/{} ({})",
            self.index + 1,
            self.keys.len(),
            self.keys[self.index]
        );
        true
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
