//! Error taxonomy shared by the cipher library and its callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned by every cipher operation.
///
/// Variants map to distinct handling policies at the call site:
/// - [`CipherError::Configuration`] → abort startup or the request, operator must fix the key
/// - [`CipherError::Format`] → caller bug or upstream data corruption
/// - [`CipherError::Tamper`] → possible security incident, alert separately
/// - [`CipherError::Encryption`] → unexpected failure on the encrypt path
///
/// None of them are retryable.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The encryption key is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The envelope (or the payload inside it) is structurally invalid.
    #[error("invalid format: {0}")]
    Format(String),

    /// Authentication tag verification failed.
    #[error("decryption failed: data may have been tampered with or key is incorrect")]
    Tamper,

    /// The encrypt path failed unexpectedly.
    #[error("encryption failed: {0}")]
    Encryption(String),
}

/// Coarse classification of a [`CipherError`], safe to log or serialise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Format,
    Tamper,
    Encryption,
}

impl CipherError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CipherError::Configuration(_) => ErrorKind::Configuration,
            CipherError::Format(_) => ErrorKind::Format,
            CipherError::Tamper => ErrorKind::Tamper,
            CipherError::Encryption(_) => ErrorKind::Encryption,
        }
    }

    /// Short machine-readable error code (e.g. `"tamper_error"`).
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Configuration => "configuration_error",
            ErrorKind::Format => "format_error",
            ErrorKind::Tamper => "tamper_error",
            ErrorKind::Encryption => "encryption_error",
        }
    }

    /// `true` when the failure may indicate active tampering or a wrong key.
    pub fn is_security_incident(&self) -> bool {
        matches!(self, CipherError::Tamper)
    }
}
