//! Report types emitted by operator tooling.
//!
//! These types are serialised as JSON on the CLI's stdout so that deployment
//! health checks can parse them.

use serde::{Deserialize, Serialize};

use crate::error::{CipherError, ErrorKind};

// ---------------------------------------------------------------------------
// Key check
// ---------------------------------------------------------------------------

/// Outcome of a startup key-configuration check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyHealthReport {
    /// Overall status: `"ok"` or `"invalid"`.
    pub status: String,
    /// Whether a usable key is configured.
    pub key_ready: bool,
    /// Classification of the failure, absent when the key is usable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Human-readable description. Never contains key material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl KeyHealthReport {
    /// Report for a usable key.
    pub fn ok() -> Self {
        Self {
            status: "ok".into(),
            key_ready: true,
            error_kind: None,
            message: None,
        }
    }

    /// Report for a key that failed validation.
    pub fn invalid(err: &CipherError) -> Self {
        Self {
            status: "invalid".into(),
            key_ready: false,
            error_kind: Some(err.kind()),
            message: Some(err.to_string()),
        }
    }

    /// Build a report from the result of a key validation.
    pub fn from_result(result: &Result<(), CipherError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::invalid(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Key generation
// ---------------------------------------------------------------------------

/// Output of `generate-key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedKey {
    /// Name of the environment variable the key is meant for.
    pub env_var: String,
    /// 64 lower-case hex characters.
    pub key_hex: String,
}
