//! Telemetry initialisation for the `credcipher` CLI.
//!
//! Structured JSON logs only, written to stderr so that stdout carries nothing
//! but command results.
//!
//! # Telemetry invariants
//!
//! - **No plaintext or key material** may appear in any log field.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialise the tracing subscriber.
///
/// `RUST_LOG` takes precedence over `log_level` when set.
///
/// # Errors
///
/// Returns an error if the subscriber has already been set.
pub fn init(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise credcipher tracing subscriber: {e}"))
}
