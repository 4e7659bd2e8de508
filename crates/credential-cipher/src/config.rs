//! Configuration loading for processes that embed the cipher.
//!
//! Values are read from environment variables. A missing key is not an error
//! at load time; it surfaces at first use, or eagerly through
//! [`validate_key_configuration`].
//!
//! [`validate_key_configuration`]: crate::CredentialCipher::validate_key_configuration

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::key::StaticKeyProvider;

/// Cipher configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Hex-encoded 256-bit key (`ENCRYPTION_KEY`). Generate with
    /// `credcipher generate-key` or `openssl rand -hex 32`.
    #[serde(default)]
    pub encryption_key: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment cannot be read or a value has the
    /// wrong type, or if `LOG_LEVEL` is blank.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Key provider backed by the configured key value.
    pub fn key_provider(&self) -> StaticKeyProvider {
        StaticKeyProvider::new(self.encryption_key.clone())
    }

    fn validate(&self) -> Result<()> {
        if self.log_level.trim().is_empty() {
            anyhow::bail!("LOG_LEVEL must not be empty");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "encryption_key",
                &self.encryption_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("log_level", &self.log_level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyProvider;

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_rejects_blank_log_level() {
        let cfg = Config {
            encryption_key: None,
            log_level: "  ".into(),
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_key_is_deferred_to_first_use() {
        let cfg = Config {
            encryption_key: None,
            log_level: default_log_level(),
        };
        assert!(cfg.validate().is_ok());
        assert!(cfg.key_provider().load_key().is_err());
    }

    #[test]
    fn key_provider_uses_configured_key() {
        let key = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
        let cfg = Config {
            encryption_key: Some(key.into()),
            log_level: default_log_level(),
        };
        assert_eq!(cfg.key_provider().load_key().unwrap().to_hex(), key);
    }

    #[test]
    fn debug_redacts_key() {
        let cfg = Config {
            encryption_key: Some("deadbeef".into()),
            log_level: default_log_level(),
        };
        assert!(!format!("{cfg:?}").contains("deadbeef"));
    }
}
