//! Key providers: where [`CredentialCipher`](crate::CredentialCipher) gets its key.

use std::env;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use common::CipherError;

use super::EncryptionKey;

/// Default environment variable holding the hex-encoded key.
pub const DEFAULT_KEY_VAR: &str = "ENCRYPTION_KEY";

/// Source of the encryption key.
///
/// Called once per encrypt/decrypt. Implementations must be cheap and must not
/// block on I/O; the key is expected to already be resident in memory.
#[cfg_attr(test, mockall::automock)]
pub trait KeyProvider: Send + Sync {
    /// Load and validate the key.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Configuration`] if the key is absent or malformed.
    fn load_key(&self) -> Result<EncryptionKey, CipherError>;
}

impl<P: KeyProvider + ?Sized> KeyProvider for Arc<P> {
    fn load_key(&self) -> Result<EncryptionKey, CipherError> {
        (**self).load_key()
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Reads the key from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvKeyProvider {
    var: String,
}

impl EnvKeyProvider {
    /// Provider reading [`DEFAULT_KEY_VAR`].
    pub fn new() -> Self {
        Self::with_var(DEFAULT_KEY_VAR)
    }

    /// Provider reading a custom variable name.
    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Name of the variable this provider reads.
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvKeyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyProvider for EnvKeyProvider {
    fn load_key(&self) -> Result<EncryptionKey, CipherError> {
        let value = match env::var(&self.var) {
            Ok(v) if !v.trim().is_empty() => v,
            Ok(_) | Err(env::VarError::NotPresent) => {
                return Err(CipherError::Configuration(format!(
                    "{} environment variable is not set",
                    self.var
                )))
            }
            Err(env::VarError::NotUnicode(_)) => {
                return Err(CipherError::Configuration(format!(
                    "{} environment variable is not valid unicode",
                    self.var
                )))
            }
        };
        EncryptionKey::from_hex(&value)
    }
}

// ---------------------------------------------------------------------------
// Static configuration value
// ---------------------------------------------------------------------------

/// Holds a configured hex string and parses it on every call.
///
/// Errors in the configured value surface at first use rather than at
/// construction; call
/// [`validate_key_configuration`](crate::CredentialCipher::validate_key_configuration)
/// at startup to check eagerly.
#[derive(Clone)]
pub struct StaticKeyProvider {
    key_hex: Option<String>,
}

impl StaticKeyProvider {
    /// Provider for an optional configured value. `None` means "not set".
    pub fn new(key_hex: Option<String>) -> Self {
        Self { key_hex }
    }

    /// Provider for a known hex value.
    pub fn from_hex(key_hex: impl Into<String>) -> Self {
        Self::new(Some(key_hex.into()))
    }
}

impl std::fmt::Debug for StaticKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticKeyProvider")
            .field("configured", &self.key_hex.is_some())
            .finish()
    }
}

impl KeyProvider for StaticKeyProvider {
    fn load_key(&self) -> Result<EncryptionKey, CipherError> {
        match self.key_hex.as_deref() {
            Some(hex) => EncryptionKey::from_hex(hex),
            None => Err(CipherError::Configuration("encryption key is not set".into())),
        }
    }
}

// ---------------------------------------------------------------------------
// Memoisation
// ---------------------------------------------------------------------------

/// Memoises the first successful load of an inner provider.
///
/// Backed by [`ArcSwapOption`] so cached reads never block. Failures are not
/// cached; the next call consults the inner provider again.
pub struct CachedKeyProvider<P> {
    inner: P,
    cached: ArcSwapOption<EncryptionKey>,
}

impl<P: KeyProvider> CachedKeyProvider<P> {
    /// Wrap `inner` with a cache.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cached: ArcSwapOption::empty(),
        }
    }

    /// Returns `true` once a key has been loaded successfully.
    pub fn is_ready(&self) -> bool {
        self.cached.load().is_some()
    }
}

impl<P: KeyProvider> KeyProvider for CachedKeyProvider<P> {
    fn load_key(&self) -> Result<EncryptionKey, CipherError> {
        if let Some(key) = self.cached.load_full() {
            return Ok(EncryptionKey::clone(&key));
        }
        let key = self.inner.load_key()?;
        self.cached.store(Some(Arc::new(key.clone())));
        Ok(key)
    }
}

impl<P> std::fmt::Debug for CachedKeyProvider<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedKeyProvider")
            .field("ready", &self.cached.load().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    #[test]
    fn env_provider_reads_variable() {
        env::set_var("CREDCIPHER_TEST_ENV_VALID", TEST_KEY);
        let provider = EnvKeyProvider::with_var("CREDCIPHER_TEST_ENV_VALID");
        assert_eq!(provider.load_key().unwrap().to_hex(), TEST_KEY);
    }

    #[test]
    fn env_provider_reports_missing_variable_by_name() {
        env::remove_var("CREDCIPHER_TEST_ENV_MISSING");
        let provider = EnvKeyProvider::with_var("CREDCIPHER_TEST_ENV_MISSING");
        let err = provider.load_key().unwrap_err();
        assert!(matches!(err, CipherError::Configuration(_)));
        assert!(err
            .to_string()
            .contains("CREDCIPHER_TEST_ENV_MISSING environment variable is not set"));
    }

    #[test]
    fn env_provider_treats_empty_as_missing() {
        env::set_var("CREDCIPHER_TEST_ENV_EMPTY", "");
        let provider = EnvKeyProvider::with_var("CREDCIPHER_TEST_ENV_EMPTY");
        assert!(provider.load_key().unwrap_err().to_string().contains("not set"));
    }

    #[test]
    fn env_provider_default_var() {
        assert_eq!(EnvKeyProvider::default().var(), DEFAULT_KEY_VAR);
    }

    #[test]
    fn static_provider_none_is_not_set() {
        let err = StaticKeyProvider::new(None).load_key().unwrap_err();
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn static_provider_debug_hides_value() {
        let debug = format!("{:?}", StaticKeyProvider::from_hex(TEST_KEY));
        assert!(!debug.contains("0123"));
    }

    #[test]
    fn cached_provider_loads_once() {
        let mut mock = MockKeyProvider::new();
        mock.expect_load_key()
            .times(1)
            .returning(|| EncryptionKey::from_hex(TEST_KEY));

        let cached = CachedKeyProvider::new(mock);
        assert!(!cached.is_ready());
        for _ in 0..3 {
            assert_eq!(cached.load_key().unwrap().to_hex(), TEST_KEY);
        }
        assert!(cached.is_ready());
    }

    #[test]
    fn cached_provider_retries_after_failure() {
        let mut mock = MockKeyProvider::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_load_key()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(CipherError::Configuration("encryption key is not set".into())));
        mock.expect_load_key()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| EncryptionKey::from_hex(TEST_KEY));

        let cached = CachedKeyProvider::new(mock);
        assert!(cached.load_key().is_err());
        assert!(!cached.is_ready());
        assert!(cached.load_key().is_ok());
        assert!(cached.load_key().is_ok());
    }

    #[test]
    fn arc_provider_delegates() {
        let provider = Arc::new(StaticKeyProvider::from_hex(TEST_KEY));
        assert!(provider.load_key().is_ok());
    }
}
