//! [`CredentialCipher`]: text and JSON encryption for values stored at rest.

use common::CipherError;
use serde::{de::DeserializeOwned, Serialize};

use crate::crypto::{self, Envelope};
use crate::key::{EncryptionKey, EnvKeyProvider, KeyProvider};

/// Authenticated encryption of credentials and configuration blobs.
///
/// Every call loads the key from the injected [`KeyProvider`] and builds its
/// own AEAD context, so a single instance can be shared across threads.
#[derive(Debug, Clone)]
pub struct CredentialCipher<P = EnvKeyProvider> {
    provider: P,
}

impl CredentialCipher<EnvKeyProvider> {
    /// Cipher reading the key from `ENCRYPTION_KEY` on every call.
    pub fn from_env() -> Self {
        Self::new(EnvKeyProvider::new())
    }
}

impl<P: KeyProvider> CredentialCipher<P> {
    /// Create a cipher backed by `provider`.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Borrow the key provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Load the current key from the provider.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Configuration`] if the key is absent or malformed.
    pub fn load_key(&self) -> Result<EncryptionKey, CipherError> {
        self.provider.load_key()
    }

    /// Check that a usable key is configured without encrypting anything.
    ///
    /// Intended for process-startup health checks.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Configuration`] if the key is absent or malformed.
    pub fn validate_key_configuration(&self) -> Result<(), CipherError> {
        self.load_key().map(drop)
    }

    /// Encrypt UTF-8 text into an `iv:tag:ciphertext` envelope.
    ///
    /// Encryption is non-deterministic: the same plaintext yields a different
    /// envelope on every call.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Configuration`] for key problems and
    /// [`CipherError::Encryption`] for unexpected AEAD failures.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let key = self.load_key()?;
        let envelope = crypto::seal(plaintext.as_bytes(), &key)?;
        Ok(envelope.to_string())
    }

    /// Decrypt an envelope produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// - [`CipherError::Configuration`] for key problems.
    /// - [`CipherError::Format`] for a malformed envelope or non-UTF-8 plaintext.
    /// - [`CipherError::Tamper`] when tag verification fails.
    pub fn decrypt(&self, envelope: &str) -> Result<String, CipherError> {
        let key = self.load_key()?;
        let envelope: Envelope = envelope.parse()?;
        let plaintext = crypto::open(&envelope, &key)?;
        String::from_utf8(plaintext)
            .map_err(|_| CipherError::Format("decrypted payload is not valid UTF-8".into()))
    }

    /// Serialise `value` to JSON and encrypt it.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Encryption`] if `value` cannot be serialised,
    /// plus everything [`encrypt`](Self::encrypt) returns.
    pub fn encrypt_structure<T: Serialize + ?Sized>(
        &self,
        value: &T,
    ) -> Result<String, CipherError> {
        let json = serde_json::to_string(value)
            .map_err(|e| CipherError::Encryption(format!("failed to serialise value: {e}")))?;
        self.encrypt(&json)
    }

    /// Decrypt an envelope and parse the plaintext as JSON into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Format`] if the plaintext is not valid JSON for
    /// `T`, plus everything [`decrypt`](Self::decrypt) returns.
    pub fn decrypt_structure<T: DeserializeOwned>(
        &self,
        envelope: &str,
    ) -> Result<T, CipherError> {
        let json = self.decrypt(envelope)?;
        serde_json::from_str(&json)
            .map_err(|e| CipherError::Format(format!("decrypted payload is not valid JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{MockKeyProvider, StaticKeyProvider};
    use serde_json::{json, Value};

    const TEST_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn cipher() -> CredentialCipher<StaticKeyProvider> {
        CredentialCipher::new(StaticKeyProvider::from_hex(TEST_KEY))
    }

    #[test]
    fn key_is_loaded_on_every_call() {
        let mut mock = MockKeyProvider::new();
        mock.expect_load_key()
            .times(2)
            .returning(|| EncryptionKey::from_hex(TEST_KEY));

        let cipher = CredentialCipher::new(mock);
        let envelope = cipher.encrypt("hello").unwrap();
        assert_eq!(cipher.decrypt(&envelope).unwrap(), "hello");
    }

    #[test]
    fn key_errors_propagate_unchanged() {
        let mut mock = MockKeyProvider::new();
        mock.expect_load_key().returning(|| {
            Err(CipherError::Configuration(
                "ENCRYPTION_KEY environment variable is not set".into(),
            ))
        });

        let cipher = CredentialCipher::new(mock);
        let err = cipher.encrypt("hello").unwrap_err();
        assert!(err.to_string().contains("ENCRYPTION_KEY environment variable is not set"));
        assert!(matches!(
            cipher.decrypt("invalid"),
            Err(CipherError::Configuration(_))
        ));
    }

    #[test]
    fn validate_accepts_valid_key() {
        assert!(cipher().validate_key_configuration().is_ok());
    }

    #[test]
    fn validate_rejects_missing_and_short_keys() {
        let missing = CredentialCipher::new(StaticKeyProvider::new(None));
        assert!(matches!(
            missing.validate_key_configuration(),
            Err(CipherError::Configuration(_))
        ));

        let short = CredentialCipher::new(StaticKeyProvider::from_hex("01234567"));
        let err = short.validate_key_configuration().unwrap_err();
        assert!(err.to_string().contains("got 4 bytes"));
    }

    #[test]
    fn empty_string_round_trips() {
        let cipher = cipher();
        let envelope = cipher.encrypt("").unwrap();
        assert!(envelope.ends_with(':'));
        assert_eq!(cipher.decrypt(&envelope).unwrap(), "");
    }

    #[test]
    fn non_utf8_plaintext_is_a_format_error() {
        let key = EncryptionKey::from_hex(TEST_KEY).unwrap();
        let envelope = crypto::seal(&[0xff, 0xfe, 0xfd], &key).unwrap().to_string();
        let err = cipher().decrypt(&envelope).unwrap_err();
        assert!(matches!(err, CipherError::Format(_)));
    }

    #[test]
    fn non_json_plaintext_is_a_format_error() {
        let cipher = cipher();
        let envelope = cipher.encrypt("not json {").unwrap();
        let err = cipher.decrypt_structure::<Value>(&envelope).unwrap_err();
        assert!(matches!(err, CipherError::Format(_)));
    }

    #[test]
    fn structure_preserves_key_order() {
        let cipher = cipher();
        let value = json!({"zeta": 1, "alpha": 2, "mid": 3});
        let envelope = cipher.encrypt_structure(&value).unwrap();
        assert_eq!(cipher.decrypt(&envelope).unwrap(), r#"{"zeta":1,"alpha":2,"mid":3}"#);
    }
}
