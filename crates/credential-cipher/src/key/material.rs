//! [`EncryptionKey`]: the 256-bit secret shared by every envelope.

use std::fmt;

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use common::CipherError;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::KEY_LEN;

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// Cloned into each encrypt/decrypt call and dropped right after. The memory
/// is overwritten with zeroes on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_LEN],
}

impl EncryptionKey {
    /// Generate a new random key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Build a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Configuration`] if `bytes` is not exactly
    /// [`KEY_LEN`] bytes; the message reports the actual length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CipherError> {
        if bytes.len() != KEY_LEN {
            return Err(CipherError::Configuration(format!(
                "invalid key length: encryption key must be {KEY_LEN} bytes \
                 ({} hex characters), got {} bytes",
                KEY_LEN * 2,
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(bytes);
        Ok(Self { bytes: key })
    }

    /// Parse a key from its hex representation (64 characters, either case).
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Configuration`] if the value is empty, is not
    /// valid hex, or does not decode to [`KEY_LEN`] bytes.
    pub fn from_hex(value: &str) -> Result<Self, CipherError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(CipherError::Configuration("encryption key is not set".into()));
        }
        let mut decoded = hex::decode(value).map_err(|e| {
            CipherError::Configuration(format!(
                "invalid key length: encryption key must be {KEY_LEN} bytes of hex, \
                 value is not valid hex ({e})"
            ))
        })?;
        let key = Self::from_bytes(&decoded);
        decoded.zeroize();
        key
    }

    /// Export the key as 64 lower-case hex characters.
    ///
    /// The returned string is raw key material; only key generation should
    /// call this.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("EncryptionKey([REDACTED])")
    }
}
