//! AES-256-GCM seal/open of individual values and the envelope codec.
//!
//! **Algorithm choice:** AES-256-GCM with a 128-bit random IV and a detached
//! 128-bit tag. The IV length is non-standard for GCM (96 bits is the usual
//! choice) but matches envelopes already stored by existing writers, so it
//! must not change. A fresh IV is drawn from the OS CSPRNG on every call.
//!
//! **Never reuse an IV under the same key.** GCM IV reuse breaks both
//! confidentiality and authentication.

use std::fmt;
use std::str::FromStr;

use aes_gcm::{
    aead::{
        consts::U16,
        generic_array::GenericArray,
        rand_core::RngCore,
        AeadInPlace, KeyInit, OsRng,
    },
    aes::Aes256,
    AesGcm, Nonce,
};
use common::CipherError;

use crate::key::EncryptionKey;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of the initialization vector (16 bytes = 128 bits).
pub const IV_LEN: usize = 16;

/// Byte length of the GCM authentication tag.
pub const TAG_LEN: usize = 16;

/// Separator between the three envelope segments.
pub const SEPARATOR: char = ':';

/// AES-256-GCM parameterised with a 16-byte IV.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// A parsed, encrypted value.
///
/// The string representation is `<hex(iv)>:<hex(tag)>:<hex(ciphertext)>`.
/// Segments are rendered lower-case; parsing accepts either case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Raw IV bytes.
    pub iv: [u8; IV_LEN],
    /// Raw authentication tag bytes.
    pub tag: [u8; TAG_LEN],
    /// Raw ciphertext bytes. Same length as the plaintext.
    pub ciphertext: Vec<u8>,
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            hex::encode(self.iv),
            hex::encode(self.tag),
            hex::encode(&self.ciphertext),
        )
    }
}

impl FromStr for Envelope {
    type Err = CipherError;

    /// Parse an envelope string back into an [`Envelope`].
    ///
    /// Every failure here is a [`CipherError::Format`]; nothing is verified
    /// cryptographically until [`open`] is called.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(SEPARATOR).collect();
        // The ciphertext segment is legitimately empty for an empty plaintext.
        let [iv_hex, tag_hex, data_hex] = parts.as_slice() else {
            return Err(invalid_layout());
        };
        if iv_hex.is_empty() || tag_hex.is_empty() {
            return Err(invalid_layout());
        }

        let iv_bytes = decode_segment(iv_hex, "IV")?;
        let tag_bytes = decode_segment(tag_hex, "auth tag")?;
        let ciphertext = decode_segment(data_hex, "ciphertext")?;

        let iv: [u8; IV_LEN] = iv_bytes.as_slice().try_into().map_err(|_| {
            CipherError::Format(format!(
                "invalid IV length: expected {IV_LEN} bytes, got {}",
                iv_bytes.len()
            ))
        })?;
        let tag: [u8; TAG_LEN] = tag_bytes.as_slice().try_into().map_err(|_| {
            CipherError::Format(format!(
                "invalid auth tag length: expected {TAG_LEN} bytes, got {}",
                tag_bytes.len()
            ))
        })?;

        Ok(Self {
            iv,
            tag,
            ciphertext,
        })
    }
}

fn invalid_layout() -> CipherError {
    CipherError::Format("invalid format, expected iv:authTag:data".into())
}

fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>, CipherError> {
    hex::decode(segment).map_err(|e| CipherError::Format(format!("{name} is not valid hex: {e}")))
}

/// Encrypt `plaintext` under `key` with a fresh random IV.
///
/// # Errors
///
/// Returns [`CipherError::Encryption`] on an internal AEAD error (should be
/// unreachable with a valid key).
pub fn seal(plaintext: &[u8], key: &EncryptionKey) -> Result<Envelope, CipherError> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    seal_with_iv(plaintext, key, iv)
}

/// Encrypt with a caller-chosen IV. Only [`seal`] and known-answer tests call this.
pub(crate) fn seal_with_iv(
    plaintext: &[u8],
    key: &EncryptionKey,
    iv: [u8; IV_LEN],
) -> Result<Envelope, CipherError> {
    let cipher = build_cipher(key).map_err(CipherError::Encryption)?;

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::<U16>::from_slice(&iv), b"", &mut buffer)
        .map_err(|e| CipherError::Encryption(format!("aead seal failed: {e}")))?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(&tag);

    Ok(Envelope {
        iv,
        tag: tag_bytes,
        ciphertext: buffer,
    })
}

/// Decrypt an [`Envelope`] back to plaintext bytes.
///
/// # Errors
///
/// Returns [`CipherError::Tamper`] if tag verification fails (wrong key or
/// modified IV, tag, or ciphertext). No partial plaintext is ever returned.
pub fn open(envelope: &Envelope, key: &EncryptionKey) -> Result<Vec<u8>, CipherError> {
    let cipher = build_cipher(key).map_err(CipherError::Configuration)?;

    let mut buffer = envelope.ciphertext.clone();
    cipher
        .decrypt_in_place_detached(
            Nonce::<U16>::from_slice(&envelope.iv),
            b"",
            &mut buffer,
            GenericArray::from_slice(&envelope.tag),
        )
        .map_err(|_| CipherError::Tamper)?;
    Ok(buffer)
}

fn build_cipher(key: &EncryptionKey) -> Result<Aes256Gcm16, String> {
    Aes256Gcm16::new_from_slice(key.as_bytes())
        .map_err(|_| format!("invalid key length: expected {KEY_LEN} bytes"))
}
