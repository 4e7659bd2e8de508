//! AES-256-GCM envelope encryption primitives.
//!
//! This module knows nothing about where keys come from. It provides the
//! low-level seal/open operations and the envelope codec used by
//! [`CredentialCipher`](crate::CredentialCipher).
//!
//! # Envelope format
//!
//! ```text
//! <hex(iv, 16 bytes)>:<hex(tag, 16 bytes)>:<hex(ciphertext)>
//! ```
//!
//! The envelope carries no version or key identifier. Rows written with it can
//! only be re-keyed by decrypting and re-encrypting every value.

pub mod cipher;

pub use cipher::{open, seal, Envelope, IV_LEN, KEY_LEN, TAG_LEN};
