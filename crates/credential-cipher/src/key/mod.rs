//! Key material and the providers that supply it.
//!
//! # Lifecycle
//!
//! 1. A [`KeyProvider`] is injected into [`CredentialCipher`](crate::CredentialCipher)
//!    at construction.
//! 2. Every encrypt/decrypt call asks the provider for the key. Providers may
//!    re-read configuration each time ([`EnvKeyProvider`], [`StaticKeyProvider`])
//!    or memoise it ([`CachedKeyProvider`]).
//! 3. The returned [`EncryptionKey`] is a short-lived copy, zeroised when the
//!    call finishes.
//!
//! # Security invariants
//!
//! - Key material is never logged or included in `Debug` output.
//! - Only one key is active at a time; there is no key identifier or rotation.

pub mod material;
pub mod provider;

pub use material::EncryptionKey;
pub use provider::{
    CachedKeyProvider, EnvKeyProvider, KeyProvider, StaticKeyProvider, DEFAULT_KEY_VAR,
};

#[cfg(test)]
pub use provider::MockKeyProvider;
