//! Error taxonomy and report types shared across `credential-cipher` crates.

pub mod error;
pub mod protocol;

pub use error::{CipherError, ErrorKind};
