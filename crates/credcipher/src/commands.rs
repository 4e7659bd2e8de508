//! Subcommand implementations.
//!
//! Results are written to the supplied output (stdout in production). Logs go
//! through `tracing` to stderr and never contain plaintext or key material.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use clap::Subcommand;
use common::protocol::{GeneratedKey, KeyHealthReport};
use common::CipherError;
use credential_cipher::{CredentialCipher, EncryptionKey, KeyProvider};
use serde_json::Value;
use tracing::{error, info, warn};

/// Operations exposed by the CLI.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a fresh random 256-bit key as 64 hex characters.
    GenerateKey {
        /// Print a JSON object instead of the bare key.
        #[arg(long)]
        json: bool,
    },
    /// Validate the configured key without encrypting anything.
    CheckKey,
    /// Encrypt VALUE (or stdin) into an `iv:tag:ciphertext` envelope.
    Encrypt {
        /// Plaintext to encrypt. Read from stdin when omitted.
        value: Option<String>,
        /// Parse the input as JSON and encrypt it as a structure.
        #[arg(long)]
        json: bool,
    },
    /// Decrypt ENVELOPE (or stdin) back to plaintext.
    Decrypt {
        /// Envelope to decrypt. Read from stdin when omitted.
        envelope: Option<String>,
        /// Parse the plaintext as JSON and pretty-print it.
        #[arg(long)]
        json: bool,
    },
}

/// How a successfully executed command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command did what was asked.
    Success,
    /// `check-key` found no usable key.
    KeyInvalid,
}

impl Command {
    /// Short name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Command::GenerateKey { .. } => "generate-key",
            Command::CheckKey => "check-key",
            Command::Encrypt { .. } => "encrypt",
            Command::Decrypt { .. } => "decrypt",
        }
    }
}

/// Execute `command`, reading input from `input` when no argument is given.
///
/// # Errors
///
/// Returns an error if input cannot be read, output cannot be written, or the
/// cipher rejects the operation.
pub fn run<P, R, W>(
    command: Command,
    cipher: &CredentialCipher<P>,
    key_var: &str,
    input: R,
    mut out: W,
) -> Result<Outcome>
where
    P: KeyProvider,
    R: Read,
    W: Write,
{
    match command {
        Command::GenerateKey { json } => {
            let key = EncryptionKey::generate();
            if json {
                let generated = GeneratedKey {
                    env_var: key_var.to_owned(),
                    key_hex: key.to_hex(),
                };
                serde_json::to_writer(&mut out, &generated)?;
                writeln!(out)?;
            } else {
                writeln!(out, "{}", key.to_hex())?;
            }
            info!("generated new key");
        }
        Command::CheckKey => {
            let result = cipher.validate_key_configuration();
            let report = KeyHealthReport::from_result(&result);
            serde_json::to_writer(&mut out, &report)?;
            writeln!(out)?;
            if let Err(e) = result {
                warn!(code = e.code(), key_var, error = %e, "key configuration invalid");
                return Ok(Outcome::KeyInvalid);
            }
            info!(key_var, "key configuration valid");
        }
        Command::Encrypt { value, json } => {
            let plaintext = match value {
                Some(v) => v,
                None => strip_line_ending(read_all(input)?),
            };
            let envelope = if json {
                let parsed: Value =
                    serde_json::from_str(&plaintext).context("input is not valid JSON")?;
                cipher.encrypt_structure(&parsed)
            } else {
                cipher.encrypt(&plaintext)
            }
            .map_err(|e| report_failure("encrypt", e))?;
            writeln!(out, "{envelope}")?;
        }
        Command::Decrypt { envelope, json } => {
            let envelope = match envelope {
                Some(v) => v,
                None => read_all(input)?,
            };
            let envelope = envelope.trim();
            if json {
                let value: Value = cipher
                    .decrypt_structure(envelope)
                    .map_err(|e| report_failure("decrypt", e))?;
                serde_json::to_writer_pretty(&mut out, &value)?;
                writeln!(out)?;
            } else {
                let plaintext = cipher
                    .decrypt(envelope)
                    .map_err(|e| report_failure("decrypt", e))?;
                writeln!(out, "{plaintext}")?;
            }
        }
    }
    out.flush()?;
    Ok(Outcome::Success)
}

fn read_all<R: Read>(mut input: R) -> Result<String> {
    let mut buf = String::new();
    input
        .read_to_string(&mut buf)
        .context("failed to read stdin as UTF-8")?;
    Ok(buf)
}

/// Drop one trailing line ending, as left by `echo` or a heredoc.
fn strip_line_ending(mut s: String) -> String {
    if s.ends_with('\n') {
        s.pop();
        if s.ends_with('\r') {
            s.pop();
        }
    }
    s
}

fn report_failure(operation: &'static str, e: CipherError) -> anyhow::Error {
    if e.is_security_incident() {
        error!(operation, code = e.code(), security_incident = true, "{e}");
    } else {
        warn!(operation, code = e.code(), "{e}");
    }
    anyhow::Error::new(e).context(format!("{operation} failed"))
}
