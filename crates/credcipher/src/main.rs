//! `credcipher`: operator CLI entry point.
//!
//! Startup sequence:
//! 1. Parse arguments.
//! 2. Load [`Config`] from environment variables.
//! 3. Initialise structured JSON logging.
//! 4. Build the [`CredentialCipher`] and run the requested command.

mod commands;
mod telemetry;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use credential_cipher::config::Config;
use credential_cipher::key::DEFAULT_KEY_VAR;
use credential_cipher::{CredentialCipher, EnvKeyProvider, KeyProvider};
use tracing::info;

use commands::{Command, Outcome};

#[derive(Debug, Parser)]
#[command(name = "credcipher", version)]
#[command(about = "Encrypt and decrypt stored credentials with the shared ENCRYPTION_KEY")]
struct Cli {
    /// Read the key from this environment variable instead of ENCRYPTION_KEY.
    #[arg(long, global = true)]
    key_env: Option<String>,

    /// Log level override (defaults to LOG_LEVEL, then "info").
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<ExitCode> {
    // -----------------------------------------------------------------------
    // 1. Arguments
    // -----------------------------------------------------------------------
    let cli = Cli::parse();

    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    let log_level = cli.log_level.as_deref().unwrap_or(&cfg.log_level);
    telemetry::init(log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        command = cli.command.name(),
        "credcipher starting"
    );

    // -----------------------------------------------------------------------
    // 4. Command
    // -----------------------------------------------------------------------
    let (provider, key_var) = key_provider(&cli, &cfg);
    let cipher = CredentialCipher::new(provider);

    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    let outcome = commands::run(cli.command, &cipher, &key_var, stdin, stdout)?;
    Ok(match outcome {
        Outcome::Success => ExitCode::SUCCESS,
        Outcome::KeyInvalid => ExitCode::FAILURE,
    })
}

/// Pick the key source: an explicit `--key-env` variable, else the loaded config.
fn key_provider(cli: &Cli, cfg: &Config) -> (Arc<dyn KeyProvider>, String) {
    match &cli.key_env {
        Some(var) => {
            let provider: Arc<dyn KeyProvider> = Arc::new(EnvKeyProvider::with_var(var.clone()));
            (provider, var.clone())
        }
        None => {
            let provider: Arc<dyn KeyProvider> = Arc::new(cfg.key_provider());
            (provider, DEFAULT_KEY_VAR.to_owned())
        }
    }
}
