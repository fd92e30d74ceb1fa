//! CLI entry point for ais.

pub mod auth;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::SecretBackend;

/// ais credential CLI
#[derive(Parser, Debug)]
#[command(name = "ais", version, about = "GitHub Copilot credentials for the ais assistants")]
pub struct Cli {
    /// Path to a config file (defaults to ~/.ais/config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override where secrets are stored (keyring, file)
    #[arg(long, global = true)]
    pub secret_backend: Option<SecretBackend>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authentication management
    Auth(AuthArgs),
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Run the GitHub device flow and store a new refresh token
    Login,
    /// Show what is stored, without contacting GitHub
    Status,
    /// Remove all stored credentials
    Logout,
    /// Print a valid Copilot access token, authenticating if needed
    Token,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
