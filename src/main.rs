//! ais CLI binary entry point.

use ais::cli::{AuthCommands, Cli, Commands};
use ais::config::AisConfig;
use ais::error::AisError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("AIS_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();

    if let Err(e) = run(cli).await {
        eprintln!("❌ Error: {e}");
        eprintln!("   {}", e.hint());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AisError> {
    let mut config = AisConfig::load(cli.config.as_deref())?;
    if let Some(backend) = cli.secret_backend {
        config = config.with_secret_backend(backend);
    }
    let manager = config.credential_manager()?;

    match cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Login => ais::cli::auth::handle_login(&manager).await,
            AuthCommands::Status => ais::cli::auth::handle_status(&manager).await,
            AuthCommands::Logout => ais::cli::auth::handle_logout(&manager).await,
            AuthCommands::Token => ais::cli::auth::handle_token(&manager).await,
        },
    }
}
