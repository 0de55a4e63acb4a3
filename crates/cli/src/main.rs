use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use quizlink_core::AppConfig;
use quizlink_lookup::{HttpLookupClient, ShortLinkLookup, UnconfiguredLookup};
use quizlink_storage::Origin;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "quizlink")]
#[command(about = "Short-link and deep-link resolution for embedded quiz funnels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the redirect HTTP server
    Serve {
        #[arg(short, long, default_value = "37780")]
        port: u16,
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Print the navigation path for a short code
    Resolve { code: String },
    /// Print the redirect (or start URL) of an assessment entry route
    Normalize {
        quiz: String,
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Bootstrap a session from a landing URL against the local origin
    Bootstrap { url: String },
    /// Inspect or edit persisted session state
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Print a stored value
    Get { name: String },
    /// Store a JSON value
    Set { name: String, json: String },
    /// Remove a stored value
    Clear { name: String },
    /// Print changes made by other processes as they happen
    Watch,
}

/// Lookup client built once from configuration. Without configuration every
/// short link fails closed.
pub(crate) fn build_lookup(config: &AppConfig) -> Result<Arc<dyn ShortLinkLookup>> {
    match config.require_lookup() {
        Ok(lookup) => Ok(Arc::new(HttpLookupClient::new(lookup)?)),
        Err(e) => {
            tracing::warn!(error = %e, "Short links resolve to not-found");
            Ok(Arc::new(UnconfiguredLookup))
        },
    }
}

pub(crate) fn ensure_data_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// The durable origin of this machine, falling back to memory when it cannot be opened.
pub(crate) fn open_origin(config: &AppConfig) -> Result<Origin> {
    ensure_data_dir(&config.data_dir)?;
    Ok(Origin::open_or_memory(&config.origin_db_path()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(&config, port, host).await,
        Commands::Resolve { code } => commands::links::run_resolve(&config, &code).await,
        Commands::Normalize { quiz, query } => commands::links::run_normalize(&quiz, &query),
        Commands::Bootstrap { url } => commands::bootstrap::run(&config, &url).await,
        Commands::Session { action } => match action {
            SessionCommand::Get { name } => commands::session::run_get(&config, &name),
            SessionCommand::Set { name, json } => commands::session::run_set(&config, &name, &json),
            SessionCommand::Clear { name } => commands::session::run_clear(&config, &name),
            SessionCommand::Watch => commands::session::run_watch(&config).await,
        },
    }
}
