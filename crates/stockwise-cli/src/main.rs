//! Stockwise CLI - inventory management from the terminal.
//!
//! Talks to the inventory backend through `stockwise-core`: sign in once,
//! then list and edit the catalog, orders and users, read reports and
//! download exports.

mod cli;
mod commands;
mod output;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use stockwise_core::auth::{FileSessionStore, KeyringSessionStore};
use stockwise_core::config::TokenStorage;
use stockwise_core::{ApiClient, ClientError, Config, Navigator, SessionStore};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;

/// Log file prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "stockwise.log";

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` controls the level (warn by default). With `log_dir` set the
/// same events also go to a daily-rotated file; keep the guard alive until exit.
fn init_tracing(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

/// Terminal stand-in for a page redirect: there is no login page to show,
/// so point the user at the login command instead.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: &str) {
        debug!(route = route, "Login required");
        eprintln!("Session expired or missing. Run `stockwise login` to sign in.");
    }
}

fn build_client(config: &Config) -> Result<ApiClient> {
    let store: Arc<dyn SessionStore> = match config.token_storage {
        TokenStorage::File => Arc::new(FileSessionStore::new(config.cache_dir()?)),
        TokenStorage::Keyring => Arc::new(KeyringSessionStore::new()),
    };
    ApiClient::new(config.api_config(), store, Arc::new(TerminalNavigator))
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let client = build_client(&config)?;
    info!(origin = %client.config().origin, "Stockwise starting");
    commands::run(&client, &config, cli.command).await
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {:#}; using defaults", e);
            Config::default()
        }
    };
    config.apply_overrides(cli.origin.clone(), cli.timeout.clone());

    let log_dir = if cli.log_file { config.cache_dir().ok() } else { None };
    let _guard = init_tracing(log_dir);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The navigator has already printed the login hint
            let handled = e
                .downcast_ref::<ClientError>()
                .is_some_and(ClientError::is_handled);
            if !handled {
                eprintln!("Error: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}
