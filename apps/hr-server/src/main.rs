mod config;
mod logging;
mod signals;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use directory_sync::DirectorySyncModule;
use mimalloc::MiMalloc;
use sea_orm::Database;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::config::{AppConfig, CliOverrides};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// HR Server - directory synchronization backend
#[derive(Parser)]
#[command(name = "hr-server")]
#[command(about = "HR Server - mirrors the corporate directory into the HR platform")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) defaults -> 2) YAML (if provided) -> 3) env (APP__*) -> 4) CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(CliOverrides {
        port: cli.port,
        verbose: cli.verbose,
        mock: cli.mock,
    });

    if cli.print_config {
        println!("Effective configuration:\n{}", config.to_yaml()?);
        return Ok(());
    }

    logging::init_logging(&config.logging)?;
    tracing::info!("HR Server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    println!("Configuration is valid");
    println!("{}", config.to_yaml()?);
    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!(dsn = %redact_dsn(&config.database.dsn), "Connecting to database");
    let db = Database::connect(config.database.dsn.as_str())
        .await
        .context("connecting to the database")?;

    let module = DirectorySyncModule::init(config.modules.directory_sync.clone(), db).await?;
    let cancel = CancellationToken::new();
    module.start(cancel.clone());

    let app = module.router().layer(TraceLayer::new_for_http());
    let addr = SocketAddr::new(config.server.bind_addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "HTTP server listening");

    tokio::spawn(signals::cancel_on_shutdown(cancel.clone()));
    let shutdown = cancel.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await;

    cancel.cancel();
    module.stop().await;
    tracing::info!("HR Server stopped");
    served.context("HTTP server failed")
}

/// Hide credentials embedded in a DSN before it reaches the logs.
fn redact_dsn(dsn: &str) -> String {
    match (dsn.find("://"), dsn.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &dsn[..scheme_end], &dsn[at..])
        }
        _ => dsn.to_owned(),
    }
}
