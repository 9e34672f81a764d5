//! dataagent — CLI entry point that boots the HTTP/WebSocket server.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dataagent_config::Config;
use dataagent_telemetry::{LogConfig, LogFormat, setup_logging};
use tracing::info;

/// dataagent: multi-tenant conversational-agent service.
#[derive(Parser)]
#[command(name = "dataagent")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Workspace root to resolve layered config against.
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP/WebSocket server.
    Serve,
    /// Print the fully-resolved configuration and exit.
    ShowConfig,
}

fn log_format(format: &str) -> LogFormat {
    match format {
        "compact" => LogFormat::Compact,
        "json" => LogFormat::Json,
        _ => LogFormat::Pretty,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let resolved = Config::load(cli.workspace.as_deref()).context("failed to load configuration")?;
    let config = resolved.config.clone();

    let log_config = LogConfig::new(config.logging.level.clone()).with_format(log_format(&config.logging.format));
    setup_logging(&log_config).context("failed to initialize logging")?;

    match cli.command {
        Commands::ShowConfig => {
            println!("{}", resolved.render(dataagent_config::ShowFormat::Toml));
            Ok(())
        },
        Commands::Serve => serve(config).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind_addr.clone();
    let port = config.server.port;

    let state = dataagent_server::bootstrap::build_state(config)
        .await
        .context("failed to build application state")?;
    let router = dataagent_server::build_router(state);

    let addr: SocketAddr = format!("{bind_addr}:{port}")
        .parse()
        .context("invalid server.bind_addr/port")?;
    info!(%addr, "starting dataagent server");

    let listener = tokio::net::TcpListener::bind(addr).await.context("failed to bind listener")?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
