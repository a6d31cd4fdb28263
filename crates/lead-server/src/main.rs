use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use lead_server::logging::init_logging;
use lead_server::{run_server, AppState, ServerConfig};

#[derive(Parser, Debug, Clone)]
#[command(name = "leadchat-server")]
#[command(about = "Lead capture chat and content studio API")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, env = "DEBUG", default_value = "false")]
    debug: bool,

    /// Server port (overrides the config file)
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Path to the TOML config file
    #[arg(long, env = "LEADCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, e.g. "info,lead_server=debug"
    #[arg(long, env = "LEADCHAT_LOG")]
    log_level: Option<String>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug, cli.log_level.as_deref());

    let mut config = ServerConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    log::info!("Starting leadchat server on port {}", config.port);
    log::info!("  Default model: {}", config.default_model);
    log::info!("  Studio connections: {}", config.connections.len());
    if cli.debug {
        log::debug!("  Database: {}", config.database.display());
    }

    let state = AppState::from_config(&config)
        .await
        .context("Invalid server configuration")?;
    run_server(state, config.port).await?;
    Ok(())
}
