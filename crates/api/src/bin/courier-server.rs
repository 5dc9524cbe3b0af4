//! Courier binary entry point: loads configuration, initializes tracing,
//! and runs the broker until a termination signal.

use anyhow::Result;
use clap::{Parser, Subcommand};
use courier_api::CourierServer;
use courier_common::{tracing_setup, CourierConfig};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "courier")]
#[command(version = "0.1.0")]
#[command(about = "In-process publish/subscribe event broker")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "courier.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the broker
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Validate configuration and exit
    ValidateConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = cli.log_level.as_deref().unwrap_or("info");
    tracing_setup::init_tracing(log_level);

    info!("Courier v0.1.0 starting");

    let config = CourierConfig::load(&cli.config).map_err(|err| {
        error!("failed to load configuration: {err}");
        err
    })?;

    match cli.command {
        Some(Commands::ValidateConfig) => {
            println!("configuration is valid");
            println!("  port: {}", config.port);
            println!("  auth required: {}", config.auth.required);
            println!("  preconfigured channels: {:?}", config.channels.preconfigured);
            Ok(())
        }
        Some(Commands::Serve { host, port }) => {
            let mut config = config;
            if let Some(h) = host {
                config.host = h;
            }
            if let Some(p) = port {
                config.port = p;
            }
            serve(config).await
        }
        None => serve(config).await,
    }
}

async fn serve(config: CourierConfig) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    info!(%addr, "starting Courier");
    let server = CourierServer::new(config)?;
    server.run(&addr).await
}
