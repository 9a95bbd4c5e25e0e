//! Supervisory core daemon for a cryo-mill fieldbus/relay bridge node
//! (§10.1). Parses configuration, builds the [`millbridged::BridgeService`],
//! and runs it until ctrl-c, mirroring `service/src/main.rs`'s
//! `tracing_subscriber::fmt()` + `tokio::select!` shutdown shape.

use clap::Parser;
use tracing::{error, info};

use millbridge_config::{BridgeConfig, CliArgs};
use millbridged::BridgeService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("millbridged=info,warn").init();

    let cli = CliArgs::parse();
    info!("Starting millbridged v{}", env!("CARGO_PKG_VERSION"));

    let config = BridgeConfig::load(&cli.config)?.with_cli_overrides(&cli);
    let mut service = BridgeService::new(config).await?;

    let shutdown_signal = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl-c signal handler");
        info!("received shutdown signal");
    };

    tokio::select! {
        result = service.run() => {
            if let Err(err) = result {
                error!("service error: {err}");
                return Err(err.into());
            }
        }
        () = shutdown_signal => {
            info!("shutting down gracefully...");
        }
    }

    info!("millbridged stopped");
    Ok(())
}
