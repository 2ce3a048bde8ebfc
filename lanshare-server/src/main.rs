//! Lanshare file server

mod args;

use std::process;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use args::Args;
use lanshare_server::Server;
use lanshare_server::constants::*;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    info!("{}{}", MSG_BANNER, env!("CARGO_PKG_VERSION"));

    let config = args.server_config();
    if !config.root.is_dir() {
        error!("{} is not a directory", config.root.display());
        process::exit(1);
    }

    let mut server = match Server::start(&config).await {
        Ok(server) => server,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };
    info!("{}{}", MSG_SHARING, config.root.display());
    info!("{}{}", MSG_CONTROL_LISTENING, server.control_addr());
    info!("{}{}", MSG_DISCOVERY_LISTENING, server.discovery_addr());

    setup_shutdown_signal().await;
    info!("{}", MSG_SHUTDOWN_RECEIVED);

    server.stop().await;
    info!("{}", MSG_STOPPED);
}

/// Log to stderr; `RUST_LOG` overrides the level chosen by `--debug`
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Wait for SIGTERM/SIGINT (Unix) or Ctrl+C (elsewhere)
async fn setup_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let (mut sigterm, mut sigint) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            (Err(e), _) => {
                error!("{ERR_SIGNAL_SIGTERM}: {e}");
                process::exit(1);
            }
            (_, Err(e)) => {
                error!("{ERR_SIGNAL_SIGINT}: {e}");
                process::exit(1);
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("{ERR_SIGNAL_CTRLC}: {e}");
            process::exit(1);
        }
    }
}
