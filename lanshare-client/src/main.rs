//! Lanshare command-line client

mod args;

use std::process;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use args::{Args, Mode};
use lanshare_client::App;
use lanshare_client::constants::MSG_DOWNLOAD_SUCCESS;
use lanshare_common::FileEntry;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    let mut app = App::new(args.client_config(), args.server_config());
    let ok = run(&mut app, args.command).await;
    app.stop_all().await;

    if !ok {
        process::exit(1);
    }
}

async fn run(app: &mut App, mode: Mode) -> bool {
    match mode {
        Mode::Serve { .. } => {
            if !app.start_server().await {
                return false;
            }
            if let Some(server) = app.server() {
                info!(
                    "Sharing {} on {} (discovery {})",
                    app.shared_dir().display(),
                    server.control_addr(),
                    server.discovery_addr()
                );
            }
            wait_for_ctrl_c().await;
            info!("Shutting down");
            true
        }
        Mode::Scan => {
            let servers = app.start_client().await;
            if servers.is_empty() {
                println!("No servers found");
            }
            for server in servers {
                println!("{server}");
            }
            true
        }
        Mode::Dir { server } => {
            if !connect(app, &server).await {
                return false;
            }
            match app.server_dir().await {
                Some(dir) => {
                    println!("{dir}");
                    true
                }
                None => false,
            }
        }
        Mode::List { server, json } => {
            if !connect(app, &server).await {
                return false;
            }
            let entries = app.remote_files().await;
            print_entries(&entries, json)
        }
        Mode::Get { server, names } => {
            if !connect(app, &server).await {
                return false;
            }
            let mut all_ok = true;
            for name in names {
                let message = app.request_file(&name).await;
                println!("{name}: {message}");
                all_ok &= message == MSG_DOWNLOAD_SUCCESS;
            }
            all_ok
        }
        Mode::Local { json } => {
            let entries = app.local_files().await;
            print_entries(&entries, json)
        }
    }
}

async fn connect(app: &mut App, server: &str) -> bool {
    if app.connect(server).await {
        return true;
    }
    error!("Could not connect to {server}");
    false
}

fn print_entries(entries: &[FileEntry], json: bool) -> bool {
    if json {
        return match serde_json::to_string_pretty(entries) {
            Ok(text) => {
                println!("{text}");
                true
            }
            Err(e) => {
                error!("Failed to encode listing: {e}");
                false
            }
        };
    }

    for entry in entries {
        if entry.is_folder {
            println!("{}/", entry.name);
        } else {
            println!("{}", entry.name);
        }
    }
    true
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

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {e}");
    }
}
