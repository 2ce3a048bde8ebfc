//! Command-line argument parsing

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use lanshare_common::{DEFAULT_CONTROL_PORT, DEFAULT_DISCOVERY_PORT};

use lanshare_server::ServerConfig;

/// Lanshare file server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory to share
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// IP address to bind to (IPv4 or IPv6)
    #[arg(short, long, default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// TCP port for the control channel
    #[arg(short, long, default_value_t = DEFAULT_CONTROL_PORT)]
    pub port: u16,

    /// UDP port for the discovery responder
    #[arg(short = 'd', long, default_value_t = DEFAULT_DISCOVERY_PORT)]
    pub discovery_port: u16,

    /// Enable debug logging (shows connections and every command)
    #[arg(long, default_value = "false")]
    pub debug: bool,
}

impl Args {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind: self.bind,
            control_port: self.port,
            discovery_port: self.discovery_port,
            root: self.root.clone(),
        }
    }
}
