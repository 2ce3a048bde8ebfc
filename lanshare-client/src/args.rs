//! Command-line argument parsing

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lanshare_common::{DEFAULT_CONTROL_PORT, DEFAULT_DISCOVERY_PORT};

use lanshare_client::{ClientConfig, DiscoveryConfig};
use lanshare_client::constants::DEFAULT_RECEIVE_DIR;
use lanshare_server::ServerConfig;

/// Share files on the local network
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Mode,

    /// Directory downloads are saved to
    #[arg(short, long, global = true, default_value = DEFAULT_RECEIVE_DIR)]
    pub receive_dir: PathBuf,

    /// UDP port servers answer discovery probes on
    #[arg(short = 'd', long, global = true, default_value_t = DEFAULT_DISCOVERY_PORT)]
    pub discovery_port: u16,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Share a directory until interrupted
    Serve {
        /// Directory to share
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// IP address to bind to
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: IpAddr,

        /// TCP port for the control channel
        #[arg(short, long, default_value_t = DEFAULT_CONTROL_PORT)]
        port: u16,
    },
    /// Look for servers on every interface
    Scan,
    /// Print a server's shared directory path
    Dir {
        /// Server address (host:port)
        server: String,
    },
    /// List the files a server shares
    List {
        /// Server address (host:port)
        server: String,

        /// Print the listing as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
    /// Download files from a server
    Get {
        /// Server address (host:port)
        server: String,

        /// File names to download
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// List files already downloaded
    Local {
        /// Print the listing as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

impl Args {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            receive_dir: self.receive_dir.clone(),
            discovery: DiscoveryConfig {
                port: self.discovery_port,
                ..DiscoveryConfig::default()
            },
            ..ClientConfig::default()
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        match &self.command {
            Mode::Serve { root, bind, port } => ServerConfig {
                bind: *bind,
                control_port: *port,
                discovery_port: self.discovery_port,
                root: root.clone(),
            },
            _ => ServerConfig {
                discovery_port: self.discovery_port,
                ..ServerConfig::default()
            },
        }
    }
}
