//! The application context
//!
//! [`App`] owns every piece of process state: the running server (if
//! any), the outbound control connection (if any), and the local receive
//! directory. UI shells and the CLI call its methods and only ever see
//! plain strings, booleans and lists.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use lanshare_common::{FileEntry, read_directory};
use lanshare_server::{Server, ServerConfig};

use crate::config::ClientConfig;
use crate::connection::ControlClient;
use crate::constants::{MSG_DOWNLOAD_FAILED, MSG_DOWNLOAD_SUCCESS};
use crate::discovery::discover_servers;
use crate::error::ClientError;
use crate::transfers::prepare_receive_dir;

pub struct App {
    config: ClientConfig,
    server_config: ServerConfig,
    server: Option<Server>,
    connection: Option<ControlClient>,
    receive_dir: Option<PathBuf>,
}

impl App {
    pub fn new(config: ClientConfig, server_config: ServerConfig) -> Self {
        Self {
            config,
            server_config,
            server: None,
            connection: None,
            receive_dir: None,
        }
    }

    // =========================================================================
    // Server side
    // =========================================================================

    /// Start sharing the configured directory
    ///
    /// Returns `true` if the server is running afterwards; starting twice is
    /// a no-op. A server whose loops have died is stopped and started again.
    pub async fn start_server(&mut self) -> bool {
        if let Some(mut server) = self.server.take() {
            if server.is_running() {
                self.server = Some(server);
                return true;
            }
            warn!(control_addr = %server.control_addr(), "server loops exited, restarting");
            server.stop().await;
        }
        match Server::start(&self.server_config).await {
            Ok(server) => {
                self.server = Some(server);
                true
            }
            Err(e) => {
                error!("failed to start server: {e}");
                false
            }
        }
    }

    /// Share a different directory
    ///
    /// A running server serves the new directory from the next request on.
    pub fn set_shared_dir(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        info!(path = %path.display(), "shared directory changed");
        if let Some(server) = &self.server {
            server.shared().set_root(path.clone());
        }
        self.server_config.root = path;
    }

    pub fn shared_dir(&self) -> &Path {
        &self.server_config.root
    }

    /// The running server, if any
    pub fn server(&self) -> Option<&Server> {
        self.server.as_ref()
    }

    // =========================================================================
    // Client side
    // =========================================================================

    /// Enter client mode: prepare the receive directory and look for
    /// servers once
    pub async fn start_client(&mut self) -> Vec<String> {
        if let Err(e) = self.ensure_receive_dir().await {
            warn!("failed to prepare receive directory: {e}");
        }
        let servers = self.discover_servers().await;
        info!(?servers, "discovery finished");
        servers
    }

    /// Probe every interface for servers; empty when nothing answered
    pub async fn discover_servers(&self) -> Vec<String> {
        discover_servers(&self.config.discovery)
            .await
            .into_iter()
            .map(|addr| addr.to_string())
            .collect()
    }

    /// Connect to `addr` (`host:port`), replacing any current connection
    pub async fn connect(&mut self, addr: &str) -> bool {
        self.disconnect().await;
        match ControlClient::connect(addr).await {
            Ok(client) => {
                self.connection = Some(
                    client.with_timeouts(self.config.response_timeout, self.config.progress_timeout),
                );
                true
            }
            Err(e) => {
                warn!(addr, "failed to connect: {e}");
                false
            }
        }
    }

    /// Close the outbound connection, if any
    pub async fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.shutdown().await;
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Download a file from the connected server
    pub async fn request_file(&mut self, name: &str) -> String {
        match self.try_request_file(name).await {
            Ok(path) => {
                info!(name, path = %path.display(), "download complete");
                MSG_DOWNLOAD_SUCCESS.to_string()
            }
            Err(e) => {
                warn!(name, "download failed: {e}");
                format!("{MSG_DOWNLOAD_FAILED}{e}")
            }
        }
    }

    /// Shared root path of the connected server
    pub async fn server_dir(&mut self) -> Option<String> {
        let result = match self.connection.as_mut() {
            Some(connection) => connection.server_dir().await,
            None => Err(ClientError::NotConnected),
        };
        self.settle(result, "GETDIR").await
    }

    /// Files and folders the connected server shares; empty on failure
    pub async fn remote_files(&mut self) -> Vec<FileEntry> {
        let result = match self.connection.as_mut() {
            Some(connection) => connection.list_files().await,
            None => Err(ClientError::NotConnected),
        };
        self.settle(result, "GETFILES").await.unwrap_or_default()
    }

    /// Files already downloaded; empty when the directory is unreadable
    pub async fn local_files(&self) -> Vec<FileEntry> {
        let dir = self.receive_dir();
        match read_directory(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %dir.display(), "failed to list receive directory: {e}");
                Vec::new()
            }
        }
    }

    /// Directory downloads land in
    pub fn receive_dir(&self) -> &Path {
        self.receive_dir.as_deref().unwrap_or(&self.config.receive_dir)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Stop the server and close the outbound connection
    ///
    /// Safe to call any number of times.
    pub async fn stop_all(&mut self) {
        if let Some(mut server) = self.server.take() {
            server.stop().await;
        }
        self.disconnect().await;
    }

    async fn try_request_file(&mut self, name: &str) -> Result<PathBuf, ClientError> {
        let receive_dir = self.ensure_receive_dir().await?;
        let result = match self.connection.as_mut() {
            Some(connection) => connection.request_file(name, &receive_dir).await,
            None => Err(ClientError::NotConnected),
        };
        if let Err(e) = &result
            && e.poisons_connection()
        {
            self.disconnect().await;
        }
        result
    }

    async fn ensure_receive_dir(&mut self) -> Result<PathBuf, ClientError> {
        if let Some(dir) = &self.receive_dir {
            return Ok(dir.clone());
        }
        let dir = prepare_receive_dir(&self.config.receive_dir).await?;
        self.receive_dir = Some(dir.clone());
        Ok(dir)
    }

    /// Log a failed request and drop the connection if it is out of step
    async fn settle<T>(&mut self, result: Result<T, ClientError>, command: &str) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(command, "request failed: {e}");
                if e.poisons_connection() {
                    self.disconnect().await;
                }
                None
            }
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(ClientConfig::default(), ServerConfig::default())
    }
}
