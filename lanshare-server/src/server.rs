//! Server lifecycle
//!
//! [`Server::start`] binds both sockets and spawns the accept loop and the
//! discovery responder. Every loop watches one shutdown channel, and
//! [`Server::stop`] waits until all of them (and every connection task)
//! have exited, so ports are free again when it returns.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::connection::{ConnectionParams, handle_connection};
use crate::discovery::{bind_discovery_socket, run_discovery_responder};
use crate::error::ServerError;
use crate::files::SharedDirectory;

/// A running server
pub struct Server {
    control_addr: SocketAddr,
    discovery_addr: SocketAddr,
    shared: SharedDirectory,
    shutdown_tx: Option<watch::Sender<bool>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Server {
    /// Bind the control listener and the discovery socket, then start
    /// serving
    ///
    /// If either bind fails nothing keeps running and any socket already
    /// bound is released.
    pub async fn start(config: &ServerConfig) -> Result<Self, ServerError> {
        let control_bind = SocketAddr::new(config.bind, config.control_port);
        let listener = TcpListener::bind(control_bind)
            .await
            .map_err(|e| ServerError::bind("TCP", control_bind, e))?;
        let control_addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

        let discovery_bind = SocketAddr::new(config.bind, config.discovery_port);
        let socket = bind_discovery_socket(discovery_bind)
            .map_err(|e| ServerError::bind("UDP", discovery_bind, e))?;
        let discovery_addr = socket.local_addr().map_err(ServerError::LocalAddr)?;

        Ok(Self::spawn(listener, socket, control_addr, discovery_addr, config))
    }

    fn spawn(
        listener: TcpListener,
        socket: UdpSocket,
        control_addr: SocketAddr,
        discovery_addr: SocketAddr,
        config: &ServerConfig,
    ) -> Self {
        let shared = SharedDirectory::new(config.root.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let accept = tokio::spawn(run_accept_loop(
            listener,
            shared.clone(),
            shutdown_rx.clone(),
        ));
        let responder = tokio::spawn(run_discovery_responder(
            socket,
            control_addr.port(),
            shutdown_rx,
        ));

        info!(%control_addr, %discovery_addr, root = %config.root.display(), "server started");

        Self {
            control_addr,
            discovery_addr,
            shared,
            shutdown_tx: Some(shutdown_tx),
            tasks: vec![accept, responder],
        }
    }

    /// Address of the TCP control listener
    pub fn control_addr(&self) -> SocketAddr {
        self.control_addr
    }

    /// Address of the UDP discovery responder
    pub fn discovery_addr(&self) -> SocketAddr {
        self.discovery_addr
    }

    /// Handle to the shared directory; updates apply to new requests
    pub fn shared(&self) -> &SharedDirectory {
        &self.shared
    }

    /// Whether both loops are still serving
    ///
    /// `false` once `stop` was called, and also when the accept loop or the
    /// discovery responder exited on its own after an I/O error. A server in
    /// that state must be stopped and started again.
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some() && self.tasks.iter().all(|task| !task.is_finished())
    }

    /// Signal every loop to stop and wait for them to exit
    ///
    /// Calling it again is a no-op.
    pub async fn stop(&mut self) {
        let Some(shutdown_tx) = self.shutdown_tx.take() else {
            return;
        };
        let _ = shutdown_tx.send(true);

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!("server task ended abnormally: {e}");
            }
        }
        info!(control_addr = %self.control_addr, "server stopped");
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        // Loops still exit on their own; nothing can wait for them here
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(true);
        }
    }
}

/// Wait until the shutdown flag is set or the sender is gone
pub(crate) async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stopped| *stopped).await;
}

/// Accept control connections, one task each
///
/// On shutdown the listener is closed first, then every connection task is
/// awaited.
async fn run_accept_loop(
    listener: TcpListener,
    shared: SharedDirectory,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut connections = JoinSet::new();
    let connection_shutdown = shutdown.clone();

    loop {
        tokio::select! {
            _ = wait_for_shutdown(&mut shutdown) => break,
            Some(joined) = connections.join_next(), if !connections.is_empty() => {
                if let Err(e) = joined {
                    warn!("connection task ended abnormally: {e}");
                }
            }
            accepted = listener.accept() => match accepted {
                Ok((socket, peer_addr)) => {
                    let params = ConnectionParams {
                        peer_addr,
                        shared: shared.clone(),
                        shutdown: connection_shutdown.clone(),
                    };
                    connections.spawn(serve(socket, params));
                }
                Err(e) => {
                    error!("accept loop stopped: {e}");
                    break;
                }
            },
        }
    }

    drop(listener);
    while let Some(joined) = connections.join_next().await {
        if let Err(e) = joined {
            warn!("connection task ended abnormally: {e}");
        }
    }
    debug!("accept loop exited");
}

async fn serve(socket: TcpStream, params: ConnectionParams) {
    let peer_addr = params.peer_addr;
    debug!(%peer_addr, "connection accepted");

    if let Err(e) = handle_connection(socket, params).await {
        debug!(%peer_addr, "connection ended with error: {e}");
    }
    debug!(%peer_addr, "connection closed");
}
