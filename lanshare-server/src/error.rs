//! Server lifecycle errors

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Failures starting a server
#[derive(Debug, Error)]
pub enum ServerError {
    /// A listening socket could not be bound
    #[error("failed to bind {protocol} socket on {addr}: {source}")]
    Bind {
        protocol: &'static str,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The bound address of a socket could not be read back
    #[error("failed to read local address: {0}")]
    LocalAddr(#[source] io::Error),
}

impl ServerError {
    pub(crate) fn bind(protocol: &'static str, addr: SocketAddr, source: io::Error) -> Self {
        Self::Bind {
            protocol,
            addr,
            source,
        }
    }
}
