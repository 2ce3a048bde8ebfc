//! UDP discovery responder
//!
//! Answers the exact discovery token with the control port so clients can
//! find the server without configuration. Any other datagram is dropped
//! without a reply.

use std::io;
use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, error, warn};

use lanshare_common::protocol::discovery_reply;
use lanshare_common::{DISCOVERY_TOKEN, MAX_DATAGRAM_SIZE};

use crate::server::wait_for_shutdown;

/// Bind the responder socket
///
/// An unspecified IPv6 address is bound dual-stack so IPv4 probes are
/// answered too.
pub fn bind_discovery_socket(addr: SocketAddr) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    UdpSocket::from_std(socket.into())
}

/// Answer discovery probes until shutdown or a receive error
///
/// The socket is released when this returns.
pub async fn run_discovery_responder(
    socket: UdpSocket,
    control_port: u16,
    mut shutdown: watch::Receiver<bool>,
) {
    let reply = discovery_reply(control_port);
    let mut buf = [0u8; MAX_DATAGRAM_SIZE];

    loop {
        let (len, from) = tokio::select! {
            _ = wait_for_shutdown(&mut shutdown) => break,
            received = socket.recv_from(&mut buf) => match received {
                Ok(received) => received,
                Err(e) => {
                    error!("discovery responder stopped: {e}");
                    break;
                }
            },
        };

        if &buf[..len] != DISCOVERY_TOKEN.as_bytes() {
            debug!(%from, len, "ignoring unrecognized datagram");
            continue;
        }

        match socket.send_to(reply.as_bytes(), from).await {
            Ok(_) => debug!(%from, "answered discovery probe"),
            Err(e) => warn!(%from, "failed to answer discovery probe: {e}"),
        }
    }

    debug!("discovery responder exited");
}
