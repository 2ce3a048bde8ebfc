//! Finding servers on the local network
//!
//! Every usable IPv4 interface gets its own probe: a socket bound to that
//! interface's address broadcasts the discovery token on its subnet and
//! waits for one reply. Hosts often report several interfaces as up while
//! only one actually routes, so probing them one by one is what makes
//! discovery reliable. Interfaces that are down are never probed. Probes
//! run concurrently and a failed probe never fails the whole scan.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use ipnet::Ipv4Net;
use tokio::net::UdpSocket;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use lanshare_common::protocol::parse_discovery_reply;
use lanshare_common::{DISCOVERY_TOKEN, MAX_DATAGRAM_SIZE};

use crate::config::DiscoveryConfig;
use crate::error::ClientError;

/// A local address to probe from and the broadcast address to probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTarget {
    pub local_ip: Ipv4Addr,
    pub broadcast: Ipv4Addr,
}

/// One IPv4 address assigned to a local interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddr {
    pub name: String,
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
    /// Broadcast address reported by the OS, if the interface has one
    pub broadcast: Option<Ipv4Addr>,
    pub is_up: bool,
    pub is_loopback: bool,
}

/// IPv4 addresses of every local interface, whatever its state
#[cfg(unix)]
pub fn interface_addrs() -> io::Result<Vec<InterfaceAddr>> {
    use nix::ifaddrs::getifaddrs;
    use nix::net::if_::InterfaceFlags;
    use nix::sys::socket::SockaddrStorage;

    fn ipv4(addr: Option<&SockaddrStorage>) -> Option<Ipv4Addr> {
        addr.and_then(|addr| addr.as_sockaddr_in()).map(|addr| addr.ip())
    }

    let mut addrs = Vec::new();
    for ifaddr in getifaddrs()? {
        let Some(ip) = ipv4(ifaddr.address.as_ref()) else {
            continue;
        };
        let flags = ifaddr.flags;
        let broadcast = if flags.contains(InterfaceFlags::IFF_BROADCAST) {
            ipv4(ifaddr.broadcast.as_ref())
        } else {
            None
        };

        addrs.push(InterfaceAddr {
            name: ifaddr.interface_name,
            ip,
            netmask: ipv4(ifaddr.netmask.as_ref()).unwrap_or(Ipv4Addr::BROADCAST),
            broadcast,
            is_up: flags.contains(InterfaceFlags::IFF_UP),
            is_loopback: flags.contains(InterfaceFlags::IFF_LOOPBACK),
        });
    }
    Ok(addrs)
}

#[cfg(not(unix))]
pub fn interface_addrs() -> io::Result<Vec<InterfaceAddr>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "interface enumeration is only available on unix",
    ))
}

/// Probe targets for this host's up, non-loopback IPv4 interfaces
pub fn probe_targets() -> io::Result<Vec<ProbeTarget>> {
    Ok(select_probe_targets(&interface_addrs()?))
}

/// Keep the addresses worth probing and pair each with its broadcast
/// address
///
/// Down and loopback interfaces are dropped. The result keeps interface
/// order and lists each target once.
pub fn select_probe_targets(addrs: &[InterfaceAddr]) -> Vec<ProbeTarget> {
    let mut targets = Vec::new();

    for addr in addrs {
        if !addr.is_up {
            debug!(interface = %addr.name, "skipping interface that is down");
            continue;
        }
        if addr.is_loopback || addr.ip.is_loopback() {
            continue;
        }

        let target = ProbeTarget {
            local_ip: addr.ip,
            broadcast: broadcast_address(addr.ip, addr.netmask, addr.broadcast),
        };
        debug!(interface = %addr.name, ?target, "found probe target");
        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    targets
}

/// Broadcast address for a subnet
///
/// Prefers what the OS reports, then computes it from the netmask, and
/// finally falls back to the limited broadcast address.
pub fn broadcast_address(
    ip: Ipv4Addr,
    netmask: Ipv4Addr,
    reported: Option<Ipv4Addr>,
) -> Ipv4Addr {
    if let Some(broadcast) = reported
        && !broadcast.is_unspecified()
    {
        return broadcast;
    }

    match Ipv4Net::with_netmask(ip, netmask) {
        Ok(net) if net.prefix_len() < 31 => net.broadcast(),
        _ => Ipv4Addr::BROADCAST,
    }
}

/// Send one probe from `local_ip` to `target` and wait for one reply
///
/// Returns the control address (`replier-ip:port`) the reply points at.
pub async fn probe(
    local_ip: IpAddr,
    target: SocketAddr,
    config: &DiscoveryConfig,
) -> Result<SocketAddr, ClientError> {
    let socket = UdpSocket::bind(SocketAddr::new(local_ip, 0))
        .await
        .map_err(ClientError::Transport)?;
    socket.set_broadcast(true).map_err(ClientError::Transport)?;

    timeout(
        config.write_timeout,
        socket.send_to(DISCOVERY_TOKEN.as_bytes(), target),
    )
    .await
    .map_err(|_| ClientError::Timeout)?
    .map_err(ClientError::Transport)?;

    let mut buf = [0u8; MAX_DATAGRAM_SIZE];
    let (len, from) = timeout(config.read_timeout, socket.recv_from(&mut buf))
        .await
        .map_err(|_| ClientError::Timeout)?
        .map_err(ClientError::Transport)?;

    let reply = String::from_utf8_lossy(&buf[..len]);
    Ok(parse_discovery_reply(&reply, from.ip())?)
}

/// Probe every interface and collect the servers that answered
///
/// Failures are logged and skipped; the result may be empty.
pub async fn discover_servers(config: &DiscoveryConfig) -> Vec<SocketAddr> {
    let targets = match probe_targets() {
        Ok(targets) => targets,
        Err(e) => {
            warn!("failed to enumerate network interfaces: {e}");
            return Vec::new();
        }
    };
    if targets.is_empty() {
        info!("no usable IPv4 interfaces to probe");
    }
    probe_all(targets, config).await
}

/// Probe all `targets` concurrently on `config.port`
///
/// Results keep target order and contain each address once. A target
/// that fails to bind, send or get an answer is skipped.
pub async fn probe_all(targets: Vec<ProbeTarget>, config: &DiscoveryConfig) -> Vec<SocketAddr> {
    let mut probes = JoinSet::new();
    for (index, target) in targets.into_iter().enumerate() {
        let config = config.clone();
        probes.spawn(async move {
            let destination = SocketAddr::new(IpAddr::V4(target.broadcast), config.port);
            let result = probe(IpAddr::V4(target.local_ip), destination, &config).await;
            (index, target, result)
        });
    }

    let mut found = Vec::new();
    while let Some(joined) = probes.join_next().await {
        match joined {
            Ok((index, _, Ok(server))) => found.push((index, server)),
            Ok((_, target, Err(e))) => {
                info!(local_ip = %target.local_ip, "no server found: {e}");
            }
            Err(e) => warn!("discovery probe task failed: {e}"),
        }
    }

    found.sort_by_key(|(index, _)| *index);
    let mut servers: Vec<SocketAddr> = Vec::with_capacity(found.len());
    for (_, server) in found {
        if !servers.contains(&server) {
            servers.push(server);
        }
    }
    servers
}
