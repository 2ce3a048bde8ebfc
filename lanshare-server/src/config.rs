//! Server configuration

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use lanshare_common::{DEFAULT_CONTROL_PORT, DEFAULT_DISCOVERY_PORT};

/// Where a server listens and what it shares
///
/// A port of `0` asks the OS for an ephemeral port; the bound addresses are
/// available from the running [`crate::Server`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address both sockets bind to
    pub bind: IpAddr,
    /// TCP control channel port
    pub control_port: u16,
    /// UDP discovery responder port
    pub discovery_port: u16,
    /// Directory served to peers
    pub root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            control_port: DEFAULT_CONTROL_PORT,
            discovery_port: DEFAULT_DISCOVERY_PORT,
            root: PathBuf::from("."),
        }
    }
}

impl ServerConfig {
    /// Loopback config on ephemeral ports, for tests and local demos
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            control_port: 0,
            discovery_port: 0,
            root: root.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.control_port, 8888);
        assert_eq!(config.discovery_port, 9999);
        assert_eq!(config.root, PathBuf::from("."));
    }

    #[test]
    fn test_local_uses_ephemeral_ports() {
        let config = ServerConfig::local("/tmp");
        assert!(config.bind.is_loopback());
        assert_eq!(config.control_port, 0);
        assert_eq!(config.discovery_port, 0);
    }
}
