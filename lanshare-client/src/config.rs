//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

use lanshare_common::DEFAULT_DISCOVERY_PORT;
use lanshare_common::framing::{DEFAULT_PROGRESS_TIMEOUT, DEFAULT_RESPONSE_TIMEOUT};

use crate::constants::{
    DEFAULT_PROBE_READ_TIMEOUT, DEFAULT_PROBE_WRITE_TIMEOUT, DEFAULT_RECEIVE_DIR,
};

/// How discovery probes are sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// UDP port servers answer probes on
    pub port: u16,
    /// Deadline for sending one probe
    pub write_timeout: Duration,
    /// Deadline for the reply to one probe
    pub read_timeout: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_DISCOVERY_PORT,
            write_timeout: DEFAULT_PROBE_WRITE_TIMEOUT,
            read_timeout: DEFAULT_PROBE_READ_TIMEOUT,
        }
    }
}

/// Client-side settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Where downloaded files are written
    pub receive_dir: PathBuf,
    pub discovery: DiscoveryConfig,
    /// Deadline for one response line from the server
    pub response_timeout: Duration,
    /// Longest gap allowed between chunks of file data
    pub progress_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            receive_dir: PathBuf::from(DEFAULT_RECEIVE_DIR),
            discovery: DiscoveryConfig::default(),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            progress_timeout: DEFAULT_PROGRESS_TIMEOUT,
        }
    }
}
