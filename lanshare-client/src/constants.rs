//! Client constants

use std::time::Duration;

/// Receive directory used when none is configured
pub const DEFAULT_RECEIVE_DIR: &str = "received_files";

/// Suffix appended to a taken destination name, repeatedly
pub const COLLISION_SUFFIX: &str = "(1)";

/// How many `(1)` suffixes are tried before falling back to a UUID
pub const MAX_NAME_ATTEMPTS: usize = 50;

/// Suffix of the staging file a download is written to
pub const PART_SUFFIX: &str = ".part";

/// Time allowed for a TCP connect to the control port
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default deadline for sending a discovery probe
pub const DEFAULT_PROBE_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Default deadline for a discovery reply
pub const DEFAULT_PROBE_READ_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// User-facing results
// =============================================================================

pub const MSG_DOWNLOAD_SUCCESS: &str = "File downloaded successfully.";
pub const MSG_DOWNLOAD_FAILED: &str = "Error requesting the file, ";
