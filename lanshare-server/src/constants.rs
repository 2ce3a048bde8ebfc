//! Server constants
//!
//! User-facing messages and the error texts sent after `ERROR:` on the wire.
//! Peers match on some of these strings, so they must stay stable.

// =============================================================================
// Wire error messages
// =============================================================================

/// Requested file does not exist in the shared directory
pub const ERR_FILE_NOT_FOUND: &str = "File not found";

/// Requested name is empty or is not a single plain file name
pub const ERR_FILE_INVALID_NAME: &str = "Invalid file name";

/// Requested name resolves outside the shared directory
pub const ERR_FILE_ACCESS_DENIED: &str = "Access denied";

/// Requested name is a directory or another non-regular file
pub const ERR_FILE_NOT_A_FILE: &str = "Not a file";

/// File exists but could not be opened or inspected
pub const ERR_FILE_READ: &str = "Error getting file data";

/// Prefix of the message used when a path could not be resolved
pub const ERR_FILE_CANONICALIZE: &str = "Failed to resolve path";

/// Shared directory is missing or unreadable
pub const ERR_SHARED_ROOT_UNAVAILABLE: &str = "Shared directory unavailable";

// =============================================================================
// Log messages
// =============================================================================

pub const MSG_BANNER: &str = "lanshared v";
pub const MSG_CONTROL_LISTENING: &str = "Control channel listening on ";
pub const MSG_DISCOVERY_LISTENING: &str = "Discovery responder listening on ";
pub const MSG_SHARING: &str = "Sharing directory ";
pub const MSG_SHUTDOWN_RECEIVED: &str = "Shutdown signal received, stopping";
pub const MSG_STOPPED: &str = "Server stopped";

// =============================================================================
// Fatal errors
// =============================================================================

pub const ERR_SIGNAL_SIGTERM: &str = "Failed to install SIGTERM handler";
pub const ERR_SIGNAL_SIGINT: &str = "Failed to install SIGINT handler";
pub const ERR_SIGNAL_CTRLC: &str = "Failed to listen for Ctrl+C";

/// Size of the buffer used for each read from a control connection
pub const CONNECTION_READ_BUFFER: usize = 4096;
