//! Lanshare Common Library
//!
//! Wire constants, the directory listing codec, and the command/response
//! framing shared by the lanshare server and client.

pub mod framing;
pub mod listing;
pub mod protocol;

pub use listing::{FileEntry, ListingError, decode_listing, encode_listing, read_directory};
pub use protocol::{Command, ProtocolError, Response};

/// Default UDP port the discovery responder listens on
pub const DEFAULT_DISCOVERY_PORT: u16 = 9999;

/// Default TCP port for the control channel
pub const DEFAULT_CONTROL_PORT: u16 = 8888;

/// Exact payload a client broadcasts to locate servers
pub const DISCOVERY_TOKEN: &str = "DISCOVER_FILE_SERVER";

/// Prefix of a discovery reply; followed by `:<control-port>`
pub const DISCOVERY_RESPONSE_PREFIX: &str = "FILE_SERVER_RESPONSE:";

/// Largest discovery datagram either side reads
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// Delimiter terminating every command sent by a client
pub const COMMAND_DELIMITER: &str = "\r\n";

/// Terminator of `DIR:`, `SIZE:` and listing responses
pub const RESPONSE_TERMINATOR: u8 = b'\n';
