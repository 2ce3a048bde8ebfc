//! Protocol message types
//!
//! The control channel is plain text. Clients send one of three commands,
//! each followed by `\r\n`:
//!
//! | Command          | Response                                         |
//! |------------------|--------------------------------------------------|
//! | `GETDIR`         | `DIR:<path>\n`                                   |
//! | `GETFILES`       | listing text (see [`crate::listing`])            |
//! | `REQUEST:<name>` | `SIZE:<n>\n` then `n` raw bytes, or `ERROR:<msg>` |
//!
//! `ERROR:` responses carry no terminator. Deployed peers depend on that, so
//! the server keeps emitting it and [`crate::framing::ResponseReader`] hides it
//! from the rest of the client.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

use crate::listing::{FileEntry, ListingError, decode_listing, encode_listing};
use crate::{COMMAND_DELIMITER, DISCOVERY_RESPONSE_PREFIX};

/// Prefix of the response to `GETDIR`
pub const DIR_PREFIX: &str = "DIR:";

/// Prefix of a successful file transfer header
pub const SIZE_PREFIX: &str = "SIZE:";

/// Prefix of a failure response
pub const ERROR_PREFIX: &str = "ERROR:";

/// Prefix of a file request command
pub const REQUEST_PREFIX: &str = "REQUEST:";

/// Errors in the content of a response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The response did not start with any prefix valid for the request
    #[error("unexpected response from server: {0}")]
    UnexpectedResponse(String),

    /// The `SIZE:` header did not carry a byte count
    #[error("invalid file size received: {0}")]
    InvalidSize(String),

    /// A discovery reply was not `FILE_SERVER_RESPONSE:<:port>`
    #[error("malformed discovery reply: {0}")]
    InvalidDiscoveryReply(String),

    /// The listing text could not be decoded
    #[error("file parsing error: {0}")]
    Listing(#[from] ListingError),
}

// =============================================================================
// Commands
// =============================================================================

/// A command sent from client to server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask for the server's shared root path
    GetDir,
    /// Ask for a listing of the shared root
    GetFiles,
    /// Ask for the contents of a file in the shared root
    Request(String),
}

impl Command {
    /// Parse one framed command (without its delimiter)
    ///
    /// Returns `None` for anything unrecognized; unknown commands are ignored
    /// by the server.
    pub fn parse(line: &str) -> Option<Self> {
        match line {
            "GETDIR" => Some(Self::GetDir),
            "GETFILES" => Some(Self::GetFiles),
            _ => line
                .strip_prefix(REQUEST_PREFIX)
                .map(|name| Self::Request(name.to_string())),
        }
    }

    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetDir => "GETDIR",
            Self::GetFiles => "GETFILES",
            Self::Request(_) => "REQUEST",
        }
    }

    /// Bytes to write on the wire, delimiter included
    pub fn to_wire(&self) -> Vec<u8> {
        format!("{self}{COMMAND_DELIMITER}").into_bytes()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetDir | Self::GetFiles => f.write_str(self.name()),
            Self::Request(name) => write!(f, "{REQUEST_PREFIX}{name}"),
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// A response from server to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Shared root path
    Dir(String),
    /// Children of the shared root
    Listing(Vec<FileEntry>),
    /// Header announcing `n` raw bytes follow
    Size(u64),
    /// Request failed on the server
    Error(String),
}

impl Response {
    /// Encode for the wire
    ///
    /// `Error` is deliberately left without a terminator; see the module docs.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Dir(path) => format!("{DIR_PREFIX}{path}\n").into_bytes(),
            Self::Listing(entries) => encode_listing(entries).into_bytes(),
            Self::Size(size) => format!("{SIZE_PREFIX}{size}\n").into_bytes(),
            Self::Error(message) => format!("{ERROR_PREFIX}{message}").into_bytes(),
        }
    }

    /// Parse the answer to `GETDIR`
    pub fn parse_dir(text: &str) -> Result<Self, ProtocolError> {
        if let Some(error) = Self::parse_error(text) {
            return Ok(error);
        }
        text.strip_prefix(DIR_PREFIX)
            .map(|path| Self::Dir(path.to_string()))
            .ok_or_else(|| ProtocolError::UnexpectedResponse(text.to_string()))
    }

    /// Parse the answer to `GETFILES`
    pub fn parse_listing(text: &str) -> Result<Self, ProtocolError> {
        if let Some(error) = Self::parse_error(text) {
            return Ok(error);
        }
        Ok(Self::Listing(decode_listing(text)?))
    }

    /// Parse the header line answering `REQUEST:<name>`
    pub fn parse_transfer_header(text: &str) -> Result<Self, ProtocolError> {
        if let Some(error) = Self::parse_error(text) {
            return Ok(error);
        }
        let Some(size) = text.trim().strip_prefix(SIZE_PREFIX) else {
            return Err(ProtocolError::UnexpectedResponse(text.to_string()));
        };
        size.parse::<u64>()
            .map(Self::Size)
            .map_err(|_| ProtocolError::InvalidSize(size.to_string()))
    }

    fn parse_error(text: &str) -> Option<Self> {
        text.strip_prefix(ERROR_PREFIX)
            .map(|message| Self::Error(message.trim().to_string()))
    }
}

// =============================================================================
// Discovery
// =============================================================================

/// Payload a responder sends back to a probe
pub fn discovery_reply(control_port: u16) -> String {
    format!("{DISCOVERY_RESPONSE_PREFIX}:{control_port}")
}

/// Turn a discovery reply into a dialable `host:port`
///
/// The host is taken from the datagram's source address; the reply only
/// carries the control port (with its leading colon).
pub fn parse_discovery_reply(payload: &str, replier: IpAddr) -> Result<SocketAddr, ProtocolError> {
    let invalid = || ProtocolError::InvalidDiscoveryReply(payload.to_string());

    let port = payload
        .strip_prefix(DISCOVERY_RESPONSE_PREFIX)
        .and_then(|rest| rest.strip_prefix(':'))
        .ok_or_else(invalid)?;
    let port = port.trim().parse::<u16>().map_err(|_| invalid())?;

    Ok(SocketAddr::new(replier, port))
}
