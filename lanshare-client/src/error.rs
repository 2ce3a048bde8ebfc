//! Client errors

use std::io;

use thiserror::Error;

use lanshare_common::framing::FrameError;
use lanshare_common::{ListingError, ProtocolError};

/// Everything that can go wrong talking to a server or saving a download
#[derive(Debug, Error)]
pub enum ClientError {
    /// Dial, read or write failure on a socket
    #[error("{0}")]
    Transport(#[source] io::Error),

    /// A deadline expired
    #[error("timed out waiting for the server")]
    Timeout,

    /// The server answered with something that does not fit the request
    #[error("{0}")]
    Protocol(ProtocolError),

    /// The listing text could not be decoded
    #[error("file parsing error: {0}")]
    Listing(#[from] ListingError),

    /// The server answered `ERROR:<message>`
    #[error("{0}")]
    Server(String),

    /// Local file or directory operation failed
    #[error("{0}")]
    Filesystem(#[source] io::Error),

    /// The server closed the stream before the announced size arrived
    #[error("expected to copy {expected} bytes, but copied {copied}")]
    LengthMismatch { expected: u64, copied: u64 },

    /// No free destination name was found
    #[error("no free file name for {0}")]
    NameExhausted(String),

    /// The requested name is not a single plain file name
    #[error("invalid file name: {0}")]
    InvalidName(String),

    #[error("connection is not open")]
    NotConnected,
}

impl ClientError {
    /// Whether the control connection is unusable after this error
    ///
    /// Anything that may leave unread response bytes (or a half-written
    /// command) on the stream poisons it, since later responses could no
    /// longer be told apart.
    pub fn poisons_connection(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout | Self::Protocol(_) | Self::LengthMismatch { .. }
        )
    }
}

impl From<FrameError> for ClientError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Timeout => Self::Timeout,
            other => Self::Transport(other.into()),
        }
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Listing(e) => Self::Listing(e),
            other => Self::Protocol(other),
        }
    }
}
