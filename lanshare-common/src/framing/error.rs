//! Framing errors

use std::io;

use thiserror::Error;

/// Transport-level failures while framing commands or responses
#[derive(Debug, Error)]
pub enum FrameError {
    /// Underlying socket error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Peer closed the connection before a frame completed
    #[error("connection closed")]
    ConnectionClosed,

    /// Deadline expired before the frame completed
    #[error("timed out waiting for data")]
    Timeout,

    /// Peer sent more than the command limit without a delimiter
    #[error("command exceeds {0} bytes without a delimiter")]
    CommandTooLong(usize),

    /// Response line grew past the client's limit
    #[error("response exceeds {0} bytes without a terminator")]
    ResponseTooLong(usize),

    /// Response line was not valid UTF-8
    #[error("response is not valid UTF-8")]
    InvalidUtf8,
}

impl From<FrameError> for io::Error {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(e) => e,
            FrameError::ConnectionClosed => {
                io::Error::new(io::ErrorKind::ConnectionReset, "connection closed")
            }
            FrameError::Timeout => {
                io::Error::new(io::ErrorKind::TimedOut, FrameError::Timeout.to_string())
            }
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}
