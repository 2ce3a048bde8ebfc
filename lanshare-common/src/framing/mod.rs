//! Control channel framing
//!
//! Commands travel client → server terminated by `\r\n` and may arrive
//! pipelined or split across reads; [`CommandBuffer`] turns the raw byte
//! stream back into whole commands in arrival order.
//!
//! Responses travel server → client as newline-terminated lines, except for
//! `ERROR:` which has no terminator. [`ResponseReader`] reads either shape and
//! then streams raw file bytes after a `SIZE:` header.

mod command;
mod error;
mod response;

use std::time::Duration;

pub use command::CommandBuffer;
pub use error::FrameError;
pub use response::ResponseReader;

/// Longest command accepted without seeing a delimiter (4KB)
pub const MAX_COMMAND_LENGTH: usize = 4 * 1024;

/// Longest response line a client buffers (4MB, enough for large listings)
pub const MAX_RESPONSE_LINE: usize = 4 * 1024 * 1024;

/// How long an unterminated `ERROR:` response may stay silent before it is
/// considered complete
pub const DEFAULT_ERROR_QUIET_PERIOD: Duration = Duration::from_millis(250);

/// Default deadline for a whole response line
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time allowed between chunks while streaming file bytes
pub const DEFAULT_PROGRESS_TIMEOUT: Duration = Duration::from_secs(60);

/// Buffer size for streaming file bytes (64KB)
pub const STREAM_BUFFER_SIZE: usize = 64 * 1024;
