//! Client-side response reading

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, timeout};

use super::{DEFAULT_ERROR_QUIET_PERIOD, FrameError, MAX_RESPONSE_LINE, STREAM_BUFFER_SIZE};
use crate::RESPONSE_TERMINATOR;
use crate::protocol::ERROR_PREFIX;

/// Reads server responses from a buffered stream
///
/// The reader must live as long as the connection: bytes buffered past the
/// end of one response belong to the next one (or to file data after a
/// `SIZE:` header).
pub struct ResponseReader<R> {
    reader: R,
    error_quiet_period: Duration,
    max_line: usize,
}

impl<R> ResponseReader<R> {
    /// Create a response reader with default limits
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            error_quiet_period: DEFAULT_ERROR_QUIET_PERIOD,
            max_line: MAX_RESPONSE_LINE,
        }
    }

    /// Override how long an unterminated `ERROR:` may stay silent
    pub fn with_error_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.error_quiet_period = quiet_period;
        self
    }

    /// Override the longest accepted response line
    pub fn with_max_line(mut self, max_line: usize) -> Self {
        self.max_line = max_line;
        self
    }

    /// Get a mutable reference to the underlying reader
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Consume the response reader and return the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: AsyncBufRead + Unpin> ResponseReader<R> {
    /// Read one response line, without its terminator
    ///
    /// Normal responses end at `\n` (a preceding `\r` is dropped too). A
    /// response starting with `ERROR:` has no terminator, so it also ends
    /// when the stream stays quiet for the configured quiet period or the
    /// peer closes the connection.
    ///
    /// # Errors
    ///
    /// - `Timeout` if no complete response arrives within `deadline`
    /// - `ConnectionClosed` if the peer closes before a response completes
    /// - `ResponseTooLong` if the line exceeds the configured limit
    pub async fn read_response_line(&mut self, deadline: Duration) -> Result<String, FrameError> {
        let deadline = Instant::now() + deadline;
        let mut line: Vec<u8> = Vec::new();

        loop {
            let is_error = line.starts_with(ERROR_PREFIX.as_bytes());
            let wait = if is_error {
                self.error_quiet_period
                    .min(deadline.saturating_duration_since(Instant::now()))
            } else {
                deadline.saturating_duration_since(Instant::now())
            };

            let (consumed, complete) = {
                let available = match timeout(wait, self.reader.fill_buf()).await {
                    Ok(Ok(available)) => available,
                    Ok(Err(e)) => return Err(FrameError::Io(e)),
                    Err(_) if is_error => break,
                    Err(_) => return Err(FrameError::Timeout),
                };

                if available.is_empty() {
                    if is_error {
                        break;
                    }
                    return Err(FrameError::ConnectionClosed);
                }

                match available.iter().position(|&b| b == RESPONSE_TERMINATOR) {
                    Some(index) => {
                        line.extend_from_slice(&available[..index]);
                        (index + 1, true)
                    }
                    None => {
                        line.extend_from_slice(available);
                        (available.len(), false)
                    }
                }
            };
            self.reader.consume(consumed);

            if line.len() > self.max_line {
                return Err(FrameError::ResponseTooLong(self.max_line));
            }
            if complete {
                break;
            }
        }

        if line.last() == Some(&b'\r') {
            line.pop();
        }
        String::from_utf8(line).map_err(|_| FrameError::InvalidUtf8)
    }

    /// Copy up to `length` raw bytes from the stream into `writer`
    ///
    /// Stops early if the peer closes the connection; the returned count is
    /// then smaller than `length` and the caller decides what a short copy
    /// means. Each chunk must arrive within `progress_timeout`.
    pub async fn copy_exact<W>(
        &mut self,
        writer: &mut W,
        length: u64,
        progress_timeout: Duration,
    ) -> Result<u64, FrameError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut remaining = length;
        let mut copied: u64 = 0;
        let mut buffer = vec![0u8; STREAM_BUFFER_SIZE];

        while remaining > 0 {
            let to_read = (remaining.min(buffer.len() as u64)) as usize;

            let bytes_read =
                match timeout(progress_timeout, self.reader.read(&mut buffer[..to_read])).await {
                    Ok(Ok(0)) => break,
                    Ok(Ok(n)) => n,
                    Ok(Err(e)) => return Err(FrameError::Io(e)),
                    Err(_) => return Err(FrameError::Timeout),
                };

            writer.write_all(&buffer[..bytes_read]).await?;
            remaining -= bytes_read as u64;
            copied += bytes_read as u64;
        }

        writer.flush().await?;
        Ok(copied)
    }
}
