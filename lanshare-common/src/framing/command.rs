//! Server-side command framing

use super::{FrameError, MAX_COMMAND_LENGTH};
use crate::COMMAND_DELIMITER;

/// Accumulates bytes read from a control connection and yields complete
/// commands
///
/// Every time bytes are appended the caller drains [`next_command`] until it
/// returns `Ok(None)`, so several commands delivered by one read are
/// dispatched individually and in order. A partial command stays buffered
/// until the rest arrives.
///
/// [`next_command`]: CommandBuffer::next_command
#[derive(Debug)]
pub struct CommandBuffer {
    buffer: Vec<u8>,
    max_length: usize,
}

impl CommandBuffer {
    /// Create a buffer with the default command limit
    pub fn new() -> Self {
        Self::with_limit(MAX_COMMAND_LENGTH)
    }

    /// Create a buffer that rejects commands longer than `max_length`
    pub fn with_limit(max_length: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_length,
        }
    }

    /// Append bytes read from the connection
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of buffered bytes not yet part of a complete command
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Take the next complete command, if one is buffered
    ///
    /// The returned text excludes the delimiter. Bytes that are not UTF-8
    /// are replaced, which turns them into an unknown (ignored) command.
    ///
    /// # Errors
    ///
    /// Returns `CommandTooLong` once the buffer holds more than the limit
    /// without a delimiter; the connection should be dropped.
    pub fn next_command(&mut self) -> Result<Option<String>, FrameError> {
        let delimiter = COMMAND_DELIMITER.as_bytes();

        match self
            .buffer
            .windows(delimiter.len())
            .position(|window| window == delimiter)
        {
            Some(index) => {
                let command = String::from_utf8_lossy(&self.buffer[..index]).into_owned();
                self.buffer.drain(..index + delimiter.len());
                Ok(Some(command))
            }
            None if self.buffer.len() > self.max_length => {
                Err(FrameError::CommandTooLong(self.max_length))
            }
            None => Ok(None),
        }
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(buffer: &mut CommandBuffer) -> Vec<String> {
        let mut commands = Vec::new();
        while let Some(command) = buffer.next_command().unwrap() {
            commands.push(command);
        }
        commands
    }

    #[test]
    fn test_single_command() {
        let mut buffer = CommandBuffer::new();
        buffer.extend(b"GETDIR\r\n");
        assert_eq!(drain(&mut buffer), vec!["GETDIR"]);
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn test_pipelined_commands_in_order() {
        let mut buffer = CommandBuffer::new();
        buffer.extend(b"GETDIR\r\nGETFILES\r\nREQUEST:a.txt\r\n");
        assert_eq!(
            drain(&mut buffer),
            vec!["GETDIR", "GETFILES", "REQUEST:a.txt"]
        );
    }

    #[test]
    fn test_command_split_across_reads() {
        let mut buffer = CommandBuffer::new();
        buffer.extend(b"GETF");
        assert!(buffer.next_command().unwrap().is_none());
        buffer.extend(b"ILES\r");
        assert!(buffer.next_command().unwrap().is_none());
        buffer.extend(b"\nGET");
        assert_eq!(drain(&mut buffer), vec!["GETFILES"]);
        assert_eq!(buffer.pending(), 3);
    }

    #[test]
    fn test_bare_newline_is_not_a_delimiter() {
        let mut buffer = CommandBuffer::new();
        buffer.extend(b"GETDIR\nGETFILES\r\n");
        assert_eq!(drain(&mut buffer), vec!["GETDIR\nGETFILES"]);
    }

    #[test]
    fn test_empty_command() {
        let mut buffer = CommandBuffer::new();
        buffer.extend(b"\r\n\r\n");
        assert_eq!(drain(&mut buffer), vec!["", ""]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut buffer = CommandBuffer::new();
        buffer.extend(b"GET\xffDIR\r\n");
        let command = buffer.next_command().unwrap().unwrap();
        assert_ne!(command, "GETDIR");
        assert!(command.starts_with("GET"));
    }

    #[test]
    fn test_oversized_command_rejected() {
        let mut buffer = CommandBuffer::with_limit(8);
        buffer.extend(b"REQUEST:");
        assert!(buffer.next_command().unwrap().is_none());
        buffer.extend(b"x");
        assert!(matches!(
            buffer.next_command(),
            Err(FrameError::CommandTooLong(8))
        ));
    }

    #[test]
    fn test_limit_only_applies_without_delimiter() {
        let mut buffer = CommandBuffer::with_limit(8);
        buffer.extend(b"GETDIR\r\nGETFILES\r\n");
        assert_eq!(drain(&mut buffer), vec!["GETDIR", "GETFILES"]);
    }
}
