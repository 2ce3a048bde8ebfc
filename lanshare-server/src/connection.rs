//! Control connection handling
//!
//! Each accepted connection gets one task running [`handle_connection`].
//! The task owns both halves of the socket, so responses (and file bytes)
//! are written strictly in the order commands arrived.

use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tracing::{debug, warn};

use lanshare_common::framing::CommandBuffer;
use lanshare_common::{Command, Response};

use crate::constants::{CONNECTION_READ_BUFFER, ERR_SHARED_ROOT_UNAVAILABLE};
use crate::files::SharedDirectory;
use crate::server::wait_for_shutdown;
use crate::transfer::send_file;

/// Parameters for handling a connection
pub struct ConnectionParams {
    pub peer_addr: SocketAddr,
    pub shared: SharedDirectory,
    pub shutdown: watch::Receiver<bool>,
}

/// Serve commands on one control connection until the peer leaves or the
/// server shuts down
///
/// Unknown commands are ignored without a response.
///
/// # Errors
///
/// Returns the read or write error that ended the connection, or an
/// `InvalidData` error when the peer sends an oversized command.
pub async fn handle_connection<S>(socket: S, params: ConnectionParams) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ConnectionParams {
        peer_addr,
        shared,
        mut shutdown,
    } = params;

    let (mut reader, mut writer) = tokio::io::split(socket);
    let mut commands = CommandBuffer::new();
    let mut chunk = vec![0u8; CONNECTION_READ_BUFFER];

    loop {
        let bytes_read = tokio::select! {
            _ = wait_for_shutdown(&mut shutdown) => {
                debug!(%peer_addr, "closing connection for shutdown");
                return Ok(());
            }
            result = reader.read(&mut chunk) => result?,
        };

        if bytes_read == 0 {
            debug!(%peer_addr, "peer closed connection");
            return Ok(());
        }
        commands.extend(&chunk[..bytes_read]);

        while let Some(line) = commands.next_command().map_err(io::Error::from)? {
            tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => {
                    debug!(%peer_addr, "shutdown while serving a command");
                    return Ok(());
                }
                result = dispatch(&mut writer, &line, &shared, peer_addr) => result?,
            }
        }
    }
}

/// Execute one framed command and write its response
async fn dispatch<W>(
    writer: &mut W,
    line: &str,
    shared: &SharedDirectory,
    peer_addr: SocketAddr,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let Some(command) = Command::parse(line) else {
        debug!(%peer_addr, command = line, "ignoring unknown command");
        return Ok(());
    };
    debug!(%peer_addr, command = command.name(), "received command");

    match command {
        Command::GetDir => {
            let root = shared.root().display().to_string();
            send_response(writer, &Response::Dir(root)).await
        }
        Command::GetFiles => match shared.list().await {
            Ok(entries) => send_response(writer, &Response::Listing(entries)).await,
            Err(e) => {
                warn!(%peer_addr, root = %shared.root().display(), "failed to list shared directory: {e}");
                send_response(writer, &Response::Error(ERR_SHARED_ROOT_UNAVAILABLE.into())).await
            }
        },
        Command::Request(name) => send_file(writer, shared, &name, peer_addr).await.map(|_| ()),
    }
}

async fn send_response<W>(writer: &mut W, response: &Response) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&response.to_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use tempfile::TempDir;
    use tokio::io::DuplexStream;
    use tokio::task::JoinHandle;

    use super::*;

    struct Harness {
        dir: TempDir,
        shared: SharedDirectory,
        client: DuplexStream,
        shutdown: watch::Sender<bool>,
        task: JoinHandle<io::Result<()>>,
    }

    fn spawn_connection() -> Harness {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let (client, server) = tokio::io::duplex(64 * 1024);
        let (shutdown, rx) = watch::channel(false);
        let shared = SharedDirectory::new(dir.path());
        let params = ConnectionParams {
            peer_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 40000),
            shared: shared.clone(),
            shutdown: rx,
        };
        let task = tokio::spawn(handle_connection(server, params));
        Harness {
            dir,
            shared,
            client,
            shutdown,
            task,
        }
    }

    async fn read_exactly(client: &mut DuplexStream, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        tokio::time::timeout(Duration::from_secs(5), client.read_exact(&mut buf))
            .await
            .unwrap()
            .unwrap();
        buf
    }

    #[tokio::test]
    async fn test_pipelined_commands_answered_in_order() {
        let mut h = spawn_connection();
        h.client
            .write_all(b"GETFILES\r\nREQUEST:a.txt\r\nGETFILES\r\n")
            .await
            .unwrap();

        let listing = b"a.txt//false,,sub//true,,\n";
        let expected = [&listing[..], b"SIZE:5\nhello", &listing[..]].concat();
        assert_eq!(read_exactly(&mut h.client, expected.len()).await, expected);
    }

    #[tokio::test]
    async fn test_command_split_across_writes() {
        let mut h = spawn_connection();
        h.client.write_all(b"REQUEST:a.").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        h.client.write_all(b"txt\r\n").await.unwrap();

        assert_eq!(read_exactly(&mut h.client, 12).await, b"SIZE:5\nhello");
    }

    #[tokio::test]
    async fn test_unknown_command_is_ignored() {
        let mut h = spawn_connection();
        h.client.write_all(b"HELLO\r\n\r\nREQUEST:a.txt\r\n").await.unwrap();
        assert_eq!(read_exactly(&mut h.client, 12).await, b"SIZE:5\nhello");
    }

    #[tokio::test]
    async fn test_error_keeps_connection_open() {
        let mut h = spawn_connection();
        h.client.write_all(b"REQUEST:missing\r\n").await.unwrap();
        assert_eq!(read_exactly(&mut h.client, 20).await, b"ERROR:File not found");

        h.client.write_all(b"REQUEST:a.txt\r\n").await.unwrap();
        assert_eq!(read_exactly(&mut h.client, 12).await, b"SIZE:5\nhello");
    }

    #[tokio::test]
    async fn test_missing_root_lists_as_error() {
        let mut h = spawn_connection();
        h.shared.set_root(h.dir.path().join("gone"));

        h.client.write_all(b"GETFILES\r\n").await.unwrap();
        let expected = b"ERROR:Shared directory unavailable";
        assert_eq!(read_exactly(&mut h.client, expected.len()).await, expected);
    }

    #[tokio::test]
    async fn test_getdir_follows_root_changes() {
        let mut h = spawn_connection();
        let other = h.dir.path().join("sub");
        h.shared.set_root(&other);

        h.client.write_all(b"GETDIR\r\n").await.unwrap();
        let expected = format!("DIR:{}\n", other.display());
        assert_eq!(
            read_exactly(&mut h.client, expected.len()).await,
            expected.as_bytes()
        );
    }

    #[tokio::test]
    async fn test_peer_close_ends_task() {
        let h = spawn_connection();
        drop(h.client);
        let result = tokio::time::timeout(Duration::from_secs(5), h.task)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_ends_task() {
        let h = spawn_connection();
        h.shutdown.send(true).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), h.task)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_oversized_command_drops_connection() {
        let mut h = spawn_connection();
        let junk = vec![b'x'; 5000];
        h.client.write_all(&junk).await.unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), h.task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidData);
    }
}
