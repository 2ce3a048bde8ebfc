//! Control connection to a server
//!
//! One [`ControlClient`] wraps one TCP stream. The response reader lives as
//! long as the connection, so bytes buffered past one response are still
//! there for the next.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;
use tracing::{debug, info};

use lanshare_common::framing::{DEFAULT_PROGRESS_TIMEOUT, DEFAULT_RESPONSE_TIMEOUT, ResponseReader};
use lanshare_common::protocol::ProtocolError;
use lanshare_common::{Command, FileEntry, Response};

use crate::constants::CONNECT_TIMEOUT;
use crate::error::ClientError;
use crate::transfers::{Download, discard, is_plain_file_name};

/// An open control connection
pub struct ControlClient {
    peer_addr: SocketAddr,
    reader: ResponseReader<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    response_timeout: Duration,
    progress_timeout: Duration,
}

impl ControlClient {
    /// Dial a server's control port (`host:port`)
    pub async fn connect(addr: &str) -> Result<Self, ClientError> {
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| ClientError::Timeout)?
            .map_err(ClientError::Transport)?;
        let peer_addr = stream.peer_addr().map_err(ClientError::Transport)?;
        info!(%peer_addr, "connected");

        let (reader, writer) = stream.into_split();
        Ok(Self {
            peer_addr,
            reader: ResponseReader::new(BufReader::new(reader)),
            writer,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            progress_timeout: DEFAULT_PROGRESS_TIMEOUT,
        })
    }

    /// Override the response and file-data deadlines
    pub fn with_timeouts(mut self, response_timeout: Duration, progress_timeout: Duration) -> Self {
        self.response_timeout = response_timeout;
        self.progress_timeout = progress_timeout;
        self
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Ask for the server's shared root path
    pub async fn server_dir(&mut self) -> Result<String, ClientError> {
        self.send(&Command::GetDir).await?;
        let line = self.read_line().await?;
        match Response::parse_dir(&line)? {
            Response::Dir(path) => Ok(path),
            Response::Error(message) => Err(ClientError::Server(message)),
            other => Err(unexpected(&other)),
        }
    }

    /// Ask for the children of the server's shared root
    pub async fn list_files(&mut self) -> Result<Vec<FileEntry>, ClientError> {
        self.send(&Command::GetFiles).await?;
        let line = self.read_line().await?;
        match Response::parse_listing(&line)? {
            Response::Listing(entries) => Ok(entries),
            Response::Error(message) => Err(ClientError::Server(message)),
            other => Err(unexpected(&other)),
        }
    }

    /// Download `name` into `receive_dir`
    ///
    /// Returns the path the file was saved under, which differs from
    /// `receive_dir/name` when that name was already taken.
    pub async fn request_file(
        &mut self,
        name: &str,
        receive_dir: &Path,
    ) -> Result<PathBuf, ClientError> {
        if !is_plain_file_name(name) {
            return Err(ClientError::InvalidName(name.to_string()));
        }

        self.send(&Command::Request(name.to_string())).await?;
        let line = self.read_line().await?;
        let size = match Response::parse_transfer_header(&line)? {
            Response::Size(size) => size,
            Response::Error(message) => return Err(ClientError::Server(message)),
            other => return Err(unexpected(&other)),
        };
        debug!(peer_addr = %self.peer_addr, name, size, "receiving file");

        let download = match Download::create(receive_dir, name).await {
            Ok(download) => download,
            Err(e) => {
                discard(&mut self.reader, size, self.progress_timeout).await?;
                return Err(e);
            }
        };
        let path = download
            .receive(&mut self.reader, size, self.progress_timeout)
            .await?;

        info!(peer_addr = %self.peer_addr, name, bytes = size, path = %path.display(), "file received");
        Ok(path)
    }

    /// Close the connection
    pub async fn shutdown(mut self) {
        if let Err(e) = self.writer.shutdown().await {
            debug!(peer_addr = %self.peer_addr, "error closing connection: {e}");
        }
        info!(peer_addr = %self.peer_addr, "disconnected");
    }

    async fn send(&mut self, command: &Command) -> Result<(), ClientError> {
        debug!(peer_addr = %self.peer_addr, command = command.name(), "sending command");
        self.writer
            .write_all(&command.to_wire())
            .await
            .map_err(ClientError::Transport)
    }

    async fn read_line(&mut self) -> Result<String, ClientError> {
        Ok(self.reader.read_response_line(self.response_timeout).await?)
    }
}

fn unexpected(response: &Response) -> ClientError {
    ProtocolError::UnexpectedResponse(format!("{response:?}")).into()
}
