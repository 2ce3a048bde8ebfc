//! Serving `REQUEST:<name>`
//!
//! A successful request is answered with `SIZE:<n>\n` followed by exactly
//! `n` raw bytes on the control connection. A failed one is answered with
//! `ERROR:<message>` and the connection stays usable.

use std::io;
use std::net::SocketAddr;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use lanshare_common::Response;
use lanshare_common::framing::STREAM_BUFFER_SIZE;

use crate::constants::{ERR_FILE_NOT_A_FILE, ERR_FILE_READ};
use crate::files::{PathError, SharedDirectory};

/// What happened to a file request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Header and all bytes were written
    Sent(u64),
    /// An `ERROR:` response was written instead
    Refused(String),
}

/// Answer one file request on `writer`
///
/// # Errors
///
/// Returns an error only when the connection can no longer be used: a write
/// failed, or the file shrank after its size was announced, which leaves the
/// byte stream out of step with the header.
pub async fn send_file<W>(
    writer: &mut W,
    shared: &SharedDirectory,
    name: &str,
    peer_addr: SocketAddr,
) -> io::Result<TransferOutcome>
where
    W: AsyncWrite + Unpin,
{
    let (file, size) = match open_shared_file(shared, name).await {
        Ok(opened) => opened,
        Err(message) => {
            debug!(%peer_addr, name, reason = %message, "refusing file request");
            writer
                .write_all(&Response::Error(message.clone()).to_bytes())
                .await?;
            writer.flush().await?;
            return Ok(TransferOutcome::Refused(message));
        }
    };

    writer.write_all(&Response::Size(size).to_bytes()).await?;

    let mut reader = BufReader::with_capacity(STREAM_BUFFER_SIZE, file).take(size);
    let sent = tokio::io::copy_buf(&mut reader, writer).await?;
    writer.flush().await?;

    if sent < size {
        warn!(%peer_addr, name, announced = size, sent, "file shrank during transfer");
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("{name} shrank during transfer: announced {size} bytes, sent {sent}"),
        ));
    }

    info!(%peer_addr, name, bytes = sent, "file sent");
    Ok(TransferOutcome::Sent(sent))
}

/// Resolve, open and size a requested file
///
/// The error is the message to send after `ERROR:`.
async fn open_shared_file(shared: &SharedDirectory, name: &str) -> Result<(File, u64), String> {
    let path = shared.resolve(name).map_err(|e| match e {
        PathError::CanonicalizeFailed(_) => ERR_FILE_READ.to_string(),
        other => other.to_string(),
    })?;

    let file = File::open(&path).await.map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            PathError::NotFound.to_string()
        } else {
            ERR_FILE_READ.to_string()
        }
    })?;

    let metadata = file
        .metadata()
        .await
        .map_err(|_| ERR_FILE_READ.to_string())?;
    if !metadata.is_file() {
        return Err(ERR_FILE_NOT_A_FILE.to_string());
    }

    Ok((file, metadata.len()))
}
