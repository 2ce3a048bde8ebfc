//! Receiving file bytes after a `SIZE:` header

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncBufRead;
use tracing::{debug, warn};

use lanshare_common::framing::ResponseReader;

use super::naming::{part_path, unique_destination};
use crate::error::ClientError;

/// A download in progress, staged in a `.part` file
#[derive(Debug)]
pub struct Download {
    dir: PathBuf,
    name: String,
    destination: PathBuf,
    part: PathBuf,
    file: File,
}

impl Download {
    /// Reserve a destination in `dir` and create its staging file
    pub async fn create(dir: &Path, name: &str) -> Result<Self, ClientError> {
        let destination = unique_destination(dir, name).await?;
        let part = part_path(&destination);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&part)
            .await
            .map_err(ClientError::Filesystem)?;

        debug!(destination = %destination.display(), "staging download");
        Ok(Self {
            dir: dir.to_path_buf(),
            name: name.to_string(),
            destination,
            part,
            file,
        })
    }

    /// Where the file will land if nothing else claims the name first
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Copy exactly `size` bytes from `reader` and move the file into place
    ///
    /// On any failure the staging file is removed, so no partial file is
    /// left behind under either name.
    pub async fn receive<R>(
        mut self,
        reader: &mut ResponseReader<R>,
        size: u64,
        progress_timeout: Duration,
    ) -> Result<PathBuf, ClientError>
    where
        R: AsyncBufRead + Unpin,
    {
        let copied = match reader
            .copy_exact(&mut self.file, size, progress_timeout)
            .await
        {
            Ok(copied) => copied,
            Err(e) => {
                self.abandon().await;
                return Err(e.into());
            }
        };

        if copied < size {
            self.abandon().await;
            return Err(ClientError::LengthMismatch {
                expected: size,
                copied,
            });
        }

        if let Err(e) = self.file.sync_all().await {
            self.abandon().await;
            return Err(ClientError::Filesystem(e));
        }

        self.finish().await
    }

    async fn finish(self) -> Result<PathBuf, ClientError> {
        let Self {
            dir,
            name,
            mut destination,
            part,
            file,
        } = self;
        drop(file);

        // Something may have taken the name while bytes were arriving
        if tokio::fs::symlink_metadata(&destination).await.is_ok() {
            destination = unique_destination(&dir, &name).await?;
        }

        if let Err(e) = tokio::fs::rename(&part, &destination).await {
            remove_staging(&part).await;
            return Err(ClientError::Filesystem(e));
        }
        Ok(destination)
    }

    async fn abandon(self) {
        drop(self.file);
        remove_staging(&self.part).await;
    }
}

async fn remove_staging(part: &Path) {
    if let Err(e) = tokio::fs::remove_file(part).await {
        warn!(path = %part.display(), "failed to remove staging file: {e}");
    }
}

/// Read and drop `size` file bytes so the connection stays in step
///
/// Used when the server already started sending but nothing can be saved.
pub async fn discard<R>(
    reader: &mut ResponseReader<R>,
    size: u64,
    progress_timeout: Duration,
) -> Result<(), ClientError>
where
    R: AsyncBufRead + Unpin,
{
    let mut sink = tokio::io::sink();
    let copied = reader.copy_exact(&mut sink, size, progress_timeout).await?;
    if copied < size {
        return Err(ClientError::LengthMismatch {
            expected: size,
            copied,
        });
    }
    Ok(())
}
