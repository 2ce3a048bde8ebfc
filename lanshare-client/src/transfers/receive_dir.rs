//! Receive directory setup

use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::constants::{COLLISION_SUFFIX, MAX_NAME_ATTEMPTS};
use crate::error::ClientError;

/// Make sure downloads have a directory to land in
///
/// Creates `path` if it is missing. If a regular file already occupies it,
/// `(1)` is appended to the directory name until a usable path is found.
/// Returns the directory actually used.
pub async fn prepare_receive_dir(path: &Path) -> Result<PathBuf, ClientError> {
    let mut candidate = path.as_os_str().to_owned();

    for _ in 0..=MAX_NAME_ATTEMPTS {
        let dir = PathBuf::from(&candidate);
        match tokio::fs::metadata(&dir).await {
            Ok(metadata) if metadata.is_dir() => return Ok(dir),
            Ok(_) => {
                warn!(path = %dir.display(), "receive path is a file, trying another name");
                candidate.push(COLLISION_SUFFIX);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tokio::fs::create_dir_all(&dir)
                    .await
                    .map_err(ClientError::Filesystem)?;
                info!(path = %dir.display(), "created receive directory");
                return Ok(dir);
            }
            Err(e) => return Err(ClientError::Filesystem(e)),
        }
    }

    Err(ClientError::NameExhausted(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let root = TempDir::new().unwrap();
        let wanted = root.path().join("received_files");

        let dir = prepare_receive_dir(&wanted).await.unwrap();
        assert_eq!(dir, wanted);
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_existing_directory_is_reused() {
        let root = TempDir::new().unwrap();
        let wanted = root.path().join("received_files");
        fs::create_dir(&wanted).unwrap();
        fs::write(wanted.join("keep.txt"), b"x").unwrap();

        let dir = prepare_receive_dir(&wanted).await.unwrap();
        assert_eq!(dir, wanted);
        assert!(dir.join("keep.txt").exists());
    }

    #[tokio::test]
    async fn test_file_in_the_way() {
        let root = TempDir::new().unwrap();
        let wanted = root.path().join("received_files");
        fs::write(&wanted, b"not a directory").unwrap();

        let dir = prepare_receive_dir(&wanted).await.unwrap();
        assert_eq!(dir, root.path().join("received_files(1)"));
        assert!(dir.is_dir());
        assert!(wanted.is_file());
    }

    #[tokio::test]
    async fn test_nested_path_is_created() {
        let root = TempDir::new().unwrap();
        let wanted = root.path().join("a").join("b");

        let dir = prepare_receive_dir(&wanted).await.unwrap();
        assert!(dir.is_dir());
    }
}
