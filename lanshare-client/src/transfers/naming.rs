//! Collision-free destination names

use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::constants::{COLLISION_SUFFIX, MAX_NAME_ATTEMPTS, PART_SUFFIX};
use crate::error::ClientError;

/// Whether `name` is a single plain file name that stays inside a directory
/// when joined to it
pub fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Staging path for a destination (`<dest>.part`)
pub fn part_path(destination: &Path) -> PathBuf {
    let mut path = destination.as_os_str().to_owned();
    path.push(PART_SUFFIX);
    PathBuf::from(path)
}

/// Pick a path in `dir` for `name` that neither a file nor a staging file
/// occupies
///
/// Tries `name`, then `name(1)`, `name(1)(1)`, and so on. After
/// [`MAX_NAME_ATTEMPTS`] suffixes it falls back to `name(<uuid>)`.
pub async fn unique_destination(dir: &Path, name: &str) -> Result<PathBuf, ClientError> {
    let mut candidate = name.to_string();

    for _ in 0..=MAX_NAME_ATTEMPTS {
        let path = dir.join(&candidate);
        if !is_occupied(&path).await {
            return Ok(path);
        }
        candidate.push_str(COLLISION_SUFFIX);
    }

    let path = dir.join(format!("{name}({})", Uuid::new_v4()));
    if is_occupied(&path).await {
        return Err(ClientError::NameExhausted(name.to_string()));
    }
    Ok(path)
}

/// A path is taken if anything exists there (including a dangling symlink)
/// or if a download into it is in progress
async fn is_occupied(path: &Path) -> bool {
    exists(path).await || exists(&part_path(path)).await
}

async fn exists(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path).await.is_ok()
}
