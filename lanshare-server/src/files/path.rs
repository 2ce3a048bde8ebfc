//! Safe resolution of requested file names
//!
//! A remote peer only ever names a direct child of the shared directory.
//! Anything else is rejected before the filesystem is touched, and the
//! resolved path is checked against the shared root after symlinks are
//! followed.

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::constants::{
    ERR_FILE_ACCESS_DENIED, ERR_FILE_CANONICALIZE, ERR_FILE_INVALID_NAME, ERR_FILE_NOT_FOUND,
    ERR_SHARED_ROOT_UNAVAILABLE,
};

/// Why a requested name could not be resolved
///
/// The `Display` text is what the server sends after `ERROR:`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Empty, `..`, absolute, or more than one path component
    #[error("{}", ERR_FILE_INVALID_NAME)]
    InvalidName,
    /// Resolved outside the shared directory (usually through a symlink)
    #[error("{}", ERR_FILE_ACCESS_DENIED)]
    AccessDenied,
    /// Nothing with that name exists
    #[error("{}", ERR_FILE_NOT_FOUND)]
    NotFound,
    /// The shared directory itself is missing or unreadable
    #[error("{}", ERR_SHARED_ROOT_UNAVAILABLE)]
    RootUnavailable,
    /// Any other canonicalization failure
    #[error("{prefix}: {0}", prefix = ERR_FILE_CANONICALIZE)]
    CanonicalizeFailed(String),
}

impl From<PathError> for io::Error {
    fn from(e: PathError) -> Self {
        let kind = match e {
            PathError::InvalidName => io::ErrorKind::InvalidInput,
            PathError::AccessDenied => io::ErrorKind::PermissionDenied,
            PathError::NotFound | PathError::RootUnavailable => io::ErrorKind::NotFound,
            PathError::CanonicalizeFailed(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, e.to_string())
    }
}

/// Resolve a requested file name inside the shared directory
///
/// Three checks run in order:
///
/// 1. **Name validation**: the name must be exactly one normal component
/// 2. **Canonicalization**: the root and the candidate are resolved, which
///    follows symlinks
/// 3. **Prefix check**: the canonical candidate must still live under the
///    canonical root
///
/// The returned path is canonical. Whether it is a regular file is left to
/// the caller, which needs the metadata anyway.
#[must_use = "path resolution result should be used"]
pub fn resolve_shared_file(root: &Path, name: &str) -> Result<PathBuf, PathError> {
    validate_file_name(name)?;

    let root = root
        .canonicalize()
        .map_err(|_| PathError::RootUnavailable)?;

    let canonical = root.join(name).canonicalize().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            PathError::NotFound
        } else {
            PathError::CanonicalizeFailed(e.to_string())
        }
    })?;

    if !canonical.starts_with(&root) {
        return Err(PathError::AccessDenied);
    }

    Ok(canonical)
}

/// Check that `name` is a single plain file name, without touching the
/// filesystem
///
/// Both separators are rejected on every platform so a name means the same
/// thing whichever OS serves it.
fn validate_file_name(name: &str) -> Result<(), PathError> {
    if name.is_empty() || name.contains(['/', '\\', '\0']) {
        return Err(PathError::InvalidName);
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(PathError::InvalidName),
    }
}
