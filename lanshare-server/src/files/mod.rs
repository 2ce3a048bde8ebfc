//! Shared directory access

mod path;
mod shared;

pub use path::{PathError, resolve_shared_file};
pub use shared::SharedDirectory;
