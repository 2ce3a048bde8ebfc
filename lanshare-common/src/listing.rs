//! Directory listing codec
//!
//! A listing is a snapshot of the immediate children of one directory. Each
//! child is written as `<name>//<isFolder>` followed by `,,`, and the whole
//! listing ends with a single newline:
//!
//! ```text
//! a.txt//false,,sub//true,,\n
//! ```
//!
//! Commas and slashes cannot appear together like this in a file name on
//! the platforms we serve, so the two-character separators are unambiguous
//! as long as [`FileEntry::is_wire_safe`] holds.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::protocol::ERROR_PREFIX;

/// Separator written after every entry
pub const ENTRY_SEPARATOR: &str = ",,";

/// Separator between an entry's name and its folder flag
pub const FIELD_SEPARATOR: &str = "//";

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub is_folder: bool,
}

impl FileEntry {
    /// Create an entry for a regular file
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_folder: false,
        }
    }

    /// Create an entry for a directory
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_folder: true,
        }
    }

    /// Whether the name can be encoded without colliding with the separators
    ///
    /// A name starting with `ERROR:` is refused too: as the first entry of a
    /// listing it would read as an error response.
    pub fn is_wire_safe(&self) -> bool {
        !self.name.is_empty()
            && !self.name.starts_with(ERROR_PREFIX)
            && !self.name.contains(ENTRY_SEPARATOR)
            && !self.name.contains(FIELD_SEPARATOR)
            && !self.name.contains(['\r', '\n'])
    }
}

/// Errors produced while decoding a listing
///
/// Any error aborts the whole decode: a partially understood listing is
/// never returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingError {
    /// A segment had no `//` between name and flag
    #[error("listing entry '{0}' has no '//' separator")]
    MissingSeparator(String),

    /// The folder flag was something other than `true` or `false`
    #[error("invalid folder flag '{flag}' for entry '{name}'")]
    InvalidFlag { name: String, flag: String },
}

/// Encode entries into listing text, including the trailing newline
pub fn encode_listing(entries: &[FileEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.name);
        out.push_str(FIELD_SEPARATOR);
        out.push_str(if entry.is_folder { "true" } else { "false" });
        out.push_str(ENTRY_SEPARATOR);
    }
    out.push('\n');
    out
}

/// Decode listing text produced by [`encode_listing`]
///
/// # Errors
///
/// Returns the first malformed segment. Folder flags are parsed strictly:
/// only the literals `true` and `false` are accepted.
pub fn decode_listing(text: &str) -> Result<Vec<FileEntry>, ListingError> {
    let mut entries = Vec::new();

    for segment in text.split(ENTRY_SEPARATOR) {
        // The final separator leaves the terminating newline on its own
        if segment.chars().all(|c| c == '\n' || c == '\r') {
            continue;
        }

        let (name, flag) = segment
            .split_once(FIELD_SEPARATOR)
            .ok_or_else(|| ListingError::MissingSeparator(segment.to_string()))?;

        let is_folder = match flag {
            "true" => true,
            "false" => false,
            _ => {
                return Err(ListingError::InvalidFlag {
                    name: name.to_string(),
                    flag: flag.to_string(),
                });
            }
        };

        entries.push(FileEntry {
            name: name.to_string(),
            is_folder,
        });
    }

    Ok(entries)
}

/// Read the immediate children of `dir`, sorted by name
///
/// Entries are classified with the directory-read file type, so a symlink
/// is reported as a file. Names that are not UTF-8 or that would break the
/// listing format are skipped with a warning.
pub async fn read_directory(dir: &Path) -> io::Result<Vec<FileEntry>> {
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(dir_entry) = read_dir.next_entry().await? {
        let name = match dir_entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                warn!("Skipping non UTF-8 name in {}: {:?}", dir.display(), raw);
                continue;
            }
        };
        let is_folder = dir_entry.file_type().await?.is_dir();

        let entry = FileEntry { name, is_folder };
        if !entry.is_wire_safe() {
            warn!(
                "Skipping {:?} in {}: name clashes with listing separators",
                entry.name,
                dir.display()
            );
            continue;
        }
        entries.push(entry);
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_example_listing() {
        let entries = vec![FileEntry::file("a.txt"), FileEntry::folder("sub")];
        assert_eq!(encode_listing(&entries), "a.txt//false,,sub//true,,\n");
    }

    #[test]
    fn test_encode_empty_listing_is_just_newline() {
        assert_eq!(encode_listing(&[]), "\n");
    }

    #[test]
    fn test_decode_example_listing() {
        let entries = decode_listing("a.txt//false,,sub//true,,\n").unwrap();
        assert_eq!(
            entries,
            vec![FileEntry::file("a.txt"), FileEntry::folder("sub")]
        );
    }

    #[test]
    fn test_decode_discards_trailing_newline_fragment() {
        assert!(decode_listing("\n").unwrap().is_empty());
        assert!(decode_listing("").unwrap().is_empty());
        assert_eq!(decode_listing("x//true,,\r\n").unwrap().len(), 1);
    }

    #[test]
    fn test_decode_rejects_non_boolean_flag() {
        let err = decode_listing("a.txt//yes,,\n").unwrap_err();
        assert_eq!(
            err,
            ListingError::InvalidFlag {
                name: "a.txt".to_string(),
                flag: "yes".to_string()
            }
        );
    }

    #[test]
    fn test_decode_flag_is_case_sensitive() {
        assert!(decode_listing("a//True,,\n").is_err());
        assert!(decode_listing("a//1,,\n").is_err());
        assert!(decode_listing("a//false ,,\n").is_err());
    }

    #[test]
    fn test_decode_bad_entry_aborts_whole_listing() {
        // Good entries before and after the bad one are not returned either
        let result = decode_listing("good//false,,bad//maybe,,also-good//true,,\n");
        assert!(matches!(result, Err(ListingError::InvalidFlag { .. })));
    }

    #[test]
    fn test_decode_missing_separator() {
        let err = decode_listing("lonely,,\n").unwrap_err();
        assert_eq!(err, ListingError::MissingSeparator("lonely".to_string()));
    }

    #[test]
    fn test_round_trip_preserves_canonical_text() {
        let text = "notes.md//false,,photos//true,,archive.tar.gz//false,,\n";
        let decoded = decode_listing(text).unwrap();
        assert_eq!(encode_listing(&decoded), text);
    }

    #[test]
    fn test_round_trip_normalizes_missing_newline() {
        let decoded = decode_listing("a//false,,b//true,,").unwrap();
        assert_eq!(encode_listing(&decoded), "a//false,,b//true,,\n");
    }

    #[test]
    fn test_names_with_spaces_and_unicode() {
        let entries = vec![
            FileEntry::file("my report (final).pdf"),
            FileEntry::folder("фото"),
        ];
        let decoded = decode_listing(&encode_listing(&entries)).unwrap();
        assert_eq!(decoded, entries);
    }

    #[test]
    fn test_is_wire_safe() {
        assert!(FileEntry::file("plain.txt").is_wire_safe());
        assert!(FileEntry::file("one,comma.txt").is_wire_safe());
        assert!(!FileEntry::file("two,,commas").is_wire_safe());
        assert!(!FileEntry::file("line\nbreak").is_wire_safe());
        assert!(!FileEntry::file("").is_wire_safe());
        assert!(!FileEntry::file("ERROR:log.txt").is_wire_safe());
        assert!(FileEntry::file("error:log.txt").is_wire_safe());
        assert!(FileEntry::file("my ERROR:log.txt").is_wire_safe());
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let json = serde_json::to_string(&FileEntry::folder("sub")).unwrap();
        assert_eq!(json, r#"{"name":"sub","isFolder":true}"#);

        let parsed: FileEntry = serde_json::from_str(r#"{"name":"a","isFolder":false}"#).unwrap();
        assert_eq!(parsed, FileEntry::file("a"));
    }

    #[tokio::test]
    async fn test_read_directory_lists_children_sorted() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"bb").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/nested.txt"), b"n").unwrap();

        let entries = read_directory(dir.path()).await.unwrap();
        assert_eq!(
            entries,
            vec![
                FileEntry::file("a.txt"),
                FileEntry::file("b.txt"),
                FileEntry::folder("sub"),
            ]
        );
    }

    #[tokio::test]
    async fn test_read_directory_skips_unsafe_names() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("ok.txt"), b"").unwrap();
        std::fs::write(dir.path().join("bad,,name"), b"").unwrap();

        let entries = read_directory(dir.path()).await.unwrap();
        assert_eq!(entries, vec![FileEntry::file("ok.txt")]);
    }

    #[tokio::test]
    async fn test_read_directory_skips_error_prefixed_names() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("ERROR:log.txt"), b"").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"").unwrap();

        let entries = read_directory(dir.path()).await.unwrap();
        assert_eq!(entries, vec![FileEntry::file("a.txt")]);

        let text = encode_listing(&entries);
        assert!(!text.starts_with(ERROR_PREFIX));
    }

    #[tokio::test]
    async fn test_read_directory_missing_dir_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = read_directory(&dir.path().join("nope")).await;
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}
