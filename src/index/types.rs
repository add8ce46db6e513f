use crate::utils::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Row identifier assigned by the index store
pub type FileId = i64;

/// Filename, path and extension of one indexed file.
///
/// This is the payload of a trie leaf and the row shape returned by the
/// index store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileInfo {
    pub filename: String,
    pub absolute_path: String,
    pub extension: String,
}

/// Result row returned by the index store
pub type FileResult = FileInfo;

impl FileInfo {
    pub fn new(
        filename: impl Into<String>,
        absolute_path: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            absolute_path: absolute_path.into(),
            extension: extension.into(),
        }
    }
}

/// A file discovered by the crawler, with the tokens derived from its path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub filename: String,
    pub absolute_path: String,
    pub extension: String,
    pub tokens: HashSet<String>,
}

impl FileRecord {
    /// Build a record from a file path.
    ///
    /// Non-UTF-8 path bytes are replaced lossily.
    pub fn from_path(path: &Path) -> Self {
        let absolute_path = path.to_string_lossy().into_owned();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| absolute_path.clone());
        let extension = extension_of(&filename).to_string();
        let tokens = tokenize(&absolute_path);

        Self {
            filename,
            absolute_path,
            extension,
            tokens,
        }
    }

    /// The record without its tokens
    pub fn info(&self) -> FileInfo {
        FileInfo::new(&self.filename, &self.absolute_path, &self.extension)
    }
}

/// Text after the last `.` of a filename, or empty. Only the filename is
/// considered, so a dotted parent directory never contributes.
pub fn extension_of(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(pos) => &filename[pos + 1..],
        None => "",
    }
}
