use std::path::{Path, PathBuf};

/// Where the bytes of a [`StreamedFile`] come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contents {
    /// Content already held in memory.
    Buffer(Vec<u8>),
    /// Content read lazily from a file on disk.
    Disk(PathBuf),
}

/// A file moving through the pipeline.
///
/// The adapter only reads it; the same value is handed back downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamedFile {
    pub path: PathBuf,
    /// Base directory the file was matched from, if any.
    pub base: Option<PathBuf>,
    pub contents: Contents,
}

impl StreamedFile {
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            base: None,
            contents: Contents::Buffer(bytes.into()),
        }
    }

    /// A file whose content is the file at `path` itself.
    pub fn from_disk(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            contents: Contents::Disk(path.clone()),
            path,
            base: None,
        }
    }

    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// File name without its last extension (`fileA.txt` -> `fileA`).
    pub fn stem(&self) -> Option<&str> {
        self.path.file_stem().and_then(|s| s.to_str())
    }

    /// Last extension without the dot, empty when there is none.
    pub fn extension(&self) -> &str {
        self.path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
    }

    /// Path relative to `base`, or the full path when no base is set.
    pub fn relative(&self) -> &Path {
        self.base
            .as_deref()
            .and_then(|base| self.path.strip_prefix(base).ok())
            .unwrap_or(&self.path)
    }
}
