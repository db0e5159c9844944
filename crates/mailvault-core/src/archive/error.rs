//! Archive errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from opening or closing an archive.
///
/// None of these stop message processing; the message is relayed without
/// being persisted.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// No archive root configured.
    #[error("Archive storage path not set")]
    RootNotSet,

    /// Bucket path exists but is not a directory.
    #[error("{} already exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Bucket directory could not be created.
    #[error("Cannot create directory {}: {source}", path.display())]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// Content or metadata file could not be created.
    #[error("Cannot create file {}: {source}", path.display())]
    CreateFile {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// Buffered data could not be written out on close.
    #[error("Cannot flush {}: {source}", path.display())]
    Flush {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
}
