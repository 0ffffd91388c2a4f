//! Error type for console operations that touch the file system.

use std::io;
use std::path::PathBuf;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, ConsoleError>;

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("unsupported file type: {} (expected .log or .txt)", .0.display())]
    UnsupportedFile(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid settings in {}: {source}", .path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConsoleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            ConsoleError::MissingFile(path)
        } else {
            ConsoleError::Io { path, source }
        }
    }
}
