//! Error types shared by every installer operation.
//!
//! Each variant is fatal for the current `ensure_installed` call. Nothing in
//! the library catches and downgrades these; callers decide whether to re-run.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, InstallError>;

#[derive(Debug, Error)]
pub enum InstallError {
    /// The host operating system has no RenderDoc profile.
    #[error("Unsupported OS: {0}")]
    UnsupportedOs(String),

    /// A download was required but offline mode is enabled.
    #[error("Cannot install RenderDoc while offline: {url} would need to be downloaded")]
    Offline { url: String },

    /// Connection failure, timeout or non-success HTTP status.
    #[error("Failed to download {url}: {reason}")]
    Network { url: String, reason: String },

    /// The archive could not be read or one of its entries could not be decoded.
    #[error("Corrupt archive {}: {reason}", path.display())]
    CorruptArchive { path: PathBuf, reason: String },

    /// An archive entry would be written outside the destination root.
    #[error("Refusing to extract '{entry}': path escapes {}", destination.display())]
    UnsafeEntry { entry: String, destination: PathBuf },

    /// Filesystem write, create or permission failure.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The OS profile has no value for a path the caller asked for.
    #[error("Not implemented yet: {0}")]
    NotImplemented(&'static str),
}

impl InstallError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        InstallError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        InstallError::CorruptArchive {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
