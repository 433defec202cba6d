//! Error types for library operations.
//!
//! Every fallible operation on the tree or the library directory returns
//! [`LibraryError`]. Batch operations (ingest) capture errors per item instead
//! of returning them; see `library::ingest`.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    /// The path does not exist (or vanished between listing and stat).
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Metadata or listing failed for a reason other than absence.
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Copying `from` into the library at `to` failed.
    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Deleting `path` failed. `deleted` lists the entries that were already
    /// removed from disk by the same call before the failure.
    #[error("failed to delete {}: {source}", path.display())]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
        deleted: Vec<PathBuf>,
    },

    /// The caller asked for something that can never succeed on this path.
    #[error("invalid operation on {}: {reason}", path.display())]
    InvalidOperation { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, LibraryError>;

impl LibraryError {
    /// Map an I/O error raised while inspecting `path` to `NotFound` or `Unreadable`.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn invalid(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// The path this error is about.
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path }
            | Self::Unreadable { path, .. }
            | Self::DeleteFailed { path, .. }
            | Self::InvalidOperation { path, .. } => path,
            Self::CopyFailed { from, .. } => from,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_io_distinguishes_missing_from_unreadable() {
        let p = Path::new("/tmp/x.mp3");
        let missing = LibraryError::from_io(p, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(missing, LibraryError::NotFound { .. }));

        let denied = LibraryError::from_io(p, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(denied, LibraryError::Unreadable { .. }));
        assert_eq!(denied.path(), p);
    }

    #[test]
    fn messages_name_the_path() {
        let err = LibraryError::invalid(Path::new("music/sub"), "not a file");
        assert_eq!(err.to_string(), "invalid operation on music/sub: not a file");
    }
}
