//! Error types for expensiveops

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Result type alias for expensive operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for expensive operations
///
/// Errors are `Clone` so a single failed computation can be handed to every
/// caller that was waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// I/O error while reading a file during a directory walk
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: Arc<io::Error>,
    },

    /// Directory traversal error
    #[error("Walk error: {0}")]
    Walk(#[source] Arc<walkdir::Error>),

    /// The wrapped computation failed for a reason of its own
    #[error("Computation failed: {0}")]
    Computation(String),

    /// Argument cannot be used to identify a call
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Wrap an I/O error raised while handling `path`
    pub fn io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source: Arc::new(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::Walk(Arc::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_display_names_path() {
        let err = Error::io("/tmp/x", io::Error::other("boom"));
        let msg = err.to_string();
        assert!(msg.contains("/tmp/x"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_clone_shares_source() {
        let err = Error::io("a", io::Error::new(io::ErrorKind::NotFound, "gone"));
        let copy = err.clone();
        match (err, copy) {
            (Error::Io { source: a, .. }, Error::Io { source: b, .. }) => {
                assert!(Arc::ptr_eq(&a, &b));
            }
            _ => panic!("expected Io errors"),
        }
    }
}
