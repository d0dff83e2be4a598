//! Error types shared by the store, backends, codec and hosts-file writers.

use std::path::PathBuf;

use thiserror::Error;

use crate::profile::ProfileId;

/// Errors surfaced by hostswitch operations.
///
/// None of these are fatal: a failed mutation leaves the cached snapshot as
/// it was and the caller may retry once the precondition is fixed.
#[derive(Debug, Error)]
pub enum Error {
    /// Create/rename against a name another profile already uses.
    #[error("a profile named '{0}' already exists")]
    NameCollision(String),

    /// Empty or whitespace-only profile name.
    #[error("invalid profile name: {0:?}")]
    InvalidName(String),

    /// The targeted profile no longer exists.
    #[error("profile not found: {0}")]
    NotFound(ProfileId),

    /// The OS refused the hosts file write.
    #[error("permission denied writing {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Import payload failed schema validation.
    #[error("malformed bundle: {0}")]
    MalformedBundle(String),

    /// The round trip to the persistence backend could not complete.
    #[error("backend round trip failed: {0}")]
    TransportFailure(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Classify an I/O failure on `path`, splitting out permission errors.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Error::PermissionDenied(path)
        } else {
            Error::Io { path, source }
        }
    }
}
