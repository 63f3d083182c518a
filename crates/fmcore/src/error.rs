use std::io;
use std::path::PathBuf;

/// The semantic error kinds produced anywhere in the engine.
///
/// Variants map onto POSIX failure modes rather than onto a particular
/// syscall, so a caller can match on *why* an operation failed without
/// caring whether the underlying call was `lstat` or `fstatat`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Composing a path would exceed the host's `PATH_MAX`.
    #[error("path too long: {0}")]
    NameTooLong(PathBuf),

    /// The target of an operation does not exist.
    #[error("not found: {0}")]
    NotFound(PathBuf),

    /// The calling process lacks permission for the operation.
    #[error("access denied: {0}")]
    AccessDenied(PathBuf),

    /// A path component that should be a directory is not one.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The destination of a create-like operation already exists.
    #[error("already exists: {0}")]
    AlreadyExists(PathBuf),

    /// An allocation failed while growing a list or scan buffer.
    #[error("out of memory")]
    OutOfMemory,

    /// A rename target is empty or contains a path separator.
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// The rename planner could not produce a legal schedule.
    #[error("rename conflict: {0}")]
    Conflict(String),

    /// The operation was aborted by the user.
    #[error("cancelled")]
    Cancelled,

    /// Catch-all wrapping the underlying platform error for a given path.
    #[error("{path}: {source}")]
    Syscall {
        /// The path the failing syscall was operating on.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Wrap an [`io::Error`] observed while operating on `path`, mapping
    /// well-known [`io::ErrorKind`]s onto the matching semantic variant
    /// and falling back to [`Error::Syscall`] otherwise.
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Error::NotFound(path),
            io::ErrorKind::PermissionDenied => Error::AccessDenied(path),
            io::ErrorKind::AlreadyExists => Error::AlreadyExists(path),
            _ => Error::Syscall { path, source },
        }
    }
}

/// The result type used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;
