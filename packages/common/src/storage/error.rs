use std::fmt;

/// Errors raised by a [`BlobStore`](super::BlobStore).
#[derive(Debug)]
pub enum StorageError {
    /// No blob is stored under the given hash.
    NotFound(String),
    Io(std::io::Error),
    /// A hash string could not be parsed.
    InvalidHash(String),
    /// The blob is larger than the store accepts.
    TooLarge { actual: u64, limit: u64 },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(hash) => write!(f, "blob not found: {hash}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::InvalidHash(msg) => write!(f, "invalid content hash: {msg}"),
            Self::TooLarge { actual, limit } => {
                write!(f, "blob is too large ({actual} > {limit} bytes)")
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
