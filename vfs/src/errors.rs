use crate::path::{PathBuf, PathComponentError};
use thiserror::Error;

/// Errors returned by operations on a [crate::VirtualFileSystem] or one of
/// its [crate::SourceNode]s.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("{0} does not exist")]
    NotFound(PathBuf),

    #[error("{0} already exists")]
    AlreadyExists(PathBuf),

    #[error("invalid name: {0}")]
    InvalidName(#[from] PathComponentError),

    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("{0} is a directory")]
    IsADirectory(PathBuf),

    #[error("{0} is not writable")]
    ReadOnly(PathBuf),

    #[error("{0} has been deleted")]
    Invalid(PathBuf),

    #[error("stamp {new} for {path} is not newer than {current}")]
    StaleStamp {
        path: PathBuf,
        current: u64,
        new: u64,
    },

    #[error("the root directory cannot be {0}")]
    Root(&'static str),
}

impl From<Error> for std::io::Error {
    fn from(value: Error) -> Self {
        let kind = match value {
            Error::NotFound(_) | Error::Invalid(_) => std::io::ErrorKind::NotFound,
            Error::AlreadyExists(_) => std::io::ErrorKind::AlreadyExists,
            Error::ReadOnly(_) => std::io::ErrorKind::PermissionDenied,
            Error::InvalidName(_) | Error::InvalidPath(_) | Error::StaleStamp { .. } => {
                std::io::ErrorKind::InvalidInput
            }
            Error::NotADirectory(_) | Error::IsADirectory(_) | Error::Root(_) => {
                std::io::ErrorKind::Other
            }
        };
        Self::new(kind, value)
    }
}
