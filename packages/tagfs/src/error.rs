//! Error types for the filesystem layer.

use std::io;

use tagfs_object_service::ServiceError;

/// Filesystem error type.
///
/// Every facade operation either succeeds or returns one of these; nothing
/// is retried or swallowed on the way up.
#[derive(thiserror::Error, Debug)]
pub enum FsError {
    /// Neither a directory nor a file exists at the path.
    #[error("resource not found: {path}")]
    ResourceNotFound { path: String },

    /// A file was expected but a directory was found.
    #[error("path is a directory, expected a file: {path}")]
    FileExpected { path: String },

    /// A directory was expected but a file was found.
    #[error("path is a file, expected a directory: {path}")]
    DirectoryExpected { path: String },

    /// More objects match the path than the store may contain.
    #[error("resource error at {path}: {message}")]
    ResourceError { path: String, message: String },

    #[error("directory already exists: {path}")]
    DirectoryExists { path: String },

    #[error("file already exists: {path}")]
    FileExists { path: String },

    #[error("directory not empty: {path}")]
    DirectoryNotEmpty { path: String },

    /// Read on a write-only handle, or write on a read-only one.
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("unsupported operation on {path}: {message}")]
    Unsupported { path: String, message: String },

    #[error("invalid open mode: {mode}")]
    InvalidMode { mode: String },

    #[error("invalid path {path}: {message}")]
    InvalidPath { path: String, message: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("cannot remove the root directory: {path}")]
    RemoveRoot { path: String },

    /// Establishing the connection failed.
    #[error("remote connection failed: {message}")]
    RemoteConnection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The filesystem or handle has been closed.
    #[error("closed")]
    Closed,

    #[error("object service error: {0}")]
    Service(#[from] ServiceError),
}

pub type FsResult<T> = Result<T, FsError>;

impl FsError {
    pub(crate) fn not_found(path: &str) -> Self {
        FsError::ResourceNotFound {
            path: path.to_string(),
        }
    }

    pub(crate) fn unsupported(path: &str, message: impl Into<String>) -> Self {
        FsError::Unsupported {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl From<FsError> for io::Error {
    fn from(error: FsError) -> Self {
        let kind = match &error {
            FsError::ResourceNotFound { .. } => io::ErrorKind::NotFound,
            FsError::DirectoryExists { .. } | FsError::FileExists { .. } => {
                io::ErrorKind::AlreadyExists
            }
            FsError::PermissionDenied { .. } => io::ErrorKind::PermissionDenied,
            FsError::Unsupported { .. } => io::ErrorKind::Unsupported,
            FsError::InvalidMode { .. }
            | FsError::InvalidPath { .. }
            | FsError::InvalidArgument { .. } => io::ErrorKind::InvalidInput,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn error_display() {
        let e = FsError::not_found("/a/b");
        assert_eq!(e.to_string(), "resource not found: /a/b");

        let e = FsError::ResourceError {
            path: "/x".to_string(),
            message: "Multiple directories [2] found with same path".to_string(),
        };
        assert!(e.to_string().contains("Multiple directories"));
    }

    #[test]
    fn connection_error_keeps_source() {
        let e = FsError::RemoteConnection {
            message: "Failed to connect".to_string(),
            source: Some(Box::new(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "refused",
            ))),
        };
        assert!(StdError::source(&e).is_some());

        let e = FsError::RemoteConnection {
            message: "group not supported".to_string(),
            source: None,
        };
        assert!(StdError::source(&e).is_none());
    }

    #[test]
    fn service_error_converts() {
        let e: FsError = ServiceError::Closed.into();
        assert!(matches!(e, FsError::Service(ServiceError::Closed)));
    }

    #[test]
    fn io_error_kinds() {
        let io_err: io::Error = FsError::PermissionDenied {
            message: "File opened read-only".to_string(),
        }
        .into();
        assert_eq!(io_err.kind(), io::ErrorKind::PermissionDenied);

        let io_err: io::Error = FsError::not_found("/nope").into();
        assert_eq!(io_err.kind(), io::ErrorKind::NotFound);

        let io_err: io::Error = FsError::Closed.into();
        assert_eq!(io_err.kind(), io::ErrorKind::Other);
    }
}
