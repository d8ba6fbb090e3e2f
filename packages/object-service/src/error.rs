//! Errors returned by object service implementations.
//!
//! These are service-level failures only. Filesystem semantics (a path
//! that is not a directory, a directory that is not empty) belong to the
//! layer above.

use crate::model::{ObjectKind, ObjectRef};

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    /// The referenced object does not exist.
    #[error("{0} not found")]
    NotFound(ObjectRef),

    /// The pair of objects cannot be linked.
    #[error("cannot link {parent} to {child}: link children must be annotations")]
    IncompatibleLink { parent: ObjectKind, child: ObjectKind },

    /// The query text is not understood by this service.
    #[error("unsupported query: {0}")]
    UnsupportedQuery(String),

    /// A named query parameter is absent or has the wrong type.
    #[error("missing query parameter :{0}")]
    MissingParameter(String),

    /// A ranged file operation was out of bounds.
    #[error("invalid file range: {message}")]
    InvalidRange { message: String },

    /// The server rejected the request.
    #[error("remote error {status}: {message}")]
    Remote { status: u16, message: String },

    /// Network or encoding failure talking to the server.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The connection has been closed.
    #[error("connection closed")]
    Closed,
}

pub type ServiceResult<T> = Result<T, ServiceError>;
