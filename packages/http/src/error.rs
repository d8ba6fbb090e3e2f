//! Errors raised by the HTTP binding.
//!
//! Once a session is open, every failure reaches callers as a
//! [`ServiceError`]; this type travels inside it as the transport source.
//! Only [`HttpObjectService::connect`](crate::HttpObjectService::connect)
//! returns it directly.

use tagfs_object_service::ServiceError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },

    /// The server returned a session key that cannot be sent as a header.
    #[error("Invalid session key: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// The server refused to open a session.
    #[error("Session rejected ({status}): {message}")]
    Session { status: u16, message: String },
}

impl From<Error> for ServiceError {
    fn from(error: Error) -> Self {
        ServiceError::Transport(Box::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_session_error_display() {
        let e = Error::Session {
            status: 401,
            message: "expired".to_string(),
        };
        assert_eq!(e.to_string(), "Session rejected (401): expired");
    }

    #[test]
    fn test_converts_to_transport() {
        let e: ServiceError = Error::InvalidUrl {
            message: "no host".to_string(),
        }
        .into();
        assert!(matches!(e, ServiceError::Transport(_)));
        assert!(e.source().unwrap().to_string().contains("no host"));
    }
}
