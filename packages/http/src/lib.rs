//! # tagfs-http
//!
//! HTTP binding of the tagfs object service.
//!
//! [`HttpObjectService`] opens a session against a remote server and maps
//! each [`tagfs_object_service::ObjectService`] call to one blocking HTTP
//! request.
//!
//! ```ignore
//! use tagfs_http::HttpObjectService;
//! use tagfs_object_service::ObjectService;
//!
//! let service = HttpObjectService::connect("images.example.org", "alice", "secret")?;
//! let tags = service.find_annotations("github.com/tagfs/tagfs", "/")?;
//! service.close()?;
//! ```

pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpObjectService, DEFAULT_TIMEOUT, SESSION_HEADER};
pub use error::Error;
