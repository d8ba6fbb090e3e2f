//! # tagfs-object-service
//!
//! The remote object service that tagfs stores its filesystem in.
//!
//! The service is a flat store: it holds namespaced text annotations,
//! original files with byte content, and links whose child end is always an
//! annotation. It answers projection queries written against its link
//! tables and offers ranged reads and writes on file content.
//!
//! ## Implementations
//!
//! - [`InMemoryService`] - process-local arena, used by tests and demos
//! - `tagfs_http::HttpObjectService` - a session against a remote server
//!
//! ```rust
//! use std::sync::Arc;
//! use tagfs_object_service::{InMemoryService, ObjectService};
//!
//! let service: Arc<dyn ObjectService> = Arc::new(InMemoryService::new());
//! assert!(service.find_annotations("ns", "/").unwrap().is_empty());
//! ```

pub mod error;
pub mod in_memory;
pub mod model;
pub mod query;
pub mod service;

pub use error::{ServiceError, ServiceResult};
pub use in_memory::{InMemoryService, MAX_CONTENT_LEN};
pub use model::{
    Annotation, Link, NewAnnotation, NewOriginalFile, ObjectId, ObjectKind, ObjectRef,
    OriginalFile, Timestamp,
};
pub use query::{queries, Params, Row, Scalar};
pub use service::ObjectService;
