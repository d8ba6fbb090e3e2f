//! # tagfs
//!
//! A hierarchical filesystem stored in a flat remote object store.
//!
//! The store knows nothing about directories. tagfs keeps each directory as
//! a namespaced tag annotation whose text value is the directory's full
//! path, each file as an original file linked to the tag of its directory,
//! and the tree shape in annotation-to-annotation links.
//!
//! ## Layers
//!
//! - [`path`] - normalizing, validating and splitting paths
//! - [`markers`] - creating and querying directory markers
//! - [`resolver`] - mapping a path to at most one marker or file
//! - [`handle`] - seekable file handles over ranged remote reads and writes
//! - [`fs`] - [`TagFs`], the [`Filesystem`] implementation
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tagfs::{Filesystem, FsOptions, TagFs};
//! use tagfs_object_service::InMemoryService;
//!
//! let fs = TagFs::new(Arc::new(InMemoryService::new()), FsOptions::default())?;
//! fs.makedir("/a", false)?;
//!
//! let mut file = fs.openbin("/a/f.txt", "w")?;
//! file.write(b"hello")?;
//! file.close()?;
//!
//! assert_eq!(fs.readbytes("/a/f.txt")?, b"hello");
//! assert_eq!(fs.listdir("/a")?, vec!["f.txt".to_string()]);
//! # Ok::<(), tagfs::FsError>(())
//! ```
//!
//! With the `http` feature (on by default), [`TagFs::connect`] opens the
//! filesystem on a remote server described by a [`ConnectionConfig`].

pub mod config;
pub mod error;
pub mod fs;
pub mod handle;
pub mod info;
pub mod markers;
pub mod path;
pub mod resolver;
pub mod vfs;

pub use config::{ConnectionConfig, FsOptions, DEFAULT_NAMESPACE};
pub use error::{FsError, FsResult};
pub use fs::TagFs;
pub use handle::{FileHandle, Lines, DEFAULT_BUFFER_SIZE};
pub use info::{times_update, BasicInfo, DetailsInfo, Info, RawInfo, ResourceType};
pub use markers::DirMarker;
pub use resolver::Lookup;
pub use vfs::{Filesystem, FsMeta, OpenKind, OpenMode, SubFs};
