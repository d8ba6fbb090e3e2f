//! Resolving paths to backing objects.
//!
//! There is no path index in the object store. Each lookup is an exact
//! text-equality query: directories by marker text value, files by name
//! plus the text value of the marker they are linked to. One query per
//! path, so walking or creating a deep tree costs one round trip per level.
//!
//! A path must map to at most one directory marker and at most one file,
//! and never to both. Violations are reported, not repaired.

use tagfs_object_service::{queries, ObjectService, OriginalFile, Params, Scalar};

use crate::error::{FsError, FsResult};
use crate::markers::{DirMarker, MarkerManager};
use crate::path;

/// What to do when nothing is found at a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
    /// Return `None`.
    Optional,
    /// Fail with [`FsError::ResourceNotFound`]. With `check_other`, first look
    /// for the other kind of resource and report a type mismatch instead if
    /// one exists.
    Required { check_other: bool },
}

impl Lookup {
    /// Fail when missing, reporting type mismatches.
    pub const REQUIRED: Lookup = Lookup::Required { check_other: true };
}

/// Maps paths to directory markers and files in one namespace.
pub struct Resolver<'a> {
    service: &'a dyn ObjectService,
    namespace: &'a str,
}

impl<'a> Resolver<'a> {
    pub fn new(service: &'a dyn ObjectService, namespace: &'a str) -> Self {
        Self { service, namespace }
    }

    pub fn markers(&self) -> MarkerManager<'a> {
        MarkerManager::new(self.service, self.namespace)
    }

    /// Find the directory marker for `path`.
    pub fn resolve_dir(&self, path: &str, lookup: Lookup) -> FsResult<Option<DirMarker>> {
        let path = path::normalize(path);
        let mut found = self.markers().find(&path)?;

        match found.len() {
            0 => match lookup {
                Lookup::Optional => Ok(None),
                Lookup::Required { check_other } => {
                    if check_other && self.resolve_file(&path, Lookup::Optional)?.is_some() {
                        return Err(FsError::DirectoryExpected { path });
                    }
                    Err(FsError::not_found(&path))
                }
            },
            1 => Ok(found.pop()),
            n => Err(FsError::ResourceError {
                path,
                message: format!("Multiple directories [{}] found with same path", n),
            }),
        }
    }

    /// Find the file at `path`.
    pub fn resolve_file(&self, path: &str, lookup: Lookup) -> FsResult<Option<OriginalFile>> {
        let (dirname, basename) = path::split(path);
        let path = path::normalize(path);
        if basename.is_empty() {
            return match lookup {
                Lookup::Optional => Ok(None),
                Lookup::Required { .. } => Err(FsError::FileExpected { path }),
            };
        }

        let params = Params::new()
            .add_string("dirname", dirname)
            .add_string("ns", self.namespace)
            .add_string("filename", basename);
        let rows = self.service.projection(queries::FILE_IDS_BY_PATH, &params)?;

        match rows.as_slice() {
            [] => match lookup {
                Lookup::Optional => Ok(None),
                Lookup::Required { check_other } => {
                    if check_other && self.resolve_dir(&path, Lookup::Optional)?.is_some() {
                        return Err(FsError::FileExpected { path });
                    }
                    Err(FsError::not_found(&path))
                }
            },
            [row] => match row.first() {
                Some(Scalar::Long(id)) => Ok(Some(self.service.get_file(*id)?)),
                other => Err(FsError::ResourceError {
                    path,
                    message: format!("unexpected file id in query result: {:?}", other),
                }),
            },
            rows => Err(FsError::ResourceError {
                path,
                message: format!("Multiple files [{}] found with same path", rows.len()),
            }),
        }
    }

    /// The directory marker for `path`, which must exist.
    pub fn require_dir(&self, path: &str) -> FsResult<DirMarker> {
        self.resolve_dir(path, Lookup::REQUIRED)?
            .ok_or_else(|| FsError::not_found(path))
    }

    /// The file at `path`, which must exist.
    pub fn require_file(&self, path: &str) -> FsResult<OriginalFile> {
        self.resolve_file(path, Lookup::REQUIRED)?
            .ok_or_else(|| FsError::not_found(path))
    }
}
