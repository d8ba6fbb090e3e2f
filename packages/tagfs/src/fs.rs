//! The tag-backed filesystem.
//!
//! [`TagFs`] implements [`Filesystem`] over an [`ObjectService`]. Checks and
//! creations are separate round trips with no locking, so two clients
//! creating the same path at once can both succeed and leave duplicates
//! behind. Later lookups of that path then fail with
//! [`FsError::ResourceError`].

use std::fmt;
use std::io::SeekFrom;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tagfs_object_service::{NewOriginalFile, ObjectRef, ObjectService};

use crate::config::FsOptions;
use crate::error::{FsError, FsResult};
use crate::handle::FileHandle;
use crate::info::{Info, RawInfo, TimesUpdate};
use crate::markers::DirMarker;
use crate::path;
use crate::resolver::{Lookup, Resolver};
use crate::vfs::{Filesystem, FsMeta, OpenMode, SubFs};

/// A filesystem whose directories are tag annotations and whose files are
/// original files in a remote object store.
pub struct TagFs {
    service: Arc<dyn ObjectService>,
    namespace: String,
    root: String,
    closed: AtomicBool,
}

impl fmt::Debug for TagFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagFs")
            .field("namespace", &self.namespace)
            .field("root", &self.root)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl TagFs {
    /// Open a filesystem over `service`.
    ///
    /// The root marker is looked up and, with `options.create`, created
    /// when missing. Without `create` a missing root is an error.
    pub fn new(service: Arc<dyn ObjectService>, options: FsOptions) -> FsResult<Self> {
        let root = path::validate(&options.root)?;
        let fs = Self {
            service,
            namespace: options.namespace,
            root,
            closed: AtomicBool::new(false),
        };

        {
            let resolver = fs.resolver();
            let lookup = if options.create {
                Lookup::Optional
            } else {
                Lookup::REQUIRED
            };
            if resolver.resolve_dir(&fs.root, lookup)?.is_none() {
                resolver.markers().create(&fs.root, None)?;
                tracing::info!(root = %fs.root, namespace = %fs.namespace, "created root directory");
            }
        }

        Ok(fs)
    }

    /// Connect to a remote server over HTTP and open a filesystem on it.
    #[cfg(feature = "http")]
    pub fn connect(config: &crate::config::ConnectionConfig) -> FsResult<Self> {
        if config.group.is_some() {
            return Err(FsError::RemoteConnection {
                message: "group not supported".to_string(),
                source: None,
            });
        }

        let service =
            tagfs_http::HttpObjectService::connect(&config.host, &config.user, &config.password)
                .map_err(|e| FsError::RemoteConnection {
                    message: "Failed to connect to object service".to_string(),
                    source: Some(Box::new(e)),
                })?;
        tracing::debug!(host = %config.host, "connected to object service");

        Self::new(Arc::new(service), config.options.clone())
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.service.as_ref(), &self.namespace)
    }

    fn ensure_open(&self) -> FsResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(FsError::Closed);
        }
        Ok(())
    }

    fn entries(&self, marker: &DirMarker) -> FsResult<Vec<String>> {
        let markers = self.resolver().markers();
        let mut names: Vec<String> = markers
            .child_paths(marker)?
            .iter()
            .map(|child| path::basename(child))
            .collect();
        names.extend(markers.file_names(marker)?);
        Ok(names)
    }
}

impl Filesystem for TagFs {
    fn getinfo(&self, path: &str) -> FsResult<Info> {
        self.ensure_open()?;
        let path = path::validate(path)?;
        let resolver = self.resolver();

        let dir = resolver.resolve_dir(&path, Lookup::Optional)?;
        let file = resolver.resolve_file(&path, Lookup::Optional)?;
        let name = path::basename(&path);

        match (dir, file) {
            (Some(_), Some(_)) => Err(FsError::ResourceError {
                path,
                message: "Directory and file found with same path".to_string(),
            }),
            (Some(dir), None) => Ok(Info::directory(name, dir.created)),
            (None, Some(file)) => Ok(Info::file(
                name,
                file.size,
                file.ctime.unwrap_or(file.created),
                file.mtime,
            )),
            (None, None) => Err(FsError::not_found(&path)),
        }
    }

    fn listdir(&self, path: &str) -> FsResult<Vec<String>> {
        self.ensure_open()?;
        let path = path::validate(path)?;
        let marker = self.resolver().require_dir(&path)?;
        self.entries(&marker)
    }

    fn makedir(&self, path: &str, recreate: bool) -> FsResult<SubFs<'_, Self>> {
        self.ensure_open()?;
        let path = path::validate(path)?;
        let resolver = self.resolver();

        match resolver.resolve_dir(&path, Lookup::Optional)? {
            Some(_) if !recreate => return Err(FsError::DirectoryExists { path }),
            Some(_) => {}
            None => {
                if resolver.resolve_file(&path, Lookup::Optional)?.is_some() {
                    return Err(FsError::DirectoryExists { path });
                }
                let parent = if path::is_root(&path) {
                    None
                } else {
                    let (dirname, _) = path::split(&path);
                    Some(resolver.require_dir(&dirname)?)
                };
                resolver.markers().create(&path, parent.as_ref())?;
            }
        }

        Ok(SubFs::new(self, &path))
    }

    fn openbin(&self, path: &str, mode: &str) -> FsResult<FileHandle> {
        self.ensure_open()?;
        let mode = OpenMode::parse(mode)?;
        let path = path::validate(path)?;
        let (dirname, basename) = path::split(&path);
        let resolver = self.resolver();

        let parent = resolver
            .resolve_dir(&dirname, Lookup::Optional)?
            .ok_or_else(|| FsError::not_found(&path))?;

        if !mode.create() {
            let file = resolver.require_file(&path)?;
            tracing::debug!(path = %path, %mode, file_id = file.id, "opened file");
            return Ok(FileHandle::new(
                Arc::clone(&self.service),
                file.id,
                basename,
                mode.reading(),
                mode.writing(),
            ));
        }

        let file = match resolver.resolve_file(&path, Lookup::Optional)? {
            Some(_) if mode.exclusive() => return Err(FsError::FileExists { path }),
            Some(file) => file,
            None => {
                if resolver.resolve_dir(&path, Lookup::Optional)?.is_some() {
                    return Err(FsError::FileExpected { path });
                }
                let file = self.service.create_file(NewOriginalFile {
                    name: basename.clone(),
                    path: dirname,
                })?;
                resolver.markers().attach_file(&file, &parent)?;
                tracing::debug!(path = %path, file_id = file.id, "created file");
                file
            }
        };

        let mut handle = FileHandle::new(
            Arc::clone(&self.service),
            file.id,
            basename,
            mode.reading(),
            mode.writing(),
        );
        if mode.truncate() {
            handle.truncate(Some(0))?;
        }
        handle.seek(SeekFrom::End(0))?;
        tracing::debug!(path = %path, %mode, file_id = file.id, "opened file");
        Ok(handle)
    }

    fn remove(&self, path: &str) -> FsResult<()> {
        self.ensure_open()?;
        let path = path::validate(path)?;
        let file = self.resolver().require_file(&path)?;
        self.service.delete(ObjectRef::original_file(file.id))?;
        tracing::info!(path = %path, file_id = file.id, "removed file");
        Ok(())
    }

    /// Remove an empty directory.
    ///
    /// Some servers also delete the parent marker when it loses its last
    /// child. That is detected and logged, not repaired.
    fn removedir(&self, path: &str) -> FsResult<()> {
        self.ensure_open()?;
        let path = path::validate(path)?;
        if path == self.root {
            return Err(FsError::RemoveRoot {
                path: self.root.clone(),
            });
        }

        let resolver = self.resolver();
        let marker = resolver.require_dir(&path)?;
        if !self.entries(&marker)?.is_empty() {
            return Err(FsError::DirectoryNotEmpty { path });
        }

        let parent = if path::is_root(&path) {
            None
        } else {
            resolver.resolve_dir(&path::split(&path).0, Lookup::Optional)?
        };

        self.service.delete(marker.object_ref())?;
        tracing::info!(path = %path, marker_id = marker.id, "removed directory");

        if let Some(parent) = parent {
            if resolver.resolve_dir(&parent.path, Lookup::Optional)?.is_none() {
                tracing::warn!(
                    path = %path,
                    parent = %parent.path,
                    "parent directory marker was deleted along with its last child"
                );
            }
        }
        Ok(())
    }

    /// Set `details.created` and `details.modified` of a file.
    fn setinfo(&self, path: &str, info: &RawInfo) -> FsResult<()> {
        self.ensure_open()?;
        let path = path::validate(path)?;
        let resolver = self.resolver();

        if resolver.resolve_dir(&path, Lookup::Optional)?.is_some() {
            return Err(FsError::unsupported(&path, "cannot set info on a directory"));
        }
        let mut file = resolver.require_file(&path)?;
        let update = TimesUpdate::from_raw(&path, info)?;

        if let Some(created) = update.created {
            file.ctime = Some(created);
        }
        if let Some(modified) = update.modified {
            file.mtime = Some(modified);
        }
        self.service.update_file(&file)?;
        tracing::debug!(path = %path, file_id = file.id, "updated file times");
        Ok(())
    }

    fn meta(&self) -> FsMeta {
        FsMeta {
            case_insensitive: false,
            invalid_path_chars: path::INVALID_PATH_CHARS.to_string(),
            max_path_length: None,
            max_sys_path_length: None,
            network: true,
            read_only: false,
            supports_rename: false,
        }
    }

    /// Close the connection. Closing twice is fine.
    fn close(&self) -> FsResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.service.close()?;
        tracing::debug!(namespace = %self.namespace, "closed filesystem");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagfs_object_service::InMemoryService;

    fn open() -> (Arc<InMemoryService>, TagFs) {
        let service = Arc::new(InMemoryService::new());
        let fs = TagFs::new(service.clone(), FsOptions::default().with_namespace("unit")).unwrap();
        (service, fs)
    }

    #[test]
    fn new_creates_root_once() {
        let (service, fs) = open();
        assert_eq!(service.annotation_count(), 1);
        assert!(fs.isdir("/").unwrap());

        let again = TagFs::new(service.clone(), FsOptions::default().with_namespace("unit")).unwrap();
        assert_eq!(again.root(), "/");
        assert_eq!(service.annotation_count(), 1);
    }

    #[test]
    fn new_without_create_requires_root() {
        let service = Arc::new(InMemoryService::new());
        let err = TagFs::new(service, FsOptions::default().with_create(false)).unwrap_err();
        assert!(matches!(err, FsError::ResourceNotFound { .. }));
    }

    #[test]
    fn write_modes_position_at_end() {
        let (_service, fs) = open();
        fs.writebytes("/f", b"abc").unwrap();

        let append = fs.openbin("/f", "ab").unwrap();
        assert_eq!(append.tell(), 3);
        assert!(!append.readable());

        let mut truncating = fs.openbin("/f", "w+").unwrap();
        assert_eq!(truncating.tell(), 0);
        assert!(truncating.readable());
        assert_eq!(truncating.read(None).unwrap(), b"");
    }

    #[test]
    fn read_mode_starts_at_zero() {
        let (_service, fs) = open();
        fs.writebytes("/f", b"abc").unwrap();

        let mut h = fs.openbin("/f", "r").unwrap();
        assert_eq!(h.tell(), 0);
        assert!(!h.writable());
        assert_eq!(h.read(Some(1)).unwrap(), b"a");

        let h = fs.openbin("/f", "r+").unwrap();
        assert!(h.writable());
    }

    #[test]
    fn meta_is_static() {
        let (_service, fs) = open();
        let meta = fs.meta();
        assert!(meta.network);
        assert!(!meta.read_only);
        assert_eq!(meta.invalid_path_chars, "\0");
    }

    #[test]
    fn close_is_idempotent_and_final() {
        let (_service, fs) = open();
        fs.close().unwrap();
        fs.close().unwrap();
        assert!(matches!(fs.listdir("/"), Err(FsError::Closed)));
        assert!(matches!(fs.openbin("/f", "w"), Err(FsError::Closed)));
    }
}
