//! Directory markers.
//!
//! The object store has no directories. A directory is a tag annotation in
//! the filesystem's namespace whose text value is the directory's full
//! normalized path. Hierarchy lives in links:
//!
//! - a directory links to each subdirectory (parent marker -> child marker)
//! - a file links to its directory (file -> marker)
//!
//! The two link shapes point in opposite directions, so they are spelled
//! out once here as [`SUBDIRECTORY_LINK`] and [`FILE_LINK`].

use tagfs_object_service::{
    queries, Annotation, Link, NewAnnotation, ObjectId, ObjectKind, ObjectRef, ObjectService,
    OriginalFile, Params, Row, Scalar, ServiceResult, Timestamp,
};

use crate::error::{FsError, FsResult};

/// A directory marker: the annotation standing in for one directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirMarker {
    pub id: ObjectId,
    /// Normalized path of the directory.
    pub path: String,
    /// Creation-event time recorded by the server.
    pub created: Timestamp,
}

impl DirMarker {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::annotation(self.id)
    }
}

impl From<Annotation> for DirMarker {
    fn from(annotation: Annotation) -> Self {
        Self {
            id: annotation.id,
            path: annotation.text_value,
            created: annotation.created,
        }
    }
}

/// The kinds at the two ends of a link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkShape {
    pub parent: ObjectKind,
    pub child: ObjectKind,
}

impl LinkShape {
    pub fn link(
        self,
        service: &dyn ObjectService,
        parent: ObjectId,
        child: ObjectId,
    ) -> ServiceResult<Link> {
        service.link(
            ObjectRef {
                kind: self.parent,
                id: parent,
            },
            ObjectRef {
                kind: self.child,
                id: child,
            },
        )
    }
}

/// Directory to subdirectory: the parent marker is the parent of the link.
pub const SUBDIRECTORY_LINK: LinkShape = LinkShape {
    parent: ObjectKind::Annotation,
    child: ObjectKind::Annotation,
};

/// File to directory: the file is the parent of the link and its
/// directory marker the child.
pub const FILE_LINK: LinkShape = LinkShape {
    parent: ObjectKind::OriginalFile,
    child: ObjectKind::Annotation,
};

/// Creates and queries directory markers in one namespace.
pub struct MarkerManager<'a> {
    service: &'a dyn ObjectService,
    namespace: &'a str,
}

impl<'a> MarkerManager<'a> {
    pub fn new(service: &'a dyn ObjectService, namespace: &'a str) -> Self {
        Self { service, namespace }
    }

    /// Persist a new marker for `path` and link it below `parent`.
    ///
    /// Existing markers are not checked; callers resolve first.
    pub fn create(&self, path: &str, parent: Option<&DirMarker>) -> FsResult<DirMarker> {
        let annotation = self.service.create_annotation(NewAnnotation {
            ns: self.namespace.to_string(),
            text_value: path.to_string(),
        })?;
        let marker = DirMarker::from(annotation);

        if let Some(parent) = parent {
            SUBDIRECTORY_LINK.link(self.service, parent.id, marker.id)?;
        }

        tracing::debug!(
            path,
            id = marker.id,
            parent = ?parent.map(|p| p.path.as_str()),
            "created directory marker"
        );
        Ok(marker)
    }

    /// Every marker whose text value is exactly `path`.
    pub fn find(&self, path: &str) -> FsResult<Vec<DirMarker>> {
        Ok(self
            .service
            .find_annotations(self.namespace, path)?
            .into_iter()
            .map(DirMarker::from)
            .collect())
    }

    /// Paths of the markers linked directly below `marker`.
    pub fn child_paths(&self, marker: &DirMarker) -> FsResult<Vec<String>> {
        let params = Params::new()
            .add_id(marker.id)
            .add_string("ns", self.namespace);
        let rows = self.service.projection(queries::CHILD_MARKERS, &params)?;
        rows.iter()
            .map(|row| string_column(row, 1, &marker.path))
            .collect()
    }

    /// Names of the files linked to `marker`.
    pub fn file_names(&self, marker: &DirMarker) -> FsResult<Vec<String>> {
        let params = Params::new().add_id(marker.id);
        let rows = self.service.projection(queries::LINKED_FILES, &params)?;
        rows.iter()
            .map(|row| string_column(row, 1, &marker.path))
            .collect()
    }

    /// Link `file` into the directory `marker`.
    pub fn attach_file(&self, file: &OriginalFile, marker: &DirMarker) -> FsResult<()> {
        FILE_LINK.link(self.service, file.id, marker.id)?;
        Ok(())
    }
}

fn string_column(row: &Row, index: usize, path: &str) -> FsResult<String> {
    match row.get(index) {
        Some(Scalar::String(value)) => Ok(value.clone()),
        other => Err(FsError::ResourceError {
            path: path.to_string(),
            message: format!("unexpected column {} in query result: {:?}", index, other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagfs_object_service::{InMemoryService, NewOriginalFile};

    #[test]
    fn create_links_child_below_parent() {
        let service = InMemoryService::new();
        let markers = MarkerManager::new(&service, "ns");

        let root = markers.create("/", None).unwrap();
        let a = markers.create("/a", Some(&root)).unwrap();
        assert_eq!(a.path, "/a");

        assert_eq!(markers.child_paths(&root).unwrap(), vec!["/a".to_string()]);
        assert!(markers.child_paths(&a).unwrap().is_empty());
    }

    #[test]
    fn find_is_namespace_scoped() {
        let service = InMemoryService::new();
        MarkerManager::new(&service, "one").create("/a", None).unwrap();
        MarkerManager::new(&service, "two").create("/a", None).unwrap();

        let found = MarkerManager::new(&service, "one").find("/a").unwrap();
        assert_eq!(found.len(), 1);
        assert!(MarkerManager::new(&service, "three")
            .find("/a")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn create_does_not_deduplicate() {
        let service = InMemoryService::new();
        let markers = MarkerManager::new(&service, "ns");
        markers.create("/a", None).unwrap();
        markers.create("/a", None).unwrap();
        assert_eq!(markers.find("/a").unwrap().len(), 2);
    }

    #[test]
    fn files_link_towards_their_directory() {
        let service = InMemoryService::new();
        let markers = MarkerManager::new(&service, "ns");
        let dir = markers.create("/d", None).unwrap();
        let file = service
            .create_file(NewOriginalFile {
                name: "f.txt".to_string(),
                path: "/d".to_string(),
            })
            .unwrap();

        markers.attach_file(&file, &dir).unwrap();

        assert_eq!(markers.file_names(&dir).unwrap(), vec!["f.txt".to_string()]);
        // file links are not subdirectory links
        assert!(markers.child_paths(&dir).unwrap().is_empty());
    }

    #[test]
    fn link_shapes_point_opposite_ways() {
        assert_eq!(SUBDIRECTORY_LINK.child, ObjectKind::Annotation);
        assert_eq!(FILE_LINK.parent, ObjectKind::OriginalFile);
        assert_eq!(FILE_LINK.child, ObjectKind::Annotation);
    }
}
