//! In-memory object service.
//!
//! Keeps annotations, files and links in a single mutex-guarded arena.
//! Queries are evaluated only for the texts in [`crate::queries`]; anything
//! else is rejected as unsupported.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{ServiceError, ServiceResult};
use crate::model::{
    Annotation, Link, NewAnnotation, NewOriginalFile, ObjectId, ObjectKind, ObjectRef,
    OriginalFile, Timestamp,
};
use crate::query::{queries, Params, Row, Scalar};
use crate::service::ObjectService;

/// Largest file content the in-memory store will hold.
pub const MAX_CONTENT_LEN: usize = 1 << 30;

struct StoredFile {
    meta: OriginalFile,
    content: Vec<u8>,
}

#[derive(Default)]
struct State {
    next_id: ObjectId,
    annotations: BTreeMap<ObjectId, Annotation>,
    files: BTreeMap<ObjectId, StoredFile>,
    links: Vec<Link>,
    closed: bool,
}

impl State {
    fn allocate_id(&mut self) -> ObjectId {
        self.next_id += 1;
        self.next_id
    }

    fn exists(&self, object: ObjectRef) -> bool {
        match object.kind {
            ObjectKind::Annotation => self.annotations.contains_key(&object.id),
            ObjectKind::OriginalFile => self.files.contains_key(&object.id),
        }
    }

    fn file(&self, id: ObjectId) -> ServiceResult<&StoredFile> {
        self.files
            .get(&id)
            .ok_or(ServiceError::NotFound(ObjectRef::original_file(id)))
    }

    fn file_mut(&mut self, id: ObjectId) -> ServiceResult<&mut StoredFile> {
        self.files
            .get_mut(&id)
            .ok_or(ServiceError::NotFound(ObjectRef::original_file(id)))
    }

    fn remove_object(&mut self, object: ObjectRef) {
        match object.kind {
            ObjectKind::Annotation => {
                self.annotations.remove(&object.id);
            }
            ObjectKind::OriginalFile => {
                self.files.remove(&object.id);
            }
        }
        self.links
            .retain(|link| link.parent != object && link.child != object);
    }

    /// Subdirectory links point from the annotation, file links point to it.
    fn has_children(&self, object: ObjectRef) -> bool {
        self.links.iter().any(|link| {
            link.parent == object
                || (link.child == object && link.parent.kind == ObjectKind::OriginalFile)
        })
    }
}

/// An [`ObjectService`] that lives entirely in process memory.
///
/// # Example
///
/// ```rust
/// use tagfs_object_service::{InMemoryService, NewAnnotation, ObjectService};
///
/// let service = InMemoryService::new();
/// let tag = service
///     .create_annotation(NewAnnotation {
///         ns: "example".to_string(),
///         text_value: "/".to_string(),
///     })
///     .unwrap();
/// assert_eq!(service.find_annotations("example", "/").unwrap(), vec![tag]);
/// ```
pub struct InMemoryService {
    state: Mutex<State>,
    orphan_cascade: bool,
}

impl InMemoryService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            orphan_cascade: false,
        }
    }

    /// Emulate servers that delete a parent annotation together with its
    /// last child annotation.
    #[must_use]
    pub fn with_orphan_cascade(mut self, enabled: bool) -> Self {
        self.orphan_cascade = enabled;
        self
    }

    /// Number of stored annotations.
    pub fn annotation_count(&self) -> usize {
        self.lock().annotations.len()
    }

    /// Number of stored files.
    pub fn file_count(&self) -> usize {
        self.lock().files.len()
    }

    /// Number of stored links.
    pub fn link_count(&self) -> usize {
        self.lock().links.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(&self) -> ServiceResult<MutexGuard<'_, State>> {
        let state = self.lock();
        if state.closed {
            return Err(ServiceError::Closed);
        }
        Ok(state)
    }

    fn file_ids_by_path(state: &State, params: &Params) -> ServiceResult<Vec<Row>> {
        let filename = params.require_str("filename")?;
        let dirname = params.require_str("dirname")?;
        let ns = params.require_str("ns")?;

        let rows = state
            .links
            .iter()
            .filter(|link| link.parent.kind == ObjectKind::OriginalFile)
            .filter_map(|link| {
                let file = state.files.get(&link.parent.id)?;
                let tag = state.annotations.get(&link.child.id)?;
                (file.meta.name == filename && tag.text_value == dirname && tag.ns == ns)
                    .then(|| vec![Scalar::Long(file.meta.id)])
            })
            .collect();
        Ok(rows)
    }

    fn child_markers(state: &State, params: &Params) -> ServiceResult<Vec<Row>> {
        let parent = ObjectRef::annotation(params.require_long("id")?);
        let ns = params.require_str("ns")?;

        let rows = state
            .links
            .iter()
            .filter(|link| link.parent == parent)
            .filter_map(|link| {
                let child = state.annotations.get(&link.child.id)?;
                (child.ns == ns)
                    .then(|| vec![Scalar::Long(child.id), Scalar::String(child.text_value.clone())])
            })
            .collect();
        Ok(rows)
    }

    fn linked_files(state: &State, params: &Params) -> ServiceResult<Vec<Row>> {
        let child = ObjectRef::annotation(params.require_long("id")?);

        let rows = state
            .links
            .iter()
            .filter(|link| link.child == child && link.parent.kind == ObjectKind::OriginalFile)
            .filter_map(|link| {
                let file = state.files.get(&link.parent.id)?;
                Some(vec![
                    Scalar::Long(file.meta.id),
                    Scalar::String(file.meta.name.clone()),
                ])
            })
            .collect();
        Ok(rows)
    }
}

impl Default for InMemoryService {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectService for InMemoryService {
    fn create_annotation(&self, annotation: NewAnnotation) -> ServiceResult<Annotation> {
        let mut state = self.open()?;
        let id = state.allocate_id();
        let stored = Annotation {
            id,
            ns: annotation.ns,
            text_value: annotation.text_value,
            created: Timestamp::now(),
        };
        state.annotations.insert(id, stored.clone());
        Ok(stored)
    }

    fn find_annotations(&self, ns: &str, text_value: &str) -> ServiceResult<Vec<Annotation>> {
        let state = self.open()?;
        Ok(state
            .annotations
            .values()
            .filter(|a| a.ns == ns && a.text_value == text_value)
            .cloned()
            .collect())
    }

    fn create_file(&self, file: NewOriginalFile) -> ServiceResult<OriginalFile> {
        let mut state = self.open()?;
        let id = state.allocate_id();
        let meta = OriginalFile {
            id,
            name: file.name,
            path: file.path,
            size: 0,
            ctime: None,
            mtime: None,
            created: Timestamp::now(),
        };
        state.files.insert(
            id,
            StoredFile {
                meta: meta.clone(),
                content: Vec::new(),
            },
        );
        Ok(meta)
    }

    fn get_file(&self, id: ObjectId) -> ServiceResult<OriginalFile> {
        let state = self.open()?;
        Ok(state.file(id)?.meta.clone())
    }

    fn update_file(&self, file: &OriginalFile) -> ServiceResult<OriginalFile> {
        let mut state = self.open()?;
        let stored = state.file_mut(file.id)?;
        stored.meta.ctime = file.ctime;
        stored.meta.mtime = file.mtime;
        Ok(stored.meta.clone())
    }

    fn link(&self, parent: ObjectRef, child: ObjectRef) -> ServiceResult<Link> {
        if child.kind != ObjectKind::Annotation {
            return Err(ServiceError::IncompatibleLink {
                parent: parent.kind,
                child: child.kind,
            });
        }
        let mut state = self.open()?;
        for object in [parent, child] {
            if !state.exists(object) {
                return Err(ServiceError::NotFound(object));
            }
        }
        let id = state.allocate_id();
        let link = Link { id, parent, child };
        state.links.push(link);
        Ok(link)
    }

    fn projection(&self, query: &str, params: &Params) -> ServiceResult<Vec<Row>> {
        let state = self.open()?;
        match query {
            queries::FILE_IDS_BY_PATH => Self::file_ids_by_path(&state, params),
            queries::CHILD_MARKERS => Self::child_markers(&state, params),
            queries::LINKED_FILES => Self::linked_files(&state, params),
            other => Err(ServiceError::UnsupportedQuery(other.to_string())),
        }
    }

    fn delete(&self, object: ObjectRef) -> ServiceResult<()> {
        let mut state = self.open()?;
        if !state.exists(object) {
            return Err(ServiceError::NotFound(object));
        }

        let parents: Vec<ObjectRef> = state
            .links
            .iter()
            .filter(|link| link.child == object && link.parent.kind == ObjectKind::Annotation)
            .map(|link| link.parent)
            .collect();

        state.remove_object(object);

        if self.orphan_cascade {
            for parent in parents {
                if state.exists(parent) && !state.has_children(parent) {
                    tracing::debug!(%object, %parent, "cascading delete to childless parent");
                    state.remove_object(parent);
                }
            }
        }
        Ok(())
    }

    fn file_size(&self, id: ObjectId) -> ServiceResult<u64> {
        let state = self.open()?;
        Ok(state.file(id)?.content.len() as u64)
    }

    fn read_file(&self, id: ObjectId, offset: u64, length: u64) -> ServiceResult<Vec<u8>> {
        let state = self.open()?;
        let content = &state.file(id)?.content;
        let start = (offset as usize).min(content.len());
        let end = start.saturating_add(length as usize).min(content.len());
        Ok(content[start..end].to_vec())
    }

    fn write_file(&self, id: ObjectId, offset: u64, data: &[u8]) -> ServiceResult<()> {
        let mut state = self.open()?;
        let stored = state.file_mut(id)?;
        let start = usize::try_from(offset).map_err(|_| ServiceError::InvalidRange {
            message: format!("offset {} out of range", offset),
        })?;
        let end = start
            .checked_add(data.len())
            .filter(|&end| end <= MAX_CONTENT_LEN)
            .ok_or_else(|| ServiceError::InvalidRange {
                message: format!(
                    "write of {} bytes at offset {} exceeds {} bytes",
                    data.len(),
                    offset,
                    MAX_CONTENT_LEN
                ),
            })?;
        if stored.content.len() < end {
            stored.content.resize(end, 0);
        }
        stored.content[start..end].copy_from_slice(data);
        stored.meta.size = stored.content.len() as u64;
        Ok(())
    }

    fn truncate_file(&self, id: ObjectId, size: u64) -> ServiceResult<()> {
        let mut state = self.open()?;
        let stored = state.file_mut(id)?;
        if size < stored.content.len() as u64 {
            stored.content.truncate(size as usize);
            stored.meta.size = size;
        }
        Ok(())
    }

    fn close(&self) -> ServiceResult<()> {
        self.lock().closed = true;
        Ok(())
    }
}
