//! The object service trait.

use crate::error::ServiceResult;
use crate::model::{
    Annotation, Link, NewAnnotation, NewOriginalFile, ObjectId, ObjectRef, OriginalFile,
};
use crate::query::{Params, Row};

/// Connection to a remote object store.
///
/// Every method is one blocking round trip. Implementations synchronize
/// internally, so a connection can be shared behind an `Arc` by the
/// filesystem and the file handles it hands out.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Arc<dyn ObjectService>`.
pub trait ObjectService: Send + Sync {
    /// Persist a new annotation and return it with its id and creation time.
    fn create_annotation(&self, annotation: NewAnnotation) -> ServiceResult<Annotation>;

    /// Every annotation whose namespace and text value equal the given pair.
    ///
    /// An empty list is a normal result; more than one match is returned as is.
    fn find_annotations(&self, ns: &str, text_value: &str) -> ServiceResult<Vec<Annotation>>;

    /// Persist a new, empty original file.
    fn create_file(&self, file: NewOriginalFile) -> ServiceResult<OriginalFile>;

    /// Fetch one original file by id, including its current size.
    fn get_file(&self, id: ObjectId) -> ServiceResult<OriginalFile>;

    /// Store the mutable attributes (`ctime`, `mtime`) of an original file.
    fn update_file(&self, file: &OriginalFile) -> ServiceResult<OriginalFile>;

    /// Link `parent` to `child`. The child must be an annotation.
    fn link(&self, parent: ObjectRef, child: ObjectRef) -> ServiceResult<Link>;

    /// Run a projection query.
    fn projection(&self, query: &str, params: &Params) -> ServiceResult<Vec<Row>>;

    /// Delete an object together with the links that reference it.
    ///
    /// Servers may delete more than asked for: deleting an annotation can
    /// take a parent annotation with it when that parent has no other
    /// children.
    fn delete(&self, object: ObjectRef) -> ServiceResult<()>;

    /// Current size of a file's content in bytes.
    fn file_size(&self, id: ObjectId) -> ServiceResult<u64>;

    /// Read up to `length` bytes starting at `offset`.
    ///
    /// Reads past the end return fewer bytes, possibly none.
    fn read_file(&self, id: ObjectId, offset: u64, length: u64) -> ServiceResult<Vec<u8>>;

    /// Write `data` at `offset`, extending the file if needed.
    fn write_file(&self, id: ObjectId, offset: u64, data: &[u8]) -> ServiceResult<()>;

    /// Cut a file down to `size` bytes. Sizes at or above the current size
    /// leave the file unchanged.
    fn truncate_file(&self, id: ObjectId, size: u64) -> ServiceResult<()>;

    /// Release the connection.
    fn close(&self) -> ServiceResult<()>;
}
