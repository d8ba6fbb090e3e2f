//! Object model of the remote service.
//!
//! The service knows two kinds of objects, annotations and original files,
//! and a table of links between them. There is no directory type; callers
//! that need one build it out of annotations and links.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Server-assigned object identifier.
pub type ObjectId = i64;

/// The kinds of object the service stores.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Annotation,
    OriginalFile,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Annotation => write!(f, "annotation"),
            ObjectKind::OriginalFile => write!(f, "original_file"),
        }
    }
}

/// A typed reference to a stored object.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub id: ObjectId,
}

impl ObjectRef {
    pub fn annotation(id: ObjectId) -> Self {
        Self {
            kind: ObjectKind::Annotation,
            id,
        }
    }

    pub fn original_file(id: ObjectId) -> Self {
        Self {
            kind: ObjectKind::OriginalFile,
            id,
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Server time value: milliseconds since the Unix epoch.
#[derive(
    Clone, Copy, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Convert from floating point epoch seconds.
    pub fn from_secs_f64(secs: f64) -> Self {
        Timestamp((secs * 1000.0).round() as i64)
    }

    /// Floating point epoch seconds.
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1000.0
    }

    pub fn millis(self) -> i64 {
        self.0
    }

    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();
        Timestamp(millis)
    }
}

/// A namespaced text annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: ObjectId,
    pub ns: String,
    pub text_value: String,
    /// Time of the creation event recorded by the server.
    pub created: Timestamp,
}

impl Annotation {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::annotation(self.id)
    }
}

/// Fields supplied when creating an annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAnnotation {
    pub ns: String,
    pub text_value: String,
}

/// A file object with server-side byte content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalFile {
    pub id: ObjectId,
    pub name: String,
    /// Path of the directory the file was created in.
    pub path: String,
    pub size: u64,
    /// Explicitly stored creation time, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctime: Option<Timestamp>,
    /// Explicitly stored modification time, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<Timestamp>,
    /// Time of the creation event recorded by the server.
    pub created: Timestamp,
}

impl OriginalFile {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::original_file(self.id)
    }
}

/// Fields supplied when creating an original file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOriginalFile {
    pub name: String,
    pub path: String,
}

/// A directed link. The child is always an annotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: ObjectId,
    pub parent: ObjectRef,
    pub child: ObjectRef,
}
