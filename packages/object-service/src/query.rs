//! Projection queries with named parameters.
//!
//! A projection takes a query text whose parameters are written `:name`,
//! plus a [`Params`] map binding each name to a [`Scalar`]. The result is a
//! list of rows of scalar column values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::model::ObjectId;

/// A single column value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Long(i64),
    String(String),
}

impl Scalar {
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Scalar::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Long(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::String(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::String(v)
    }
}

/// One result row.
pub type Row = Vec<Scalar>;

/// Named query parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params {
    values: BTreeMap<String, Scalar>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the conventional `:id` parameter.
    #[must_use]
    pub fn add_id(self, id: ObjectId) -> Self {
        self.add("id", id)
    }

    #[must_use]
    pub fn add_string(self, name: &str, value: impl Into<String>) -> Self {
        self.add(name, Scalar::String(value.into()))
    }

    #[must_use]
    pub fn add(mut self, name: &str, value: impl Into<Scalar>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a string parameter, failing if it is absent or not a string.
    pub fn require_str(&self, name: &str) -> Result<&str, ServiceError> {
        self.get(name)
            .and_then(Scalar::as_str)
            .ok_or_else(|| ServiceError::MissingParameter(name.to_string()))
    }

    /// Look up an integer parameter, failing if it is absent or not an integer.
    pub fn require_long(&self, name: &str) -> Result<i64, ServiceError> {
        self.get(name)
            .and_then(Scalar::as_long)
            .ok_or_else(|| ServiceError::MissingParameter(name.to_string()))
    }
}

/// Query texts issued by tagfs.
pub mod queries {
    /// Ids of files named `:filename` linked to the tag annotation in `:ns`
    /// whose text value is `:dirname`.
    pub const FILE_IDS_BY_PATH: &str = "SELECT parent.id FROM OriginalFileAnnotationLink \
         WHERE parent.name=:filename \
         AND child.textValue=:dirname \
         AND child.ns=:ns \
         AND child.class=TagAnnotation";

    /// Id and text value of every annotation in `:ns` linked below annotation `:id`.
    pub const CHILD_MARKERS: &str = "SELECT child.id, child.textValue FROM AnnotationAnnotationLink \
         WHERE parent.id=:id AND child.ns=:ns";

    /// Id and name of every file linked to annotation `:id`.
    ///
    /// Files are the parent end of their links, so this selects on the child.
    pub const LINKED_FILES: &str = "SELECT parent.id, parent.name FROM OriginalFileAnnotationLink \
         WHERE child.id=:id";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_builder() {
        let params = Params::new().add_id(12).add_string("ns", "test");
        assert_eq!(params.require_long("id").unwrap(), 12);
        assert_eq!(params.require_str("ns").unwrap(), "test");
    }

    #[test]
    fn missing_parameter_is_reported_by_name() {
        let params = Params::new().add_id(1);
        let err = params.require_str("ns").unwrap_err();
        assert!(matches!(err, ServiceError::MissingParameter(ref name) if name == "ns"));
        // present but of the wrong type
        assert!(params.require_str("id").is_err());
    }

    #[test]
    fn scalars_serialize_untagged() {
        let row: Row = vec![Scalar::Long(4), Scalar::from("/a"), Scalar::Null];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[4,"/a",null]"#);
        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn query_texts_use_named_parameters() {
        assert!(queries::FILE_IDS_BY_PATH.contains(":filename"));
        assert!(queries::FILE_IDS_BY_PATH.contains(":dirname"));
        assert!(queries::CHILD_MARKERS.contains(":ns"));
        assert!(queries::LINKED_FILES.contains("child.id=:id"));
    }
}
