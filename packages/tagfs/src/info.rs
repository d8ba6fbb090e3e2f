//! Resource information records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tagfs_object_service::Timestamp;

use crate::error::{FsError, FsResult};

/// Kind of resource at a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Unknown,
    Directory,
    File,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasicInfo {
    pub name: String,
    pub is_dir: bool,
}

/// Times are floating point epoch seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetailsInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<f64>,
    pub size: u64,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
}

/// Information about a file or directory, grouped by namespace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub basic: BasicInfo,
    pub details: DetailsInfo,
}

impl Info {
    pub(crate) fn directory(name: String, created: Timestamp) -> Self {
        Self {
            basic: BasicInfo { name, is_dir: true },
            details: DetailsInfo {
                created: Some(created.as_secs_f64()),
                modified: None,
                size: 0,
                resource_type: ResourceType::Directory,
            },
        }
    }

    pub(crate) fn file(
        name: String,
        size: u64,
        created: Timestamp,
        modified: Option<Timestamp>,
    ) -> Self {
        Self {
            basic: BasicInfo {
                name,
                is_dir: false,
            },
            details: DetailsInfo {
                created: Some(created.as_secs_f64()),
                modified: modified.map(Timestamp::as_secs_f64),
                size,
                resource_type: ResourceType::File,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.basic.name
    }

    pub fn is_dir(&self) -> bool {
        self.basic.is_dir
    }

    pub fn is_file(&self) -> bool {
        !self.basic.is_dir
    }

    pub fn size(&self) -> u64 {
        self.details.size
    }

    pub fn created(&self) -> Option<f64> {
        self.details.created
    }

    pub fn modified(&self) -> Option<f64> {
        self.details.modified
    }

    pub fn resource_type(&self) -> ResourceType {
        self.details.resource_type
    }
}

/// Untyped info, keyed by namespace then field, as accepted by `setinfo`.
pub type RawInfo = BTreeMap<String, Map<String, Value>>;

/// Build a `details` update for the two settable times.
pub fn times_update(created: Option<f64>, modified: Option<f64>) -> RawInfo {
    let mut details = Map::new();
    if let Some(created) = created {
        details.insert("created".to_string(), Value::from(created));
    }
    if let Some(modified) = modified {
        details.insert("modified".to_string(), Value::from(modified));
    }
    let mut raw = RawInfo::new();
    raw.insert("details".to_string(), details);
    raw
}

/// Times extracted from a [`RawInfo`] update.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct TimesUpdate {
    pub created: Option<Timestamp>,
    pub modified: Option<Timestamp>,
}

impl TimesUpdate {
    /// Accept only `details.created` and `details.modified`; anything else
    /// has no stored equivalent.
    pub fn from_raw(path: &str, raw: &RawInfo) -> FsResult<Self> {
        let mut update = TimesUpdate::default();
        for (namespace, fields) in raw {
            if namespace != "details" {
                return Err(FsError::unsupported(
                    path,
                    format!("cannot set info in namespace '{}'", namespace),
                ));
            }
            for (field, value) in fields {
                let slot = match field.as_str() {
                    "created" => &mut update.created,
                    "modified" => &mut update.modified,
                    other => {
                        return Err(FsError::unsupported(
                            path,
                            format!("cannot set details.{}", other),
                        ))
                    }
                };
                *slot = match value {
                    Value::Null => None,
                    Value::Number(n) => n.as_f64().map(Timestamp::from_secs_f64),
                    other => {
                        return Err(FsError::InvalidArgument {
                            message: format!("details.{} must be a number, got {}", field, other),
                        })
                    }
                };
            }
        }
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn directory_info() {
        let info = Info::directory("d".to_string(), Timestamp(2_500));
        assert!(info.is_dir());
        assert_eq!(info.size(), 0);
        assert_eq!(info.created(), Some(2.5));
        assert_eq!(info.modified(), None);
        assert_eq!(info.resource_type(), ResourceType::Directory);
    }

    #[test]
    fn info_serializes_by_namespace() {
        let info = Info::file("f.txt".to_string(), 5, Timestamp(1_000), Some(Timestamp(3_000)));
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(
            json,
            json!({
                "basic": {"name": "f.txt", "is_dir": false},
                "details": {"created": 1.0, "modified": 3.0, "size": 5, "type": "file"}
            })
        );
    }

    #[test]
    fn times_update_round_trips_through_raw() {
        let raw = times_update(Some(10.5), Some(20.0));
        let update = TimesUpdate::from_raw("/f", &raw).unwrap();
        assert_eq!(update.created, Some(Timestamp(10_500)));
        assert_eq!(update.modified, Some(Timestamp(20_000)));
    }

    #[test]
    fn other_namespaces_are_unsupported() {
        let mut raw = times_update(None, Some(1.0));
        raw.insert("access".to_string(), Map::new());
        let err = TimesUpdate::from_raw("/f", &raw).unwrap_err();
        assert!(matches!(err, FsError::Unsupported { .. }));
    }

    #[test]
    fn other_details_fields_are_unsupported() {
        let mut raw = RawInfo::new();
        let mut details = Map::new();
        details.insert("size".to_string(), json!(3));
        raw.insert("details".to_string(), details);
        assert!(matches!(
            TimesUpdate::from_raw("/f", &raw),
            Err(FsError::Unsupported { .. })
        ));
    }

    #[test]
    fn non_numeric_time_is_rejected() {
        let mut raw = RawInfo::new();
        let mut details = Map::new();
        details.insert("modified".to_string(), json!("yesterday"));
        raw.insert("details".to_string(), details);
        assert!(matches!(
            TimesUpdate::from_raw("/f", &raw),
            Err(FsError::InvalidArgument { .. })
        ));
    }
}
