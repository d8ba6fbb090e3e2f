//! Request and response bodies of the object service wire protocol.

use serde::{Deserialize, Serialize};

use tagfs_object_service::{ObjectRef, Params};

/// Body of `POST /session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequest {
    pub username: String,
    pub password: String,
}

/// Response of `POST /session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_key: String,
}

/// Body of `POST /links`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LinkRequest {
    pub parent: ObjectRef,
    pub child: ObjectRef,
}

/// Body of `POST /query/projection`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionRequest {
    pub query: String,
    #[serde(default)]
    pub params: Params,
}

/// Response of `GET /files/{id}/size`, body of `POST /files/{id}/truncate`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SizeBody {
    pub size: u64,
}

/// Error body returned by the server on failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_request_shape() {
        let request = ProjectionRequest {
            query: "SELECT 1".to_string(),
            params: Params::new().add_id(3).add_string("ns", "x"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"query": "SELECT 1", "params": {"id": 3, "ns": "x"}})
        );
    }

    #[test]
    fn error_body_tolerates_missing_field() {
        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert!(body.error.is_empty());
    }
}
