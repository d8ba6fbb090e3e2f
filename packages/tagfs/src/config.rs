//! Configuration for a tagfs instance.

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::{FsError, FsResult};

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "github.com/tagfs/tagfs";

/// Options that shape one logical filesystem inside the object store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsOptions {
    /// Path of the root directory marker.
    pub root: String,
    /// Create the root marker if it does not exist yet.
    pub create: bool,
    /// Namespace scoping every marker and link lookup.
    pub namespace: String,
}

impl Default for FsOptions {
    fn default() -> Self {
        Self {
            root: "/".to_string(),
            create: true,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl FsOptions {
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    #[must_use]
    pub fn with_create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }
}

/// Everything needed to open a tagfs instance against a remote server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Host name or base URL of the server.
    pub host: String,
    /// User name, or a session key.
    pub user: String,
    /// Password, or a session key.
    pub password: String,
    /// Group to connect in. Groups are not supported; setting one makes
    /// connecting fail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(flatten)]
    pub options: FsOptions,
}

impl ConnectionConfig {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            group: None,
            options: FsOptions::default(),
        }
    }

    /// Read the configuration from the environment.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `TAGFS_HOST` | server host (required) |
    /// | `TAGFS_USER` | user name |
    /// | `TAGFS_PASSWORD` | password |
    /// | `TAGFS_SESSION` | session key, used as both user and password |
    /// | `TAGFS_NAMESPACE` | namespace, defaults to [`DEFAULT_NAMESPACE`] |
    /// | `TAGFS_ROOT` | root path, defaults to `/` |
    pub fn from_env() -> FsResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> FsResult<Self> {
        let host = lookup("TAGFS_HOST").ok_or_else(|| FsError::RemoteConnection {
            message: "TAGFS_HOST is not set".to_string(),
            source: None,
        })?;

        let (user, password) = match lookup("TAGFS_SESSION") {
            Some(session) => (session.clone(), session),
            None => (
                lookup("TAGFS_USER").unwrap_or_default(),
                lookup("TAGFS_PASSWORD").unwrap_or_default(),
            ),
        };

        let mut options = FsOptions::default();
        if let Some(namespace) = lookup("TAGFS_NAMESPACE") {
            options.namespace = namespace;
        }
        if let Some(root) = lookup("TAGFS_ROOT") {
            options.root = root;
        }

        Ok(Self {
            host,
            user,
            password,
            group: None,
            options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn default_options() {
        let options = FsOptions::default();
        assert_eq!(options.root, "/");
        assert!(options.create);
        assert_eq!(options.namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: FsOptions = serde_json::from_str(r#"{"namespace": "custom"}"#).unwrap();
        assert_eq!(options.namespace, "custom");
        assert_eq!(options.root, "/");
        assert!(options.create);
    }

    #[test]
    fn connection_config_flattens_options() {
        let config: ConnectionConfig = serde_json::from_value(serde_json::json!({
            "host": "localhost",
            "user": "root",
            "password": "omega",
            "root": "/data",
            "create": false
        }))
        .unwrap();
        assert_eq!(config.options.root, "/data");
        assert!(!config.options.create);
        assert_eq!(config.options.namespace, DEFAULT_NAMESPACE);
        assert!(config.group.is_none());
    }

    #[test]
    fn env_user_and_password() {
        let config = ConnectionConfig::from_lookup(lookup(&[
            ("TAGFS_HOST", "images.example.org"),
            ("TAGFS_USER", "alice"),
            ("TAGFS_PASSWORD", "secret"),
            ("TAGFS_NAMESPACE", "scratch"),
        ]))
        .unwrap();
        assert_eq!(config.host, "images.example.org");
        assert_eq!(config.user, "alice");
        assert_eq!(config.password, "secret");
        assert_eq!(config.options.namespace, "scratch");
    }

    #[test]
    fn env_session_overrides_credentials() {
        let config = ConnectionConfig::from_lookup(lookup(&[
            ("TAGFS_HOST", "h"),
            ("TAGFS_USER", "alice"),
            ("TAGFS_SESSION", "abc-123"),
        ]))
        .unwrap();
        assert_eq!(config.user, "abc-123");
        assert_eq!(config.password, "abc-123");
    }

    #[test]
    fn env_requires_host() {
        let err = ConnectionConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, FsError::RemoteConnection { .. }));
    }
}
