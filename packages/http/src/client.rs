//! Object service over HTTP.
//!
//! ## Protocol
//!
//! All bodies are JSON except file content, which travels as raw bytes.
//!
//! | Operation | Request |
//! |---|---|
//! | open session | `POST /session` |
//! | close session | `DELETE /session` |
//! | create / find annotations | `POST /annotations`, `GET /annotations?ns=&text_value=` |
//! | create / get / update file | `POST /files`, `GET /files/{id}`, `PUT /files/{id}` |
//! | link | `POST /links` |
//! | projection | `POST /query/projection` |
//! | delete | `DELETE /objects/{kind}/{id}` |
//! | file content | `GET /files/{id}/size`, `GET`/`PUT /files/{id}/data`, `POST /files/{id}/truncate` |
//!
//! Every request after the session is opened carries the session key in
//! the `X-Session-Key` header.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use tagfs_object_service::{
    Annotation, Link, NewAnnotation, NewOriginalFile, ObjectId, ObjectRef, ObjectService,
    OriginalFile, Params, Row, ServiceError, ServiceResult,
};

use crate::error::Error;
use crate::types::{
    ErrorBody, LinkRequest, ProjectionRequest, SessionRequest, SessionResponse, SizeBody,
};

/// Header carrying the session key.
pub const SESSION_HEADER: &str = "X-Session-Key";

/// Request timeout used by [`HttpObjectService::connect`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A session against a remote object service.
///
/// This is a synchronous (blocking) client: every [`ObjectService`] call
/// is one HTTP request.
pub struct HttpObjectService {
    client: Client,
    base_url: Url,
    closed: AtomicBool,
}

impl HttpObjectService {
    /// Open a session with the default request timeout.
    ///
    /// `host` is either a bare host (`images.example.org`, reached over
    /// https) or a full base URL (`http://localhost:4080/api`).
    pub fn connect(host: &str, username: &str, password: &str) -> Result<Self, Error> {
        Self::connect_with_timeout(host, username, password, DEFAULT_TIMEOUT)
    }

    /// Open a session with an explicit request timeout.
    pub fn connect_with_timeout(
        host: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let base_url = base_url(host)?;

        let bootstrap = Client::builder().timeout(timeout).build()?;
        let response = bootstrap
            .post(base_url.join("session")?)
            .json(&SessionRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Session {
                status: status.as_u16(),
                message: error_message(response),
            });
        }
        let session: SessionResponse = response.json()?;

        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_str(&session.session_key)?);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        tracing::debug!(url = %base_url, "object service session opened");

        Ok(Self {
            client,
            base_url,
            closed: AtomicBool::new(false),
        })
    }

    /// The base URL all endpoints are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> ServiceResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ServiceError::from(Error::from(e)))
    }

    /// Send a request, mapping failure statuses to service errors.
    ///
    /// A 404 becomes [`ServiceError::NotFound`] when the request targets a
    /// single object.
    fn send(&self, request: RequestBuilder, object: Option<ObjectRef>) -> ServiceResult<Response> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ServiceError::Closed);
        }

        let response = request.send().map_err(Error::from)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if let (StatusCode::NOT_FOUND, Some(object)) = (status, object) {
            return Err(ServiceError::NotFound(object));
        }
        Err(ServiceError::Remote {
            status: status.as_u16(),
            message: error_message(response),
        })
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        object: Option<ObjectRef>,
    ) -> ServiceResult<T> {
        let response = self.send(request, object)?;
        Ok(response.json().map_err(Error::from)?)
    }
}

impl ObjectService for HttpObjectService {
    fn create_annotation(&self, annotation: NewAnnotation) -> ServiceResult<Annotation> {
        let request = self.client.post(self.url("annotations")?).json(&annotation);
        self.send_json(request, None)
    }

    fn find_annotations(&self, ns: &str, text_value: &str) -> ServiceResult<Vec<Annotation>> {
        let request = self
            .client
            .get(self.url("annotations")?)
            .query(&[("ns", ns), ("text_value", text_value)]);
        self.send_json(request, None)
    }

    fn create_file(&self, file: NewOriginalFile) -> ServiceResult<OriginalFile> {
        let request = self.client.post(self.url("files")?).json(&file);
        self.send_json(request, None)
    }

    fn get_file(&self, id: ObjectId) -> ServiceResult<OriginalFile> {
        let request = self.client.get(self.url(&format!("files/{}", id))?);
        self.send_json(request, Some(ObjectRef::original_file(id)))
    }

    fn update_file(&self, file: &OriginalFile) -> ServiceResult<OriginalFile> {
        let request = self
            .client
            .put(self.url(&format!("files/{}", file.id))?)
            .json(file);
        self.send_json(request, Some(file.object_ref()))
    }

    fn link(&self, parent: ObjectRef, child: ObjectRef) -> ServiceResult<Link> {
        if child.kind != tagfs_object_service::ObjectKind::Annotation {
            return Err(ServiceError::IncompatibleLink {
                parent: parent.kind,
                child: child.kind,
            });
        }
        let request = self
            .client
            .post(self.url("links")?)
            .json(&LinkRequest { parent, child });
        self.send_json(request, None)
    }

    fn projection(&self, query: &str, params: &Params) -> ServiceResult<Vec<Row>> {
        let request = self
            .client
            .post(self.url("query/projection")?)
            .json(&ProjectionRequest {
                query: query.to_string(),
                params: params.clone(),
            });
        self.send_json(request, None)
    }

    fn delete(&self, object: ObjectRef) -> ServiceResult<()> {
        let request = self
            .client
            .delete(self.url(&format!("objects/{}/{}", object.kind, object.id))?);
        self.send(request, Some(object))?;
        Ok(())
    }

    fn file_size(&self, id: ObjectId) -> ServiceResult<u64> {
        let request = self.client.get(self.url(&format!("files/{}/size", id))?);
        let body: SizeBody = self.send_json(request, Some(ObjectRef::original_file(id)))?;
        Ok(body.size)
    }

    fn read_file(&self, id: ObjectId, offset: u64, length: u64) -> ServiceResult<Vec<u8>> {
        let request = self
            .client
            .get(self.url(&format!("files/{}/data", id))?)
            .query(&[("offset", offset), ("length", length)]);
        let response = self.send(request, Some(ObjectRef::original_file(id)))?;
        let bytes = response.bytes().map_err(Error::from)?;
        Ok(bytes.to_vec())
    }

    fn write_file(&self, id: ObjectId, offset: u64, data: &[u8]) -> ServiceResult<()> {
        let request = self
            .client
            .put(self.url(&format!("files/{}/data", id))?)
            .query(&[("offset", offset), ("length", data.len() as u64)])
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data.to_vec());
        self.send(request, Some(ObjectRef::original_file(id)))?;
        Ok(())
    }

    fn truncate_file(&self, id: ObjectId, size: u64) -> ServiceResult<()> {
        let request = self
            .client
            .post(self.url(&format!("files/{}/truncate", id))?)
            .json(&SizeBody { size });
        self.send(request, Some(ObjectRef::original_file(id)))?;
        Ok(())
    }

    fn close(&self) -> ServiceResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let response = self
            .client
            .delete(self.url("session")?)
            .send()
            .map_err(Error::from)?;
        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "closing session failed");
        }
        tracing::debug!(url = %self.base_url, "object service session closed");
        Ok(())
    }
}

/// Resolve a host argument to a base URL ending in `/`.
pub(crate) fn base_url(host: &str) -> Result<Url, Error> {
    let raw = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    };
    let mut url = Url::parse(&raw)?;
    if url.cannot_be_a_base() {
        return Err(Error::InvalidUrl {
            message: format!("{} cannot be used as a base URL", raw),
        });
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Best-effort error message from a failed response.
fn error_message(response: Response) -> String {
    let text = response.text().unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) if !body.error.is_empty() => body.error,
        _ => text,
    }
}
