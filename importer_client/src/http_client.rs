//! Blocking HTTP transport bound to one importer endpoint.
//!
//! All calls go through [`HttpClient::request`]: the Basic auth header is
//! attached to every request, the full response body is read into memory, and
//! the status code is classified into the crate error taxonomy. No retries,
//! no caching; network-level failures propagate as [`reqwest::Error`].

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use importer_types::ErrorResponse;
use parking_lot::{Condvar, Mutex};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use tracing::{debug, info};
use url::Url;

use crate::error::{ImporterClientError, Result};
use crate::multipart::{self, FilePart};

/// Idle connections kept around per host.
const RESERVED_CONNECTIONS: usize = 2;

/// Hard cap on simultaneous connections; an extra caller blocks until a
/// permit frees up instead of opening more sockets.
const MAX_CONNECTIONS: usize = 4;

/// Request bodies at or above this size are elided from the request log.
const LOG_BODY_LIMIT: usize = 1024;

/// A successful (2xx) response: status, raw headers, and the fully-read body.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

enum RequestBody {
    Buffered(Vec<u8>),
    FileStream { file: File, path: PathBuf },
}

/// Counting gate bounding simultaneous connections, blocking admission.
#[derive(Debug)]
struct ConnectionGate {
    available: Mutex<usize>,
    cond: Condvar,
}

impl ConnectionGate {
    fn new(permits: usize) -> Self {
        Self {
            available: Mutex::new(permits),
            cond: Condvar::new(),
        }
    }

    fn acquire(&self) -> ConnectionPermit<'_> {
        let mut available = self.available.lock();
        while *available == 0 {
            self.cond.wait(&mut available);
        }
        *available -= 1;
        ConnectionPermit { gate: self }
    }
}

/// RAII permit; returning it wakes one blocked caller.
struct ConnectionPermit<'a> {
    gate: &'a ConnectionGate,
}

impl Drop for ConnectionPermit<'_> {
    fn drop(&mut self) {
        let mut available = self.gate.available.lock();
        *available += 1;
        self.gate.cond.notify_one();
    }
}

/// Transport bound to one endpoint: normalized base URL, a bounded blocking
/// connection pool, and a Basic auth header computed once at construction.
#[derive(Debug)]
pub struct HttpClient {
    service_url: String,
    username: String,
    password: String,
    client: Client,
    auth_header: HeaderValue,
    gate: ConnectionGate,
}

impl HttpClient {
    pub fn new(url: &str, username: &str, password: &str) -> Result<Self> {
        let service_url = url.trim_end_matches('/').to_string();
        let scheme = Url::parse(&service_url)?.scheme().to_string();

        let mut builder = Client::builder()
            .pool_max_idle_per_host(RESERVED_CONNECTIONS)
            .timeout(None::<Duration>);
        if scheme == "https" {
            // Certificate and hostname verification stay disabled for https
            // endpoints; the trust decision is the deployment's, not ours.
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }
        let client = builder.build()?;

        Ok(Self {
            service_url,
            username: username.to_string(),
            password: password.to_string(),
            client,
            auth_header: basic_auth_header(username, password)?,
            gate: ConnectionGate::new(MAX_CONNECTIONS),
        })
    }

    /// The normalized base URL (no trailing slash).
    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// `{base}/{path}`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.service_url, path)
    }

    pub fn get(&self, url: &str) -> Result<RawResponse> {
        self.request(Method::GET, url, None, HeaderMap::new())
    }

    pub fn post(&self, url: &str) -> Result<RawResponse> {
        self.request(Method::POST, url, None, HeaderMap::new())
    }

    pub fn delete(&self, url: &str) -> Result<RawResponse> {
        self.request(Method::DELETE, url, None, HeaderMap::new())
    }

    pub fn put_json(&self, url: &str, data: &str) -> Result<RawResponse> {
        self.request_json(Method::PUT, url, data)
    }

    pub fn post_json(&self, url: &str, data: &str) -> Result<RawResponse> {
        self.request_json(Method::POST, url, data)
    }

    fn request_json(&self, method: Method, url: &str, data: &str) -> Result<RawResponse> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.request(method, url, Some(RequestBody::Buffered(data.as_bytes().to_vec())), headers)
    }

    /// PUT the file at `path` as an application/zip body. The file handle is
    /// scoped to this call and released on every exit path.
    pub fn put_zip(&self, url: &str, path: &Path) -> Result<RawResponse> {
        let file = File::open(path)?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/zip"));
        let body = RequestBody::FileStream {
            file,
            path: path.to_path_buf(),
        };
        self.request(Method::PUT, url, Some(body), headers)
    }

    /// Tells the service to fetch the data itself: POSTs a single url-encoded
    /// form field named `url`.
    pub fn post_upload_url(&self, url: &str, upload_url: &str) -> Result<RawResponse> {
        let data = format!("url={}", urlencoding::encode(upload_url));
        let mut headers = HeaderMap::new();
        // the service rejects this call without the exact content type
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));
        self.request(Method::POST, url, Some(RequestBody::Buffered(data.into_bytes())), headers)
    }

    /// POST a multipart/form-data envelope built from `fields` then `files`,
    /// in the supplied order.
    pub fn post_multipart(&self, url: &str, files: &[FilePart], fields: &[(String, String)]) -> Result<RawResponse> {
        info!("post_multipart {} {:?} {:?}", url, files, fields);
        let envelope = multipart::build_envelope(files, fields)?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(multipart::MULTIPART_CONTENT_TYPE));
        self.request(Method::POST, url, Some(RequestBody::Buffered(envelope)), headers)
    }

    fn request(&self, method: Method, url: &str, body: Option<RequestBody>, mut headers: HeaderMap) -> Result<RawResponse> {
        info!("{} request to {}: [Data]: {}", method, url, body_preview(&body));

        // auth always wins over caller-supplied headers
        headers.insert(AUTHORIZATION, self.auth_header.clone());

        let _permit = self.gate.acquire();
        let mut request = self.client.request(method, url).headers(headers);
        request = match body {
            Some(RequestBody::Buffered(data)) => request.body(data),
            Some(RequestBody::FileStream { file, .. }) => request.body(file),
            None => request,
        };

        let response = request.send()?;
        let status = response.status().as_u16();
        let response_headers = response.headers().clone();
        let content = response.bytes()?;

        debug_response(&response_headers, &content);
        classify(status, response_headers, content)
    }
}

/// Maps a status code and fully-read body onto the error taxonomy. Total over
/// all status codes: 404 is NotFound, 400 is BadRequest, any other non-2xx is
/// RequestFailed, 2xx is success.
pub(crate) fn classify(status: u16, headers: HeaderMap, body: Bytes) -> Result<RawResponse> {
    if status == 404 {
        return Err(ImporterClientError::NotFound);
    }
    if !(200..300).contains(&status) {
        if status == 400 {
            return Err(ImporterClientError::BadRequest(parse_errors(&body)));
        }
        return Err(ImporterClientError::RequestFailed {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    Ok(RawResponse { status, headers, body })
}

/// The service reports 400 details as `{"errors": [...]}`; anything else is
/// carried verbatim as a single entry.
fn parse_errors(body: &Bytes) -> Vec<String> {
    match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(envelope) => envelope.errors,
        Err(_) => vec![String::from_utf8_lossy(body).into_owned()],
    }
}

fn basic_auth_header(username: &str, password: &str) -> Result<HeaderValue> {
    let credentials = BASE64.encode(format!("{username}:{password}"));
    let mut value = HeaderValue::from_str(&format!("Basic {credentials}")).map_err(|_| {
        ImporterClientError::ConfigurationError("credentials do not form a valid header value".to_string())
    })?;
    value.set_sensitive(true);
    Ok(value)
}

fn body_preview(body: &Option<RequestBody>) -> String {
    match body {
        None => "None".to_string(),
        Some(RequestBody::Buffered(data)) if data.len() < LOG_BODY_LIMIT => {
            String::from_utf8_lossy(data).into_owned()
        },
        Some(RequestBody::Buffered(_)) => "[Data too long...]".to_string(),
        Some(RequestBody::FileStream { path, .. }) => format!("[file: {}]", path.display()),
    }
}

fn debug_response(headers: &HeaderMap, content: &Bytes) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    debug!("response: {headers:?}");
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false);
    if is_json {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(content) {
            if let Ok(pretty) = serde_json::to_string_pretty(&value) {
                debug!("content : {pretty}");
                return;
            }
        }
    }
    debug!("content : {}", String::from_utf8_lossy(content));
}
