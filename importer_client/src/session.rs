//! Session and task objects built from raw service responses.
//!
//! These stay thin on purpose: the remote side owns the real state machine.
//! Each object keeps the raw parsed value it was built from plus the shared
//! transport handle it was constructed with, so follow-up operations reuse
//! the same authenticated connection pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use importer_types::{ImportEnvelope, ImportList, ImportRecord, TaskRecord, TaskResponse};
use serde_json::Value;

use crate::error::{ImporterClientError, Result};
use crate::http_client::HttpClient;
use crate::multipart::{basename, FilePart};

/// One import session on the remote service. Entries from the session list
/// are unexpanded: id and href only.
#[derive(Debug)]
pub struct Session {
    pub id: u64,
    pub href: String,
    pub state: Option<String>,
    pub tasks: Vec<Task>,
    raw: Value,
    http: Arc<HttpClient>,
}

/// One upload task within a session.
#[derive(Debug)]
pub struct Task {
    pub id: u64,
    pub href: String,
    pub state: Option<String>,
    raw: Value,
    http: Arc<HttpClient>,
}

impl Session {
    /// The transport handle is a required constructor argument; sessions are
    /// never retroactively patched with one.
    pub(crate) fn from_value(http: Arc<HttpClient>, value: Value) -> Result<Self> {
        let record: ImportRecord = serde_json::from_value(value.clone())
            .map_err(|e| ImporterClientError::MalformedResponse(format!("import record: {e}")))?;
        let tasks = record
            .tasks
            .into_iter()
            .map(|t| Task::from_value(Arc::clone(&http), t))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            id: record.id,
            href: record.href,
            state: record.state,
            tasks,
            raw: value,
            http,
        })
    }

    /// The raw parsed response data this session was built from.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Hands files to this session for upload, one task per call.
    ///
    /// Protocol selection: `use_url` tells the service to fetch the first
    /// file itself; a single zip is PUT as an application/zip stream; any
    /// other file set goes up as one multipart request. `initial_opts` are
    /// appended to the target URL as a query string.
    pub fn upload_task(&self, files: &[PathBuf], use_url: bool, initial_opts: &[(String, String)]) -> Result<Vec<Task>> {
        let first = files
            .first()
            .ok_or_else(|| ImporterClientError::ConfigurationError("no files to upload".to_string()))?;

        let response = if use_url {
            let url = with_query(self.http.url(&format!("imports/{}/tasks", self.id)), initial_opts);
            self.http.post_upload_url(&url, &first.to_string_lossy())?
        } else if files.len() == 1 && has_extension(first, "zip") {
            let url = with_query(
                self.http.url(&format!("imports/{}/tasks/{}", self.id, basename(first))),
                initial_opts,
            );
            self.http.put_zip(&url, first)?
        } else {
            let url = with_query(self.http.url(&format!("imports/{}/tasks", self.id)), initial_opts);
            let parts: Vec<FilePart> = files.iter().map(FilePart::from_path).collect();
            self.http.post_multipart(&url, &parts, &[])?
        };

        let parsed: TaskResponse = serde_json::from_slice(&response.body)
            .map_err(|e| ImporterClientError::MalformedResponse(format!("task response: {e}")))?;
        parsed
            .into_vec()
            .into_iter()
            .map(|value| Task::from_value(Arc::clone(&self.http), value))
            .collect()
    }

    /// Deletes this session on the remote service.
    pub fn delete(&self) -> Result<()> {
        self.http.delete(&self.http.url(&format!("imports/{}", self.id)))?;
        Ok(())
    }
}

impl Task {
    pub(crate) fn from_value(http: Arc<HttpClient>, value: Value) -> Result<Self> {
        let record: TaskRecord = serde_json::from_value(value.clone())
            .map_err(|e| ImporterClientError::MalformedResponse(format!("task record: {e}")))?;
        Ok(Self {
            id: record.id,
            href: record.href,
            state: record.state,
            raw: value,
            http,
        })
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Deletes this task on the remote service.
    pub fn delete(&self) -> Result<()> {
        self.http.delete(&self.href)?;
        Ok(())
    }
}

/// Parses the `{"imports": [...]}` list envelope into unexpanded sessions.
pub(crate) fn parse_session_list(http: &Arc<HttpClient>, body: &[u8]) -> Result<Vec<Session>> {
    let list: ImportList = serde_json::from_slice(body)
        .map_err(|e| ImporterClientError::MalformedResponse(format!("imports envelope: {e}")))?;
    list.imports
        .into_iter()
        .map(|value| Session::from_value(Arc::clone(http), value))
        .collect()
}

/// Parses the `{"import": {...}}` envelope into one session.
pub(crate) fn parse_session(http: &Arc<HttpClient>, body: &[u8]) -> Result<Session> {
    let envelope: ImportEnvelope = serde_json::from_slice(body)
        .map_err(|e| ImporterClientError::MalformedResponse(format!("import envelope: {e}")))?;
    Session::from_value(Arc::clone(http), envelope.import)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

fn with_query(url: String, opts: &[(String, String)]) -> String {
    if opts.is_empty() {
        return url;
    }
    let query: Vec<String> = opts
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect();
    format!("{url}?{}", query.join("&"))
}
