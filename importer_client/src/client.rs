//! High-level importer client.
//!
//! Translates import intents into the exact descriptor payloads the service
//! expects, sequences session creation and file upload, and hands every
//! returned session the shared transport handle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use importer_types::{ImportDescriptor, DEFAULT_CHARSET_ENCODING};
use serde::{Deserialize, Serialize};

use crate::error::{ImporterClientError, Result};
use crate::http_client::HttpClient;
use crate::session::{self, Session};
use crate::sidecar;

/// Credentials assumed when the caller supplies none; the service ships with
/// these.
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "geoserver";

/// Parameters selecting the import variant.
#[derive(Debug, Clone)]
pub struct ImportOpts {
    /// Raster mosaic import (multiple tiles, one logical coverage).
    pub mosaic: bool,
    /// Layer/file name; derived from the uploaded files when absent.
    pub name: Option<String>,
    /// Name of an existing data store to update instead of creating one.
    pub target_store: Option<String>,
    pub charset_encoding: String,
}

impl Default for ImportOpts {
    fn default() -> Self {
        Self {
            mosaic: false,
            name: None,
            target_store: None,
            charset_encoding: DEFAULT_CHARSET_ENCODING.to_string(),
        }
    }
}

/// Plain persistence record for the endpoint binding, so long-lived callers
/// can rebuild a client across process restarts without re-prompting for
/// credentials. The connection pool itself is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub url: String,
    pub username: String,
    pub password: String,
}

pub struct ImporterClient {
    http: Arc<HttpClient>,
}

impl ImporterClient {
    pub fn new(url: &str, username: Option<&str>, password: Option<&str>) -> Result<Self> {
        let http = HttpClient::new(
            url,
            username.unwrap_or(DEFAULT_USERNAME),
            password.unwrap_or(DEFAULT_PASSWORD),
        )?;
        Ok(Self { http: Arc::new(http) })
    }

    /// Rebuilds a client from a previously exported [`EndpointConfig`].
    pub fn from_config(config: &EndpointConfig) -> Result<Self> {
        Self::new(&config.url, Some(&config.username), Some(&config.password))
    }

    /// Exports the endpoint binding for persistence.
    pub fn config(&self) -> EndpointConfig {
        EndpointConfig {
            url: self.http.service_url().to_string(),
            username: self.http.username().to_string(),
            password: self.http.password().to_string(),
        }
    }

    /// The shared transport handle sessions are constructed with.
    pub fn http(&self) -> &Arc<HttpClient> {
        &self.http
    }

    /// Fetches the unexpanded session list; entries carry only id and href.
    pub fn get_sessions(&self) -> Result<Vec<Session>> {
        let response = self.http.get(&self.http.url("imports"))?;
        session::parse_session_list(&self.http, &response.body)
    }

    /// Fetches one fully expanded session by id.
    pub fn get_session(&self, id: u64) -> Result<Session> {
        let response = self.http.get(&self.http.url(&format!("imports/{id}?expand=3")))?;
        session::parse_session(&self.http, &response.body)
    }

    /// Creates a new import session, or updates the session `import_id` when
    /// one is given. The returned session's id must be at least the supplied
    /// hint; the service assigns the true id.
    pub fn start_import(&self, import_id: Option<u64>, opts: &ImportOpts) -> Result<Session> {
        let descriptor = build_descriptor(opts)?;
        let data = serde_json::to_string(&descriptor)?;
        let response = match import_id {
            Some(id) => self.http.put_json(&self.http.url(&format!("imports/{id}")), &data)?,
            None => self.http.post_json(&self.http.url("imports"), &data)?,
        };
        let session = session::parse_session(&self.http, &response.body)?;
        if let Some(hint) = import_id {
            if session.id < hint {
                return Err(ImporterClientError::MalformedResponse(format!(
                    "session id {} is below the requested id {hint}",
                    session.id
                )));
            }
        }
        Ok(session)
    }

    /// Complete import of one path: creates a session and uploads the file.
    /// A `.shp` path expands to its full sidecar set first.
    pub fn upload(
        &self,
        path: impl AsRef<Path>,
        use_url: bool,
        import_id: Option<u64>,
        mosaic: bool,
        initial_opts: &[(String, String)],
    ) -> Result<Session> {
        let path = path.as_ref();
        let files = if has_shp_extension(path) {
            sidecar::shp_files(path)?
        } else {
            vec![path.to_path_buf()]
        };
        let opts = ImportOpts {
            mosaic,
            ..Default::default()
        };
        self.upload_files(&files, use_url, import_id, &opts, initial_opts)
    }

    /// Creates (or updates) a session for `files` and hands them to it for
    /// upload. When no name is given, mosaics take the first file's stem and
    /// target-store updates its basename.
    pub fn upload_files(
        &self,
        files: &[PathBuf],
        use_url: bool,
        import_id: Option<u64>,
        opts: &ImportOpts,
        initial_opts: &[(String, String)],
    ) -> Result<Session> {
        let mut opts = opts.clone();
        if opts.name.is_none() {
            opts.name = derive_name(&opts, files);
        }

        let session = self.start_import(import_id, &opts)?;
        if !files.is_empty() {
            session.upload_task(files, use_url, initial_opts)?;
        }
        Ok(session)
    }
}

fn build_descriptor(opts: &ImportOpts) -> Result<ImportDescriptor> {
    if opts.mosaic {
        return Ok(ImportDescriptor::mosaic(opts.name.as_deref(), &opts.charset_encoding));
    }
    match &opts.target_store {
        Some(store) if store.is_empty() => Err(ImporterClientError::ConfigurationError(
            "target store name must not be empty".to_string(),
        )),
        Some(store) => Ok(ImportDescriptor::file_into_store(
            opts.name.as_deref(),
            store,
            &opts.charset_encoding,
        )),
        None => Ok(ImportDescriptor::file(opts.name.as_deref(), &opts.charset_encoding)),
    }
}

/// Mosaics are named after the first file's stem, target-store updates after
/// its full basename; a plain file import keeps whatever was supplied.
fn derive_name(opts: &ImportOpts, files: &[PathBuf]) -> Option<String> {
    let first = files.first()?;
    if opts.mosaic {
        first.file_stem().map(|s| s.to_string_lossy().into_owned())
    } else if opts.target_store.is_some() {
        first.file_name().map(|s| s.to_string_lossy().into_owned())
    } else {
        None
    }
}

fn has_shp_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("shp"))
        .unwrap_or(false)
}
