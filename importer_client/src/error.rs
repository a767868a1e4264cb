use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ImporterClientError {
    /// The remote answered 404.
    #[error("not found")]
    NotFound,

    /// The remote answered 400; carries the service's reported error list,
    /// or the raw body as a single entry when it was not parseable.
    #[error("bad request: {0:?}")]
    BadRequest(Vec<String>),

    /// Any other non-2xx status.
    #[error("request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// A 2xx response whose body could not be interpreted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("url parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("http error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ImporterClientError>;

impl PartialEq for ImporterClientError {
    fn eq(&self, other: &ImporterClientError) -> bool {
        match (self, other) {
            (ImporterClientError::BadRequest(a), ImporterClientError::BadRequest(b)) => a == b,
            (
                ImporterClientError::RequestFailed { status: a, .. },
                ImporterClientError::RequestFailed { status: b, .. },
            ) => a == b,
            (e1, e2) => std::mem::discriminant(e1) == std::mem::discriminant(e2),
        }
    }
}
