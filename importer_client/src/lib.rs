#![cfg_attr(feature = "strict", deny(warnings))]

pub use crate::client::{EndpointConfig, ImportOpts, ImporterClient, DEFAULT_PASSWORD, DEFAULT_USERNAME};
pub use crate::error::{ImporterClientError, Result};
pub use crate::http_client::{HttpClient, RawResponse};
pub use crate::multipart::FilePart;
pub use crate::session::{Session, Task};

mod client;
mod error;
mod http_client;
mod multipart;
mod session;
mod sidecar;
