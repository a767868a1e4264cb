#![cfg_attr(feature = "strict", deny(warnings))]

pub use descriptor::{ImportBody, ImportData, ImportDescriptor, StoreRef, TargetStore, TimeMode, DEFAULT_CHARSET_ENCODING};
pub use responses::{ErrorResponse, ImportEnvelope, ImportList, ImportRecord, TaskRecord, TaskResponse};

mod descriptor;
mod responses;
