use serde::Serialize;

/// Charset sent with an import unless the caller overrides it.
pub const DEFAULT_CHARSET_ENCODING: &str = "UTF-8";

/// The JSON payload POSTed to create an import session, or PUT to update one.
///
/// Exactly one of three shapes, selected once at construction:
/// a plain file import, a raster mosaic, or a file import targeting an
/// existing data store. The service is sensitive to the exact nesting, so
/// these structs are the single source of truth for the wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportDescriptor {
    pub import: ImportBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportBody {
    pub data: ImportData,
    #[serde(rename = "targetStore", skip_serializing_if = "Option::is_none")]
    pub target_store: Option<TargetStore>,
}

/// The `data` member of an import descriptor. The `type` discriminator is
/// rendered first; `name`/`file` stay present (as null) when no name has been
/// resolved yet, which is what the service's own serializer produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ImportData {
    Mosaic {
        name: Option<String>,
        time: TimeMode,
        #[serde(rename = "charsetEncoding")]
        charset_encoding: String,
    },
    File {
        file: Option<String>,
        #[serde(rename = "charsetEncoding")]
        charset_encoding: String,
    },
}

/// Time dimension handling for mosaic imports. Only automatic detection is
/// ever requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeMode {
    pub mode: String,
}

impl Default for TimeMode {
    fn default() -> Self {
        Self { mode: "auto".to_string() }
    }
}

/// Reference to an existing data store the import should write into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetStore {
    #[serde(rename = "dataStore")]
    pub data_store: StoreRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreRef {
    pub name: String,
}

impl ImportDescriptor {
    /// Descriptor for a raster mosaic import.
    pub fn mosaic(name: Option<&str>, charset_encoding: &str) -> Self {
        Self {
            import: ImportBody {
                data: ImportData::Mosaic {
                    name: name.map(str::to_string),
                    time: TimeMode::default(),
                    charset_encoding: charset_encoding.to_string(),
                },
                target_store: None,
            },
        }
    }

    /// Descriptor for a plain single-file import.
    pub fn file(name: Option<&str>, charset_encoding: &str) -> Self {
        Self {
            import: ImportBody {
                data: ImportData::File {
                    file: name.map(str::to_string),
                    charset_encoding: charset_encoding.to_string(),
                },
                target_store: None,
            },
        }
    }

    /// Descriptor for a file import that updates an existing data store.
    pub fn file_into_store(name: Option<&str>, target_store: &str, charset_encoding: &str) -> Self {
        Self {
            import: ImportBody {
                data: ImportData::File {
                    file: name.map(str::to_string),
                    charset_encoding: charset_encoding.to_string(),
                },
                target_store: Some(TargetStore {
                    data_store: StoreRef {
                        name: target_store.to_string(),
                    },
                }),
            },
        }
    }
}
