//! Multipart/form-data envelope construction for file uploads.
//!
//! The envelope is assembled as raw bytes with a fixed boundary marker so the
//! framing is byte-identical from one call to the next. Field order and file
//! order are preserved exactly as supplied; the service may be sensitive to
//! order.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Fixed boundary marker; declared in the Content-Type header of every
/// multipart request.
pub(crate) const BOUNDARY: &str = "----------ThIs_Is_tHe_bouNdaRY_$";

pub(crate) const MULTIPART_CONTENT_TYPE: &str =
    "multipart/form-data; boundary=----------ThIs_Is_tHe_bouNdaRY_$";

const CRLF: &[u8] = b"\r\n";

/// One file entry of a multipart upload.
///
/// A closed set of three shapes, resolved once before the envelope is built:
/// a bare path (the field name is the path itself), a named path (bytes read
/// from disk, filename taken from the path's basename), or an in-memory
/// payload that never touches the filesystem.
#[derive(Clone)]
pub enum FilePart {
    Path(PathBuf),
    NamedPath(String, PathBuf),
    InMemory {
        name: String,
        filename: String,
        data: Vec<u8>,
    },
}

impl FilePart {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        FilePart::Path(path.into())
    }

    pub fn named(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        FilePart::NamedPath(name.into(), path.into())
    }

    pub fn in_memory(name: impl Into<String>, filename: impl Into<String>, data: Vec<u8>) -> Self {
        FilePart::InMemory {
            name: name.into(),
            filename: filename.into(),
            data,
        }
    }

    /// Resolves to (field name, filename, payload), reading from disk for the
    /// path-backed shapes.
    fn resolve(&self) -> Result<(String, String, Vec<u8>)> {
        match self {
            FilePart::Path(path) => {
                Ok((path.display().to_string(), basename(path), fs::read(path)?))
            },
            FilePart::NamedPath(name, path) => Ok((name.clone(), basename(path), fs::read(path)?)),
            FilePart::InMemory { name, filename, data } => {
                Ok((name.clone(), filename.clone(), data.clone()))
            },
        }
    }
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilePart::Path(path) => write!(f, "Path({})", path.display()),
            FilePart::NamedPath(name, path) => write!(f, "NamedPath({name}, {})", path.display()),
            FilePart::InMemory { name, filename, data } => {
                write!(f, "InMemory({name}, {filename}, {} bytes)", data.len())
            },
        }
    }
}

/// Builds the full envelope body: form fields first, then file parts, each
/// delimited by the boundary, with the terminal `--BOUNDARY--` marker exactly
/// once and a trailing CRLF.
pub(crate) fn build_envelope(files: &[FilePart], fields: &[(String, String)]) -> Result<Vec<u8>> {
    let mut lines: Vec<Vec<u8>> = Vec::new();
    for (key, value) in fields {
        lines.push(format!("--{BOUNDARY}").into_bytes());
        lines.push(format!("Content-Disposition: form-data; name=\"{key}\"").into_bytes());
        lines.push(Vec::new());
        lines.push(value.clone().into_bytes());
    }
    for part in files {
        let (name, filename, data) = part.resolve()?;
        lines.push(format!("--{BOUNDARY}").into_bytes());
        lines.push(
            format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"")
                .into_bytes(),
        );
        lines.push(format!("Content-Type: {}", content_type(&filename)).into_bytes());
        lines.push(Vec::new());
        lines.push(data);
    }
    lines.push(format!("--{BOUNDARY}--").into_bytes());
    lines.push(Vec::new());
    Ok(lines.join(CRLF))
}

/// Content type for an uploaded file, guessed from the filename extension;
/// unknown extensions fall back to application/octet-stream.
fn content_type(filename: &str) -> String {
    new_mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}

pub(crate) fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
        if needle.len() > haystack.len() {
            return 0;
        }
        haystack
            .windows(needle.len())
            .filter(|w| *w == needle)
            .count()
    }

    #[test]
    fn test_envelope_framing() {
        let files = vec![
            FilePart::in_memory("f1", "a.tif", b"tile-a".to_vec()),
            FilePart::in_memory("f2", "b.tif", b"tile-b".to_vec()),
        ];
        let fields = vec![
            ("alpha".to_string(), "1".to_string()),
            ("beta".to_string(), "2".to_string()),
        ];
        let body = build_envelope(&files, &fields).unwrap();

        // 2 field blocks + 2 file blocks, one terminal marker.
        let delimiter = format!("--{BOUNDARY}\r\n");
        let terminal = format!("--{BOUNDARY}--\r\n");
        assert_eq!(count_occurrences(&body, delimiter.as_bytes()), 4);
        assert_eq!(count_occurrences(&body, terminal.as_bytes()), 1);
        assert!(body.ends_with(terminal.as_bytes()));

        // field order then file order, preserved as supplied
        let text = String::from_utf8(body).unwrap();
        let positions: Vec<usize> = ["name=\"alpha\"", "name=\"beta\"", "name=\"f1\"", "name=\"f2\""]
            .iter()
            .map(|n| text.find(n).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_field_block_layout() {
        let body = build_envelope(&[], &[("k".to_string(), "v".to_string())]).unwrap();
        let expected = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"k\"\r\n\r\nv\r\n--{BOUNDARY}--\r\n"
        );
        assert_eq!(body, expected.as_bytes());
    }

    #[test]
    fn test_file_block_layout_and_content_type() {
        let files = vec![FilePart::in_memory("data", "tiles.zip", b"PK".to_vec())];
        let body = build_envelope(&files, &[]).unwrap();
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("Content-Disposition: form-data; name=\"data\"; filename=\"tiles.zip\"\r\n"));
        assert!(text.contains("Content-Type: application/zip\r\n"));
    }

    #[test]
    fn test_unknown_extension_defaults_to_octet_stream() {
        assert_eq!(content_type("payload.qqq"), "application/octet-stream");
        assert_eq!(content_type("payload"), "application/octet-stream");
    }

    #[test]
    fn test_binary_payload_passes_through() {
        let data = vec![0u8, 0xff, 0x80, 0x7f];
        let files = vec![FilePart::in_memory("bin", "raw.bin", data.clone())];
        let body = build_envelope(&files, &[]).unwrap();
        assert_eq!(count_occurrences(&body, &data), 1);
    }

    #[test]
    fn test_bare_path_uses_path_as_field_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roads.shp");
        fs::write(&path, b"shp-bytes").unwrap();

        let body = build_envelope(&[FilePart::from_path(&path)], &[]).unwrap();
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains(&format!("name=\"{}\"; filename=\"roads.shp\"", path.display())));
        assert!(text.contains("shp-bytes"));
    }

    #[test]
    fn test_named_path_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parcels.dbf");
        fs::write(&path, b"dbf-bytes").unwrap();

        let body = build_envelope(&[FilePart::named("parcels", &path)], &[]).unwrap();
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("name=\"parcels\"; filename=\"parcels.dbf\""));
        assert!(text.contains("dbf-bytes"));
    }

    #[test]
    fn test_missing_file_errors() {
        let part = FilePart::from_path("/nonexistent/zzz.shp");
        assert!(build_envelope(&[part], &[]).is_err());
    }

    #[test]
    fn test_empty_envelope_is_just_the_terminal_marker() {
        let body = build_envelope(&[], &[]).unwrap();
        assert_eq!(body, format!("--{BOUNDARY}--\r\n").as_bytes());
    }
}
