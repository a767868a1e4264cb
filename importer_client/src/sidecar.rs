//! Shapefile sidecar-file discovery.
//!
//! A shapefile's main `.shp` file travels with auxiliary files sharing its
//! stem; the service needs the whole set in one upload.

use std::path::{Path, PathBuf};

use crate::error::{ImporterClientError, Result};

/// Sidecar extensions uploaded alongside the main file, when present.
const SIDECAR_EXTENSIONS: [&str; 3] = ["shx", "dbf", "prj"];

/// Expands a `.shp` path to the existing members of its sidecar set, main
/// file first. The sidecar extensions follow the main file's case
/// convention. Errors when the main file itself is missing.
pub(crate) fn shp_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_file() {
        return Err(ImporterClientError::ConfigurationError(format!(
            "shapefile {} does not exist",
            path.display()
        )));
    }

    let uppercase = path
        .extension()
        .map(|e| e.to_string_lossy().chars().all(|c| !c.is_ascii_lowercase()))
        .unwrap_or(false);

    let mut files = vec![path.to_path_buf()];
    for extension in SIDECAR_EXTENSIONS {
        let extension = if uppercase {
            extension.to_ascii_uppercase()
        } else {
            extension.to_string()
        };
        let candidate = path.with_extension(extension);
        if candidate.is_file() {
            files.push(candidate);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_full_sidecar_set() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["parcels.shp", "parcels.shx", "parcels.dbf", "parcels.prj"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let files = shp_files(&dir.path().join("parcels.shp")).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["parcels.shp", "parcels.shx", "parcels.dbf", "parcels.prj"]);
    }

    #[test]
    fn test_missing_members_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["roads.shp", "roads.dbf"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        // an unrelated file with the same stem is not part of the set
        fs::write(dir.path().join("roads.qix"), b"x").unwrap();

        let files = shp_files(&dir.path().join("roads.shp")).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["roads.shp", "roads.dbf"]);
    }

    #[test]
    fn test_uppercase_main_file_keeps_case() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["LOTS.SHP", "LOTS.DBF"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let files = shp_files(&dir.path().join("LOTS.SHP")).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["LOTS.SHP", "LOTS.DBF"]);
    }

    #[test]
    fn test_missing_main_file_errors() {
        let err = shp_files(Path::new("/nonexistent/void.shp")).unwrap_err();
        assert_eq!(err, ImporterClientError::ConfigurationError(String::new()));
    }
}
