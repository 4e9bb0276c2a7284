//! JSON artifact persistence
//!
//! Artifacts are written to a temporary file in the destination directory
//! and renamed over the target only once fully written, so an interrupted
//! run never leaves a truncated array behind.

use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

use super::parsing::case_list_parser::sort_cases;
use super::parsing::context::origin_of;
use crate::domain::CaseSummary;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Input file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("Input file {} is not a valid case listing: {reason}", path.display())]
    InvalidInput { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl OutputError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Serialize `value` as pretty JSON to `path`, replacing it atomically
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), OutputError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| OutputError::io(dir, e))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| OutputError::io(dir, e))?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, value).map_err(|source| OutputError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        writer.write_all(b"\n").map_err(|e| OutputError::io(path, e))?;
        writer.flush().map_err(|e| OutputError::io(path, e))?;
    }
    temp.as_file().sync_all().map_err(|e| OutputError::io(path, e))?;

    temp.persist(path).map_err(|e| OutputError::io(path, e.error))?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Read a listing artifact produced by an earlier run.
///
/// The artifact must be a non-empty array of summaries with absolute links
/// and well-formed closing dates; it is returned in listing order.
pub fn read_listing(path: &Path) -> Result<Vec<CaseSummary>, OutputError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(OutputError::MissingInput {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(OutputError::io(path, e)),
    };

    let invalid = |reason: String| OutputError::InvalidInput {
        path: path.to_path_buf(),
        reason,
    };

    let cases: Vec<CaseSummary> =
        serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
    if cases.is_empty() {
        return Err(invalid("listing contains no cases".to_string()));
    }
    if let Some(case) = cases.iter().find(|case| origin_of(&case.link).is_err()) {
        return Err(invalid(format!(
            "case '{}' has a non-absolute link '{}'",
            case.name, case.link
        )));
    }

    // Hand-edited listings come back in the order a fresh crawl would write
    sort_cases(cases).map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn summary(name: &str) -> CaseSummary {
        CaseSummary {
            name: name.to_string(),
            link: format!("https://example.org/cases/{name}"),
            status: "Open".to_string(),
            tag: "Mergers".to_string(),
            outcome: None,
            date: None,
        }
    }

    #[test]
    fn test_write_then_read_listing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/cases.json");
        let cases = vec![summary("alpha"), summary("beta")];

        write_json_atomic(&path, &cases).unwrap();

        assert_eq!(read_listing(&path).unwrap(), cases);
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cases.json");
        std::fs::write(&path, "old").unwrap();

        write_json_atomic(&path, &[summary("gamma")]).unwrap();
        assert_eq!(read_listing(&path).unwrap()[0].name, "gamma");
    }

    #[test]
    fn test_missing_listing() {
        let dir = tempdir().unwrap();
        let err = read_listing(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, OutputError::MissingInput { .. }));
    }

    #[test]
    fn test_invalid_listing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cases.json");
        std::fs::write(&path, r#"[{"name": "no link"}]"#).unwrap();

        let err = read_listing(&path).unwrap_err();
        assert!(matches!(err, OutputError::InvalidInput { .. }));
    }

    fn invalid_reason(content: &str) -> String {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cases.json");
        std::fs::write(&path, content).unwrap();

        match read_listing(&path).unwrap_err() {
            OutputError::InvalidInput { reason, .. } => reason,
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_listing_is_invalid() {
        assert_eq!(invalid_reason("[]"), "listing contains no cases");
    }

    #[test]
    fn test_relative_link_is_invalid() {
        let mut case = summary("alpha");
        case.link = "/cases/alpha".to_string();
        let content = serde_json::to_string(&[case]).unwrap();

        assert!(invalid_reason(&content).contains("/cases/alpha"));
    }

    #[test]
    fn test_malformed_date_is_invalid() {
        let mut case = summary("alpha");
        case.date = Some("2024-01-05".to_string());
        let content = serde_json::to_string(&[case]).unwrap();

        assert!(invalid_reason(&content).contains("2024-01-05"));
    }

    #[test]
    fn test_listing_is_returned_in_listing_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cases.json");
        let mut dated = summary("alpha");
        dated.date = Some("5 January 2024".to_string());
        let open = summary("zeta");
        write_json_atomic(&path, &[dated.clone(), open.clone()]).unwrap();

        assert_eq!(read_listing(&path).unwrap(), vec![open, dated]);
    }
}
