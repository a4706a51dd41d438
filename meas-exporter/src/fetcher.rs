//! Fetching entries from measurement sources.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::trace;

use crate::entry::MeasEntry;

/// Errors raised while reading a measurement source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: json5::Error,
    },
    #[error("Invalid entry in {table}: {reason}")]
    InvalidEntry { table: String, reason: String },
}

/// A source of meas entries bound to one table.
///
/// Every call re-reads the source; implementations must not cache.
pub trait MeasFetcher: std::fmt::Debug + Send + Sync {
    /// Name of the table this fetcher reads.
    fn table(&self) -> &str;

    /// Read the current rows of the table.
    fn entries(&self) -> Result<Vec<MeasEntry>, FetchError>;
}

/// Where a fetcher gets its rows from.
#[derive(Debug, Clone)]
pub enum EntrySource {
    /// Fixed in-memory rows.
    Sample(Vec<MeasEntry>),
    /// A JSON5 file holding an array of `{ name, value }` objects.
    File(PathBuf),
}

impl EntrySource {
    /// Read all rows, validating them for `table`.
    pub fn read(&self, table: &str) -> Result<Vec<MeasEntry>, FetchError> {
        let entries = match self {
            EntrySource::Sample(entries) => entries.clone(),
            EntrySource::File(path) => read_entries_file(path)?,
        };

        if let Some(pos) = entries.iter().position(|e| e.name.is_empty()) {
            return Err(FetchError::InvalidEntry {
                table: table.to_string(),
                reason: format!("entry {} has an empty name", pos),
            });
        }

        trace!(table, count = entries.len(), "Read meas entries");
        Ok(entries)
    }
}

fn read_entries_file(path: &Path) -> Result<Vec<MeasEntry>, FetchError> {
    let content = std::fs::read_to_string(path).map_err(|source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    json5::from_str(&content).map_err(|source| FetchError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_sample_source() {
        let source = EntrySource::Sample(vec![
            MeasEntry::new("a", 1.0),
            MeasEntry::new("b", 2.0),
        ]);

        let entries = source.read("t").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].name, "b");
    }

    #[test]
    fn test_empty_sample_source() {
        let source = EntrySource::Sample(Vec::new());
        assert!(source.read("t").unwrap().is_empty());
    }

    #[test]
    fn test_file_source_rereads() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{ name: "a", value: 1 }}]"#).unwrap();
        file.flush().unwrap();

        let source = EntrySource::File(file.path().to_path_buf());
        assert_eq!(source.read("t").unwrap(), vec![MeasEntry::new("a", 1.0)]);

        std::fs::write(file.path(), r#"[{ name: "a", value: 2 }, { name: "b", value: 3 }]"#)
            .unwrap();
        let entries = source.read("t").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].value, 2.0);
    }

    #[test]
    fn test_file_source_missing() {
        let source = EntrySource::File(PathBuf::from("/nonexistent/meas.json5"));
        assert!(matches!(source.read("t"), Err(FetchError::Io { .. })));
    }

    #[test]
    fn test_file_source_malformed() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        file.flush().unwrap();

        let source = EntrySource::File(file.path().to_path_buf());
        assert!(matches!(source.read("t"), Err(FetchError::Parse { .. })));
    }

    #[test]
    fn test_empty_name_rejected() {
        let source = EntrySource::Sample(vec![MeasEntry::new("", 1.0)]);
        let err = source.read("diamsch_meas").unwrap_err();
        assert!(err.to_string().contains("diamsch_meas"));
    }
}
