//! Batch metadata loading.
//!
//! The metadata table holds one row per (batch, version) with the portal
//! status the external system reported for it. Each row expands into one
//! `DocumentRecord` per document type, with the storage key derived from the
//! fixed naming convention `{docType}/{batch}/{batch}_{version}.pdf`.

use crate::storage::DataSource;
use crate::{DocType, DocumentRecord};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Error loading data: cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error loading data: malformed metadata: {0}")]
    Csv(#[from] csv::Error),
    #[error("Error loading data: batch {batch} has invalid version count 0")]
    InvalidVersion { batch: String },
    #[error("Error loading data: duplicate version {version} for {batch}/{doc_type}")]
    DuplicateVersion {
        batch: String,
        doc_type: DocType,
        version: u32,
    },
}

pub type Result<T> = std::result::Result<T, MetadataError>;

/// One row of the metadata table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MetadataRow {
    #[serde(rename = "Batch")]
    pub batch: String,
    pub batch_count: u32,
    #[serde(default)]
    pub portal_status: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Where the metadata rows came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataOrigin {
    File(PathBuf),
    BuiltInSample,
    /// Rows handed over by the caller.
    InMemory,
}

/// The full document table for one session.
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<DocumentRecord>,
    origin: MetadataOrigin,
    source: DataSource,
}

impl Catalog {
    /// Load the metadata file at `path`, or the built-in sample if it is absent.
    ///
    /// `source` is the data source chosen by the storage probe; it is carried
    /// on the catalog so later document fetches use the same decision.
    pub fn load(path: &Path, source: DataSource) -> Result<Self> {
        let (rows, origin) = if path.exists() {
            let file = std::fs::File::open(path).map_err(|source| MetadataError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            (read_rows(file)?, MetadataOrigin::File(path.to_path_buf()))
        } else {
            tracing::info!(path = %path.display(), "metadata file absent, using built-in sample");
            (sample_rows(), MetadataOrigin::BuiltInSample)
        };

        let records = expand(&rows)?;
        tracing::info!(records = records.len(), source = %source, "metadata loaded");

        Ok(Self {
            records,
            origin,
            source,
        })
    }

    /// Build a catalog from rows already in memory.
    pub fn from_rows(rows: &[MetadataRow], source: DataSource) -> Result<Self> {
        Ok(Self {
            records: expand(rows)?,
            origin: MetadataOrigin::InMemory,
            source,
        })
    }

    pub fn records(&self) -> &[DocumentRecord] {
        &self.records
    }

    pub fn origin(&self) -> &MetadataOrigin {
        &self.origin
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    /// Distinct batch ids, sorted.
    pub fn batches(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.batch.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct versions of one batch/type, sorted ascending.
    pub fn versions(&self, batch: &str, doc_type: DocType) -> Vec<u32> {
        self.records
            .iter()
            .filter(|r| r.batch == batch && r.doc_type == doc_type)
            .map(|r| r.version)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn find(&self, batch: &str, doc_type: DocType, version: u32) -> Option<&DocumentRecord> {
        self.records
            .iter()
            .find(|r| r.batch == batch && r.doc_type == doc_type && r.version == version)
    }
}

/// Parse metadata rows from CSV with a header line.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<MetadataRow>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for row in csv_reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Fixed demo dataset used when no metadata file exists.
pub fn sample_rows() -> Vec<MetadataRow> {
    let data = [
        ("B001", 1, "Pending", ""),
        ("B001", 2, "Accepted", "Approved by agent"),
        ("B002", 1, "Rejected", "Missing information"),
        ("B002", 2, "Pending", ""),
        ("B003", 1, "Accepted", "Complete documentation"),
        ("B003", 2, "In Review", "Waiting for verification"),
    ];

    data.iter()
        .map(|(batch, count, status, reason)| MetadataRow {
            batch: batch.to_string(),
            batch_count: *count,
            portal_status: Some(status.to_string()),
            reason: Some(reason.to_string()),
        })
        .collect()
}

/// Expand metadata rows into one record per row and document type.
pub fn expand(rows: &[MetadataRow]) -> Result<Vec<DocumentRecord>> {
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(rows.len() * DocType::ALL.len());

    for row in rows {
        if row.batch_count == 0 {
            return Err(MetadataError::InvalidVersion {
                batch: row.batch.clone(),
            });
        }

        let portal_status = row
            .portal_status
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());
        let reason = row.reason.clone().unwrap_or_default();

        for doc_type in DocType::ALL {
            if !seen.insert((row.batch.clone(), doc_type, row.batch_count)) {
                return Err(MetadataError::DuplicateVersion {
                    batch: row.batch.clone(),
                    doc_type,
                    version: row.batch_count,
                });
            }

            records.push(DocumentRecord {
                batch: row.batch.clone(),
                doc_type,
                version: row.batch_count,
                storage_key: storage_key(doc_type, &row.batch, row.batch_count),
                portal_status: portal_status.clone(),
                reason: reason.clone(),
            });
        }
    }

    Ok(records)
}

/// Storage key for a document under the fixed naming convention.
pub fn storage_key(doc_type: DocType, batch: &str, version: u32) -> String {
    format!("{doc_type}/{batch}/{batch}_{version}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_key_follows_naming_convention() {
        assert_eq!(storage_key(DocType::CI, "B001", 2), "CI/B001/B001_2.pdf");
        assert_eq!(storage_key(DocType::PL, "BATCH7", 10), "PL/BATCH7/BATCH7_10.pdf");
    }

    #[test]
    fn sample_expands_to_two_records_per_row() {
        let records = expand(&sample_rows()).unwrap();
        assert_eq!(records.len(), 12);

        let first = &records[0];
        assert_eq!(first.batch, "B001");
        assert_eq!(first.doc_type, DocType::CI);
        assert_eq!(first.version, 1);
        assert_eq!(first.storage_key, "CI/B001/B001_1.pdf");
        assert_eq!(first.portal_status, "Pending");
        assert_eq!(first.reason, "");
        assert_eq!(first.file_name(), "B001_1.pdf");
    }

    #[test]
    fn read_rows_handles_optional_columns() {
        let csv = "Batch,batch_count,portal_status,reason\n\
                   B010,1,Pending,\n\
                   B010,2,,\"Late, resubmitted\"\n";
        let rows = read_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);

        let records = expand(&rows).unwrap();
        assert_eq!(records[0].portal_status, "Pending");
        assert_eq!(records[0].reason, "");
        assert_eq!(records[2].portal_status, "Unknown");
        assert_eq!(records[2].reason, "Late, resubmitted");
    }

    #[test]
    fn read_rows_without_status_columns() {
        let rows = read_rows("Batch,batch_count\nB001,3\n".as_bytes()).unwrap();
        let records = expand(&rows).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.portal_status == "Unknown"));
    }

    #[test]
    fn malformed_count_is_an_error() {
        let err = read_rows("Batch,batch_count\nB001,many\n".as_bytes()).unwrap_err();
        assert!(matches!(err, MetadataError::Csv(_)));
    }

    #[test]
    fn duplicate_version_is_rejected() {
        let rows = read_rows("Batch,batch_count\nB001,1\nB001,1\n".as_bytes()).unwrap();
        let err = expand(&rows).unwrap_err();
        assert!(matches!(
            err,
            MetadataError::DuplicateVersion { version: 1, .. }
        ));
    }

    #[test]
    fn zero_version_is_rejected() {
        let rows = read_rows("Batch,batch_count\nB001,0\n".as_bytes()).unwrap();
        assert!(matches!(
            expand(&rows).unwrap_err(),
            MetadataError::InvalidVersion { .. }
        ));
    }

    #[test]
    fn load_falls_back_to_sample_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::load(&dir.path().join("missing.csv"), DataSource::LocalSample).unwrap();

        assert_eq!(catalog.origin(), &MetadataOrigin::BuiltInSample);
        assert_eq!(catalog.source(), DataSource::LocalSample);
        assert_eq!(catalog.batches(), vec!["B001", "B002", "B003"]);
        assert_eq!(catalog.versions("B002", DocType::PL), vec![1, 2]);
    }

    #[test]
    fn load_reads_file_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Manual_Review.csv");
        std::fs::write(
            &path,
            "Batch,batch_count,portal_status,reason\nZ9,3,Pending,\nZ9,1,Accepted,fine\n",
        )
        .unwrap();

        let catalog = Catalog::load(&path, DataSource::Remote).unwrap();
        assert_eq!(catalog.origin(), &MetadataOrigin::File(path.clone()));
        assert_eq!(catalog.records().len(), 4);
        assert_eq!(catalog.versions("Z9", DocType::CI), vec![1, 3]);
        assert_eq!(
            catalog.find("Z9", DocType::PL, 1).map(|r| r.reason.as_str()),
            Some("fine")
        );
        assert!(catalog.find("Z9", DocType::PL, 2).is_none());
    }

    #[test]
    fn rows_in_memory_are_not_the_sample() {
        let rows = read_rows("Batch,batch_count\nQ1,1\nQ1,2\n".as_bytes()).unwrap();
        let catalog = Catalog::from_rows(&rows, DataSource::Remote).unwrap();

        assert_eq!(catalog.origin(), &MetadataOrigin::InMemory);
        assert_eq!(catalog.source(), DataSource::Remote);
        assert_eq!(catalog.batches(), vec!["Q1"]);
    }
}
