use crate::state::ReviewEntry;
use crate::storage::{BlobStore, StorageError};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Columns of the exported audit trail, in output order.
pub const AUDIT_COLUMNS: [&str; 7] = [
    "timestamp",
    "batch",
    "doc_type",
    "v1_v2",
    "status",
    "notes",
    "decision",
];

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to serialize audit trail: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush audit trail: {0}")]
    Flush(String),
    #[error("failed to publish audit trail to {key}: {source}")]
    Publish {
        key: String,
        #[source]
        source: StorageError,
    },
    #[error("failed to write audit trail to {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, AuditError>;

/// Flat CSV row; field order matches `AUDIT_COLUMNS`.
#[derive(Debug, Serialize)]
struct AuditRow<'a> {
    timestamp: String,
    batch: &'a str,
    doc_type: &'a str,
    v1_v2: String,
    status: &'a str,
    notes: &'a str,
    decision: &'a str,
}

impl<'a> From<&'a ReviewEntry> for AuditRow<'a> {
    fn from(entry: &'a ReviewEntry) -> Self {
        Self {
            timestamp: entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            batch: &entry.batch,
            doc_type: entry.doc_type.as_str(),
            v1_v2: format!("{}-{}", entry.compared.first(), entry.compared.second()),
            status: entry.status.as_str(),
            notes: &entry.notes,
            decision: entry.decision.label(),
        }
    }
}

/// Serialize the audit log to CSV with a header row.
///
/// An empty log produces empty output (no header).
pub fn export(log: &[ReviewEntry]) -> Result<Vec<u8>> {
    if log.is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    for entry in log {
        writer.serialize(AuditRow::from(entry))?;
    }
    writer
        .into_inner()
        .map_err(|e| AuditError::Flush(e.error().to_string()))
}

/// Storage key of the audit trail exported on `date`.
pub fn audit_key(date: NaiveDate) -> String {
    format!("audit/audit_trails/{}/audit_trail.csv", date.format("%Y-%m-%d"))
}

/// Upload serialized audit bytes to the sink under the dated key.
pub fn publish(sink: &dyn BlobStore, bytes: &[u8], date: NaiveDate) -> Result<String> {
    let key = audit_key(date);
    sink.put_object_bytes(&key, bytes)
        .map_err(|source| AuditError::Publish {
            key: key.clone(),
            source,
        })?;
    tracing::info!(key = %key, sink = %sink.describe(), bytes = bytes.len(), "audit trail published");
    Ok(key)
}

/// Write a local copy of the audit trail.
pub fn save_local(bytes: &[u8], path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|source| AuditError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, bytes).map_err(|source| AuditError::Write {
        path: path.to_path_buf(),
        source,
    })
}
