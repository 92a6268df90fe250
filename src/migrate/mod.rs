//! Bulk upload of a local batch tree into the document store.
//!
//! Source layout:
//!
//! ```text
//! <source>/BATCH001/CI/anything_1.pdf   -> CI/BATCH001/BATCH001_1.pdf
//! <source>/BATCH001/PL/anything_2.pdf   -> PL/BATCH001/BATCH001_2.pdf
//! <source>/BATCH001/RG_summary.xlsx     -> audit/BATCH001/RG_summary.xlsx
//! ```

use crate::DocType;
use crate::storage::BlobStore;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("source directory not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, MigrateError>;

/// Outcome of a migration run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub batches: usize,
    pub uploaded: Vec<String>,
    pub failed: Vec<PathBuf>,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Upload every `BATCH*` directory under `source_dir` to `sink`.
///
/// Upload failures are logged and recorded in the report; only a missing or
/// unreadable source directory aborts the run.
pub fn run(source_dir: &Path, sink: &dyn BlobStore) -> Result<MigrationReport> {
    if !source_dir.is_dir() {
        tracing::error!(source = %source_dir.display(), "source directory not found");
        return Err(MigrateError::SourceNotFound(source_dir.to_path_buf()));
    }

    let mut report = MigrationReport::default();
    let batch_dirs = sorted_entries(source_dir, |path| {
        path.is_dir() && file_name(path).is_some_and(|n| n.starts_with("BATCH"))
    })?;

    for batch_path in batch_dirs {
        let Some(batch) = file_name(&batch_path).map(str::to_owned) else {
            continue;
        };
        tracing::info!(batch, "processing batch");
        report.batches += 1;

        if let Err(e) = migrate_batch(&batch_path, &batch, sink, &mut report) {
            tracing::error!(batch, error = %e, "error processing batch");
            report.failed.push(batch_path);
        }
    }

    tracing::info!(
        batches = report.batches,
        uploaded = report.uploaded.len(),
        failed = report.failed.len(),
        "migration finished"
    );
    Ok(report)
}

fn migrate_batch(
    batch_path: &Path,
    batch: &str,
    sink: &dyn BlobStore,
    report: &mut MigrationReport,
) -> Result<()> {
    for doc_type in DocType::ALL {
        let type_dir = batch_path.join(doc_type.as_str());
        if !type_dir.is_dir() {
            continue;
        }
        let pdfs = sorted_entries(&type_dir, |path| {
            path.is_file() && path.extension().is_some_and(|e| e == "pdf")
        })?;
        for pdf in pdfs {
            let Some(version) = version_suffix(&pdf) else {
                tracing::warn!(path = %pdf.display(), "skipping file without version suffix");
                continue;
            };
            let key = format!("{}/{}/{}_{}.pdf", doc_type, batch, batch, version);
            upload(sink, &pdf, key, report);
        }
    }

    let workbooks = sorted_entries(batch_path, |path| {
        path.is_file()
            && path.extension().is_some_and(|e| e == "xlsx")
            && file_name(path).is_some_and(|n| n.starts_with("RG"))
    })?;
    for workbook in workbooks {
        if let Some(name) = file_name(&workbook) {
            let key = format!("audit/{}/{}", batch, name);
            upload(sink, &workbook, key, report);
        }
    }

    Ok(())
}

fn upload(sink: &dyn BlobStore, path: &Path, key: String, report: &mut MigrationReport) {
    match sink.upload(path, &key) {
        Ok(()) => {
            tracing::info!(key, "uploaded");
            report.uploaded.push(key);
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to upload");
            report.failed.push(path.to_path_buf());
        }
    }
}

/// Version from a file stem: the text after the last `_`.
fn version_suffix(path: &Path) -> Option<&str> {
    let stem = path.file_stem()?.to_str()?;
    let (_, version) = stem.rsplit_once('_')?;
    (!version.is_empty()).then_some(version)
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

fn sorted_entries<F>(dir: &Path, keep: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    let read_err = |source: std::io::Error| MigrateError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if keep(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
