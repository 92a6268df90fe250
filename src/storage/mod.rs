//! Object storage for documents and audit exports.
//!
//! `BlobStore` is the seam the rest of the crate depends on. `S3Store` talks
//! to the remote bucket, `LocalStore` mirrors the same key layout in a local
//! directory and serves as the fallback when the bucket is unreachable.

mod local;
mod s3;

pub use local::LocalStore;
pub use s3::S3Store;

use crate::config::Config;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("S3 bucket name not configured")]
    MissingBucket,
    #[error("storage configuration error: {0}")]
    Config(String),
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("storage unreachable: {0}")]
    Unreachable(String),
    #[error("object store error: {0}")]
    Backend(#[from] object_store::Error),
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Blob storage operations used by the review tool.
///
/// Keys are relative to the store's base (the bucket prefix for S3, the
/// root directory for local storage) and always use `/` separators.
pub trait BlobStore {
    /// Short human-readable description, e.g. `s3://bucket/Doc_Review/`.
    fn describe(&self) -> String;

    /// Cheap connectivity check.
    fn probe(&self) -> Result<()>;

    fn get_object_bytes(&self, key: &str) -> Result<Vec<u8>>;

    fn put_object_bytes(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// List keys under `prefix`, relative to the store's base, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    fn presigned_url(&self, key: &str) -> Result<String>;

    /// Upload a local file under `key`.
    fn upload(&self, local_path: &Path, key: &str) -> Result<()> {
        let bytes = std::fs::read(local_path).map_err(|e| StorageError::io(local_path, e))?;
        self.put_object_bytes(key, &bytes)
    }

    /// Download `key` into `local_path`, creating parent directories.
    fn download(&self, key: &str, local_path: &Path) -> Result<()> {
        let bytes = self.get_object_bytes(key)?;
        if let Some(parent) = local_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        std::fs::write(local_path, bytes).map_err(|e| StorageError::io(local_path, e))
    }
}

/// Which backend a session reads documents from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Remote,
    LocalSample,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Remote => f.write_str("remote"),
            DataSource::LocalSample => f.write_str("local-sample"),
        }
    }
}

/// Where a fetched document's bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Remote,
    Local,
}

/// Document bytes plus their origin.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    pub origin: Origin,
}

/// Storage for one session: the data source decision plus both backends.
pub struct Storage {
    source: DataSource,
    remote: Option<Box<dyn BlobStore>>,
    local: LocalStore,
    probe_error: Option<String>,
}

impl Storage {
    /// Build the remote store from configuration and probe it once.
    ///
    /// Any failure (missing bucket, bad credentials, unreachable endpoint)
    /// selects `DataSource::LocalSample` and is logged as a warning.
    pub fn connect(config: &Config) -> Self {
        let local = LocalStore::new(&config.paths.documents);
        let remote = S3Store::new(&config.storage).map(|s| Box::new(s) as Box<dyn BlobStore>);
        Self::with_remote(remote, local)
    }

    /// Select the data source from an already-built remote store.
    pub fn with_remote(remote: Result<Box<dyn BlobStore>>, local: LocalStore) -> Self {
        let probed = remote.and_then(|store| store.probe().map(|()| store));
        match probed {
            Ok(store) => {
                tracing::info!(store = %store.describe(), "connected to remote storage");
                Self {
                    source: DataSource::Remote,
                    remote: Some(store),
                    local,
                    probe_error: None,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, local = %local.describe(), "remote storage unavailable, using local data");
                Self {
                    source: DataSource::LocalSample,
                    remote: None,
                    local,
                    probe_error: Some(e.to_string()),
                }
            }
        }
    }

    /// Local-only storage, no probe.
    pub fn local_only(local: LocalStore) -> Self {
        Self {
            source: DataSource::LocalSample,
            remote: None,
            local,
            probe_error: None,
        }
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    /// Why the remote probe failed, if it did.
    pub fn probe_error(&self) -> Option<&str> {
        self.probe_error.as_deref()
    }

    /// Store that exports and uploads go to.
    pub fn sink(&self) -> &dyn BlobStore {
        match &self.remote {
            Some(remote) => remote.as_ref(),
            None => &self.local,
        }
    }

    /// Fetch a document, falling back to the local copy when the remote read fails.
    ///
    /// Returns `None` when neither backend has the document.
    pub fn fetch_document(&self, key: &str) -> Option<Fetched> {
        if key.is_empty() {
            return None;
        }

        if let Some(remote) = &self.remote {
            match remote.get_object_bytes(key) {
                Ok(bytes) => {
                    return Some(Fetched {
                        bytes,
                        origin: Origin::Remote,
                    });
                }
                Err(e) => tracing::warn!(key, error = %e, "error fetching from remote storage"),
            }
        }

        match self.local.get_object_bytes(key) {
            Ok(bytes) => {
                tracing::info!(key, "using local file");
                Some(Fetched {
                    bytes,
                    origin: Origin::Local,
                })
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "no local fallback for document");
                None
            }
        }
    }
}

/// Join a base prefix and a relative key, e.g. `Doc_Review/` + `CI/x.pdf`.
pub fn full_key(base_prefix: &str, relative_key: &str) -> String {
    format!("{}{}", base_prefix, relative_key)
}

/// Strip a base prefix from a full key, if present.
pub fn relative_key<'a>(base_prefix: &str, full: &'a str) -> &'a str {
    full.strip_prefix(base_prefix).unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    /// In-memory store with a switchable failure mode.
    struct MemoryStore {
        objects: RefCell<BTreeMap<String, Vec<u8>>>,
        fail: bool,
    }

    impl MemoryStore {
        fn new(fail: bool) -> Self {
            Self {
                objects: RefCell::new(BTreeMap::new()),
                fail,
            }
        }
    }

    impl BlobStore for MemoryStore {
        fn describe(&self) -> String {
            "memory".to_string()
        }

        fn probe(&self) -> Result<()> {
            if self.fail {
                Err(StorageError::Unreachable("offline".to_string()))
            } else {
                Ok(())
            }
        }

        fn get_object_bytes(&self, key: &str) -> Result<Vec<u8>> {
            self.objects
                .borrow()
                .get(key)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(key.to_string()))
        }

        fn put_object_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
            self.objects
                .borrow_mut()
                .insert(key.to_string(), bytes.to_vec());
            Ok(())
        }

        fn list(&self, prefix: &str) -> Result<Vec<String>> {
            Ok(self
                .objects
                .borrow()
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        }

        fn presigned_url(&self, key: &str) -> Result<String> {
            Ok(format!("memory://{key}"))
        }
    }

    #[test]
    fn full_and_relative_keys() {
        assert_eq!(full_key("Doc_Review/", "CI/B001/B001_1.pdf"), "Doc_Review/CI/B001/B001_1.pdf");
        assert_eq!(relative_key("Doc_Review/", "Doc_Review/PL/a.pdf"), "PL/a.pdf");
        assert_eq!(relative_key("Doc_Review/", "other/a.pdf"), "other/a.pdf");
    }

    #[test]
    fn failed_probe_selects_local_sample() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::with_remote(
            Ok(Box::new(MemoryStore::new(true))),
            LocalStore::new(dir.path()),
        );
        assert_eq!(storage.source(), DataSource::LocalSample);
        assert!(storage.probe_error().unwrap().contains("offline"));
        assert!(storage.sink().describe().starts_with("local:"));
    }

    #[test]
    fn missing_bucket_selects_local_sample() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::with_remote(Err(StorageError::MissingBucket), LocalStore::new(dir.path()));
        assert_eq!(storage.source(), DataSource::LocalSample);
        assert_eq!(storage.probe_error(), Some("S3 bucket name not configured"));
    }

    #[test]
    fn fetch_prefers_remote_then_falls_back_to_local() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalStore::new(dir.path());
        local.put_object_bytes("CI/B001/B001_2.pdf", b"local-2").unwrap();
        local.put_object_bytes("CI/B001/B001_1.pdf", b"local-1").unwrap();

        let remote = MemoryStore::new(false);
        remote.put_object_bytes("CI/B001/B001_1.pdf", b"remote-1").unwrap();

        let storage = Storage::with_remote(Ok(Box::new(remote)), local);
        assert_eq!(storage.source(), DataSource::Remote);

        let first = storage.fetch_document("CI/B001/B001_1.pdf").unwrap();
        assert_eq!(first.bytes, b"remote-1");
        assert_eq!(first.origin, Origin::Remote);

        let second = storage.fetch_document("CI/B001/B001_2.pdf").unwrap();
        assert_eq!(second.bytes, b"local-2");
        assert_eq!(second.origin, Origin::Local);

        assert!(storage.fetch_document("CI/B001/B001_3.pdf").is_none());
        assert!(storage.fetch_document("").is_none());
    }

    #[test]
    fn default_upload_and_download_go_through_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.pdf");
        std::fs::write(&src, b"%PDF-1.5").unwrap();

        let store = MemoryStore::new(false);
        store.upload(&src, "PL/B002/B002_1.pdf").unwrap();
        assert_eq!(store.list("PL/").unwrap(), vec!["PL/B002/B002_1.pdf"]);

        let dest = dir.path().join("nested/out.pdf");
        store.download("PL/B002/B002_1.pdf", &dest).unwrap();
        assert_eq!(std::fs::read(dest).unwrap(), b"%PDF-1.5");

        let missing = store.upload(&dir.path().join("absent.pdf"), "x");
        assert!(matches!(missing, Err(StorageError::Io { .. })));
    }
}
