use super::{BlobStore, Result, StorageError};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Directory-backed store mirroring the bucket key layout.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a key to a path under the root.
    ///
    /// Rejects absolute keys and keys containing `..`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        if key.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(relative))
    }

    fn collect_keys(&self, dir: &Path, keys: &mut Vec<String>) -> Result<()> {
        let entries = fs::read_dir(dir).map_err(|e| StorageError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(dir, e))?;
            let path = entry.path();
            if path.is_dir() {
                self.collect_keys(&path, keys)?;
            } else if let Ok(relative) = path.strip_prefix(&self.root) {
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                keys.push(key);
            }
        }
        Ok(())
    }
}

impl BlobStore for LocalStore {
    fn describe(&self) -> String {
        format!("local:{}", self.root.display())
    }

    fn probe(&self) -> Result<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(StorageError::Unreachable(format!(
                "{} is not a directory",
                self.root.display()
            )))
        }
    }

    fn get_object_bytes(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        if !path.is_file() {
            return Err(StorageError::NotFound(key.to_owned()));
        }
        fs::read(&path).map_err(|e| StorageError::io(&path, e))
    }

    fn put_object_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        fs::write(&path, bytes).map_err(|e| StorageError::io(&path, e))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        self.collect_keys(&self.root, &mut keys)?;
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }

    fn presigned_url(&self, key: &str) -> Result<String> {
        let path = self.path_for(key)?;
        let absolute = fs::canonicalize(&path).map_err(|_| StorageError::NotFound(key.to_owned()))?;
        Ok(format!("file://{}", absolute.display()))
    }
}
