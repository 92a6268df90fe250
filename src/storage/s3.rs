use super::{BlobStore, Result, StorageError, full_key, relative_key};
use crate::config::StorageConfig;
use futures::TryStreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::{ClientOptions, ObjectMeta, ObjectStore, PutPayload, RetryConfig};
use std::time::Duration;
use tokio::runtime::Runtime;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// S3 bucket store. All keys live under the configured base prefix.
///
/// Calls block on a private current-thread runtime; the review tool is
/// synchronous end to end.
pub struct S3Store {
    inner: AmazonS3,
    runtime: Runtime,
    bucket: String,
    base_prefix: String,
    presign_expiry: Duration,
}

impl S3Store {
    /// Build a store from configuration. Does not touch the network.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let bucket = config
            .bucket_name
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .ok_or(StorageError::MissingBucket)?
            .to_string();

        // Failures are reported once; nothing is retried
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&bucket)
            .with_region(&config.region)
            .with_retry(RetryConfig {
                max_retries: 0,
                ..RetryConfig::default()
            })
            .with_client_options(ClientOptions::new().with_connect_timeout(CONNECT_TIMEOUT));
        if let Some(key_id) = &config.access_key_id {
            builder = builder.with_access_key_id(key_id);
        }
        if let Some(secret) = &config.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        if let Some(token) = &config.session_token {
            builder = builder.with_token(token);
        }
        if let Some(endpoint) = &config.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }
        let inner = builder
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StorageError::Config(format!("cannot start storage runtime: {e}")))?;

        Ok(Self {
            inner,
            runtime,
            bucket,
            base_prefix: config.base_prefix.clone(),
            presign_expiry: Duration::from_secs(config.presign_expiry_secs),
        })
    }

    fn object_path(&self, key: &str) -> Result<ObjectPath> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        ObjectPath::parse(full_key(&self.base_prefix, key))
            .map_err(|e| StorageError::InvalidKey(format!("{key}: {e}")))
    }

    fn prefix_path(&self, prefix: &str) -> ObjectPath {
        ObjectPath::from(full_key(&self.base_prefix, prefix).as_str())
    }
}

impl BlobStore for S3Store {
    fn describe(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.base_prefix)
    }

    fn probe(&self) -> Result<()> {
        let prefix = self.prefix_path("");
        self.runtime.block_on(async {
            let mut listing = self.inner.list(Some(&prefix));
            listing.try_next().await?;
            Ok::<(), StorageError>(())
        })
    }

    fn get_object_bytes(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(key)?;
        self.runtime.block_on(async {
            let result = self.inner.get(&path).await.map_err(|e| match e {
                object_store::Error::NotFound { .. } => StorageError::NotFound(key.to_owned()),
                other => StorageError::Backend(other),
            })?;
            Ok::<Vec<u8>, StorageError>(result.bytes().await?.to_vec())
        })
    }

    fn put_object_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.object_path(key)?;
        let payload = PutPayload::from(bytes.to_vec());
        self.runtime.block_on(async {
            self.inner.put(&path, payload).await?;
            tracing::debug!(key, "uploaded object");
            Ok::<(), StorageError>(())
        })
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let wanted = full_key(&self.base_prefix, prefix);
        let root = match list_root(&wanted) {
            "" => None,
            parent => Some(ObjectPath::from(parent)),
        };
        let objects: Vec<ObjectMeta> = self
            .runtime
            .block_on(async { self.inner.list(root.as_ref()).try_collect().await })?;

        let mut keys: Vec<String> = objects
            .iter()
            .map(|meta| meta.location.as_ref())
            .filter(|full| full.starts_with(&wanted))
            .map(|full| relative_key(&self.base_prefix, full).to_string())
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn presigned_url(&self, key: &str) -> Result<String> {
        let path = self.object_path(key)?;
        let url = self.runtime.block_on(async {
            self.inner
                .signed_url(http::Method::GET, &path, self.presign_expiry)
                .await
        })?;
        Ok(url.to_string())
    }
}

/// Last whole segment of a key prefix.
///
/// Listing works on path segments, so `CI/B00` must be listed from `CI` and
/// then filtered by plain string prefix.
fn list_root(full_prefix: &str) -> &str {
    match full_prefix.rfind('/') {
        Some(idx) => &full_prefix[..idx],
        None => "",
    }
}
