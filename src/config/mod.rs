use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "doc-review.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Tool configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub storage: StorageConfig,
    pub paths: PathsConfig,
}

/// Remote bucket settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    pub bucket_name: Option<String>,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    /// Prefix prepended to every object key.
    pub base_prefix: String,
    /// Custom endpoint for S3-compatible services.
    pub endpoint: Option<String>,
    pub presign_expiry_secs: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub metadata: PathBuf,
    /// Local mirror of the bucket layout, used as document fallback.
    pub documents: PathBuf,
    pub audit_download: PathBuf,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            storage: StorageConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket_name: None,
            region: "eu-central-1".to_string(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            base_prefix: "Doc_Review/".to_string(),
            endpoint: None,
            presign_expiry_secs: 3600,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            metadata: PathBuf::from("data/Manual_Review.csv"),
            documents: PathBuf::from("static/documents"),
            audit_download: PathBuf::from("audit_trail.csv"),
            log_file: PathBuf::from("doc-review.log"),
        }
    }
}

impl Config {
    /// Load configuration and apply `AWS_*` environment overrides.
    ///
    /// An explicit `path` must exist. Without one, `doc-review.toml` in the
    /// working directory is used if present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Override storage settings from `AWS_{KEY}` variables.
    ///
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let storage = &mut self.storage;

        if let Some(v) = get("AWS_BUCKET_NAME") {
            storage.bucket_name = Some(v);
        }
        if let Some(v) = get("AWS_ACCESS_KEY_ID") {
            storage.access_key_id = Some(v);
        }
        if let Some(v) = get("AWS_SECRET_ACCESS_KEY") {
            storage.secret_access_key = Some(v);
        }
        if let Some(v) = get("AWS_SESSION_TOKEN") {
            storage.session_token = Some(v);
        }
        if let Some(v) = get("AWS_REGION") {
            storage.region = v;
        }
        if let Some(v) = get("AWS_BASE_PREFIX") {
            storage.base_prefix = v;
        }
        if let Some(v) = get("AWS_ENDPOINT_URL") {
            storage.endpoint = Some(v);
        }
        if let Some(v) = get("AWS_PRESIGN_EXPIRY_SECS") {
            storage.presign_expiry_secs =
                v.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "AWS_PRESIGN_EXPIRY_SECS".to_string(),
                    value: v.clone(),
                })?;
        }

        Ok(())
    }
}
