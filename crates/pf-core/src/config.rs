//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! server, auth, storage and upload sections. Every section defaults
//! sensibly so a completely empty `{}` file is valid. Deployment-specific
//! values (bucket, region, root prefix) are usually supplied through the
//! environment and layered on top with [`Config::apply_overrides`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::keypath::{KeyPaths, DEFAULT_ROOT_PREFIX};
use crate::Error;

/// Environment variable naming the bucket.
pub const ENV_BUCKET: &str = "S3_BUCKET_NAME";
/// Environment variable naming the storage region.
pub const ENV_REGION: &str = "AWS_REGION";
/// Environment variable overriding the S3 endpoint (MinIO, R2, ...).
pub const ENV_ENDPOINT: &str = "S3_ENDPOINT_URL";
/// Environment variable overriding the root prefix.
pub const ENV_ROOT_PREFIX: &str = "PORTAL_PREFIX";
/// Environment variable selecting the storage backend (`s3` or `memory`).
pub const ENV_BACKEND: &str = "PORTALFS_STORAGE_BACKEND";

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Load configuration strictly: a missing or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Layer environment-style overrides on top of the file values.
    ///
    /// `lookup` is usually `|k| std::env::var(k).ok()`; empty values are
    /// ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(bucket) = get(ENV_BUCKET) {
            self.storage.bucket = bucket;
        }
        if let Some(region) = get(ENV_REGION) {
            self.storage.region = region;
        }
        if let Some(endpoint) = get(ENV_ENDPOINT) {
            self.storage.endpoint = Some(endpoint);
        }
        if let Some(prefix) = get(ENV_ROOT_PREFIX) {
            self.storage.root_prefix = prefix;
        }
        if let Some(backend) = get(ENV_BACKEND) {
            match backend.to_ascii_lowercase().as_str() {
                "s3" => self.storage.backend = StorageBackend::S3,
                "memory" => self.storage.backend = StorageBackend::Memory,
                other => tracing::warn!("Ignoring unknown {ENV_BACKEND} value '{other}'"),
            }
        }
    }

    /// Translator bound to the configured root prefix.
    pub fn key_paths(&self) -> KeyPaths {
        KeyPaths::new(&self.storage.root_prefix)
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.auth.enabled {
            if self.auth.api_key.is_none() && self.auth.username.is_none() {
                warnings.push("auth is enabled but neither api_key nor username is set".into());
            }
            if self.auth.username.is_some() && self.auth.password_hash.is_none() {
                warnings.push("auth username is set but password_hash is missing".into());
            }
        }

        if self.storage.backend == StorageBackend::S3 && self.storage.bucket.trim().is_empty() {
            warnings.push(format!(
                "storage.bucket is empty; set it in the config file or via {ENV_BUCKET}"
            ));
        }

        if KeyPaths::segments(&self.storage.root_prefix).is_empty() {
            warnings.push(format!(
                "storage.root_prefix is empty; falling back to '{DEFAULT_ROOT_PREFIX}'"
            ));
        }

        if self.upload.max_bytes == 0 {
            warnings.push("upload.max_bytes is 0; every upload will be rejected".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding a built browser UI, served as an SPA fallback.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            static_dir: None,
        }
    }
}

/// Authentication settings. When disabled every write is allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub username: Option<String>,
    /// Bcrypt hash (generate with `portalfs hash-password`).
    pub password_hash: Option<String>,
    pub session_timeout_hours: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            username: None,
            password_hash: None,
            session_timeout_hours: default_session_timeout(),
        }
    }
}

fn default_session_timeout() -> u64 {
    24
}

/// Which object-store implementation backs the directory services.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    S3,
    /// In-process store; contents are lost on restart.
    Memory,
}

/// Object storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible services.
    pub endpoint: Option<String>,
    /// Use path-style addressing (required by most S3-compatible services).
    pub force_path_style: bool,
    /// Prefix under which every folder and image lives.
    pub root_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            bucket: String::new(),
            region: "ap-northeast-1".into(),
            endpoint: None,
            force_path_style: false,
            root_prefix: DEFAULT_ROOT_PREFIX.into(),
        }
    }
}

/// Upload limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum request body size for uploads, in bytes.
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 25 * 1024 * 1024,
        }
    }
}
