use std::fmt;

use clap::Args;
use serde::Deserialize;

pub const DEFAULT_REGION: &str = "us-east-1";

/// Storage settings as read from flags, `MINIO_*` environment variables or a
/// host application's configuration file. Any of the four connection keys may
/// be missing; see [`Settings::resolve`].
#[derive(Args, Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    /// Storage service address, e.g. http://localhost:9000
    #[arg(long, env = "MINIO_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Default bucket targeted by every object operation
    #[arg(long, env = "MINIO_BUCKET_NAME")]
    pub bucket_name: Option<String>,

    #[arg(long, env = "MINIO_ACCESS_KEY")]
    pub access_key: Option<String>,

    #[arg(long, env = "MINIO_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Create the default bucket at startup when it is missing
    #[arg(long, env = "MINIO_AUTO_CREATE")]
    pub auto_create: bool,

    #[arg(long, env = "MINIO_REGION")]
    pub region: Option<String>,
}

impl Settings {
    /// The immutable settings the storage layer runs with, or `None` when
    /// any of endpoint, bucket name, access key or secret key is missing or
    /// empty.
    pub fn resolve(&self) -> Option<StorageSettings> {
        Some(StorageSettings {
            endpoint: present(&self.endpoint)?,
            bucket_name: present(&self.bucket_name)?,
            access_key: present(&self.access_key)?,
            secret_key: present(&self.secret_key)?,
            auto_create: self.auto_create,
            region: present(&self.region).unwrap_or_else(|| DEFAULT_REGION.to_string()),
        })
    }

    /// Names of the connection keys that keep storage disabled.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        [
            ("endpoint", &self.endpoint),
            ("bucket-name", &self.bucket_name),
            ("access-key", &self.access_key),
            ("secret-key", &self.secret_key),
        ]
        .into_iter()
        .filter(|(_, value)| present(value).is_none())
        .map(|(name, _)| name)
        .collect()
    }
}

fn present(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

#[derive(Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub endpoint: String,
    pub bucket_name: String,
    pub access_key: String,
    pub secret_key: String,
    pub auto_create: bool,
    pub region: String,
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSettings")
            .field("endpoint", &self.endpoint)
            .field("bucket_name", &self.bucket_name)
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .field("auto_create", &self.auto_create)
            .field("region", &self.region)
            .finish()
    }
}
