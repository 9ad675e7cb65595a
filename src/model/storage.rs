use std::time::SystemTime;

use thiserror::Error;

/// A bucket as reported by the storage service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bucket {
    pub name: String,
    pub creation_date: Option<SystemTime>,
}

/// An entry of the default bucket. Folder prefixes are reported with
/// `is_dir` set and no size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectItem {
    pub key: String,
    pub size: i64,
    pub last_modified: Option<SystemTime>,
    pub etag: Option<String>,
    pub content_type: Option<String>,
    pub is_dir: bool,
}

impl ObjectItem {
    pub fn file(key: &str, size: i64) -> Self {
        Self {
            key: key.to_string(),
            size,
            last_modified: None,
            etag: None,
            content_type: None,
            is_dir: false,
        }
    }

    pub fn dir(prefix: &str) -> Self {
        Self {
            key: prefix.to_string(),
            size: 0,
            last_modified: None,
            etag: None,
            content_type: None,
            is_dir: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, StorageError::PreconditionFailed(_))
    }
}
