use std::{io::Read, time::Duration};

use crate::model::storage::{Bucket, ObjectItem, StorageError};

pub mod mock;
pub mod s3;

/// One client handle bound to an endpoint and a credential pair.
///
/// Implementations never log-and-swallow: every failure comes back as a
/// classified [`StorageError`]. Deciding which failures to surface is left to
/// [`crate::template::ObjectTemplate`].
pub trait ObjectAdapter: Send + Sync {
    fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError>;

    fn make_bucket(&self, bucket: &str) -> Result<(), StorageError>;

    fn remove_bucket(&self, bucket: &str) -> Result<(), StorageError>;

    fn list_buckets(&self) -> Result<Vec<Bucket>, StorageError>;

    /// Metadata of `key`, `StorageError::NotFound` when absent.
    fn stat_object(&self, bucket: &str, key: &str) -> Result<ObjectItem, StorageError>;

    /// Stores `body` under `key`, replacing any existing object. Returns the
    /// stored key.
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, StorageError>;

    fn get_object<'a>(
        &'a self,
        bucket: &str,
        key: &str,
    ) -> Result<Box<dyn Read + Send + 'a>, StorageError>;

    /// Top level entries of `bucket`; folder prefixes are reported as
    /// directory items.
    fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectItem>, StorageError>;

    fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    /// GET URL for `key` signed for `expiry`. Does not check that the object
    /// exists.
    fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expiry: Duration,
    ) -> Result<String, StorageError>;
}
