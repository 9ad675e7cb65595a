use std::{
    collections::{BTreeMap, BTreeSet},
    io::{Cursor, Read},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
    time::{Duration, SystemTime},
};

use crate::{
    adapters,
    model::storage::{Bucket, ObjectItem, StorageError},
};

#[derive(Clone, Debug)]
struct MockObject {
    body: Vec<u8>,
    content_type: Option<String>,
    modified_time: SystemTime,
}

/// In-memory storage service. Buckets and objects live in sorted maps so
/// listings come back in key order, as they do from S3.
pub struct MockClient {
    endpoint: String,
    buckets: Mutex<BTreeMap<String, BTreeMap<String, MockObject>>>,
    offline: AtomicBool,
}

impl MockClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            buckets: Mutex::new(BTreeMap::new()),
            offline: AtomicBool::new(false),
        }
    }

    pub fn with_bucket(self, bucket: &str) -> Self {
        self.lock().insert(bucket.to_string(), BTreeMap::new());
        self
    }

    /// While offline every call fails with `StorageError::Transport`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, BTreeMap<String, MockObject>>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_online(&self) -> Result<(), StorageError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Transport(format!(
                "connection refused: {}",
                self.endpoint
            )));
        }
        Ok(())
    }
}

impl adapters::ObjectAdapter for MockClient {
    fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        self.check_online()?;
        Ok(self.lock().contains_key(bucket))
    }

    fn make_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        self.check_online()?;
        let mut buckets = self.lock();
        if buckets.contains_key(bucket) {
            return Err(StorageError::Transport(format!(
                "BucketAlreadyOwnedByYou: {}",
                bucket
            )));
        }
        buckets.insert(bucket.to_string(), BTreeMap::new());
        Ok(())
    }

    fn remove_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        self.check_online()?;
        let mut buckets = self.lock();
        match buckets.get(bucket) {
            None => Err(StorageError::NotFound(bucket.to_string())),
            Some(objects) if !objects.is_empty() => Err(StorageError::Transport(format!(
                "BucketNotEmpty: {}",
                bucket
            ))),
            Some(_) => {
                buckets.remove(bucket);
                Ok(())
            }
        }
    }

    fn list_buckets(&self) -> Result<Vec<Bucket>, StorageError> {
        self.check_online()?;
        Ok(self
            .lock()
            .keys()
            .map(|name| Bucket {
                name: name.clone(),
                creation_date: None,
            })
            .collect())
    }

    fn stat_object(&self, bucket: &str, key: &str) -> Result<ObjectItem, StorageError> {
        self.check_online()?;
        let buckets = self.lock();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StorageError::NotFound(bucket.to_string()))?;
        let object = objects
            .get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;

        Ok(ObjectItem {
            key: key.to_string(),
            size: object.body.len() as i64,
            last_modified: Some(object.modified_time),
            etag: None,
            content_type: object.content_type.clone(),
            is_dir: key.ends_with('/'),
        })
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        self.check_online()?;
        let mut buckets = self.lock();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::NotFound(bucket.to_string()))?;

        objects.insert(
            key.to_string(),
            MockObject {
                body,
                content_type: content_type.map(str::to_string),
                modified_time: SystemTime::now(),
            },
        );

        Ok(key.to_string())
    }

    fn get_object<'a>(
        &'a self,
        bucket: &str,
        key: &str,
    ) -> Result<Box<dyn Read + Send + 'a>, StorageError> {
        self.check_online()?;
        let buckets = self.lock();
        let object = buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;

        Ok(Box::new(Cursor::new(object.body.clone())))
    }

    fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectItem>, StorageError> {
        self.check_online()?;
        let buckets = self.lock();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StorageError::NotFound(bucket.to_string()))?;

        let mut prefixes = BTreeSet::new();
        let mut items = Vec::new();
        for (key, object) in objects {
            match key.find('/') {
                Some(pos) => {
                    prefixes.insert(key[..=pos].to_string());
                }
                None => items.push(ObjectItem {
                    key: key.clone(),
                    size: object.body.len() as i64,
                    last_modified: Some(object.modified_time),
                    etag: None,
                    content_type: object.content_type.clone(),
                    is_dir: false,
                }),
            }
        }

        let mut listing: Vec<ObjectItem> = prefixes
            .into_iter()
            .map(|prefix| ObjectItem::dir(&prefix))
            .collect();
        listing.extend(items);

        Ok(listing)
    }

    fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.check_online()?;
        let mut buckets = self.lock();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::NotFound(bucket.to_string()))?;

        // Deleting a missing key succeeds, as on S3.
        objects.remove(key);
        Ok(())
    }

    fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expiry: Duration,
    ) -> Result<String, StorageError> {
        self.check_online()?;
        Ok(format!(
            "{}/{}/{}?X-Amz-Algorithm=AWS4-HMAC-SHA256&X-Amz-Expires={}&X-Amz-Signature=mock",
            self.endpoint,
            bucket,
            key,
            expiry.as_secs()
        ))
    }
}
