use std::{
    io::Read,
    time::{Duration, SystemTime},
};

use aws_sdk_s3::{
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    presigning::PresigningConfig,
    primitives::{ByteStream, DateTime},
    types::{BucketLocationConstraint, CreateBucketConfiguration},
};
use tokio::runtime::{Handle, Runtime};

use crate::{
    adapters,
    model::storage::{Bucket, ObjectItem, StorageError},
    settings::DEFAULT_REGION,
    util::{poll::poll_until_ready, stream::ByteStreamReader},
};

const DELIMITER: &str = "/";

/// aws-sdk-s3 client against any S3 compatible endpoint, driven by its own
/// small runtime so callers can stay synchronous.
pub struct S3Adapter {
    client: aws_sdk_s3::Client,
    region: String,
    handle: Handle,
    runtime: Option<Runtime>,
}

impl S3Adapter {
    pub fn new(client: aws_sdk_s3::Client, region: &str, runtime: Runtime) -> Self {
        Self {
            client,
            region: region.to_string(),
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        }
    }
}

impl Drop for S3Adapter {
    fn drop(&mut self) {
        // Dropping a runtime from async code panics; this does not.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl adapters::ObjectAdapter for S3Adapter {
    fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        let req = self.client.head_bucket().bucket(bucket);

        match poll_until_ready(&self.handle, req.send()) {
            Ok(_) => Ok(true),
            Err(err) => match classify(err, bucket) {
                StorageError::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    fn make_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        let req = self
            .client
            .create_bucket()
            .bucket(bucket)
            .set_create_bucket_configuration(location_constraint(&self.region));

        poll_until_ready(&self.handle, req.send()).map_err(|err| classify(err, bucket))?;

        Ok(())
    }

    fn remove_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        let req = self.client.delete_bucket().bucket(bucket);

        poll_until_ready(&self.handle, req.send()).map_err(|err| classify(err, bucket))?;

        Ok(())
    }

    fn list_buckets(&self) -> Result<Vec<Bucket>, StorageError> {
        let lb = poll_until_ready(&self.handle, self.client.list_buckets().send())
            .map_err(|err| classify(err, "*"))?;

        Ok(lb
            .buckets()
            .iter()
            .map(|b| Bucket {
                name: b.name().unwrap_or("").to_string(),
                creation_date: to_system_time(b.creation_date()),
            })
            .collect())
    }

    fn stat_object(&self, bucket: &str, key: &str) -> Result<ObjectItem, StorageError> {
        let req = self.client.head_object().bucket(bucket).key(key);

        let ho = poll_until_ready(&self.handle, req.send()).map_err(|err| classify(err, key))?;

        Ok(ObjectItem {
            key: key.to_string(),
            size: ho.content_length().unwrap_or(0),
            last_modified: to_system_time(ho.last_modified()),
            etag: ho.e_tag().map(str::to_string),
            content_type: ho.content_type().map(str::to_string),
            is_dir: key.ends_with(DELIMITER),
        })
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        let req = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .set_content_type(content_type.map(str::to_string));

        poll_until_ready(&self.handle, req.send()).map_err(|err| classify(err, key))?;

        Ok(key.to_string())
    }

    fn get_object<'a>(
        &'a self,
        bucket: &str,
        key: &str,
    ) -> Result<Box<dyn Read + Send + 'a>, StorageError> {
        let req = self.client.get_object().bucket(bucket).key(key);

        let o = poll_until_ready(&self.handle, req.send()).map_err(|err| classify(err, key))?;

        Ok(Box::new(ByteStreamReader::new(&self.handle, o.body)))
    }

    fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectItem>, StorageError> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let req = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .delimiter(DELIMITER)
                .set_continuation_token(continuation_token.take());

            let lo = poll_until_ready(&self.handle, req.send())
                .map_err(|err| classify(err, bucket))?;

            for p in lo.common_prefixes() {
                if let Some(prefix) = p.prefix() {
                    objects.push(ObjectItem::dir(prefix));
                }
            }

            for o in lo.contents() {
                let key = o.key().unwrap_or("");
                objects.push(ObjectItem {
                    key: key.to_string(),
                    size: o.size().unwrap_or(0),
                    last_modified: to_system_time(o.last_modified()),
                    etag: o.e_tag().map(str::to_string),
                    content_type: None,
                    is_dir: key.ends_with(DELIMITER),
                });
            }

            continuation_token = lo.next_continuation_token().map(str::to_string);
            if continuation_token.is_none() {
                break;
            }
        }

        Ok(objects)
    }

    fn remove_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let req = self.client.delete_object().bucket(bucket).key(key);

        poll_until_ready(&self.handle, req.send()).map_err(|err| classify(err, key))?;

        Ok(())
    }

    fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expiry: Duration,
    ) -> Result<String, StorageError> {
        let config = PresigningConfig::expires_in(expiry)
            .map_err(|err| StorageError::Config(format!("invalid expiry: {}", err)))?;

        let req = self.client.get_object().bucket(bucket).key(key);

        let presigned = poll_until_ready(&self.handle, req.presigned(config))
            .map_err(|err| classify(err, key))?;

        Ok(presigned.uri().to_string())
    }
}

/// Missing keys and buckets become `NotFound`; everything else is a transport
/// failure carrying the full SDK error context.
fn classify<E>(err: SdkError<E>, target: &str) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|res| res.status().as_u16());
    let code = err.as_service_error().and_then(|svc| svc.code());

    if status == Some(404) || matches!(code, Some("NoSuchKey" | "NoSuchBucket" | "NotFound")) {
        return StorageError::NotFound(target.to_string());
    }

    StorageError::Transport(format!("{}: {}", target, DisplayErrorContext(&err)))
}

fn location_constraint(region: &str) -> Option<CreateBucketConfiguration> {
    if region.is_empty() || region == DEFAULT_REGION {
        return None;
    }

    Some(
        CreateBucketConfiguration::builder()
            .location_constraint(BucketLocationConstraint::from(region))
            .build(),
    )
}

fn to_system_time(dt: Option<&DateTime>) -> Option<SystemTime> {
    dt.map(|dt| SystemTime::UNIX_EPOCH + Duration::new(dt.secs().max(0) as u64, dt.subsec_nanos()))
}
