use std::{
    io::{self, Read},
    time::Duration,
};

use tracing::{error, info, span, Level};

use crate::{
    adapters::ObjectAdapter,
    model::storage::{Bucket, ObjectItem, StorageError},
    settings::StorageSettings,
    transfer::{MultipartFile, ResponseSink, CONTENT_DISPOSITION},
    util,
};

pub const PREVIEW_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

/// Bucket and object operations over one client handle.
///
/// Object operations always target the configured default bucket; bucket
/// operations take the bucket name explicitly.
///
/// Failure reporting differs per operation. `bucket_exists` returns every
/// error. `bucket_create` and `bucket_delete` return only their precondition
/// failure and log anything else. The remaining operations log failures and
/// report them as `false` or `None`. Callers that need to tell a missing
/// object from a broken connection can go through [`ObjectTemplate::adapter`].
pub struct ObjectTemplate {
    client: Box<dyn ObjectAdapter>,
    settings: StorageSettings,
}

impl ObjectTemplate {
    pub fn new(client: Box<dyn ObjectAdapter>, settings: StorageSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &StorageSettings {
        &self.settings
    }

    pub fn bucket_name(&self) -> &str {
        &self.settings.bucket_name
    }

    pub fn adapter(&self) -> &dyn ObjectAdapter {
        self.client.as_ref()
    }

    pub fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        let span = span!(Level::INFO, "bucket_exists", context = "bucket_exists");
        let _e = span.enter();
        info!(bucket = bucket, "called");

        self.client.bucket_exists(bucket).map_err(|err| {
            error!(error_message=%err, error_group="bucket_exists", bucket=bucket);
            err
        })
    }

    /// Fails when the bucket already exists. The existence check and the
    /// creation are two separate calls, so concurrent callers may both pass
    /// the check; the storage service then rejects the second creation and
    /// that rejection is only logged.
    pub fn bucket_create(&self, bucket: &str) -> Result<(), StorageError> {
        let span = span!(Level::INFO, "bucket_create", context = "bucket_create");
        let _e = span.enter();
        info!(bucket = bucket, "called");

        if self.bucket_exists(bucket)? {
            return Err(StorageError::PreconditionFailed(format!(
                "bucket {} already exists",
                bucket
            )));
        }

        if let Err(err) = self.client.make_bucket(bucket) {
            error!(error_message=%err, error_group="make_bucket", bucket=bucket);
        }

        Ok(())
    }

    pub fn bucket_delete(&self, bucket: &str) -> Result<(), StorageError> {
        let span = span!(Level::INFO, "bucket_delete", context = "bucket_delete");
        let _e = span.enter();
        info!(bucket = bucket, "called");

        if !self.bucket_exists(bucket)? {
            return Err(StorageError::PreconditionFailed(format!(
                "bucket {} does not exist",
                bucket
            )));
        }

        if let Err(err) = self.client.remove_bucket(bucket) {
            error!(error_message=%err, error_group="remove_bucket", bucket=bucket);
        }

        Ok(())
    }

    pub fn bucket_list(&self) -> Option<Vec<Bucket>> {
        let span = span!(Level::INFO, "bucket_list", context = "bucket_list");
        let _e = span.enter();
        info!("called");

        match self.client.list_buckets() {
            Err(err) => {
                error!(error_message=%err, error_group="list_buckets");
                None
            }
            Ok(buckets) => Some(buckets),
        }
    }

    /// Any failure, including a broken connection, reads as "does not exist".
    pub fn object_exists(&self, key: &str) -> bool {
        let span = span!(Level::INFO, "object_exists", context = "object_exists");
        let _e = span.enter();
        info!(bucket = self.bucket_name(), key = key, "called");

        match self.client.stat_object(self.bucket_name(), key) {
            Err(err) => {
                if !err.is_not_found() {
                    error!(error_message=%err, error_group="stat_object", key=key);
                }
                false
            }
            Ok(_) => true,
        }
    }

    /// Stores an empty folder marker at `path`, normalized to end in "/".
    #[doc(alias = "create_dictionary")]
    pub fn create_directory(&self, path: &str) -> Option<String> {
        let span = span!(Level::INFO, "create_directory", context = "create_directory");
        let _e = span.enter();

        let key = util::object::directory_key(path);
        info!(bucket = self.bucket_name(), key = %key, "called");

        match self.client.put_object(self.bucket_name(), &key, Vec::new(), None) {
            Err(err) => {
                error!(error_message=%err, error_group="create_directory", key=%key);
                None
            }
            Ok(stored) => Some(stored),
        }
    }

    /// Uploads `file` under its original filename with its content type.
    pub fn put_file(&self, file: &dyn MultipartFile) -> Option<String> {
        let reader = match file.open() {
            Err(err) => {
                error!(
                    error_message=%err,
                    error_group="open_upload",
                    filename=file.original_filename()
                );
                return None;
            }
            Ok(reader) => reader,
        };

        self.put_object(reader, file.original_filename(), file.content_type())
    }

    /// Stores the contents of `reader` under `name`, silently replacing any
    /// object already there. Returns the stored key.
    pub fn put_object<R: Read>(
        &self,
        mut reader: R,
        name: &str,
        content_type: Option<&str>,
    ) -> Option<String> {
        let span = span!(Level::INFO, "put_object", context = "put_object");
        let _e = span.enter();
        info!(
            bucket = self.bucket_name(),
            key = name,
            content_type = content_type,
            "called"
        );

        let mut body = Vec::new();
        if let Err(err) = reader.read_to_end(&mut body) {
            error!(error_message=%err, error_group="read_upload", key=name);
            return None;
        }

        match self
            .client
            .put_object(self.bucket_name(), name, body, content_type)
        {
            Err(err) => {
                error!(error_message=%err, error_group="put_object", key=name);
                None
            }
            Ok(stored) => Some(stored),
        }
    }

    /// GET URL for `key` valid for 24 hours. The object is not required to
    /// exist.
    pub fn preview(&self, key: &str) -> Option<String> {
        let span = span!(Level::INFO, "preview", context = "preview");
        let _e = span.enter();
        info!(bucket = self.bucket_name(), key = key, "called");

        match self
            .client
            .presigned_get_url(self.bucket_name(), key, PREVIEW_EXPIRY)
        {
            Err(err) => {
                error!(error_message=%err, error_group="preview", key=key);
                None
            }
            Ok(url) => Some(url),
        }
    }

    /// Streams `key` into `sink` as an attachment. Failures are logged; a
    /// failure mid-stream leaves a partial body in the sink.
    pub fn get_object<S: ResponseSink>(&self, key: &str, sink: &mut S) {
        let span = span!(Level::INFO, "get_object", context = "get_object");
        let _e = span.enter();
        info!(bucket = self.bucket_name(), key = key, "called");

        let mut reader = match self.client.get_object(self.bucket_name(), key) {
            Err(err) => {
                error!(error_message=%err, error_group="get_object", key=key);
                return;
            }
            Ok(reader) => reader,
        };

        sink.add_header(CONTENT_DISPOSITION, &format!("attachment;fileName={}", key));

        let copied = match io::copy(&mut reader, &mut *sink) {
            Ok(n) => sink.flush().map(|_| n),
            Err(err) => Err(err),
        };

        match copied {
            Err(err) => {
                error!(error_message=%err, error_group="write_response", key=key);
            }
            Ok(n) => {
                info!(key = key, size = n, "sent");
            }
        }
    }

    pub fn object_list(&self) -> Option<Vec<ObjectItem>> {
        let span = span!(Level::INFO, "object_list", context = "object_list");
        let _e = span.enter();
        info!(bucket = self.bucket_name(), "called");

        match self.client.list_objects(self.bucket_name()) {
            Err(err) => {
                error!(error_message=%err, error_group="list_objects", bucket=self.bucket_name());
                None
            }
            Ok(items) => Some(items),
        }
    }

    pub fn object_delete(&self, key: &str) -> bool {
        let span = span!(Level::INFO, "object_delete", context = "object_delete");
        let _e = span.enter();
        info!(bucket = self.bucket_name(), key = key, "called");

        match self.client.remove_object(self.bucket_name(), key) {
            Err(err) => {
                error!(
                    error_message=%err,
                    error_group="remove_object",
                    bucket=self.bucket_name(),
                    key=key
                );
                false
            }
            Ok(_) => true,
        }
    }

    /// Unsigned URL of `key` under the endpoint and default bucket.
    pub fn object_url(&self, key: &str) -> Option<String> {
        util::object::object_url(&self.settings.endpoint, self.bucket_name(), key)
    }

    /// A random 32 hex character name keeping the extension of
    /// `original_name`; `None` when it has none. Touches no storage.
    pub fn generate_file_name(original_name: &str) -> Option<String> {
        util::object::generate_file_name(original_name)
    }
}
