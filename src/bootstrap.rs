use tracing::{info, span, warn, Level};

use crate::{
    adapters::ObjectAdapter,
    client,
    model::storage::StorageError,
    settings::{Settings, StorageSettings},
    template::ObjectTemplate,
};

/// Whether storage is available to the rest of the application.
pub enum StorageState {
    /// A connection key is missing; no client was built.
    Disabled,
    Enabled(ObjectTemplate),
}

impl StorageState {
    pub fn is_enabled(&self) -> bool {
        matches!(self, StorageState::Enabled(_))
    }

    pub fn into_template(self) -> Option<ObjectTemplate> {
        match self {
            StorageState::Disabled => None,
            StorageState::Enabled(template) => Some(template),
        }
    }
}

/// Builds the storage layer from `settings` against the configured S3
/// endpoint.
pub fn bootstrap(settings: &Settings) -> Result<StorageState, StorageError> {
    bootstrap_with(settings, client::build_from_settings)
}

/// Like [`bootstrap`], with the client handle supplied by `build`.
///
/// With auto-create enabled the default bucket is checked and created when
/// missing. The check and the creation are not atomic: two processes starting
/// together may both try to create it, and the storage service decides the
/// outcome.
pub fn bootstrap_with<F>(settings: &Settings, build: F) -> Result<StorageState, StorageError>
where
    F: FnOnce(&StorageSettings) -> Result<Box<dyn ObjectAdapter>, StorageError>,
{
    let span = span!(Level::INFO, "bootstrap", context = "bootstrap");
    let _e = span.enter();

    let resolved = match settings.resolve() {
        None => {
            warn!(missing = ?settings.missing_keys(), "storage disabled");
            return Ok(StorageState::Disabled);
        }
        Some(resolved) => resolved,
    };

    info!(
        endpoint = %resolved.endpoint,
        bucket = %resolved.bucket_name,
        auto_create = resolved.auto_create,
        "storage enabled"
    );

    let client = build(&resolved)?;
    let template = ObjectTemplate::new(client, resolved);

    if template.settings().auto_create {
        let bucket = template.bucket_name().to_string();
        if template.bucket_exists(&bucket)? {
            info!(bucket = %bucket, "default bucket already exists");
        } else {
            info!(bucket = %bucket, "creating default bucket");
            template.bucket_create(&bucket)?;
        }
    }

    Ok(StorageState::Enabled(template))
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use crate::adapters::mock::MockClient;

    fn mock(client: MockClient) -> Result<Box<dyn ObjectAdapter>, StorageError> {
        Ok(Box::new(client))
    }

    fn settings(auto_create: bool) -> Settings {
        Settings {
            endpoint: Some("http://localhost:9000".to_string()),
            bucket_name: Some("media".to_string()),
            access_key: Some("minio".to_string()),
            secret_key: Some("secret".to_string()),
            auto_create,
            region: None,
        }
    }

    #[test]
    fn test_disabled_builds_nothing() {
        let mut cases = Vec::new();
        for missing in 0..4 {
            let mut input = settings(true);
            match missing {
                0 => input.endpoint = None,
                1 => input.bucket_name = Some(String::new()),
                2 => input.access_key = None,
                _ => input.secret_key = None,
            }
            cases.push((missing, input));
        }

        for (missing, input) in cases {
            let built = AtomicUsize::new(0);
            let state = bootstrap_with(&input, |_| {
                built.fetch_add(1, Ordering::SeqCst);
                mock(MockClient::new("http://mock"))
            })
            .unwrap();

            assert!(!state.is_enabled(), "failed for case: {}", missing);
            assert_eq!(built.load(Ordering::SeqCst), 0, "failed for case: {}", missing);
        }
    }

    #[test]
    fn test_enabled_without_auto_create() {
        let state = bootstrap_with(&settings(false), |_| {
            mock(MockClient::new("http://mock"))
        })
        .unwrap();

        let template = state.into_template().unwrap();
        assert!(!template.bucket_exists("media").unwrap());
    }

    #[test]
    fn test_auto_create_missing_bucket() {
        let state = bootstrap_with(&settings(true), |_| {
            mock(MockClient::new("http://mock"))
        })
        .unwrap();

        let template = state.into_template().unwrap();
        assert!(template.bucket_exists("media").unwrap());
    }

    #[test]
    fn test_auto_create_existing_bucket() {
        let client = MockClient::new("http://mock").with_bucket("media");
        let state = bootstrap_with(&settings(true), |_| mock(client)).unwrap();

        assert!(state.is_enabled());
    }

    #[test]
    fn test_auto_create_unreachable_fails() {
        let result = bootstrap_with(&settings(true), |_| {
            let client = MockClient::new("http://mock");
            client.set_offline(true);
            mock(client)
        });

        assert!(matches!(result, Err(StorageError::Transport(_))));
    }

    #[test]
    fn test_builder_receives_resolved_settings() {
        let seen = Arc::new(std::sync::Mutex::new(None));
        let captured = Arc::clone(&seen);

        bootstrap_with(&settings(false), move |resolved| {
            *captured.lock().unwrap() = Some(resolved.clone());
            mock(MockClient::new("http://mock"))
        })
        .unwrap();

        let resolved = seen.lock().unwrap().clone().unwrap();
        assert_eq!(resolved.bucket_name, "media");
        assert_eq!(resolved.region, "us-east-1");
    }
}
