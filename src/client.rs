use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::config::{Credentials, Region};
use tracing::info;

use crate::{
    adapters::{s3::S3Adapter, ObjectAdapter},
    model::storage::StorageError,
    settings::StorageSettings,
};

const CREDENTIALS_PROVIDER: &str = "objectkit";
const IO_THREADS: usize = 2;

/// Builds a client handle for `endpoint` signed with the given key pair.
///
/// Nothing is sent over the network here; an unreachable endpoint or bad
/// credentials only surface once an operation runs. Only failing to start
/// the client's I/O threads is reported.
pub fn build_client(
    endpoint: &str,
    access_key: &str,
    secret_key: &str,
    region: &str,
) -> Result<S3Adapter, StorageError> {
    info!(endpoint = endpoint, region = region, "building storage client");

    let shared = SdkConfig::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .endpoint_url(endpoint)
        .build();

    let config = aws_sdk_s3::config::Builder::from(&shared)
        .credentials_provider(Credentials::new(
            access_key,
            secret_key,
            None,
            None,
            CREDENTIALS_PROVIDER,
        ))
        .force_path_style(true)
        .build();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(IO_THREADS)
        .thread_name("objectkit-io")
        .enable_all()
        .build()
        .map_err(|err| StorageError::Config(format!("failed to start runtime: {}", err)))?;

    Ok(S3Adapter::new(
        aws_sdk_s3::Client::from_conf(config),
        region,
        runtime,
    ))
}

pub fn build_from_settings(
    settings: &StorageSettings,
) -> Result<Box<dyn ObjectAdapter>, StorageError> {
    let client = build_client(
        &settings.endpoint,
        &settings.access_key,
        &settings.secret_key,
        &settings.region,
    )?;

    Ok(Box::new(client))
}
