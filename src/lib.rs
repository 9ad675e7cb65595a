//! Storage layer over an S3 compatible service (MinIO, AWS S3 and friends).
//!
//! [`bootstrap::bootstrap`] turns [`settings::Settings`] into an
//! [`template::ObjectTemplate`] when all connection keys are present, creating
//! the default bucket on request. The template is synchronous and can be
//! shared across threads.

pub mod adapters;
pub mod bootstrap;
pub mod client;
pub mod model;
pub mod settings;
pub mod template;
pub mod transfer;
pub mod util;

pub use bootstrap::{bootstrap, StorageState};
pub use model::storage::{Bucket, ObjectItem, StorageError};
pub use settings::{Settings, StorageSettings};
pub use template::ObjectTemplate;
