//! Stockroom Storage Library
//!
//! Storage abstraction for catalog images, with S3 and local filesystem backends.
//!
//! # Storage key format
//!
//! Keys are owner-scoped: `catalog/{owner_id}/{filename}`. Keys must not contain `..`
//! or a leading `/`. Key generation lives in the `keys` module so all backends agree.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use stockroom_core::StorageBackend;
pub use traits::{Storage, StorageError, StorageResult};
