//! Pictor storage library
//!
//! Buffer-store and key-value-store abstractions plus their implementations.
//! The buffer store hands the pipeline raw source bytes and response headers;
//! the KV store resolves style names to persisted action chains.
//!
//! Keys must not contain `..` or a leading `/`; backends reject anything that
//! could resolve outside their root.

#[cfg(feature = "kv-dynamodb")]
pub mod dynamodb;
pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod mem;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

use pictor_core::AppError;

// Re-export commonly used types
#[cfg(feature = "kv-dynamodb")]
pub use dynamodb::DynamoKvStore;
pub use factory::{create_buffer_store, create_kv_store};
#[cfg(feature = "storage-local")]
pub use local::LocalStore;
pub use mem::{MemBufferStore, MemKvStore};
#[cfg(feature = "storage-s3")]
pub use s3::S3Store;
pub use traits::{BufferStore, KvStore, ObjectOutput, StoreError, StoreResult};

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(key) => AppError::NotFound(key),
            StoreError::InvalidKey(msg) => AppError::InvalidArgument(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}
