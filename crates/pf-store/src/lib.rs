//! pf-store: object-store backends and the folder/image directory services.
//!
//! The object store has no native directory concept. Folders are emulated
//! with key prefixes and zero-byte marker objects; listings use a delimiter
//! to recover one level of hierarchy at a time.
//!
//! - [`ObjectStore`]: backend trait, implemented by [`S3Store`] and
//!   [`MemoryStore`]
//! - [`FolderService`]: list, get, create and recursively delete folders
//! - [`ImageService`]: list, stream, upload and delete images

pub mod backend;
pub mod folders;
pub mod images;
pub mod memory;
pub mod s3;

use std::sync::Arc;

use pf_core::config::{StorageBackend, StorageConfig};

pub use backend::{ByteStream, Listing, ObjectBody, ObjectMeta, ObjectStore, MAX_BATCH_DELETE};
pub use folders::FolderService;
pub use images::{ImageBody, ImageService, ImageUpload};
pub use memory::MemoryStore;
pub use s3::S3Store;

/// Build the store selected by `config.backend`.
pub async fn connect(config: &StorageConfig) -> Arc<dyn ObjectStore> {
    match config.backend {
        StorageBackend::S3 => {
            let store = S3Store::connect(config).await;
            tracing::info!(
                bucket = %config.bucket,
                region = %config.region,
                endpoint = config.endpoint.as_deref().unwrap_or("default"),
                "Using S3 object store"
            );
            Arc::new(store)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory object store; contents are lost on restart");
            Arc::new(MemoryStore::new())
        }
    }
}
