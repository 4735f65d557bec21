//! The object-store abstraction the directory services are written against.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use pf_core::Result;

/// Largest number of keys a single batch delete call may carry.
pub const MAX_BATCH_DELETE: usize = 1000;

/// Chunked object contents.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Metadata for one stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    /// Content type recorded at upload, if the backend reports one.
    pub content_type: Option<String>,
}

/// Result of a prefix listing.
///
/// With a delimiter, keys containing the delimiter after the prefix are
/// rolled up into `common_prefixes` (each ending with the delimiter) and do
/// not appear in `objects`.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub objects: Vec<ObjectMeta>,
    pub common_prefixes: Vec<String>,
}

/// An object opened for reading.
pub struct ObjectBody {
    pub meta: ObjectMeta,
    pub stream: ByteStream,
}

impl std::fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBody")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// Flat key/value object storage with prefix listing.
///
/// Implementations must return listing results in ascending key order and
/// treat deletes of missing keys as success.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short identifier for logs (e.g. `"s3"`).
    fn name(&self) -> &'static str;

    /// List every object whose key starts with `prefix`, following
    /// pagination to the end.
    async fn list(&self, prefix: &str, delimiter: Option<char>) -> Result<Listing>;

    /// Metadata for the object at exactly `key`, or `None` if absent.
    async fn head(&self, key: &str) -> Result<Option<ObjectMeta>>;

    /// Open the object at `key` for streaming, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<ObjectBody>>;

    /// Store `body` at `key`, replacing any existing object.
    async fn put(&self, key: &str, body: Bytes, content_type: Option<&str>) -> Result<ObjectMeta>;

    /// Remove the object at `key`. Missing keys are not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Remove many keys. Returns the number of keys submitted.
    ///
    /// The default issues one [`delete`](Self::delete) per key; backends with
    /// a native multi-object delete override it.
    async fn delete_batch(&self, keys: &[String]) -> Result<usize> {
        for key in keys {
            self.delete(key).await?;
        }
        Ok(keys.len())
    }
}
