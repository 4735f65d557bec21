//! In-process object store used by tests and the `memory` storage backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use pf_core::Result;

use crate::backend::{Listing, ObjectBody, ObjectMeta, ObjectStore};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
    last_modified: DateTime<Utc>,
}

impl StoredObject {
    fn meta(&self, key: &str) -> ObjectMeta {
        ObjectMeta {
            key: key.to_string(),
            size: self.data.len() as u64,
            last_modified: self.last_modified,
            content_type: self.content_type.clone(),
        }
    }
}

/// Object store backed by an ordered map behind a lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// All stored keys in ascending order.
    pub fn keys(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list(&self, prefix: &str, delimiter: Option<char>) -> Result<Listing> {
        let objects = self.objects.read();
        let mut listing = Listing::default();

        for (key, object) in objects.range(prefix.to_string()..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };
            let rolled_up = delimiter.and_then(|d| rest.find(d).map(|idx| idx + d.len_utf8()));
            match rolled_up {
                Some(end) => {
                    let common = format!("{prefix}{}", &rest[..end]);
                    if listing.common_prefixes.last() != Some(&common) {
                        listing.common_prefixes.push(common);
                    }
                }
                None => listing.objects.push(object.meta(key)),
            }
        }

        Ok(listing)
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectMeta>> {
        Ok(self.objects.read().get(key).map(|o| o.meta(key)))
    }

    async fn get(&self, key: &str) -> Result<Option<ObjectBody>> {
        let Some(object) = self.objects.read().get(key).cloned() else {
            return Ok(None);
        };
        let meta = object.meta(key);
        let stream = futures::stream::once(async move { Ok::<_, std::io::Error>(object.data) });
        Ok(Some(ObjectBody {
            meta,
            stream: Box::pin(stream),
        }))
    }

    async fn put(&self, key: &str, body: Bytes, content_type: Option<&str>) -> Result<ObjectMeta> {
        let object = StoredObject {
            data: body,
            content_type: content_type.map(str::to_string),
            last_modified: Utc::now(),
        };
        let meta = object.meta(key);
        self.objects.write().insert(key.to_string(), object);
        Ok(meta)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.write().remove(key);
        Ok(())
    }

    async fn delete_batch(&self, keys: &[String]) -> Result<usize> {
        let mut objects = self.objects.write();
        for key in keys {
            objects.remove(key);
        }
        Ok(keys.len())
    }
}
