//! Amazon S3 (and S3-compatible) object store.

use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream as SdkByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio_util::io::ReaderStream;

use pf_core::config::StorageConfig;
use pf_core::{Error, Result};

use crate::backend::{Listing, ObjectBody, ObjectMeta, ObjectStore, MAX_BATCH_DELETE};

/// Object store talking to one bucket through the AWS SDK.
///
/// Credentials come from the SDK's default provider chain (environment,
/// profile, instance metadata).
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Build a client from the storage settings.
    pub async fn connect(config: &StorageConfig) -> Self {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        builder = builder.force_path_style(config.force_path_style);

        Self::new(Client::from_conf(builder.build()), config.bucket.clone())
    }

    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn sdk_error<E>(operation: &str, err: E) -> Error
where
    E: std::error::Error + 'static,
{
    Error::storage(operation, DisplayErrorContext(err).to_string())
}

fn to_chrono(dt: Option<&aws_sdk_s3::primitives::DateTime>) -> DateTime<Utc> {
    dt.and_then(|d| DateTime::from_timestamp(d.secs(), d.subsec_nanos()))
        .unwrap_or_else(Utc::now)
}

fn to_size(len: Option<i64>) -> u64 {
    len.and_then(|n| u64::try_from(n).ok()).unwrap_or(0)
}

#[async_trait]
impl ObjectStore for S3Store {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn list(&self, prefix: &str, delimiter: Option<char>) -> Result<Listing> {
        let mut listing = Listing::default();
        let mut continuation: Option<String> = None;

        loop {
            let mut req = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);
            if let Some(d) = delimiter {
                req = req.delimiter(d.to_string());
            }
            if let Some(token) = continuation.take() {
                req = req.continuation_token(token);
            }

            let resp = req.send().await.map_err(|e| sdk_error("list", e))?;

            for object in resp.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                listing.objects.push(ObjectMeta {
                    key: key.to_string(),
                    size: to_size(object.size()),
                    last_modified: to_chrono(object.last_modified()),
                    content_type: None,
                });
            }
            listing.common_prefixes.extend(
                resp.common_prefixes()
                    .iter()
                    .filter_map(|p| p.prefix().map(str::to_string)),
            );

            match resp.next_continuation_token() {
                Some(token) if resp.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        tracing::debug!(
            prefix,
            objects = listing.objects.len(),
            prefixes = listing.common_prefixes.len(),
            "Listed bucket"
        );
        Ok(listing)
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectMeta>> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(resp) => Ok(Some(ObjectMeta {
                key: key.to_string(),
                size: to_size(resp.content_length()),
                last_modified: to_chrono(resp.last_modified()),
                content_type: resp.content_type().map(str::to_string),
            })),
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_not_found()) {
                    return Ok(None);
                }
                Err(sdk_error("head", err))
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<ObjectBody>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        let resp = match result {
            Ok(resp) => resp,
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    return Ok(None);
                }
                return Err(sdk_error("get", err));
            }
        };

        let meta = ObjectMeta {
            key: key.to_string(),
            size: to_size(resp.content_length()),
            last_modified: to_chrono(resp.last_modified()),
            content_type: resp.content_type().map(str::to_string),
        };
        let stream = ReaderStream::new(resp.body.into_async_read()).boxed();

        Ok(Some(ObjectBody { meta, stream }))
    }

    async fn put(&self, key: &str, body: Bytes, content_type: Option<&str>) -> Result<ObjectMeta> {
        let size = body.len() as u64;
        let mut req = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(SdkByteStream::from(body));
        if let Some(ct) = content_type {
            req = req.content_type(ct);
        }
        req.send().await.map_err(|e| sdk_error("put", e))?;

        tracing::debug!(key, size, "Stored object");
        Ok(ObjectMeta {
            key: key.to_string(),
            size,
            last_modified: Utc::now(),
            content_type: content_type.map(str::to_string),
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error("delete", e))?;
        Ok(())
    }

    async fn delete_batch(&self, keys: &[String]) -> Result<usize> {
        for chunk in keys.chunks(MAX_BATCH_DELETE) {
            let objects = chunk
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| sdk_error("delete_batch", e))?;
            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|e| sdk_error("delete_batch", e))?;

            let resp = self
                .client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| sdk_error("delete_batch", e))?;

            if let Some(first) = resp.errors().first() {
                return Err(Error::storage(
                    "delete_batch",
                    format!(
                        "{} of {} keys not deleted (first: {} {})",
                        resp.errors().len(),
                        chunk.len(),
                        first.key().unwrap_or("?"),
                        first.code().unwrap_or("unknown"),
                    ),
                ));
            }
        }

        Ok(keys.len())
    }
}
