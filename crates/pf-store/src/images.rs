//! Image directory service: list, stream, upload and delete image objects.

use std::sync::Arc;

use bytes::Bytes;

use pf_core::models::{content_type_for, image_extension, is_image_key, ALLOWED_IMAGE_EXTENSIONS};
use pf_core::{DeleteOutcome, DeleteReport, Error, ImageData, KeyPaths, Result, SEPARATOR};

use crate::backend::{ByteStream, ObjectMeta, ObjectStore};

/// Content type served when neither the store nor the extension gives one.
pub const FALLBACK_CONTENT_TYPE: &str = "image/png";

/// One file submitted for upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    /// Content type declared by the client, if any.
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// An image opened for streaming to a client.
pub struct ImageBody {
    pub key: String,
    pub content_type: String,
    pub size: u64,
    pub stream: ByteStream,
}

impl std::fmt::Debug for ImageBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBody")
            .field("key", &self.key)
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct ImageService {
    store: Arc<dyn ObjectStore>,
    paths: KeyPaths,
    url_route: String,
}

impl ImageService {
    /// `url_route` is the HTTP path image URLs are built under, e.g.
    /// `/api/images`.
    pub fn new(store: Arc<dyn ObjectStore>, paths: KeyPaths, url_route: impl Into<String>) -> Self {
        Self {
            store,
            paths,
            url_route: url_route.into(),
        }
    }

    fn scoped_prefix(&self, prefix: &str) -> Result<String> {
        let normalized = self.paths.normalize_prefix(prefix);
        if !self.paths.contains(&normalized) {
            return Err(Error::validation(format!(
                "prefix '{normalized}' is outside '{}'",
                self.paths.root()
            )));
        }
        Ok(normalized)
    }

    fn scoped_key(&self, key: &str) -> Result<String> {
        let key = key.trim().trim_start_matches(SEPARATOR);
        if key.is_empty() {
            return Err(Error::validation("image key is required"));
        }
        if key.ends_with(SEPARATOR) {
            return Err(Error::validation(format!("'{key}' is a folder, not an image")));
        }
        if !self.paths.contains_key(key) {
            return Err(Error::validation(format!(
                "key '{key}' is outside '{}'",
                self.paths.root()
            )));
        }
        Ok(key.to_string())
    }

    fn to_image(&self, folder: &str, meta: ObjectMeta) -> ImageData {
        ImageData {
            name: KeyPaths::name_of(&meta.key),
            size: meta.size,
            last_modified: meta.last_modified,
            folder_id: folder.to_string(),
            url: ImageData::url_for(&self.url_route, &meta.key),
            id: meta.key,
        }
    }

    /// Images stored directly under `prefix` (not in subfolders).
    pub async fn list_images(&self, prefix: &str) -> Result<Vec<ImageData>> {
        let folder = self.scoped_prefix(prefix)?;
        let listing = self.store.list(&folder, Some(SEPARATOR)).await?;

        let images: Vec<ImageData> = listing
            .objects
            .into_iter()
            .filter(|o| is_image_key(&o.key))
            .map(|o| self.to_image(&folder, o))
            .collect();

        tracing::debug!(prefix = %folder, count = images.len(), "Listed images");
        Ok(images)
    }

    /// Open one image for streaming.
    pub async fn get_image(&self, key: &str) -> Result<ImageBody> {
        let key = self.scoped_key(key)?;
        let Some(body) = self.store.get(&key).await? else {
            return Err(Error::not_found("image", key));
        };

        let content_type = body
            .meta
            .content_type
            .filter(|ct| !ct.trim().is_empty())
            .or_else(|| content_type_for(&key).map(str::to_string))
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

        Ok(ImageBody {
            key,
            content_type,
            size: body.meta.size,
            stream: body.stream,
        })
    }

    /// Validate an upload and return the object key it will be stored at.
    fn plan_upload(&self, folder: &str, upload: &ImageUpload) -> Result<String> {
        let file_name = upload.file_name.trim();
        if file_name.is_empty() {
            return Err(Error::validation("file name is required"));
        }
        if file_name.contains(SEPARATOR) || file_name == "." || file_name == ".." {
            return Err(Error::validation(format!(
                "'{file_name}' is not a valid file name"
            )));
        }
        if image_extension(file_name).is_none() {
            return Err(Error::validation(format!(
                "'{file_name}' is not an allowed image type (allowed: {})",
                ALLOWED_IMAGE_EXTENSIONS.join(", ")
            )));
        }
        Ok(self.paths.object_key(folder, file_name))
    }

    /// Upload one file into `folder`. An empty folder means the root.
    pub async fn create_image(&self, folder: &str, upload: ImageUpload) -> Result<ImageData> {
        let folder = self.scoped_prefix(folder)?;
        let key = self.plan_upload(&folder, &upload)?;
        self.store_upload(&folder, key, upload).await
    }

    /// Upload several files into `folder`, in order.
    ///
    /// All files are validated before the first write. Uploads stop at the
    /// first storage failure; files written before it are kept.
    pub async fn create_images(&self, folder: &str, uploads: Vec<ImageUpload>) -> Result<Vec<ImageData>> {
        if uploads.is_empty() {
            return Err(Error::validation("no files provided"));
        }
        let folder = self.scoped_prefix(folder)?;
        let keys = uploads
            .iter()
            .map(|u| self.plan_upload(&folder, u))
            .collect::<Result<Vec<_>>>()?;

        let mut created = Vec::with_capacity(uploads.len());
        for (key, upload) in keys.into_iter().zip(uploads) {
            let file_name = upload.file_name.clone();
            let image = self
                .store_upload(&folder, key, upload)
                .await
                .map_err(|e| {
                    tracing::error!(
                        file = %file_name,
                        uploaded = created.len(),
                        error = %e,
                        "Batch upload stopped"
                    );
                    match e {
                        Error::Storage { source, .. } => {
                            Error::storage(format!("put {file_name}"), source)
                        }
                        other => other,
                    }
                })?;
            created.push(image);
        }
        Ok(created)
    }

    async fn store_upload(&self, folder: &str, key: String, upload: ImageUpload) -> Result<ImageData> {
        let content_type = upload
            .content_type
            .filter(|ct| !ct.trim().is_empty() && ct != "application/octet-stream")
            .or_else(|| content_type_for(&key).map(str::to_string));

        let meta = self
            .store
            .put(&key, upload.data, content_type.as_deref())
            .await
            .map_err(|e| {
                tracing::error!(key = %key, error = %e, "Upload failed");
                e
            })?;

        tracing::info!(key = %meta.key, size = meta.size, "Uploaded image");
        Ok(self.to_image(folder, meta))
    }

    /// Delete each image key. Missing keys are reported as absent.
    pub async fn delete_images(&self, keys: &[String]) -> Result<DeleteReport> {
        let keys = self.check_keys(keys)?;

        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            results.push(self.delete_one(key).await);
        }

        let report = DeleteReport::new("images", results);
        tracing::info!(
            images = report.results.len(),
            removed = report.removed(),
            failed = report.has_failures(),
            "Deleted images"
        );
        Ok(report)
    }

    /// Validate image keys for deletion, stripping leading separators.
    pub fn check_keys(&self, keys: &[String]) -> Result<Vec<String>> {
        if keys.is_empty() {
            return Err(Error::validation("no image keys provided"));
        }
        keys.iter().map(|k| self.scoped_key(k)).collect()
    }

    async fn delete_one(&self, key: String) -> DeleteOutcome {
        let existed = match self.store.head(&key).await {
            Ok(meta) => meta.is_some(),
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to look up image for delete");
                return DeleteOutcome::failed(key, e.public_message());
            }
        };
        if !existed {
            return DeleteOutcome::absent(key);
        }
        match self.store.delete(&key).await {
            Ok(()) => DeleteOutcome::deleted(key, 1),
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to delete image");
                DeleteOutcome::failed(key, e.public_message())
            }
        }
    }
}
