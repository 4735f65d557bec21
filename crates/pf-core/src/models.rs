//! Folder and image projections returned by the API.
//!
//! None of these are persisted: they are computed from object-store listing
//! responses on every request. The object store is the only durable owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::keypath::KeyPaths;

/// Image file extensions accepted for listing and upload (lowercase).
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// A virtual folder, identified by its prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FolderData {
    /// Normalized prefix, always ending with the separator.
    pub id: String,
    /// Last path segment.
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Prefix one level up; `None` at the root.
    pub parent_id: Option<String>,
}

impl FolderData {
    /// Project a folder from its prefix using the translator.
    pub fn from_prefix(paths: &KeyPaths, prefix: &str, created_at: DateTime<Utc>) -> Self {
        let id = paths.normalize_prefix(prefix);
        Self {
            name: KeyPaths::name_of(&id),
            parent_id: paths.parent_of(&id),
            id,
            created_at,
        }
    }
}

/// An image object stored under a folder prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    /// Full object key (no trailing separator).
    pub id: String,
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    /// Prefix the image lives under.
    pub folder_id: String,
    /// Retrieval URL served by this application.
    pub url: String,
}

impl ImageData {
    /// Build the retrieval URL for `key` under `route` (e.g. `/api/images`).
    pub fn url_for(route: &str, key: &str) -> String {
        format!("{}/{}", route.trim_end_matches('/'), KeyPaths::encode_key(key))
    }
}

/// One step of a breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Breadcrumb {
    pub id: String,
    pub name: String,
}

/// Result of deleting one folder or image in a bulk request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeleteStatus {
    /// Objects were removed.
    Deleted,
    /// Nothing existed under the id; treated as success.
    Absent,
    /// The store call failed; other ids were still processed.
    Failed,
}

/// Per-id outcome of a bulk delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeleteOutcome {
    pub id: String,
    pub status: DeleteStatus,
    /// Number of objects removed for this id.
    pub removed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeleteOutcome {
    pub fn deleted(id: impl Into<String>, removed: usize) -> Self {
        Self {
            id: id.into(),
            status: DeleteStatus::Deleted,
            removed,
            error: None,
        }
    }

    pub fn absent(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: DeleteStatus::Absent,
            removed: 0,
            error: None,
        }
    }

    pub fn failed(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: DeleteStatus::Failed,
            removed: 0,
            error: Some(error.into()),
        }
    }
}

/// Body returned by the delete endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeleteReport {
    pub message: String,
    pub results: Vec<DeleteOutcome>,
}

impl DeleteReport {
    /// Summarize `results` for entities of kind `noun` (plural, e.g. "folders").
    pub fn new(noun: &str, results: Vec<DeleteOutcome>) -> Self {
        let failed = results
            .iter()
            .filter(|r| r.status == DeleteStatus::Failed)
            .count();
        let message = if failed == 0 {
            let mut noun = noun.to_string();
            if let Some(first) = noun.get_mut(..1) {
                first.make_ascii_uppercase();
            }
            format!("{noun} deleted successfully")
        } else {
            format!("{failed} of {} {noun} could not be deleted", results.len())
        };
        Self { message, results }
    }

    /// Whether any id failed.
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.status == DeleteStatus::Failed)
    }

    /// Total number of objects removed across all ids.
    pub fn removed(&self) -> usize {
        self.results.iter().map(|r| r.removed).sum()
    }
}

/// Lowercase allowed extension of `key`, if it has one.
pub fn image_extension(key: &str) -> Option<&'static str> {
    let (_, ext) = key.rsplit_once('.')?;
    if ext.contains('/') {
        return None;
    }
    let ext = ext.to_ascii_lowercase();
    ALLOWED_IMAGE_EXTENSIONS
        .iter()
        .copied()
        .find(|allowed| *allowed == ext)
}

/// Whether `key` names an image with an allowed extension.
pub fn is_image_key(key: &str) -> bool {
    !key.ends_with('/') && image_extension(key).is_some()
}

/// MIME type implied by the key's extension.
pub fn content_type_for(key: &str) -> Option<&'static str> {
    match image_extension(key)? {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Split mixed selection ids into `(folder_ids, image_keys)` by extension.
pub fn partition_ids<I, S>(ids: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ids.into_iter()
        .map(Into::into)
        .partition(|id: &String| !is_image_key(id))
}
