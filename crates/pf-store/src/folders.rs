//! Folder directory service.
//!
//! A folder is a prefix ending in `/`. It exists when a zero-byte marker
//! object sits exactly at that key; the root prefix always exists. Child
//! folders are discovered with a delimiter listing, and deleting a folder
//! removes every key under its prefix.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;

use pf_core::{
    Breadcrumb, DeleteOutcome, DeleteReport, Error, FolderData, KeyPaths, Result, SEPARATOR,
};

use crate::backend::ObjectStore;

#[derive(Clone)]
pub struct FolderService {
    store: Arc<dyn ObjectStore>,
    paths: KeyPaths,
}

impl FolderService {
    pub fn new(store: Arc<dyn ObjectStore>, paths: KeyPaths) -> Self {
        Self { store, paths }
    }

    pub fn paths(&self) -> &KeyPaths {
        &self.paths
    }

    /// Normalize `prefix` and reject anything outside the root.
    fn scoped(&self, prefix: &str) -> Result<String> {
        let normalized = self.paths.normalize_prefix(prefix);
        if !self.paths.contains(&normalized) {
            return Err(Error::validation(format!(
                "prefix '{normalized}' is outside '{}'",
                self.paths.root()
            )));
        }
        Ok(normalized)
    }

    /// Immediate child folders of `prefix`, sorted by id.
    pub async fn list_children(&self, prefix: &str) -> Result<Vec<FolderData>> {
        let parent = self.scoped(prefix)?;
        let listing = self.store.list(&parent, Some(SEPARATOR)).await?;
        let now = Utc::now();

        let mut folders: Vec<FolderData> = listing
            .common_prefixes
            .into_iter()
            .filter_map(|group| {
                let name = group
                    .strip_prefix(parent.as_str())?
                    .trim_end_matches(SEPARATOR)
                    .to_string();
                if name.is_empty() {
                    return None;
                }
                Some(FolderData {
                    id: group,
                    name,
                    created_at: now,
                    parent_id: Some(parent.clone()),
                })
            })
            .collect();
        folders.sort_by(|a, b| a.id.cmp(&b.id));

        tracing::debug!(prefix = %parent, count = folders.len(), "Listed child folders");
        Ok(folders)
    }

    /// Look up a single folder by its marker object.
    pub async fn get_folder(&self, prefix: &str) -> Result<FolderData> {
        let prefix = self.scoped(prefix)?;
        if self.paths.is_root(&prefix) {
            return Ok(FolderData::from_prefix(&self.paths, &prefix, Utc::now()));
        }

        match self.store.head(&prefix).await? {
            Some(meta) => Ok(FolderData::from_prefix(
                &self.paths,
                &prefix,
                meta.last_modified,
            )),
            None => Err(Error::not_found("folder", prefix)),
        }
    }

    /// Trail of folders from the root down to `prefix`.
    pub fn breadcrumbs(&self, prefix: &str) -> Result<Vec<Breadcrumb>> {
        let prefix = self.scoped(prefix)?;
        Ok(self.paths.breadcrumbs(&prefix))
    }

    /// Create a folder called `name` under `parent` by writing its marker.
    ///
    /// Creating a folder that already exists rewrites the marker and
    /// succeeds.
    pub async fn create_folder(&self, parent: &str, name: &str) -> Result<FolderData> {
        if parent.trim().is_empty() {
            return Err(Error::validation("parent folder is required"));
        }
        let name = validate_folder_name(name)?;
        let parent = self.scoped(parent)?;

        let key = self.paths.child_prefix(&parent, name);
        let meta = self.store.put(&key, Bytes::new(), None).await?;

        tracing::info!(folder = %key, "Created folder");
        Ok(FolderData::from_prefix(&self.paths, &key, meta.last_modified))
    }

    /// Delete each folder and everything beneath it.
    ///
    /// Every id is attempted even if an earlier one fails; the report holds
    /// one outcome per id in request order.
    pub async fn delete_folders(&self, ids: &[String]) -> Result<DeleteReport> {
        let prefixes = self.check_ids(ids)?;

        let mut results = Vec::with_capacity(prefixes.len());
        for prefix in prefixes {
            results.push(self.delete_prefix(prefix).await);
        }

        let report = DeleteReport::new("folders", results);
        tracing::info!(
            folders = report.results.len(),
            objects = report.removed(),
            failed = report.has_failures(),
            "Deleted folders"
        );
        Ok(report)
    }

    /// Validate folder ids for deletion and return their normalized
    /// prefixes. The root itself and anything outside it are rejected.
    pub fn check_ids(&self, ids: &[String]) -> Result<Vec<String>> {
        if ids.is_empty() {
            return Err(Error::validation("no folder ids provided"));
        }
        ids.iter()
            .map(|id| {
                if id.trim().is_empty() {
                    return Err(Error::validation("folder id must not be empty"));
                }
                let prefix = self.scoped(id)?;
                if self.paths.is_root(&prefix) {
                    return Err(Error::validation("the root folder cannot be deleted"));
                }
                Ok(prefix)
            })
            .collect()
    }

    async fn delete_prefix(&self, prefix: String) -> DeleteOutcome {
        let keys: Vec<String> = match self.store.list(&prefix, None).await {
            Ok(listing) => listing.objects.into_iter().map(|o| o.key).collect(),
            Err(e) => {
                tracing::error!(folder = %prefix, error = %e, "Failed to list folder for delete");
                return DeleteOutcome::failed(prefix, e.public_message());
            }
        };

        if keys.is_empty() {
            tracing::debug!(folder = %prefix, "Folder already absent");
            return DeleteOutcome::absent(prefix);
        }

        match self.store.delete_batch(&keys).await {
            Ok(removed) => DeleteOutcome::deleted(prefix, removed),
            Err(e) => {
                tracing::error!(folder = %prefix, error = %e, "Failed to delete folder contents");
                DeleteOutcome::failed(prefix, e.public_message())
            }
        }
    }
}

/// Check a new folder name and return it trimmed.
fn validate_folder_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("folder name is required"));
    }
    if name.contains(SEPARATOR) {
        return Err(Error::validation(format!(
            "folder name must not contain '{SEPARATOR}'"
        )));
    }
    if name == "." || name == ".." {
        return Err(Error::validation(format!("'{name}' is not a valid folder name")));
    }
    if name.chars().any(char::is_control) {
        return Err(Error::validation("folder name must not contain control characters"));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Listing, ObjectBody, ObjectMeta};
    use crate::memory::MemoryStore;
    use async_trait::async_trait;
    use pf_core::DeleteStatus;

    async fn service_with(keys: &[&str]) -> (FolderService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        for key in keys {
            store.put(key, Bytes::from_static(b"x"), None).await.unwrap();
        }
        let svc = FolderService::new(store.clone(), KeyPaths::default());
        (svc, store)
    }

    #[tokio::test]
    async fn lists_immediate_children_sorted() {
        let (svc, _) = service_with(&[
            "portal/work/",
            "portal/trips/",
            "portal/trips/2024/",
            "portal/trips/sunset.png",
            "portal/a.png",
        ])
        .await;

        let folders = svc.list_children("portal/").await.unwrap();
        let ids: Vec<_> = folders.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["portal/trips/", "portal/work/"]);
        assert!(folders.iter().all(|f| f.parent_id.as_deref() == Some("portal/")));
        assert_eq!(folders[0].name, "trips");
    }

    #[tokio::test]
    async fn empty_prefix_lists_root() {
        let (svc, _) = service_with(&["portal/trips/"]).await;
        let folders = svc.list_children("").await.unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].id, "portal/trips/");
    }

    #[tokio::test]
    async fn children_with_empty_names_are_skipped() {
        let (svc, _) = service_with(&["portal/trips//odd.png", "portal/trips/x/"]).await;
        let folders = svc.list_children("portal/trips/").await.unwrap();
        let ids: Vec<_> = folders.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["portal/trips/x/"]);
    }

    #[tokio::test]
    async fn listing_outside_root_is_rejected() {
        let (svc, _) = service_with(&[]).await;
        let err = svc.list_children("secrets/").await.unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[tokio::test]
    async fn create_then_get_and_list() {
        let (svc, store) = service_with(&[]).await;

        let created = svc.create_folder("portal/", "trips").await.unwrap();
        assert_eq!(created.id, "portal/trips/");
        assert_eq!(created.name, "trips");
        assert_eq!(created.parent_id.as_deref(), Some("portal/"));

        let marker = store.head("portal/trips/").await.unwrap().unwrap();
        assert_eq!(marker.size, 0);

        let fetched = svc.get_folder("portal/trips").await.unwrap();
        assert_eq!(fetched.id, "portal/trips/");

        let children = svc.list_children("portal/").await.unwrap();
        assert!(children.iter().any(|f| f.id == "portal/trips/"));
    }

    #[tokio::test]
    async fn create_is_idempotent() {
        let (svc, store) = service_with(&[]).await;
        svc.create_folder("portal/", "trips").await.unwrap();
        svc.create_folder("portal/", "trips").await.unwrap();
        assert_eq!(store.keys(), vec!["portal/trips/"]);
    }

    #[tokio::test]
    async fn create_validates_before_touching_store() {
        let (svc, store) = service_with(&[]).await;
        for name in ["", "   ", "a/b", ".", ".."] {
            let err = svc.create_folder("portal/", name).await.unwrap_err();
            assert_eq!(err.http_status(), 400, "name {name:?}");
        }
        let err = svc.create_folder("", "trips").await.unwrap_err();
        assert_eq!(err.http_status(), 400);
        let err = svc.create_folder("elsewhere/", "trips").await.unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn breadcrumbs_walk_from_root() {
        let (svc, _) = service_with(&[]).await;
        let trail = svc.breadcrumbs("portal/trips/2024").unwrap();
        let ids: Vec<_> = trail.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["portal/", "portal/trips/", "portal/trips/2024/"]);
        assert_eq!(svc.breadcrumbs("other/").unwrap_err().http_status(), 400);
    }

    #[tokio::test]
    async fn get_missing_folder_is_not_found() {
        let (svc, _) = service_with(&[]).await;
        let err = svc.get_folder("portal/nope/").await.unwrap_err();
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn root_exists_without_marker() {
        let (svc, _) = service_with(&[]).await;
        let root = svc.get_folder("").await.unwrap();
        assert_eq!(root.id, "portal/");
        assert_eq!(root.parent_id, None);
    }

    #[tokio::test]
    async fn delete_removes_everything_under_prefix() {
        let (svc, store) = service_with(&[
            "portal/trips/",
            "portal/trips/a.png",
            "portal/trips/2024/b.png",
            "portal/work/",
        ])
        .await;

        let report = svc.delete_folders(&["portal/trips/".into()]).await.unwrap();
        assert!(!report.has_failures());
        assert_eq!(report.results[0].status, DeleteStatus::Deleted);
        assert_eq!(report.results[0].removed, 3);
        assert_eq!(store.keys(), vec!["portal/work/"]);

        let again = svc.delete_folders(&["portal/trips/".into()]).await.unwrap();
        assert_eq!(again.results[0].status, DeleteStatus::Absent);
        assert_eq!(again.removed(), 0);
        assert_eq!(store.keys(), vec!["portal/work/"]);
    }

    #[tokio::test]
    async fn delete_rejects_bad_ids_up_front() {
        let (svc, store) = service_with(&["portal/trips/"]).await;

        assert_eq!(svc.delete_folders(&[]).await.unwrap_err().http_status(), 400);
        for bad in ["", "portal/", "other/"] {
            let err = svc
                .delete_folders(&["portal/trips/".into(), bad.into()])
                .await
                .unwrap_err();
            assert_eq!(err.http_status(), 400, "id {bad:?}");
        }
        assert_eq!(store.len(), 1);
    }

    /// Store whose batch delete fails for keys under one prefix.
    struct FailingStore {
        inner: MemoryStore,
        poisoned: &'static str,
    }

    #[async_trait]
    impl ObjectStore for FailingStore {
        fn name(&self) -> &'static str {
            "failing"
        }
        async fn list(&self, prefix: &str, delimiter: Option<char>) -> Result<Listing> {
            self.inner.list(prefix, delimiter).await
        }
        async fn head(&self, key: &str) -> Result<Option<ObjectMeta>> {
            self.inner.head(key).await
        }
        async fn get(&self, key: &str) -> Result<Option<ObjectBody>> {
            self.inner.get(key).await
        }
        async fn put(&self, key: &str, body: Bytes, ct: Option<&str>) -> Result<ObjectMeta> {
            self.inner.put(key, body, ct).await
        }
        async fn delete(&self, key: &str) -> Result<()> {
            self.inner.delete(key).await
        }
        async fn delete_batch(&self, keys: &[String]) -> Result<usize> {
            if keys.iter().any(|k| k.starts_with(self.poisoned)) {
                return Err(Error::storage("delete_batch", "AccessDenied"));
            }
            self.inner.delete_batch(keys).await
        }
    }

    #[tokio::test]
    async fn delete_continues_past_failures() {
        let inner = MemoryStore::new();
        for key in ["portal/a/", "portal/b/", "portal/b/x.png", "portal/c/"] {
            inner.put(key, Bytes::new(), None).await.unwrap();
        }
        let store = Arc::new(FailingStore {
            inner,
            poisoned: "portal/b/",
        });
        let svc = FolderService::new(store.clone(), KeyPaths::default());

        let report = svc
            .delete_folders(&["portal/a/".into(), "portal/b/".into(), "portal/c/".into()])
            .await
            .unwrap();

        let statuses: Vec<_> = report.results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![DeleteStatus::Deleted, DeleteStatus::Failed, DeleteStatus::Deleted]
        );
        assert!(report.has_failures());
        let error = report.results[1].error.as_deref().unwrap();
        assert!(!error.contains("AccessDenied"));
        assert_eq!(store.inner.keys(), vec!["portal/b/", "portal/b/x.png"]);
    }
}
