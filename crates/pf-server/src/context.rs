//! Application context shared by every route handler via Axum state.

use std::sync::Arc;

use pf_core::config::Config;
use pf_core::KeyPaths;
use pf_store::{FolderService, ImageService, ObjectStore};

use crate::routes::images::IMAGE_ROUTE;
use crate::session::SessionStore;

/// Cheaply cloneable handle to configuration, storage and sessions.
#[derive(Clone)]
pub struct AppContext {
    /// Immutable configuration snapshot.
    pub config: Arc<Config>,
    /// Backing object store.
    pub store: Arc<dyn ObjectStore>,
    /// Translator bound to the configured root prefix.
    pub paths: KeyPaths,
    pub folders: FolderService,
    pub images: ImageService,
    /// Logged-in browser sessions.
    pub sessions: SessionStore,
}

impl AppContext {
    pub fn new(config: Config, store: Arc<dyn ObjectStore>) -> Self {
        let paths = config.key_paths();
        let sessions = SessionStore::new(config.auth.session_timeout_hours);
        Self {
            folders: FolderService::new(store.clone(), paths.clone()),
            images: ImageService::new(store.clone(), paths.clone(), IMAGE_ROUTE),
            config: Arc::new(config),
            store,
            paths,
            sessions,
        }
    }
}
