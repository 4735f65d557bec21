//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory object store, a
//! default config and a full [`AppContext`]. The [`TestHarness::with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use pf_core::config::Config;
use pf_server::context::AppContext;
use pf_server::router::build_router;
use pf_store::{MemoryStore, ObjectStore};

/// Test harness wrapping a fully-constructed [`AppContext`] backed by a
/// [`MemoryStore`].
pub struct TestHarness {
    pub ctx: AppContext,
    pub store: Arc<MemoryStore>,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let ctx = AppContext::new(config, store.clone());
        Self { ctx, store }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Put a raw object straight into the store.
    pub async fn seed(&self, key: &str, data: &'static [u8]) {
        self.store
            .put(key, Bytes::from_static(data), None)
            .await
            .expect("failed to seed object");
    }

    /// Every key currently in the store, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.store.keys()
    }
}

/// Base URL for a server address.
pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{addr}")
}

/// A config with auth enabled, the given API key and an `admin` user whose
/// password is `hunter2`.
pub fn auth_config(api_key: &str) -> Config {
    let mut config = Config::default();
    config.auth.enabled = true;
    config.auth.api_key = Some(api_key.to_string());
    config.auth.username = Some("admin".into());
    config.auth.password_hash = Some(bcrypt::hash("hunter2", 4).expect("bcrypt hash"));
    config
}

/// Multipart body with one `file` part and a `folderPath` field.
pub fn upload_form(folder: &str, file_name: &str, mime: &str, data: &'static [u8]) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(data)
        .file_name(file_name.to_string())
        .mime_str(mime)
        .expect("valid mime");
    reqwest::multipart::Form::new()
        .part("file", part)
        .text("folderPath", folder.to_string())
}
