//! pf-core: shared types, errors, configuration and key-path translation.
//!
//! This crate is the foundational dependency for the other pf-* crates. It
//! owns the mapping between human folder paths and flat object-store keys,
//! the folder/image projections returned by the API, the unified error type
//! and application configuration.

pub mod config;
pub mod error;
pub mod keypath;
pub mod models;
pub mod navigation;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use keypath::{KeyPaths, DEFAULT_ROOT_PREFIX, SEPARATOR};
pub use models::*;
