//! Browsing state for a folder view: current folder, breadcrumb trail and
//! the set of selected entries.
//!
//! This is the client-side model of a browser or UI session; the server
//! never holds one. A client feeds `current()` to the folder and image
//! listings and sends `partition_selection()` to the delete routes.
//!
//! The state is owned by a single client session and never shared; every
//! transition is a plain method call on `&mut self`.

use std::collections::BTreeSet;

use crate::keypath::KeyPaths;
use crate::models::{partition_ids, Breadcrumb};

#[derive(Debug, Clone)]
pub struct NavigationState {
    paths: KeyPaths,
    current: String,
    breadcrumbs: Vec<Breadcrumb>,
    selection: BTreeSet<String>,
}

impl NavigationState {
    /// Start at the root prefix with an empty selection.
    pub fn new(paths: KeyPaths) -> Self {
        let current = paths.root().to_string();
        let breadcrumbs = paths.breadcrumbs(&current);
        Self {
            paths,
            current,
            breadcrumbs,
            selection: BTreeSet::new(),
        }
    }

    /// Prefix of the folder being viewed.
    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn breadcrumbs(&self) -> &[Breadcrumb] {
        &self.breadcrumbs
    }

    pub fn is_at_root(&self) -> bool {
        self.paths.is_root(&self.current)
    }

    /// Navigate to `prefix`. The selection belongs to the previous view and
    /// is cleared.
    pub fn open(&mut self, prefix: &str) {
        self.current = self.paths.normalize_prefix(prefix);
        self.breadcrumbs = self.paths.breadcrumbs(&self.current);
        self.selection.clear();
    }

    /// Navigate one level up. Returns `false` when already at the root.
    pub fn up(&mut self) -> bool {
        match self.paths.parent_of(&self.current) {
            Some(parent) => {
                self.open(&parent);
                true
            }
            None => false,
        }
    }

    pub fn home(&mut self) {
        let root = self.paths.root().to_string();
        self.open(&root);
    }

    /// Flip the selection state of `id`; returns whether it is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.selection.remove(id) {
            false
        } else {
            self.selection.insert(id.to_string());
            true
        }
    }

    pub fn select_all<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection.extend(ids.into_iter().map(Into::into));
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.contains(id)
    }

    pub fn selection_len(&self) -> usize {
        self.selection.len()
    }

    /// Split the selection into `(folder_ids, image_keys)` for the two
    /// delete endpoints.
    pub fn partition_selection(&self) -> (Vec<String>, Vec<String>) {
        partition_ids(self.selection.iter().cloned())
    }
}
