//! Key-path translation between folder paths and object-store keys.
//!
//! Object stores have a flat keyspace. Folders are emulated with key
//! prefixes that end in [`SEPARATOR`]; a folder "exists" when a zero-byte
//! marker object sits exactly at its prefix. All functions here are pure and
//! never fail: empty or root-level input degrades to the configured root
//! prefix.

use crate::models::Breadcrumb;

/// Separator between path segments in object keys.
pub const SEPARATOR: char = '/';

/// Root prefix used when none is configured.
pub const DEFAULT_ROOT_PREFIX: &str = "portal/";

/// Translator bound to a root prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPaths {
    root: String,
}

impl Default for KeyPaths {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_PREFIX)
    }
}

impl KeyPaths {
    /// Build a translator for `root`. A root with no segments falls back to
    /// [`DEFAULT_ROOT_PREFIX`].
    pub fn new(root: &str) -> Self {
        let segments = Self::segments(root.trim());
        let root = if segments.is_empty() {
            DEFAULT_ROOT_PREFIX.to_string()
        } else {
            format!("{}{SEPARATOR}", segments.join("/"))
        };
        Self { root }
    }

    /// The normalized root prefix (always ends with the separator).
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Split a key into its ordered, non-empty segments.
    pub fn segments(path: &str) -> Vec<&str> {
        path.split(SEPARATOR).filter(|s| !s.is_empty()).collect()
    }

    /// Normalize a folder path into a prefix.
    ///
    /// Leading separators are dropped, repeated separators collapse and a
    /// trailing separator is appended. Empty input maps to the root prefix.
    pub fn normalize_prefix(&self, path: &str) -> String {
        let segments = Self::segments(path.trim());
        if segments.is_empty() {
            return self.root.clone();
        }
        format!("{}{SEPARATOR}", segments.join("/"))
    }

    /// Strip leading and trailing separators (repeated ones collapse too).
    pub fn trim_separators(path: &str) -> String {
        Self::segments(path.trim()).join("/")
    }

    /// Final segment of a path, used as the display name.
    pub fn name_of(path: &str) -> String {
        Self::segments(path).last().map(|s| s.to_string()).unwrap_or_default()
    }

    /// Prefix one level up, or `None` for the root prefix itself.
    ///
    /// A single-segment path outside the root has the root as its parent.
    pub fn parent_of(&self, path: &str) -> Option<String> {
        let normalized = self.normalize_prefix(path);
        if normalized == self.root {
            return None;
        }
        let segments = Self::segments(&normalized);
        if segments.len() <= 1 {
            return Some(self.root.clone());
        }
        Some(format!(
            "{}{SEPARATOR}",
            segments[..segments.len() - 1].join("/")
        ))
    }

    /// Prefix of a child folder called `name` under `parent`.
    pub fn child_prefix(&self, parent: &str, name: &str) -> String {
        format!("{}{}{SEPARATOR}", self.normalize_prefix(parent), name.trim())
    }

    /// Object key for a file placed in `folder`.
    pub fn object_key(&self, folder: &str, file_name: &str) -> String {
        let mut folder = Self::trim_separators(folder);
        if folder.is_empty() {
            folder = Self::trim_separators(&self.root);
        }
        format!("{folder}{SEPARATOR}{file_name}")
    }

    /// Whether `path` is the root prefix.
    pub fn is_root(&self, path: &str) -> bool {
        self.normalize_prefix(path) == self.root
    }

    /// Whether the folder path lies at or under the root prefix.
    pub fn contains(&self, path: &str) -> bool {
        self.normalize_prefix(path).starts_with(&self.root)
    }

    /// Whether an object key lies strictly under the root prefix.
    pub fn contains_key(&self, key: &str) -> bool {
        let trimmed = Self::trim_separators(key);
        trimmed.len() > self.root.len() && trimmed.starts_with(&self.root)
    }

    /// Trail of folders from the root down to `path`, inclusive.
    ///
    /// Paths outside the root yield a trail starting at their first segment.
    pub fn breadcrumbs(&self, path: &str) -> Vec<Breadcrumb> {
        let normalized = self.normalize_prefix(path);
        let segments = Self::segments(&normalized);
        let start = if normalized.starts_with(&self.root) {
            Self::segments(&self.root).len()
        } else {
            1
        };

        (start..=segments.len())
            .map(|depth| Breadcrumb {
                id: format!("{}{SEPARATOR}", segments[..depth].join("/")),
                name: segments[depth - 1].to_string(),
            })
            .collect()
    }

    /// Percent-encode each segment of a key for use in a URL path.
    pub fn encode_key(key: &str) -> String {
        key.split(SEPARATOR)
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> KeyPaths {
        KeyPaths::default()
    }

    #[test]
    fn root_is_normalized() {
        assert_eq!(KeyPaths::new("portal").root(), "portal/");
        assert_eq!(KeyPaths::new("/media//assets/").root(), "media/assets/");
        assert_eq!(KeyPaths::new("").root(), DEFAULT_ROOT_PREFIX);
        assert_eq!(KeyPaths::new("///").root(), DEFAULT_ROOT_PREFIX);
    }

    #[test]
    fn normalize_appends_separator() {
        let p = paths();
        assert_eq!(p.normalize_prefix("portal/trips"), "portal/trips/");
        assert_eq!(p.normalize_prefix("portal/trips/"), "portal/trips/");
        assert_eq!(p.normalize_prefix("/portal//trips"), "portal/trips/");
    }

    #[test]
    fn normalize_empty_degrades_to_root() {
        let p = paths();
        assert_eq!(p.normalize_prefix(""), "portal/");
        assert_eq!(p.normalize_prefix("/"), "portal/");
        assert_eq!(p.normalize_prefix("   "), "portal/");
    }

    #[test]
    fn normalize_ignores_trailing_separator() {
        let p = paths();
        for path in ["portal", "portal/trips", "a/b/c", "portal/trips/2024"] {
            assert_eq!(
                p.normalize_prefix(path),
                p.normalize_prefix(&format!("{path}/")),
                "path {path}"
            );
        }
    }

    #[test]
    fn trimmed_plus_separator_matches_normalized() {
        let p = paths();
        for path in ["portal", "portal/trips", "/x/y", "a"] {
            assert_eq!(
                format!("{}/", KeyPaths::trim_separators(path)),
                p.normalize_prefix(&format!("{path}/")),
            );
        }
    }

    #[test]
    fn name_is_last_segment() {
        assert_eq!(KeyPaths::name_of("portal/trips/"), "trips");
        assert_eq!(KeyPaths::name_of("portal/trips/sunset.png"), "sunset.png");
        assert_eq!(KeyPaths::name_of("portal//trips//"), "trips");
        assert_eq!(KeyPaths::name_of(""), "");
    }

    #[test]
    fn parent_of_nested_prefix() {
        let p = paths();
        assert_eq!(p.parent_of("portal/trips/"), Some("portal/".into()));
        assert_eq!(p.parent_of("portal/trips/2024/"), Some("portal/trips/".into()));
    }

    #[test]
    fn parent_of_root_is_none() {
        let p = paths();
        assert_eq!(p.parent_of("portal/"), None);
        assert_eq!(p.parent_of(""), None);
    }

    #[test]
    fn parent_of_top_level_is_root() {
        assert_eq!(paths().parent_of("other/"), Some("portal/".into()));
    }

    #[test]
    fn name_and_parent_rebuild_prefix() {
        let p = paths();
        for prefix in ["portal/trips/", "portal/trips/2024/", "portal/a/b/c/"] {
            let name = KeyPaths::name_of(prefix);
            let parent = p.parent_of(prefix).unwrap();
            assert_eq!(p.child_prefix(&parent, &name), prefix);
        }
    }

    #[test]
    fn segments_filter_empty() {
        assert_eq!(
            KeyPaths::segments("portal//trips///x.png"),
            vec!["portal", "trips", "x.png"]
        );
        assert!(KeyPaths::segments("//").is_empty());
    }

    #[test]
    fn child_prefix_joins_parent_and_name() {
        let p = paths();
        assert_eq!(p.child_prefix("portal/", "trips"), "portal/trips/");
        assert_eq!(p.child_prefix("portal", "trips"), "portal/trips/");
        assert_eq!(p.child_prefix("", "trips"), "portal/trips/");
    }

    #[test]
    fn object_key_strips_folder_separators() {
        let p = paths();
        assert_eq!(
            p.object_key("portal/trips/", "sunset.png"),
            "portal/trips/sunset.png"
        );
        assert_eq!(
            p.object_key("/portal/trips//", "sunset.png"),
            "portal/trips/sunset.png"
        );
        assert_eq!(p.object_key("", "sunset.png"), "portal/sunset.png");
    }

    #[test]
    fn containment() {
        let p = paths();
        assert!(p.contains("portal/"));
        assert!(p.contains("portal/trips"));
        assert!(!p.contains("private/"));
        assert!(!p.contains("portalx/"));
        assert!(p.contains_key("portal/trips/sunset.png"));
        assert!(!p.contains_key("portal/"));
        assert!(!p.contains_key("secrets/key.png"));
    }

    #[test]
    fn breadcrumbs_from_root() {
        let p = paths();
        let trail = p.breadcrumbs("portal/trips/2024/");
        let ids: Vec<_> = trail.iter().map(|c| c.id.as_str()).collect();
        let names: Vec<_> = trail.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(ids, vec!["portal/", "portal/trips/", "portal/trips/2024/"]);
        assert_eq!(names, vec!["portal", "trips", "2024"]);
    }

    #[test]
    fn breadcrumbs_of_root_is_single() {
        let trail = paths().breadcrumbs("");
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].id, "portal/");
    }

    #[test]
    fn breadcrumbs_with_nested_root() {
        let p = KeyPaths::new("media/assets/");
        let trail = p.breadcrumbs("media/assets/logos/");
        let ids: Vec<_> = trail.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["media/assets/", "media/assets/logos/"]);
    }

    #[test]
    fn encode_key_keeps_separators() {
        assert_eq!(
            KeyPaths::encode_key("portal/my trips/sun set.png"),
            "portal/my%20trips/sun%20set.png"
        );
    }
}
