//! Gitignore filtering.
//!
//! The engine does not parse `.gitignore` syntax itself; it consumes an
//! ignore decision through [`IgnorePredicate`]. The provided adapter wraps
//! the `ignore` crate's matcher, loading the base directory's `.gitignore`
//! when [`GlobFlags::GITIGNORE`](crate::GlobFlags::GITIGNORE) is set.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

/// Ignore decision consulted by the filesystem walker.
///
/// Paths are relative to the walk base and use `/` separators.
pub trait IgnorePredicate {
    /// Should this path be dropped from the results?
    fn is_ignored(&self, rel_path: &str, is_dir: bool) -> bool;

    /// Should this directory's whole subtree be skipped? Defaults to the
    /// directory itself being ignored, which is the `.gitignore` rule.
    fn subtree_ignored(&self, rel_path: &str) -> bool {
        self.is_ignored(rel_path, true)
    }
}

/// [`IgnorePredicate`] over a parsed `.gitignore` file.
pub struct GitignoreFilter {
    inner: Gitignore,
}

impl GitignoreFilter {
    /// Load `<base>/.gitignore`. Returns `None` when the file does not
    /// exist or cannot be parsed into any usable rule.
    pub fn from_dir(base: &Path) -> Option<GitignoreFilter> {
        let file = base.join(".gitignore");
        if !file.is_file() {
            return None;
        }
        let mut builder = GitignoreBuilder::new(base);
        builder.add(&file);
        builder
            .build()
            .ok()
            .map(|inner| GitignoreFilter { inner })
    }

    /// Wrap an already-built matcher.
    pub fn from_gitignore(inner: Gitignore) -> GitignoreFilter {
        GitignoreFilter { inner }
    }
}

impl IgnorePredicate for GitignoreFilter {
    /// Ancestor-aware: a rule like `build/` excludes `build/out/a.o` even
    /// though only the `build` component matches the rule itself.
    fn is_ignored(&self, rel_path: &str, is_dir: bool) -> bool {
        self.inner
            .matched_path_or_any_parents(rel_path, is_dir)
            .is_ignore()
    }
}
