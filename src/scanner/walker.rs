//! Shared directory walk used by every scanner.
//!
//! A [`Walk`] is a reusable description of a traversal: roots, maximum depth,
//! whether hidden entries are skipped, and an optional prune filter. Calling
//! [`Walk::iter`] starts a fresh lazy traversal, so the same `Walk` can be
//! iterated any number of times. Symlinks are never followed. Entries that
//! cannot be read are skipped and logged at `debug`; they never end a walk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use walkdir::{DirEntry, WalkDir};

use crate::common::CancelToken;

type EntryFilter = Arc<dyn Fn(&DirEntry) -> bool + Send + Sync>;

/// A file or directory seen during a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    /// Length in bytes; zero for directories
    pub size: u64,
    pub modified: SystemTime,
    pub is_dir: bool,
    /// Depth below the root the record was found under (root = 0)
    pub depth: usize,
}

impl FileRecord {
    /// True when last modified more than `days` days ago
    pub fn older_than_days(&self, days: u32) -> bool {
        SystemTime::now()
            .duration_since(self.modified)
            .unwrap_or_default()
            >= Duration::from_secs(days as u64 * 86400)
    }
}

/// Restartable walk over one or more roots
#[derive(Clone)]
pub struct Walk {
    roots: Vec<PathBuf>,
    max_depth: usize,
    skip_hidden: bool,
    include_dirs: bool,
    filter: Option<EntryFilter>,
    cancel: Option<CancelToken>,
}

impl Walk {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::over(vec![root.into()])
    }

    pub fn over(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            max_depth: usize::MAX,
            skip_hidden: false,
            include_dirs: false,
            filter: None,
            cancel: None,
        }
    }

    /// Deepest level yielded; the roots' direct children are depth 1
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Skip entries whose name starts with `.` (roots themselves are exempt)
    pub fn skip_hidden(mut self, yes: bool) -> Self {
        self.skip_hidden = yes;
        self
    }

    /// Yield directory records as well as files
    pub fn include_dirs(mut self, yes: bool) -> Self {
        self.include_dirs = yes;
        self
    }

    /// Entries for which `filter` returns false are neither yielded nor descended into
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&DirEntry) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Stop yielding once the token is cancelled
    pub fn cancel(mut self, token: &CancelToken) -> Self {
        self.cancel = Some(token.clone());
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Start a new traversal
    pub fn iter(&self) -> impl Iterator<Item = FileRecord> + '_ {
        self.roots.iter().flat_map(move |root| {
            WalkDir::new(root)
                .follow_links(false)
                .max_depth(self.max_depth)
                .into_iter()
                .filter_entry(move |entry| self.admits(entry))
                .take_while(move |_| !self.is_cancelled())
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        tracing::debug!("Skipping unreadable entry: {}", e);
                        None
                    }
                })
                .filter_map(move |entry| self.record(&entry))
        })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }

    fn admits(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        if self.skip_hidden && entry.file_name().to_string_lossy().starts_with('.') {
            return false;
        }
        self.filter.as_ref().map_or(true, |f| f(entry))
    }

    fn record(&self, entry: &DirEntry) -> Option<FileRecord> {
        let file_type = entry.file_type();
        let is_dir = file_type.is_dir();
        if file_type.is_symlink() || (is_dir && (!self.include_dirs || entry.depth() == 0)) {
            return None;
        }
        if !is_dir && !file_type.is_file() {
            return None;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!("No metadata for {}: {}", entry.path().display(), e);
                return None;
            }
        };

        Some(FileRecord {
            path: entry.path().to_path_buf(),
            size: if is_dir { 0 } else { metadata.len() },
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            is_dir,
            depth: entry.depth(),
        })
    }
}

/// Calculate total size of a directory tree (regular files only)
pub fn dir_size(path: &Path) -> u64 {
    Walk::new(path).iter().map(|r| r.size).sum()
}

/// Replace a leading `~` with the home directory
pub fn expand_tilde(path: &str) -> String {
    match path.strip_prefix('~') {
        Some(rest) => {
            let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"));
            format!("{}{}", home.display(), rest)
        }
        None => path.to_string(),
    }
}

/// Expand ~ and glob patterns in paths
pub fn expand_paths(paths: &[String]) -> Vec<PathBuf> {
    let mut expanded = Vec::new();

    for path_str in paths {
        let resolved = expand_tilde(path_str);

        if resolved.contains('*') {
            match glob::glob(&resolved) {
                Ok(entries) => expanded.extend(entries.filter_map(|e| e.ok())),
                Err(e) => tracing::debug!("Bad glob '{}': {}", resolved, e),
            }
        } else {
            expanded.push(PathBuf::from(resolved));
        }
    }

    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("a/b/c")).unwrap();
        std::fs::create_dir_all(root.join(".hidden")).unwrap();
        std::fs::write(root.join("top.txt"), b"1234").unwrap();
        std::fs::write(root.join("a/one.txt"), b"12").unwrap();
        std::fs::write(root.join("a/b/c/deep.txt"), b"123456").unwrap();
        std::fs::write(root.join(".hidden/secret.txt"), b"x").unwrap();
        dir
    }

    fn names(walk: &Walk) -> Vec<String> {
        let mut names: Vec<String> = walk
            .iter()
            .map(|r| r.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_walk_yields_files_only_by_default() {
        let dir = tree();
        let walk = Walk::new(dir.path());
        assert_eq!(names(&walk), vec!["deep.txt", "one.txt", "secret.txt", "top.txt"]);
    }

    #[test]
    fn test_walk_skips_hidden() {
        let dir = tree();
        let walk = Walk::new(dir.path()).skip_hidden(true);
        assert_eq!(names(&walk), vec!["deep.txt", "one.txt", "top.txt"]);
    }

    #[test]
    fn test_walk_max_depth() {
        let dir = tree();
        let walk = Walk::new(dir.path()).max_depth(2).skip_hidden(true);
        assert_eq!(names(&walk), vec!["one.txt", "top.txt"]);
    }

    #[test]
    fn test_walk_is_restartable() {
        let dir = tree();
        let walk = Walk::new(dir.path());
        assert_eq!(walk.iter().count(), 4);
        assert_eq!(walk.iter().count(), 4);
    }

    #[test]
    fn test_walk_filter_prunes_subtree() {
        let dir = tree();
        let walk = Walk::new(dir.path())
            .include_dirs(true)
            .filter(|e| e.file_name() != "b");
        let names = names(&walk);
        assert!(names.contains(&"a".to_string()));
        assert!(!names.contains(&"deep.txt".to_string()));
        assert!(!names.contains(&"c".to_string()));
    }

    #[test]
    fn test_walk_stops_when_cancelled() {
        let dir = tree();
        let token = CancelToken::new();
        token.cancel();
        let walk = Walk::new(dir.path()).cancel(&token);
        assert_eq!(walk.iter().count(), 0);
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let walk = Walk::new("/nonexistent/reclaim/root");
        assert_eq!(walk.iter().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_not_followed() {
        let dir = tree();
        std::os::unix::fs::symlink(dir.path().join("a"), dir.path().join("loop")).unwrap();
        let walk = Walk::new(dir.path());
        assert_eq!(walk.iter().count(), 4);
    }

    #[test]
    fn test_dir_size_sums_files() {
        let dir = tree();
        assert_eq!(dir_size(dir.path()), 13);
    }

    #[test]
    fn test_expand_home() {
        if let Some(home) = dirs::home_dir() {
            let expanded = expand_paths(&["~/Downloads".to_string()]);
            assert_eq!(expanded, vec![home.join("Downloads")]);
        }
    }
}
