//! Ignore rules and the permission filter applied to raw scan results.
//!
//! Stages run in a fixed order, cheapest first:
//! 1. ignored categories drop whole results,
//! 2. ignored paths and folders drop items,
//! 3. the permission filter drops locked, protected or unwritable items.
//!
//! Every stage only removes; applying the pipeline twice changes nothing.

use std::collections::HashSet;
use std::path::Path;

use super::types::{CategoryId, CleanableItem, ScanResult};
use crate::common::permissions::{self, LockedResources};
use crate::common::safety;

/// Normalized, read-only ignore rules for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterConfig {
    ignored_paths: HashSet<String>,
    ignored_folders: Vec<String>,
    ignored_categories: HashSet<CategoryId>,
}

impl FilterConfig {
    /// Build from raw configuration values. Unknown category ids are
    /// dropped with a warning rather than failing the run.
    pub fn new<S: AsRef<str>>(paths: &[S], folders: &[S], categories: &[S]) -> Self {
        let ignored_categories = categories
            .iter()
            .filter_map(|c| match c.as_ref().parse::<CategoryId>() {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!("Ignoring unknown category in ignore list: {}", e);
                    None
                }
            })
            .collect();

        Self {
            ignored_paths: paths.iter().map(|p| normalize(p.as_ref())).collect(),
            ignored_folders: folders.iter().map(|f| normalize(f.as_ref())).collect(),
            ignored_categories,
        }
    }

    pub fn ignore_category(mut self, id: CategoryId) -> Self {
        self.ignored_categories.insert(id);
        self
    }

    pub fn is_category_ignored(&self, id: CategoryId) -> bool {
        self.ignored_categories.contains(&id)
    }

    /// Exact match on an ignored path, or inside an ignored folder.
    /// Folder matches require a separator boundary.
    pub fn is_path_ignored(&self, path: &Path) -> bool {
        let normalized = normalize(&path.to_string_lossy());
        if self.ignored_paths.contains(&normalized) {
            return true;
        }
        self.ignored_folders
            .iter()
            .any(|folder| normalized.starts_with(&format!("{}/", folder)))
    }
}

/// Lower-case, forward slashes, no trailing slash
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/")
        .to_lowercase()
        .trim_end_matches('/')
        .to_string()
}

/// Write-permission probe used by the permission filter
pub trait AccessProbe: Send + Sync {
    fn can_delete(&self, path: &Path) -> bool;
}

/// Probe backed by file system permissions
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteAccessProbe;

impl AccessProbe for WriteAccessProbe {
    fn can_delete(&self, path: &Path) -> bool {
        permissions::can_write(path)
    }
}

/// Rejects items that are locked system resources, protected roots,
/// or fail the access probe
pub struct PermissionFilter {
    locked: LockedResources,
    probe: Box<dyn AccessProbe>,
}

impl PermissionFilter {
    pub fn new(probe: impl AccessProbe + 'static) -> Self {
        Self {
            locked: LockedResources::new(),
            probe: Box::new(probe),
        }
    }

    pub fn is_deletable(&self, item: &CleanableItem) -> bool {
        if self.locked.is_locked(&item.path) {
            tracing::debug!("Locked resource: {}", item.path.display());
            return false;
        }
        if safety::is_protected(&item.path) {
            tracing::debug!("Protected path: {}", item.path.display());
            return false;
        }
        if !self.probe.can_delete(&item.path) {
            tracing::debug!("{}", permissions::permission_hint(&item.path));
            return false;
        }
        true
    }
}

impl Default for PermissionFilter {
    fn default() -> Self {
        Self::new(WriteAccessProbe)
    }
}

/// Stage 1: drop results of ignored categories entirely
pub fn exclude_categories(results: Vec<ScanResult>, config: &FilterConfig) -> Vec<ScanResult> {
    results
        .into_iter()
        .filter(|r| !config.is_category_ignored(r.category.id))
        .collect()
}

/// Stage 2: drop ignored paths and anything under ignored folders
pub fn exclude_paths(results: Vec<ScanResult>, config: &FilterConfig) -> Vec<ScanResult> {
    results
        .into_iter()
        .map(|r| r.retain_items(|item| !config.is_path_ignored(&item.path)))
        .collect()
}

/// Stage 3: keep only deletable items; categories stay even when emptied
pub fn apply_permissions(results: Vec<ScanResult>, filter: &PermissionFilter) -> Vec<ScanResult> {
    results
        .into_iter()
        .map(|r| r.retain_items(|item| filter.is_deletable(item)))
        .collect()
}

/// Run the full pipeline in order
pub fn apply(
    results: Vec<ScanResult>,
    config: &FilterConfig,
    permissions: &PermissionFilter,
) -> Vec<ScanResult> {
    let results = exclude_categories(results, config);
    let results = exclude_paths(results, config);
    apply_permissions(results, permissions)
}
