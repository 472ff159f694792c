use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use super::{hasher, resolver, DuplicateGroup, FileEntry};
use crate::common::errors::{ReclaimError, Result};
use crate::common::CancelToken;
use crate::scanner::filter::{FilterConfig, PermissionFilter};
use crate::scanner::types::{CategoryId, CleanableItem};
use crate::scanner::walker::Walk;

/// Outcome of one detection pass
#[derive(Debug, Clone, Default)]
pub struct DuplicateReport {
    /// Identical-content groups, largest files first
    pub groups: Vec<DuplicateGroup>,
    /// Files at or above the minimum size that were considered
    pub files_scanned: usize,
    /// Bytes held by every non-keeper copy
    pub wasted_bytes: u64,
    pub duration_secs: f64,
    /// Candidates that could not be hashed
    pub errors: Vec<String>,
}

impl DuplicateReport {
    /// Removable copies, named after their keeper
    pub fn items(&self) -> Vec<CleanableItem> {
        resolver::resolve_all(&self.groups)
    }

    /// Drop copies that the ignore rules or the permission filter would hide
    /// from a category scan. Keepers stay; a group left with no removable
    /// copy is dropped.
    pub fn filtered(mut self, config: &FilterConfig, permissions: &PermissionFilter) -> Self {
        if config.is_category_ignored(CategoryId::Duplicates) {
            self.groups.clear();
            self.wasted_bytes = 0;
            return self;
        }

        self.groups = std::mem::take(&mut self.groups)
            .into_iter()
            .filter_map(|mut group| {
                let hidden: HashSet<PathBuf> = resolver::resolve_group(&group)
                    .into_iter()
                    .filter(|item| config.is_path_ignored(&item.path) || !permissions.is_deletable(item))
                    .map(|item| item.path)
                    .collect();
                group.files.retain(|f| !hidden.contains(&f.path));
                (group.files.len() > 1).then_some(group)
            })
            .collect();
        self.wasted_bytes = self.items().iter().map(|i| i.size).sum();
        self
    }
}

/// Two-pass duplicate finder: exact size buckets, then content hashes
#[derive(Debug, Clone)]
pub struct DuplicateDetector {
    roots: Vec<PathBuf>,
    exclude: Vec<PathBuf>,
    max_depth: usize,
    min_size: u64,
    show_progress: bool,
}

impl DuplicateDetector {
    pub const DEFAULT_MAX_DEPTH: usize = 5;
    pub const DEFAULT_MIN_SIZE: u64 = 1024 * 1024;

    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            exclude: Vec::new(),
            max_depth: Self::DEFAULT_MAX_DEPTH,
            min_size: Self::DEFAULT_MIN_SIZE,
            show_progress: false,
        }
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn min_size(mut self, bytes: u64) -> Self {
        self.min_size = bytes;
        self
    }

    /// Folders never walked into
    pub fn exclude(mut self, folders: Vec<PathBuf>) -> Self {
        self.exclude = folders;
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run both passes and return the confirmed groups
    pub fn find_groups(&self, cancel: &CancelToken) -> Result<DuplicateReport> {
        if self.max_depth == 0 {
            return Err(ReclaimError::InvalidOptions(
                "max_depth must be greater than zero".into(),
            ));
        }
        let start = Instant::now();

        // ── Collect candidate files ──────────────────────────────────────────
        let pb = make_spinner(self.show_progress, "Collecting files...");
        let files = self.collect_files(cancel);
        let files_scanned = files.len();
        finish(pb, &format!("Found {} files", files_scanned));

        let (mut groups, errors) = group_files(files, cancel, self.show_progress);

        for group in &mut groups {
            group.files.sort_by(|a, b| a.path.cmp(&b.path));
        }
        groups.sort_by(|a, b| {
            b.file_size()
                .cmp(&a.file_size())
                .then_with(|| a.files[0].path.cmp(&b.files[0].path))
        });

        let wasted_bytes = groups
            .iter()
            .map(|g| g.file_size() * (g.files.len() as u64 - 1))
            .sum();

        Ok(DuplicateReport {
            groups,
            files_scanned,
            wasted_bytes,
            duration_secs: start.elapsed().as_secs_f64(),
            errors,
        })
    }

    /// Removable copies across all groups
    pub fn find(&self, cancel: &CancelToken) -> Result<Vec<CleanableItem>> {
        Ok(self.find_groups(cancel)?.items())
    }

    fn collect_files(&self, cancel: &CancelToken) -> Vec<FileEntry> {
        let exclude = self.exclude.clone();
        let walk = Walk::over(self.roots.clone())
            .max_depth(self.max_depth)
            .skip_hidden(true)
            .cancel(cancel)
            .filter(move |e| !exclude.iter().any(|f| e.path().starts_with(f)));

        // Overlapping roots must not make a file its own duplicate
        let mut seen = HashSet::new();
        walk.iter()
            .filter(|r| r.size >= self.min_size)
            .filter(|r| seen.insert(r.path.clone()))
            .map(|r| FileEntry {
                path: r.path,
                size: r.size,
                modified: r.modified,
            })
            .collect()
    }
}

/// Size buckets, then content hashes with one bucket per rayon task.
/// Only buckets of two or more files are ever opened.
fn group_files(
    files: Vec<FileEntry>,
    cancel: &CancelToken,
    show_progress: bool,
) -> (Vec<DuplicateGroup>, Vec<String>) {
    // ── Pass 1: Group by file size ───────────────────────────────────────────
    let size_groups = hasher::group_by_size(files);
    let candidates: usize = size_groups.values().map(|v| v.len()).sum();
    tracing::debug!(
        "{} candidates in {} size groups",
        candidates,
        size_groups.len()
    );

    // ── Pass 2: Content hash ─────────────────────────────────────────────────
    let pb = make_progress(show_progress, size_groups.len() as u64, "Hashing...");
    let hashed: Vec<hasher::HashBuckets> = size_groups
        .into_par_iter()
        .map(|(_size, files)| {
            let buckets = hasher::group_by_hash(files, cancel);
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            buckets
        })
        .collect();

    let mut groups = Vec::new();
    let mut errors = Vec::new();
    for buckets in hashed {
        errors.extend(buckets.errors);
        groups.extend(
            buckets
                .groups
                .into_iter()
                .map(|(content_hash, files)| DuplicateGroup { content_hash, files }),
        );
    }
    finish(pb, &format!("{} duplicate groups", groups.len()));
    (groups, errors)
}

// ── Progress helpers ──────────────────────────────────────────────────────────

fn make_spinner(show: bool, msg: &str) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    Some(pb)
}

fn make_progress(show: bool, total: u64, msg: &str) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let pb = ProgressBar::new(total);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("━━░"));
    }
    pb.set_message(msg.to_string());
    Some(pb)
}

fn finish(pb: Option<ProgressBar>, msg: &str) {
    if let Some(pb) = pb {
        pb.finish_with_message(msg.to_string());
    }
}
