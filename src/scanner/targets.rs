use std::path::PathBuf;

use super::types::{Category, CategoryId, CleanableItem, SafetyLevel, ScanResult};
use super::walker::{self, Walk};
use super::{ScanOptions, Scanner};
use crate::cleaner::{self, CleanReport};

pub const CACHES: Category = Category::new(CategoryId::Caches, "Application Caches", SafetyLevel::Safe);
pub const LOGS: Category = Category::new(CategoryId::Logs, "Log Files", SafetyLevel::Moderate);
pub const TRASH: Category = Category::new(CategoryId::Trash, "Trash", SafetyLevel::Safe);

/// What a target reports as one item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Each direct child of a root, with its total size
    TopLevel,
    /// Each regular file anywhere below a root
    Files,
}

/// A scan target defines where to look and how to classify what's found
#[derive(Debug, Clone)]
pub struct ScanTarget {
    pub category: Category,
    /// Paths with ~ and glob expansion, resolved at scan time
    pub paths: Vec<String>,
    pub granularity: Granularity,
    /// Only report files with one of these extensions; empty means any
    pub extensions: &'static [&'static str],
    /// Only report entries older than N days unless options override it
    pub min_age_days: Option<u32>,
}

/// Application caches, one item per application cache directory
pub fn caches_target() -> ScanTarget {
    ScanTarget {
        category: CACHES,
        paths: vec!["~/Library/Caches".into(), "~/.cache".into()],
        granularity: Granularity::TopLevel,
        extensions: &[],
        min_age_days: None,
    }
}

/// Application and user log files
pub fn logs_target() -> ScanTarget {
    ScanTarget {
        category: LOGS,
        paths: vec!["~/Library/Logs".into(), "~/.local/state".into()],
        granularity: Granularity::Files,
        extensions: &["log", "gz", "old"],
        min_age_days: Some(7),
    }
}

/// Files already in the trash bin
pub fn trash_target() -> ScanTarget {
    ScanTarget {
        category: TRASH,
        paths: vec![
            "~/.Trash".into(),
            "~/.local/share/Trash/files".into(),
            "/Volumes/*/.Trashes".into(),
        ],
        granularity: Granularity::TopLevel,
        extensions: &[],
        min_age_days: None,
    }
}

/// Scanner driven by a static [`ScanTarget`] definition
#[derive(Debug, Clone)]
pub struct TargetScanner {
    target: ScanTarget,
}

impl TargetScanner {
    pub fn new(target: ScanTarget) -> Self {
        Self { target }
    }

    /// Replace the target's default locations
    pub fn with_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.target.paths = roots
            .into_iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        self
    }

    fn matches_extension(&self, record: &walker::FileRecord) -> bool {
        if self.target.extensions.is_empty() {
            return true;
        }
        record
            .path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.target
                    .extensions
                    .iter()
                    .any(|wanted| ext.eq_ignore_ascii_case(wanted))
            })
    }
}

impl Scanner for TargetScanner {
    fn category(&self) -> Category {
        self.target.category
    }

    fn scan(&self, options: &ScanOptions) -> ScanResult {
        let min_age = options.days_old.or(self.target.min_age_days);
        let mut items = Vec::new();

        for root in walker::expand_paths(&self.target.paths) {
            if !root.exists() {
                continue;
            }
            if options.is_ignored_folder(&root) {
                options.log(&format!("Skipping ignored root {}", root.display()));
                continue;
            }

            let ignored = options.ignored_folders.clone();
            let walk = Walk::new(&root)
                .cancel(&options.cancel)
                .filter(move |e| !ignored.iter().any(|f| e.path().starts_with(f)));

            let walk = match self.target.granularity {
                Granularity::TopLevel => walk.max_depth(1).include_dirs(true),
                Granularity::Files => walk,
            };

            for record in walk.iter() {
                if !record.is_dir && !self.matches_extension(&record) {
                    continue;
                }
                if min_age.is_some_and(|days| !record.older_than_days(days)) {
                    continue;
                }
                let size = if record.is_dir {
                    walker::dir_size(&record.path)
                } else {
                    record.size
                };
                items.push(CleanableItem::new(record.path, size, record.is_dir, record.modified));
            }
        }

        items.sort_by(|a, b| b.size.cmp(&a.size));
        options.log(&format!("{}: {} items", self.target.category.id, items.len()));
        ScanResult::new(self.target.category, items)
    }

    fn clean(&self, items: &[CleanableItem], dry_run: bool) -> CleanReport {
        cleaner::remove_items(items, dry_run)
    }
}
