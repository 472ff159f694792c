use std::path::PathBuf;

use super::types::{Category, CategoryId, CleanableItem, SafetyLevel, ScanResult};
use super::walker::Walk;
use super::{ScanOptions, Scanner};
use crate::cleaner::{self, CleanReport};

pub const LARGE_FILES: Category = Category::new(CategoryId::LargeFiles, "Large Files", SafetyLevel::Risky);

/// Directories never descended into while looking for large files
const SKIP_DIRS: &[&str] = &["node_modules", "Library"];

/// Finds individual files at or above a size threshold
#[derive(Debug, Clone)]
pub struct LargeFileScanner {
    roots: Vec<PathBuf>,
    threshold: u64,
    max_depth: usize,
}

impl LargeFileScanner {
    pub fn new(threshold: u64) -> Self {
        Self {
            roots: dirs::home_dir().into_iter().collect(),
            threshold,
            max_depth: usize::MAX,
        }
    }

    pub fn with_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.roots = roots;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

impl Scanner for LargeFileScanner {
    fn category(&self) -> Category {
        LARGE_FILES
    }

    fn scan(&self, options: &ScanOptions) -> ScanResult {
        let threshold = options.min_size.unwrap_or(self.threshold);
        if threshold == 0 {
            return ScanResult::failed(LARGE_FILES, "min_size must be greater than zero");
        }

        let ignored = options.ignored_folders.clone();
        let walk = Walk::over(self.roots.clone())
            .max_depth(self.max_depth)
            .skip_hidden(true)
            .cancel(&options.cancel)
            .filter(move |e| {
                let name = e.file_name().to_string_lossy();
                !SKIP_DIRS.contains(&name.as_ref()) && !ignored.iter().any(|f| e.path().starts_with(f))
            });

        let mut items: Vec<CleanableItem> = walk
            .iter()
            .filter(|r| r.size >= threshold)
            .filter(|r| options.days_old.map_or(true, |days| r.older_than_days(days)))
            .map(|r| CleanableItem::new(r.path, r.size, false, r.modified))
            .collect();

        // Sort by size descending
        items.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        options.log(&format!("large_files: {} files over {} bytes", items.len(), threshold));
        ScanResult::new(LARGE_FILES, items)
    }

    fn clean(&self, items: &[CleanableItem], dry_run: bool) -> CleanReport {
        cleaner::remove_items(items, dry_run)
    }
}
