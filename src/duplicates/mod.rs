//! Exact duplicate detection.
//!
//! Candidates are bucketed by size, buckets of two or more are hashed
//! (SHA-256), and each identical-content group keeps its newest file.
//! Every other copy becomes a cleanable item.

pub mod grouper;
pub mod hasher;
pub mod resolver;

use std::path::PathBuf;
use std::time::SystemTime;

use serde::Serialize;

use crate::cleaner::{self, CleanReport};
use crate::scanner::types::{Category, CategoryId, CleanableItem, SafetyLevel, ScanResult};
use crate::scanner::{ScanOptions, Scanner};

pub use grouper::{DuplicateDetector, DuplicateReport};
pub use resolver::{resolve_all, resolve_group};

pub const DUPLICATES: Category = Category::new(CategoryId::Duplicates, "Duplicate Files", SafetyLevel::Risky);

/// A regular file considered for duplicate detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

/// Two or more files with the same size and the same content hash
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub content_hash: String,
    pub files: Vec<FileEntry>,
}

impl DuplicateGroup {
    /// Size shared by every file in the group
    pub fn file_size(&self) -> u64 {
        self.files.first().map_or(0, |f| f.size)
    }
}

/// The user's Downloads, Documents and Desktop folders.
/// Falls back to the usual names under home when the platform has no mapping.
pub fn default_roots() -> Vec<PathBuf> {
    let home = dirs::home_dir().unwrap_or_default();
    [
        dirs::download_dir().unwrap_or_else(|| home.join("Downloads")),
        dirs::document_dir().unwrap_or_else(|| home.join("Documents")),
        dirs::desktop_dir().unwrap_or_else(|| home.join("Desktop")),
    ]
    .into_iter()
    .collect()
}

/// Duplicate detection as a category scanner
#[derive(Debug, Clone)]
pub struct DuplicateScanner {
    roots: Vec<PathBuf>,
    min_size: u64,
    max_depth: usize,
}

impl DuplicateScanner {
    pub fn new() -> Self {
        Self {
            roots: default_roots(),
            min_size: DuplicateDetector::DEFAULT_MIN_SIZE,
            max_depth: DuplicateDetector::DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.roots = roots;
        self
    }

    pub fn min_size(mut self, bytes: u64) -> Self {
        self.min_size = bytes;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

impl Default for DuplicateScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for DuplicateScanner {
    fn category(&self) -> Category {
        DUPLICATES
    }

    fn scan(&self, options: &ScanOptions) -> ScanResult {
        let roots: Vec<PathBuf> = self.roots.iter().filter(|r| r.exists()).cloned().collect();
        let detector = DuplicateDetector::new(roots)
            .min_size(options.min_size.unwrap_or(self.min_size))
            .max_depth(self.max_depth)
            .exclude(options.ignored_folders.clone());

        match detector.find_groups(&options.cancel) {
            Ok(report) => {
                options.log(&format!(
                    "duplicates: {} groups from {} files",
                    report.groups.len(),
                    report.files_scanned
                ));
                ScanResult::new(DUPLICATES, report.items())
            }
            Err(e) => ScanResult::failed(DUPLICATES, e.to_string()),
        }
    }

    fn clean(&self, items: &[CleanableItem], dry_run: bool) -> CleanReport {
        cleaner::remove_items(items, dry_run)
    }
}
