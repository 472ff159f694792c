use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use crate::common::errors::ReclaimError;

// ─── Categories ───────────────────────────────────────────────────────────────

/// Risk of removing items in a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    /// Caches, trash: regenerated or already discarded
    Safe,
    /// Logs, build artifacts: review recommended
    Moderate,
    /// Large files, duplicates: user data
    Risky,
}

/// Closed set of category ids, one per registered scanner.
/// Declared in id order so derived `Ord` matches sorting by id string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryId {
    BuildArtifacts,
    Caches,
    Duplicates,
    LargeFiles,
    Logs,
    Trash,
}

impl CategoryId {
    pub const ALL: [CategoryId; 6] = [
        CategoryId::BuildArtifacts,
        CategoryId::Caches,
        CategoryId::Duplicates,
        CategoryId::LargeFiles,
        CategoryId::Logs,
        CategoryId::Trash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryId::BuildArtifacts => "build_artifacts",
            CategoryId::Caches => "caches",
            CategoryId::Duplicates => "duplicates",
            CategoryId::LargeFiles => "large_files",
            CategoryId::Logs => "logs",
            CategoryId::Trash => "trash",
        }
    }
}

impl FromStr for CategoryId {
    type Err = ReclaimError;

    /// Accepts `large_files` as well as `large-files`, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('-', "_");
        CategoryId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == key)
            .ok_or_else(|| ReclaimError::UnknownCategory(s.to_string()))
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named class of cleanable items. Static per scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: &'static str,
    pub safety: SafetyLevel,
}

impl Category {
    pub const fn new(id: CategoryId, name: &'static str, safety: SafetyLevel) -> Self {
        Self { id, name, safety }
    }
}

// ─── Items and results ────────────────────────────────────────────────────────

/// A single file or directory identified as a deletion candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanableItem {
    pub path: PathBuf,
    pub size: u64,
    pub name: String,
    pub is_directory: bool,
    pub modified_at: SystemTime,
}

impl CleanableItem {
    /// Create an item named after the last path component
    pub fn new(path: impl Into<PathBuf>, size: u64, is_directory: bool, modified_at: SystemTime) -> Self {
        let path = path.into();
        let name = display_name(&path);
        Self {
            path,
            size,
            name,
            is_directory,
            modified_at,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Age of the item relative to now; zero for timestamps in the future
    pub fn age(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.modified_at)
            .unwrap_or_default()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Output of one scanner invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    pub category: Category,
    pub items: Vec<CleanableItem>,
    /// Always the sum of `items[..].size`
    pub total_size: u64,
    /// Set when the scanner could not complete; `items` stays usable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanResult {
    pub fn new(category: Category, items: Vec<CleanableItem>) -> Self {
        let mut result = Self {
            category,
            items,
            total_size: 0,
            error: None,
        };
        result.recalculate();
        result
    }

    /// A result for a scanner that produced nothing
    pub fn failed(category: Category, error: impl Into<String>) -> Self {
        Self {
            category,
            items: Vec::new(),
            total_size: 0,
            error: Some(error.into()),
        }
    }

    /// Keep only items matching the predicate and refresh the total
    pub fn retain_items<F>(mut self, keep: F) -> Self
    where
        F: FnMut(&CleanableItem) -> bool,
    {
        self.items.retain(keep);
        self.recalculate();
        self
    }

    /// Recalculate totals from items
    pub fn recalculate(&mut self) {
        self.total_size = self.items.iter().map(|i| i.size).sum();
    }
}

/// Aggregate view over all scanners that ran
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    /// When the scan finished
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// How long the scan took in seconds
    pub duration_secs: f64,

    /// One result per scanner, sorted by category id
    pub results: Vec<ScanResult>,

    /// Total reclaimable space in bytes
    pub total_size: u64,

    /// Total items found
    pub total_items: usize,

    /// The run's cancel token fired; results may be partial
    pub cancelled: bool,
}

impl ScanSummary {
    pub fn new(mut results: Vec<ScanResult>, elapsed: Duration) -> Self {
        results.sort_by(|a, b| a.category.id.as_str().cmp(b.category.id.as_str()));
        let total_size = results.iter().map(|r| r.total_size).sum();
        let total_items = results.iter().map(|r| r.items.len()).sum();
        Self {
            timestamp: chrono::Utc::now(),
            duration_secs: elapsed.as_secs_f64(),
            results,
            total_size,
            total_items,
            cancelled: false,
        }
    }

    pub fn result(&self, id: CategoryId) -> Option<&ScanResult> {
        self.results.iter().find(|r| r.category.id == id)
    }

    /// Categories whose scanner reported an error
    pub fn errors(&self) -> impl Iterator<Item = (CategoryId, &str)> {
        self.results
            .iter()
            .filter_map(|r| r.error.as_deref().map(|e| (r.category.id, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRASH: Category = Category::new(CategoryId::Trash, "Trash", SafetyLevel::Safe);
    const LOGS: Category = Category::new(CategoryId::Logs, "Logs", SafetyLevel::Moderate);

    fn item(path: &str, size: u64) -> CleanableItem {
        CleanableItem::new(path, size, false, SystemTime::UNIX_EPOCH)
    }

    #[test]
    fn test_category_id_parsing() {
        assert_eq!("trash".parse::<CategoryId>().unwrap(), CategoryId::Trash);
        assert_eq!(
            "Large-Files".parse::<CategoryId>().unwrap(),
            CategoryId::LargeFiles
        );
        assert!(matches!(
            "browser".parse::<CategoryId>(),
            Err(ReclaimError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_category_order_matches_id_strings() {
        let mut by_string = CategoryId::ALL.to_vec();
        by_string.sort_by_key(|id| id.as_str());
        assert_eq!(by_string, CategoryId::ALL.to_vec());
    }

    #[test]
    fn test_item_name_from_path() {
        let i = item("/home/u/Downloads/a.zip", 10);
        assert_eq!(i.name, "a.zip");
        assert!(!i.is_directory);
    }

    #[test]
    fn test_result_total_is_item_sum() {
        let result = ScanResult::new(TRASH, vec![item("/a", 100), item("/b", 200), item("/c", 300)]);
        assert_eq!(result.total_size, 600);

        let filtered = result.retain_items(|i| i.size != 200);
        assert_eq!(filtered.total_size, 400);
        assert_eq!(filtered.items.len(), 2);
    }

    #[test]
    fn test_summary_totals_and_order() {
        let summary = ScanSummary::new(
            vec![
                ScanResult::new(TRASH, vec![item("/a", 5)]),
                ScanResult::new(LOGS, vec![item("/b", 7), item("/c", 1)]),
                ScanResult::failed(
                    Category::new(CategoryId::Caches, "Caches", SafetyLevel::Safe),
                    "boom",
                ),
            ],
            Duration::from_millis(10),
        );

        assert_eq!(summary.total_size, 13);
        assert_eq!(summary.total_items, 3);
        let ids: Vec<_> = summary.results.iter().map(|r| r.category.id).collect();
        assert_eq!(ids, vec![CategoryId::Caches, CategoryId::Logs, CategoryId::Trash]);
        assert_eq!(summary.errors().collect::<Vec<_>>(), vec![(CategoryId::Caches, "boom")]);
        assert_eq!(summary.total_size, summary.results.iter().map(|r| r.total_size).sum::<u64>());
    }
}
