use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::common::errors::ReclaimError;
use crate::common::safety;
use crate::scanner::types::CleanableItem;

/// Report from a clean operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanReport {
    pub dry_run: bool,
    /// Items that were removed (or would be, for a dry run)
    pub cleaned_items: Vec<CleanableItem>,
    pub freed_space: u64,
    /// Items that could not be removed
    pub failed: usize,
    pub errors: Vec<String>,
}

impl CleanReport {
    /// Fold another report into this one
    pub fn merge(&mut self, other: CleanReport) {
        self.dry_run |= other.dry_run;
        self.cleaned_items.extend(other.cleaned_items);
        self.freed_space += other.freed_space;
        self.failed += other.failed;
        self.errors.extend(other.errors);
    }
}

/// How an item is physically removed
pub trait Deleter: Send + Sync {
    fn delete(&self, item: &CleanableItem) -> Result<()>;
}

/// Permanent removal, no undo
#[derive(Debug, Clone, Copy, Default)]
pub struct PermanentDelete;

impl Deleter for PermanentDelete {
    fn delete(&self, item: &CleanableItem) -> Result<()> {
        hard_delete_path(&item.path)
    }
}

/// Remove items permanently; the shared cleaning behaviour for scanners
pub fn remove_items(items: &[CleanableItem], dry_run: bool) -> CleanReport {
    remove_items_with(items, dry_run, &PermanentDelete)
}

/// Remove items with the given deleter.
///
/// - dry run: no I/O, every item reported as cleaned
/// - protected paths are refused and counted as failures
/// - a failing item never stops the remaining ones
pub fn remove_items_with(items: &[CleanableItem], dry_run: bool, deleter: &dyn Deleter) -> CleanReport {
    let mut report = CleanReport {
        dry_run,
        ..CleanReport::default()
    };

    if dry_run {
        report.freed_space = items.iter().map(|i| i.size).sum();
        report.cleaned_items = items.to_vec();
        return report;
    }

    for item in items {
        if safety::is_protected(&item.path) {
            report.failed += 1;
            report.errors.push(
                ReclaimError::Protected {
                    path: item.path.clone(),
                }
                .to_string(),
            );
            continue;
        }

        match deleter.delete(item) {
            Ok(()) => {
                report.freed_space += item.size;
                report.cleaned_items.push(item.clone());
            }
            Err(e) => {
                tracing::warn!("Failed to clean {}: {:#}", item.path.display(), e);
                report.failed += 1;
                report.errors.push(format!("{:#}", e));
            }
        }
    }

    report
}

/// Delete a single file or directory permanently
fn hard_delete_path(path: &Path) -> Result<()> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()), // Already gone
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to stat: {}", path.display()));
        }
    };

    if metadata.is_dir() {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    } else {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove file: {}", path.display()))?;
    }

    Ok(())
}
