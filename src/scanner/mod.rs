pub mod dev_detector;
pub mod filter;
pub mod large_files;
pub mod orchestrator;
pub mod registry;
pub mod targets;
pub mod types;
pub mod walker;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cleaner::CleanReport;
use crate::common::CancelToken;
use types::{Category, CleanableItem, ScanResult};

pub use orchestrator::{Orchestrator, RunOptions, ScanProgress};
pub use registry::Registry;

/// Optional sink receiving scanner log lines in addition to `tracing`
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Capability every category scanner implements.
///
/// `scan` is read-only and must not fail for expected conditions such as
/// missing directories or permission errors; those contribute nothing.
/// Only malformed options are reported, through `ScanResult::error`.
pub trait Scanner: Send + Sync {
    fn category(&self) -> Category;

    fn scan(&self, options: &ScanOptions) -> ScanResult;

    /// Remove previously scanned items. Most scanners delegate to
    /// [`crate::cleaner::remove_items`].
    fn clean(&self, items: &[CleanableItem], dry_run: bool) -> CleanReport;
}

/// Options shared by every scanner in one run
#[derive(Clone, Default)]
pub struct ScanOptions {
    /// Only report items older than this many days
    pub days_old: Option<u32>,
    /// Override the scanner's own minimum size
    pub min_size: Option<u64>,
    /// Folders scanners may skip while walking
    pub ignored_folders: Vec<PathBuf>,
    pub cancel: CancelToken,
    pub logger: Option<LogSink>,
}

impl ScanOptions {
    pub fn log(&self, message: &str) {
        tracing::debug!("{}", message);
        if let Some(sink) = &self.logger {
            sink(message);
        }
    }

    /// Walking hint; the filtering pipeline enforces ignores regardless
    pub fn is_ignored_folder(&self, path: &Path) -> bool {
        self.ignored_folders.iter().any(|f| path.starts_with(f))
    }
}

impl std::fmt::Debug for ScanOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanOptions")
            .field("days_old", &self.days_old)
            .field("min_size", &self.min_size)
            .field("ignored_folders", &self.ignored_folders)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("logger", &self.logger.is_some())
            .finish()
    }
}
