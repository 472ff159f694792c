//! Runs registered scanners under a bounded schedule and filters the results.
//!
//! One run: validate options → drop ignored categories → schedule scans →
//! turn panicked or cancelled scans into failed results → filtering pipeline →
//! [`ScanSummary`] sorted by category id.

use std::borrow::Cow;
use std::time::Instant;

use super::filter::{self, AccessProbe, FilterConfig, PermissionFilter};
use super::registry::Registry;
use super::types::{Category, CategoryId, ScanResult, ScanSummary};
use super::walker;
use super::ScanOptions;
use crate::cleaner::CleanReport;
use crate::common::config::Config;
use crate::common::errors::Result;
use crate::common::CancelToken;
use crate::parallel::{Scheduler, Task, TaskFailure};

/// Progress event emitted once per finished scanner
#[derive(Debug)]
pub struct ScanProgress<'a> {
    pub completed: usize,
    pub total: usize,
    pub category: CategoryId,
    /// Raw result, before filtering
    pub result: &'a ScanResult,
    pub elapsed_ms: u128,
}

pub type ProgressCallback = Box<dyn FnMut(&ScanProgress<'_>)>;

/// How one run is scheduled
pub struct RunOptions {
    /// Run scanners concurrently; `false` runs them one after another
    pub parallel: bool,
    /// Maximum scanners in flight; must be at least 1
    pub concurrency: usize,
    pub on_progress: Option<ProgressCallback>,
    /// Token for this run only; a fresh one is created by default
    pub cancel: CancelToken,
}

impl RunOptions {
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ScanProgress<'_>) + 'static,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            concurrency: Scheduler::DEFAULT_CONCURRENCY,
            on_progress: None,
            cancel: CancelToken::new(),
        }
    }
}

impl std::fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOptions")
            .field("parallel", &self.parallel)
            .field("concurrency", &self.concurrency)
            .field("on_progress", &self.on_progress.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Owns the registry, the ignore rules and the permission filter for a session
pub struct Orchestrator {
    registry: Registry,
    filter: FilterConfig,
    permissions: PermissionFilter,
    scan_options: ScanOptions,
}

impl Orchestrator {
    pub fn new(registry: Registry, filter: FilterConfig) -> Self {
        Self {
            registry,
            filter,
            permissions: PermissionFilter::default(),
            scan_options: ScanOptions::default(),
        }
    }

    /// Built-in scanners with ignore rules taken from `config`
    pub fn from_config(config: &Config) -> Self {
        let scan_options = ScanOptions {
            ignored_folders: walker::expand_paths(&config.ignored_folders),
            ..ScanOptions::default()
        };
        Self::new(Registry::builtin(config), config.filter_config()).with_scan_options(scan_options)
    }

    pub fn with_probe(mut self, probe: impl AccessProbe + 'static) -> Self {
        self.permissions = PermissionFilter::new(probe);
        self
    }

    /// Options handed to every scanner. Their `cancel` token is replaced by
    /// the token of each run.
    pub fn with_scan_options(mut self, options: ScanOptions) -> Self {
        self.scan_options = options;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn filter(&self) -> &FilterConfig {
        &self.filter
    }

    /// Run every registered, non-ignored scanner
    pub fn run_all_scans(&self, options: RunOptions) -> Result<ScanSummary> {
        let ids = self.registry.ids();
        self.run(&ids, options)
    }

    /// Run the named scanners. Unknown ids fail the call before anything runs.
    pub fn run_scans<S: AsRef<str>>(&self, ids: &[S], options: RunOptions) -> Result<ScanSummary> {
        let ids = self.registry.resolve(ids)?;
        self.run(&ids, options)
    }

    fn run(&self, ids: &[CategoryId], options: RunOptions) -> Result<ScanSummary> {
        let scheduler = Scheduler::new(options.concurrency)?;
        let scheduler = if options.parallel {
            scheduler
        } else {
            Scheduler::sequential()
        }
        .with_cancel(&options.cancel);
        let cancel = options.cancel.clone();
        let started = Instant::now();

        let scanners: Vec<_> = ids
            .iter()
            .filter(|id| {
                let ignored = self.filter.is_category_ignored(**id);
                if ignored {
                    tracing::debug!("Skipping ignored category {}", id);
                }
                !ignored
            })
            .filter_map(|id| self.registry.get(*id))
            .collect();
        let categories: Vec<_> = scanners.iter().map(|s| s.category()).collect();

        tracing::info!(
            "Starting scan of {} categories (concurrency {})",
            scanners.len(),
            scheduler.concurrency()
        );

        let scan_options = ScanOptions {
            cancel: cancel.clone(),
            ..self.scan_options.clone()
        };
        let scan_options = &scan_options;
        let tasks: Vec<Task<'_, ScanResult>> = scanners
            .iter()
            .map(|scanner| {
                let scanner = *scanner;
                Task::new(scanner.category().id.as_str(), move || {
                    let mut result = scanner.scan(scan_options);
                    if scan_options.cancel.is_cancelled() && result.error.is_none() {
                        result.error = Some(cancelled_message(&scan_options.cancel));
                    }
                    result
                })
            })
            .collect();

        let mut on_progress = options.on_progress;
        let completions = scheduler.run(tasks, |completion, completed, total| {
            let category = categories[completion.index];
            let result = match &completion.outcome {
                Ok(result) => Cow::Borrowed(result),
                Err(failure) => Cow::Owned(failed_result(category, failure, &cancel)),
            };
            if let Some(callback) = on_progress.as_mut() {
                callback(&ScanProgress {
                    completed,
                    total,
                    category: category.id,
                    result: &result,
                    elapsed_ms: completion.elapsed.as_millis(),
                });
            }
        });

        let raw: Vec<ScanResult> = completions
            .into_iter()
            .map(|completion| {
                let category = categories[completion.index];
                match completion.outcome {
                    Ok(result) => {
                        if let Some(error) = &result.error {
                            tracing::warn!("Scanner {} reported: {}", category.id, error);
                        }
                        result
                    }
                    Err(failure) => {
                        let result = failed_result(category, &failure, &cancel);
                        if let TaskFailure::Panicked(_) = failure {
                            tracing::warn!(
                                "Scanner {} failed: {}",
                                category.id,
                                result.error.as_deref().unwrap_or_default()
                            );
                        }
                        result
                    }
                }
            })
            .collect();

        let filtered = filter::apply(raw, &self.filter, &self.permissions);
        let mut summary = ScanSummary::new(filtered, started.elapsed());
        summary.cancelled = cancel.is_cancelled();
        if summary.cancelled {
            tracing::info!("{}", cancelled_message(&cancel));
        }

        tracing::info!(
            "Scan finished: {} items, {} bytes in {:.2}s",
            summary.total_items,
            summary.total_size,
            summary.duration_secs
        );
        Ok(summary)
    }

    /// Clean every item in `results` through its category's scanner.
    /// Results for categories without a registered scanner are skipped.
    pub fn clean_results(&self, results: &[ScanResult], dry_run: bool) -> CleanReport {
        let mut report = CleanReport {
            dry_run,
            ..CleanReport::default()
        };

        for result in results {
            if result.items.is_empty() {
                continue;
            }
            let Some(scanner) = self.registry.get(result.category.id) else {
                tracing::warn!("No scanner registered for {}", result.category.id);
                continue;
            };
            tracing::info!(
                "Cleaning {} items from {}{}",
                result.items.len(),
                result.category.id,
                if dry_run { " (dry run)" } else { "" }
            );
            report.merge(scanner.clean(&result.items, dry_run));
        }

        report
    }
}

/// The error recorded for a scanner that panicked or never ran
fn failed_result(category: Category, failure: &TaskFailure, cancel: &CancelToken) -> ScanResult {
    match failure {
        TaskFailure::Panicked(panic) => ScanResult::failed(category, format!("scanner panicked: {}", panic)),
        TaskFailure::Cancelled => ScanResult::failed(category, cancelled_message(cancel)),
    }
}

fn cancelled_message(cancel: &CancelToken) -> String {
    match cancel.reason() {
        Some(reason) => format!("cancelled: {}", reason),
        None => "cancelled".to_string(),
    }
}
