use super::dev_detector::BuildArtifactScanner;
use super::large_files::LargeFileScanner;
use super::targets::{self, TargetScanner};
use super::types::CategoryId;
use super::Scanner;
use crate::common::config::Config;
use crate::common::errors::{ReclaimError, Result};
use crate::duplicates::DuplicateScanner;

/// The set of scanners available to a run, one per category id
pub struct Registry {
    scanners: Vec<Box<dyn Scanner>>,
}

impl Registry {
    pub fn new(scanners: Vec<Box<dyn Scanner>>) -> Self {
        let mut registry = Self { scanners: Vec::new() };
        for scanner in scanners {
            registry.register(scanner);
        }
        registry
    }

    /// Every built-in scanner, configured from `config`
    pub fn builtin(config: &Config) -> Self {
        Self::new(vec![
            Box::new(BuildArtifactScanner::new(config.stale_days)),
            Box::new(TargetScanner::new(targets::caches_target())),
            Box::new(
                DuplicateScanner::new()
                    .min_size(config.duplicate_min_size_bytes())
                    .max_depth(config.duplicate_max_depth),
            ),
            Box::new(LargeFileScanner::new(config.large_file_threshold_bytes())),
            Box::new(TargetScanner::new(targets::logs_target())),
            Box::new(TargetScanner::new(targets::trash_target())),
        ])
    }

    /// Add a scanner, replacing any scanner already registered for its category
    pub fn register(&mut self, scanner: Box<dyn Scanner>) {
        let id = scanner.category().id;
        if let Some(slot) = self.scanners.iter_mut().find(|s| s.category().id == id) {
            tracing::debug!("Replacing scanner for {}", id);
            *slot = scanner;
        } else {
            self.scanners.push(scanner);
        }
    }

    pub fn get(&self, id: CategoryId) -> Option<&dyn Scanner> {
        self.scanners
            .iter()
            .find(|s| s.category().id == id)
            .map(|s| s.as_ref())
    }

    pub fn scanners(&self) -> impl Iterator<Item = &dyn Scanner> {
        self.scanners.iter().map(|s| s.as_ref())
    }

    /// Registered category ids in id order
    pub fn ids(&self) -> Vec<CategoryId> {
        let mut ids: Vec<CategoryId> = self.scanners.iter().map(|s| s.category().id).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.scanners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scanners.is_empty()
    }

    /// Parse and check requested ids. Any id that is unknown or has no
    /// registered scanner fails the whole request. Duplicates collapse.
    pub fn resolve<S: AsRef<str>>(&self, requested: &[S]) -> Result<Vec<CategoryId>> {
        let mut ids = Vec::with_capacity(requested.len());
        for raw in requested {
            let id: CategoryId = raw.as_ref().parse()?;
            if self.get(id).is_none() {
                return Err(ReclaimError::UnknownCategory(raw.as_ref().to_string()));
            }
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_category() {
        let registry = Registry::default();
        assert_eq!(registry.ids(), CategoryId::ALL.to_vec());
    }

    #[test]
    fn test_register_replaces_same_category() {
        let mut registry = Registry::new(vec![Box::new(TargetScanner::new(targets::logs_target()))]);
        registry.register(Box::new(TargetScanner::new(targets::logs_target())));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_resolve_validates_ids() {
        let registry = Registry::new(vec![
            Box::new(TargetScanner::new(targets::trash_target())),
            Box::new(TargetScanner::new(targets::logs_target())),
        ]);
        assert_eq!(
            registry.resolve(&["trash", "LOGS", "trash"]).unwrap(),
            vec![CategoryId::Trash, CategoryId::Logs]
        );
        assert!(matches!(
            registry.resolve(&["browser"]),
            Err(ReclaimError::UnknownCategory(_))
        ));
        // Valid id, but nothing registered for it
        assert!(matches!(
            registry.resolve(&["caches"]),
            Err(ReclaimError::UnknownCategory(_))
        ));
    }
}
