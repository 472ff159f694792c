use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::common::errors::ReclaimError;
use crate::scanner::filter::FilterConfig;
use crate::scanner::walker;

/// Global reclaim configuration.
///
/// Loaded once per run and treated as read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Exact paths that are never reported
    #[serde(default)]
    pub ignored_paths: Vec<String>,

    /// Folders whose contents are never reported
    #[serde(default)]
    pub ignored_folders: Vec<String>,

    /// Category ids that are never scanned or reported
    #[serde(default)]
    pub ignored_categories: Vec<String>,

    /// Run scanners concurrently
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Maximum scanners in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Stale threshold in days (build artifacts, logs)
    #[serde(default = "default_stale_days")]
    pub stale_days: u32,

    /// Large file threshold in MB
    #[serde(default = "default_large_file_mb")]
    pub large_file_threshold_mb: u64,

    /// Smallest file considered by duplicate detection, in KB
    #[serde(default = "default_duplicate_min_kb")]
    pub duplicate_min_size_kb: u64,

    /// How deep duplicate detection descends below each root
    #[serde(default = "default_duplicate_depth")]
    pub duplicate_max_depth: usize,
}

fn default_parallel() -> bool {
    true
}
fn default_concurrency() -> usize {
    4
}
fn default_stale_days() -> u32 {
    30
}
fn default_large_file_mb() -> u64 {
    500
}
fn default_duplicate_min_kb() -> u64 {
    1024
}
fn default_duplicate_depth() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignored_paths: Vec::new(),
            ignored_folders: Vec::new(),
            ignored_categories: Vec::new(),
            parallel: default_parallel(),
            concurrency: default_concurrency(),
            stale_days: default_stale_days(),
            large_file_threshold_mb: default_large_file_mb(),
            duplicate_min_size_kb: default_duplicate_min_kb(),
            duplicate_max_depth: default_duplicate_depth(),
        }
    }
}

impl Config {
    /// Get the reclaim data directory (~/.reclaim)
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".reclaim")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Get the logs directory
    pub fn logs_dir() -> PathBuf {
        Self::data_dir().join("logs")
    }

    /// Load config from the default location, or defaults if it does not exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&contents).map_err(|e| ReclaimError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no run could start with
    pub fn validate(&self) -> crate::common::errors::Result<()> {
        if self.concurrency == 0 {
            return Err(ReclaimError::InvalidConcurrency(self.concurrency));
        }
        if self.duplicate_max_depth == 0 {
            return Err(ReclaimError::Config {
                path: Self::config_path(),
                message: "duplicate_max_depth must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Build the normalized ignore rules for one run. `~` expands to the
    /// home directory, matching the walk hints.
    pub fn filter_config(&self) -> FilterConfig {
        let expand = |raw: &[String]| -> Vec<String> {
            raw.iter().map(|p| walker::expand_tilde(p)).collect()
        };
        FilterConfig::new(
            &expand(&self.ignored_paths),
            &expand(&self.ignored_folders),
            &self.ignored_categories,
        )
    }

    /// Get large file threshold in bytes
    pub fn large_file_threshold_bytes(&self) -> u64 {
        self.large_file_threshold_mb * 1024 * 1024
    }

    /// Get duplicate minimum size in bytes
    pub fn duplicate_min_size_bytes(&self) -> u64 {
        self.duplicate_min_size_kb * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::types::CategoryId;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.parallel);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.duplicate_min_size_bytes(), 1024 * 1024);
        assert_eq!(config.duplicate_max_depth, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "ignored_categories = [\"trash\"]\nignored_folders = [\"/home/u/Downloads/\"]\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.ignored_categories, vec!["trash".to_string()]);

        let filter = config.filter_config();
        assert!(filter.is_category_ignored(CategoryId::Trash));
        assert!(filter.is_path_ignored(Path::new("/home/u/Downloads/a.zip")));
    }

    #[test]
    fn test_tilde_rules_match_under_home() {
        let home = dirs::home_dir().unwrap();
        let config = Config {
            ignored_paths: vec!["~/.cache/pip".into()],
            ignored_folders: vec!["~/Downloads".into()],
            ..Config::default()
        };

        let filter = config.filter_config();
        assert!(filter.is_path_ignored(&home.join(".cache/pip")));
        assert!(filter.is_path_ignored(&home.join("Downloads/a.zip")));
        assert!(!filter.is_path_ignored(&home.join("Downloads2/a.zip")));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "concurrency = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_malformed_file_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "concurrency = \"four\"\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Config error"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/reclaim/config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }
}
