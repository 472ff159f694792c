use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use rayon::prelude::*;

use super::types::{Category, CategoryId, CleanableItem, SafetyLevel, ScanResult};
use super::walker::{self, Walk};
use super::{ScanOptions, Scanner};
use crate::cleaner::{self, CleanReport};

pub const BUILD_ARTIFACTS: Category =
    Category::new(CategoryId::BuildArtifacts, "Build Artifacts", SafetyLevel::Moderate);

/// Where a project marker lives relative to the artifact directory
#[derive(Debug, Clone, Copy)]
enum Marker {
    /// File next to the artifact directory, e.g. `package.json`
    Sibling(&'static str),
    /// File inside the artifact directory, e.g. `pyvenv.cfg`
    Inside(&'static str),
}

struct Artifact {
    names: &'static [&'static str],
    marker: Marker,
    label: &'static str,
}

const ARTIFACTS: &[Artifact] = &[
    Artifact {
        names: &["node_modules"],
        marker: Marker::Sibling("package.json"),
        label: "node_modules",
    },
    Artifact {
        names: &["target"],
        marker: Marker::Sibling("Cargo.toml"),
        label: "Cargo target",
    },
    Artifact {
        names: &["build"],
        marker: Marker::Sibling("build.gradle"),
        label: "Gradle build",
    },
    Artifact {
        names: &[".venv", "venv", ".env", "env"],
        marker: Marker::Inside("pyvenv.cfg"),
        label: "Python venv",
    },
];

/// Project directories searched when no roots are given
const SEARCH_DIRS: &[&str] = &[
    "Projects",
    "projects",
    "Code",
    "code",
    "Development",
    "dev",
    "workspace",
    "repos",
    "src",
    "Documents",
    "Desktop",
];

/// Recognise `dir` as a build artifact by its name and project marker
fn classify(dir: &Path) -> Option<(&'static Artifact, PathBuf)> {
    let name = dir.file_name()?.to_str()?;
    let artifact = ARTIFACTS.iter().find(|a| a.names.contains(&name))?;
    let marker = match artifact.marker {
        Marker::Sibling(file) => dir.parent()?.join(file),
        Marker::Inside(file) => dir.join(file),
    };
    marker.is_file().then_some((artifact, marker))
}

/// Finds regenerable build output in stale projects: `node_modules`,
/// Cargo `target`, Gradle `build`, and Python virtualenvs.
///
/// A project counts as stale when its marker file was last modified more
/// than `stale_days` ago. Unknown modification times count as stale.
#[derive(Debug, Clone)]
pub struct BuildArtifactScanner {
    roots: Vec<PathBuf>,
    stale_days: u32,
}

impl BuildArtifactScanner {
    pub fn new(stale_days: u32) -> Self {
        let home = dirs::home_dir().unwrap_or_default();
        Self {
            roots: SEARCH_DIRS.iter().map(|d| home.join(d)).collect(),
            stale_days,
        }
    }

    pub fn with_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.roots = roots;
        self
    }

    fn is_stale(marker: &Path, days: u32) -> bool {
        let threshold = Duration::from_secs(days as u64 * 86400);
        std::fs::metadata(marker)
            .and_then(|m| m.modified())
            .map(|modified| {
                SystemTime::now()
                    .duration_since(modified)
                    .unwrap_or_default()
                    >= threshold
            })
            .unwrap_or(true)
    }

    fn scan_root(&self, root: &Path, days: u32, options: &ScanOptions) -> Vec<CleanableItem> {
        let ignored = options.ignored_folders.clone();
        let walk = Walk::new(root)
            .include_dirs(true)
            .cancel(&options.cancel)
            .filter(move |e| {
                let name = e.file_name().to_string_lossy();
                if name == "Library" || ignored.iter().any(|f| e.path().starts_with(f)) {
                    return false;
                }
                let is_artifact_name = ARTIFACTS.iter().any(|a| a.names.contains(&name.as_ref()));
                if name.starts_with('.') && !is_artifact_name {
                    return false;
                }
                // Never descend into a confirmed artifact
                e.path().parent().map_or(true, |p| classify(p).is_none())
            });

        walk.iter()
            .filter(|r| r.is_dir)
            .filter_map(|r| {
                let (artifact, marker) = classify(&r.path)?;
                if !Self::is_stale(&marker, days) {
                    return None;
                }
                let project = r
                    .path
                    .parent()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let size = walker::dir_size(&r.path);
                Some(
                    CleanableItem::new(r.path, size, true, r.modified)
                        .with_name(format!("{} in {}", artifact.label, project)),
                )
            })
            .collect()
    }
}

impl Scanner for BuildArtifactScanner {
    fn category(&self) -> Category {
        BUILD_ARTIFACTS
    }

    fn scan(&self, options: &ScanOptions) -> ScanResult {
        let days = options.days_old.unwrap_or(self.stale_days);
        let existing: Vec<&PathBuf> = self.roots.iter().filter(|p| p.exists()).collect();

        let mut items: Vec<CleanableItem> = existing
            .par_iter()
            .flat_map_iter(|root| self.scan_root(root, days, options))
            .collect();

        items.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        items.dedup_by(|a, b| a.path == b.path);
        options.log(&format!("build_artifacts: {} stale directories", items.len()));
        ScanResult::new(BUILD_ARTIFACTS, items)
    }

    fn clean(&self, items: &[CleanableItem], dry_run: bool) -> CleanReport {
        cleaner::remove_items(items, dry_run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn age(path: &Path, days: u64) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(days * 86400))
            .unwrap();
    }

    fn project(root: &Path, name: &str, marker: &str, artifact: &str, days: u64) -> PathBuf {
        let dir = root.join(name);
        std::fs::create_dir_all(dir.join(artifact).join("nested")).unwrap();
        std::fs::write(dir.join(artifact).join("nested/blob"), vec![0u8; 100]).unwrap();
        std::fs::write(dir.join(marker), b"{}").unwrap();
        age(&dir.join(marker), days);
        dir.join(artifact)
    }

    #[test]
    fn test_finds_stale_node_modules_and_target() {
        let dir = TempDir::new().unwrap();
        let web = project(dir.path(), "web", "package.json", "node_modules", 90);
        let tool = project(dir.path(), "tool", "Cargo.toml", "target", 90);
        project(dir.path(), "fresh", "package.json", "node_modules", 1);

        let scanner = BuildArtifactScanner::new(30).with_roots(vec![dir.path().to_path_buf()]);
        let result = scanner.scan(&ScanOptions::default());

        let mut paths: Vec<&Path> = result.items.iter().map(|i| i.path.as_path()).collect();
        paths.sort();
        assert_eq!(paths, vec![tool.as_path(), web.as_path()]);
        assert_eq!(result.total_size, 200);
        assert!(result.items.iter().any(|i| i.name == "node_modules in web"));
    }

    #[test]
    fn test_directories_without_marker_are_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("notes/build")).unwrap();
        std::fs::write(dir.path().join("notes/build/out.txt"), b"x").unwrap();

        let scanner = BuildArtifactScanner::new(0).with_roots(vec![dir.path().to_path_buf()]);
        assert!(scanner.scan(&ScanOptions::default()).items.is_empty());
    }

    #[test]
    fn test_nested_artifacts_not_reported_twice() {
        let dir = TempDir::new().unwrap();
        let outer = project(dir.path(), "app", "package.json", "node_modules", 90);
        // A dependency that ships its own package.json + node_modules
        project(&outer, "dep", "package.json", "node_modules", 90);

        let scanner = BuildArtifactScanner::new(30).with_roots(vec![dir.path().to_path_buf()]);
        let result = scanner.scan(&ScanOptions::default());
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].path, outer);
    }

    #[test]
    fn test_venv_detected_by_pyvenv_cfg() {
        let dir = TempDir::new().unwrap();
        let venv = dir.path().join("ml/.venv");
        std::fs::create_dir_all(venv.join("lib")).unwrap();
        std::fs::write(venv.join("pyvenv.cfg"), b"home = /usr/bin").unwrap();
        age(&venv.join("pyvenv.cfg"), 60);

        let scanner = BuildArtifactScanner::new(30).with_roots(vec![dir.path().to_path_buf()]);
        let result = scanner.scan(&ScanOptions::default());
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].name, "Python venv in ml");
    }
}
