use std::path::Path;

/// Paths that must NEVER be deleted under any circumstances.
/// This is the last safety net against scanners producing bad items.
const PROTECTED_PATHS: &[&str] = &[
    "/",
    "/System",
    "/Applications",
    "/Users",
    "/Library",
    "/home",
    "/root",
    "/usr",
    "/bin",
    "/sbin",
    "/lib",
    "/var",
    "/etc",
    "/opt",
    "/private",
    "/tmp",
    "/Volumes",
];

/// Paths under home that must never be deleted entirely
const PROTECTED_HOME_DIRS: &[&str] = &[
    "", // home dir itself
    "Desktop",
    "Documents",
    "Downloads",
    "Pictures",
    "Music",
    "Movies",
    "Library",
    "Applications",
    ".cache",
    ".config",
    ".local",
    ".ssh",
    ".gnupg",
];

/// Check if a path is protected and should NEVER be deleted
pub fn is_protected(path: &Path) -> bool {
    let trimmed = path.components().collect::<std::path::PathBuf>();

    if PROTECTED_PATHS.iter().any(|p| trimmed == Path::new(p)) {
        return true;
    }

    if let Some(home) = dirs::home_dir() {
        return PROTECTED_HOME_DIRS.iter().any(|dir| {
            let protected = if dir.is_empty() {
                home.clone()
            } else {
                home.join(dir)
            };
            trimmed == protected
        });
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_protected() {
        assert!(is_protected(Path::new("/")));
    }

    #[test]
    fn test_system_dirs_protected() {
        assert!(is_protected(Path::new("/System")));
        assert!(is_protected(Path::new("/usr")));
        assert!(is_protected(Path::new("/etc/")));
        assert!(is_protected(Path::new("/home")));
    }

    #[test]
    fn test_home_dir_protected() {
        if let Some(home) = dirs::home_dir() {
            assert!(is_protected(&home));
            assert!(is_protected(&home.join("Desktop")));
            assert!(is_protected(&home.join("Downloads")));
            assert!(is_protected(&home.join(".ssh")));
        }
    }

    #[test]
    fn test_cache_entries_not_protected() {
        if let Some(home) = dirs::home_dir() {
            assert!(!is_protected(&home.join(".cache/pip/wheels")));
            assert!(!is_protected(&home.join("Library/Logs/old.log")));
            assert!(!is_protected(&home.join("Downloads/a.zip")));
        }
    }

    #[test]
    fn test_tmp_children_not_protected() {
        assert!(is_protected(Path::new("/tmp")));
        assert!(!is_protected(Path::new("/tmp/somefile")));
    }
}
