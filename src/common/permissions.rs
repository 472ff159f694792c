use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

/// System resources that stay locked by the OS while it runs.
/// Matched literally against every path segment.
const LOCKED_NAMES: &[&str] = &[
    "com.apple.LaunchServices",
    "com.apple.nsurlsessiond",
    "com.apple.bird",
    "com.apple.akd",
    "com.apple.ap.adprivacyd",
    "CloudKit",
    "FamilyCircle",
    "systemd-private",
];

/// Vendor-namespaced daemons, matched as globs against every path segment.
const LOCKED_PATTERNS: &[&str] = &[
    "com.apple.*Service",
    "com.apple.*Services",
    "com.apple.*Agent",
    "com.apple.*Helper",
];

/// Blacklist of always-locked system resource names
#[derive(Debug, Clone)]
pub struct LockedResources {
    patterns: GlobSet,
}

impl LockedResources {
    pub fn new() -> Self {
        let mut builder = GlobSetBuilder::new();
        for pattern in LOCKED_PATTERNS {
            // Patterns are compile-time constants; a bad one is skipped, not fatal
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => tracing::warn!("Invalid locked-resource pattern '{}': {}", pattern, e),
            }
        }
        let patterns = builder.build().unwrap_or_else(|_| GlobSet::empty());
        Self { patterns }
    }

    /// Check if any segment of the path names a locked resource
    pub fn is_locked(&self, path: &Path) -> bool {
        path.iter().any(|segment| {
            let name = segment.to_string_lossy();
            LOCKED_NAMES.contains(&name.as_ref()) || self.patterns.is_match(name.as_ref())
        })
    }
}

impl Default for LockedResources {
    fn default() -> Self {
        Self::new()
    }
}

/// Known SIP-protected paths that cannot be modified
const SIP_PATHS: &[&str] = &["/System", "/usr", "/bin", "/sbin", "/Applications/Utilities"];

/// Check if a path is SIP-protected
pub fn is_sip_protected(path: &Path) -> bool {
    SIP_PATHS.iter().any(|p| path.starts_with(p))
}

/// Check if we can write to a path.
/// Removing an entry needs the entry to exist and its parent to be writable
/// by the current user.
pub fn can_write(path: &Path) -> bool {
    let Ok(entry) = std::fs::symlink_metadata(path) else {
        return false;
    };
    match path.parent() {
        Some(parent) => can_unlink_from(parent, &entry),
        None => false,
    }
}

/// Asks the kernel, so ownership and group bits count, not just the mode.
/// In a sticky directory such as /tmp only the entry's owner may remove it.
#[cfg(unix)]
fn can_unlink_from(parent: &Path, entry: &std::fs::Metadata) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;
    use std::os::unix::fs::MetadataExt;

    let Ok(c_parent) = CString::new(parent.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: `c_parent` is a valid NUL-terminated string for the whole call
    if unsafe { libc::access(c_parent.as_ptr(), libc::W_OK | libc::X_OK) } != 0 {
        return false;
    }

    let Ok(parent_meta) = std::fs::metadata(parent) else {
        return false;
    };
    if parent_meta.mode() & 0o1000 == 0 {
        return true;
    }
    // SAFETY: geteuid has no preconditions and cannot fail
    let euid = unsafe { libc::geteuid() };
    euid == 0 || euid == entry.uid() || euid == parent_meta.uid()
}

#[cfg(not(unix))]
fn can_unlink_from(parent: &Path, _entry: &std::fs::Metadata) -> bool {
    std::fs::metadata(parent)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false)
}

/// Get a helpful message for permission issues
pub fn permission_hint(path: &Path) -> String {
    if is_sip_protected(path) {
        "This path is protected by the operating system and cannot be modified.".to_string()
    } else {
        format!(
            "Check file permissions for '{}'. You may need elevated privileges for system paths.",
            path.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_literal_segment() {
        let locked = LockedResources::new();
        assert!(locked.is_locked(Path::new(
            "/Users/u/Library/Caches/com.apple.nsurlsessiond/data"
        )));
        assert!(locked.is_locked(Path::new("/home/u/.cache/CloudKit")));
    }

    #[test]
    fn test_locked_vendor_suffix_patterns() {
        let locked = LockedResources::new();
        assert!(locked.is_locked(Path::new(
            "/Users/u/Library/Caches/com.apple.SoftwareUpdateService/x.db"
        )));
        assert!(locked.is_locked(Path::new("/Users/u/Library/Logs/com.apple.CommerceAgent")));
        assert!(locked.is_locked(Path::new("/Users/u/Library/Caches/com.apple.SiriHelper")));
    }

    #[test]
    fn test_unrelated_names_not_locked() {
        let locked = LockedResources::new();
        assert!(!locked.is_locked(Path::new("/Users/u/Library/Caches/com.example.Service")));
        assert!(!locked.is_locked(Path::new("/home/u/.cache/pip/http/abc")));
        // Suffix match applies to the segment, not to a substring in the middle
        assert!(!locked.is_locked(Path::new("/tmp/com.apple.AgentCache/file")));
    }

    #[test]
    fn test_can_write_missing_path() {
        assert!(!can_write(Path::new("/nonexistent/reclaim/file.bin")));
    }

    #[test]
    fn test_can_write_temp_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(can_write(&file));
    }

    #[cfg(unix)]
    #[test]
    fn test_can_write_needs_write_access_to_parent() {
        use std::os::unix::fs::PermissionsExt;

        // root bypasses mode bits
        if unsafe { libc::geteuid() } == 0 {
            return;
        }
        let dir = tempfile::TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        let file = locked.join("a.txt");
        std::fs::write(&file, b"x").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        let writable = can_write(&file);
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(!writable);

        // Root-owned 0755 directory: write bits are set, but not for us
        assert!(!can_write(Path::new("/etc")));
    }

    #[test]
    fn test_sip_protected_paths() {
        assert!(is_sip_protected(Path::new("/System/Library")));
        assert!(is_sip_protected(Path::new("/usr/bin/ls")));
        assert!(!is_sip_protected(Path::new("/usrlocal/thing")));
        assert!(!is_sip_protected(Path::new("/tmp/test")));
    }
}
