use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::FileEntry;
use crate::common::errors::{ReclaimError, Result};
use crate::common::CancelToken;

/// Size of the quick hash prefix (first 4KB)
const QUICK_HASH_SIZE: usize = 4096;

/// Compute SHA-256 of the first 4KB of a file (quick hash)
pub fn quick_hash(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| ReclaimError::io(path, e))?;
    let mut reader = BufReader::new(file).take(QUICK_HASH_SIZE as u64);
    let mut buffer = Vec::with_capacity(QUICK_HASH_SIZE);
    reader
        .read_to_end(&mut buffer)
        .map_err(|e| ReclaimError::io(path, e))?;

    Ok(format!("{:x}", Sha256::digest(&buffer)))
}

/// Compute full SHA-256 hash of a file
pub fn full_hash(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| ReclaimError::io(path, e))?;
    let mut reader = BufReader::with_capacity(1024 * 1024, file); // 1MB buffer
    let mut hasher = Sha256::new();

    let mut buffer = vec![0u8; 1024 * 1024];
    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| ReclaimError::io(path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Pass 1: bucket by exact size.
/// Files with a unique size cannot have a duplicate, so those buckets are dropped.
pub fn group_by_size(files: Vec<FileEntry>) -> HashMap<u64, Vec<FileEntry>> {
    let mut groups: HashMap<u64, Vec<FileEntry>> = HashMap::new();
    for file in files {
        groups.entry(file.size).or_default().push(file);
    }

    // Only keep groups with 2+ files (potential duplicates)
    groups.retain(|_, v| v.len() > 1);
    groups
}

/// Content groups found in one size bucket
#[derive(Debug, Default)]
pub struct HashBuckets {
    /// Full hash to files; only groups with 2+ files
    pub groups: HashMap<String, Vec<FileEntry>>,
    /// Files that could not be read, dropped from their bucket
    pub errors: Vec<String>,
}

/// Pass 2: regroup one size bucket by content hash.
///
/// Files bigger than the quick-hash prefix are first split on a hash of
/// their first 4KB, so most false candidates are never read in full.
pub fn group_by_hash(files: Vec<FileEntry>, cancel: &CancelToken) -> HashBuckets {
    let mut errors = Vec::new();
    let needs_prefix = files.first().is_some_and(|f| f.size > QUICK_HASH_SIZE as u64);
    let candidates: Vec<FileEntry> = if needs_prefix {
        bucket(files, cancel, quick_hash, &mut errors)
            .into_values()
            .flatten()
            .collect()
    } else {
        files
    };
    if candidates.len() < 2 {
        return HashBuckets {
            groups: HashMap::new(),
            errors,
        };
    }
    let groups = bucket(candidates, cancel, full_hash, &mut errors);
    HashBuckets { groups, errors }
}

fn bucket(
    files: Vec<FileEntry>,
    cancel: &CancelToken,
    hash: fn(&Path) -> Result<String>,
    errors: &mut Vec<String>,
) -> HashMap<String, Vec<FileEntry>> {
    let mut groups: HashMap<String, Vec<FileEntry>> = HashMap::new();
    for file in files {
        if cancel.is_cancelled() {
            break;
        }
        match hash(&file.path) {
            Ok(digest) => groups.entry(digest).or_default().push(file),
            Err(e) => {
                tracing::debug!("Skipping unhashable file: {}", e);
                errors.push(e.to_string());
            }
        }
    }

    groups.retain(|_, v| v.len() > 1);
    groups
}
