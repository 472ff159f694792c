//! # reclaim
//!
//! Disk cleanup engine: finds reclaimable storage by category and removes
//! what you select.
//!
//! - **Concurrent scans**: category scanners run under a bounded schedule;
//!   one failing or panicking scanner never sinks the run
//! - **Ignore rules**: categories, exact paths and whole folders, applied
//!   before anything is reported
//! - **Safety filter**: locked system resources, protected roots and
//!   unwritable paths are never offered for cleanup
//! - **Duplicate detection**: size buckets, then SHA-256, keeping the newest copy
//! - **Cancellable work**: a shared token stops walks, hashing and worker pools

pub mod cleaner;
pub mod cli;
pub mod common;
pub mod duplicates;
pub mod parallel;
pub mod scanner;
