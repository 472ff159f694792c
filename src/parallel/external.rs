//! Per-file external program runs on top of the worker pool.
//!
//! Each file is handed to `program args... <file>`. The exit status decides
//! the verdict. When the cancel token fires, in-flight children are killed
//! and the pool stops claiming files.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use serde::Serialize;

use super::pool::{run_pool, PoolReport};
use crate::common::errors::Result;
use crate::common::CancelToken;

/// Result of running the external program on one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "verdict", content = "detail")]
pub enum Verdict {
    /// Exit status 0
    Clean,
    /// Nonzero exit status
    Flagged(i32),
    /// Killed because the run was cancelled
    Aborted,
    /// The program could not be started or waited on
    Failed(String),
}

/// External program invoked once per file
#[derive(Debug, Clone)]
pub struct CommandScan {
    program: PathBuf,
    args: Vec<String>,
    poll_interval: Duration,
}

impl CommandScan {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            poll_interval: Duration::from_millis(25),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run the program over every file with `workers` concurrent children.
    /// `on_progress(file, worker_id, scanned, total)` fires after each file.
    pub fn scan_files<G>(
        &self,
        files: &[PathBuf],
        workers: usize,
        on_progress: G,
        cancel: &CancelToken,
    ) -> Result<PoolReport<Verdict>>
    where
        G: Fn(&PathBuf, usize, usize, usize) + Sync,
    {
        run_pool(files, workers, |file| self.check(file, cancel), on_progress, cancel)
    }

    /// Run the program on one file, killing it if the token fires
    pub fn check(&self, file: &Path, cancel: &CancelToken) -> Verdict {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match child {
            Ok(child) => self.supervise(child, file, cancel),
            Err(e) => Verdict::Failed(format!(
                "Failed to start {}: {}",
                self.program.display(),
                e
            )),
        }
    }

    fn supervise(&self, mut child: Child, file: &Path, cancel: &CancelToken) -> Verdict {
        loop {
            if cancel.is_cancelled() {
                if let Err(e) = child.kill() {
                    tracing::debug!("Kill failed for {}: {}", file.display(), e);
                }
                let _ = child.wait();
                return Verdict::Aborted;
            }

            match child.try_wait() {
                Ok(Some(status)) => {
                    return match status.code() {
                        Some(0) => Verdict::Clean,
                        Some(code) => Verdict::Flagged(code),
                        None => Verdict::Failed("terminated by signal".into()),
                    };
                }
                Ok(None) => std::thread::sleep(self.poll_interval),
                Err(e) => return Verdict::Failed(e.to_string()),
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;
    use tempfile::TempDir;

    fn files(dir: &TempDir) -> Vec<PathBuf> {
        let full = dir.path().join("full.bin");
        let empty = dir.path().join("empty.bin");
        std::fs::write(&full, b"payload").unwrap();
        std::fs::write(&empty, b"").unwrap();
        vec![full, empty]
    }

    #[test]
    fn test_exit_status_maps_to_verdict() {
        let dir = TempDir::new().unwrap();
        // Flags empty files: `test -s` fails on them
        let scan = CommandScan::new("sh").args(["-c", "test -s \"$1\"", "sh"]);
        let report = scan
            .scan_files(&files(&dir), 2, |_, _, _, _| {}, &CancelToken::new())
            .unwrap();

        let verdicts: Vec<&Verdict> = report.results.iter().map(|(_, v)| v).collect();
        assert_eq!(verdicts, vec![&Verdict::Clean, &Verdict::Flagged(1)]);
    }

    #[test]
    fn test_missing_program_fails_softly() {
        let dir = TempDir::new().unwrap();
        let scan = CommandScan::new("/nonexistent/reclaim-scanner");
        let report = scan
            .scan_files(&files(&dir), 1, |_, _, _, _| {}, &CancelToken::new())
            .unwrap();
        assert_eq!(report.processed, 2);
        assert!(report
            .results
            .iter()
            .all(|(_, v)| matches!(v, Verdict::Failed(_))));
    }

    #[test]
    fn test_cancel_kills_in_flight_children() {
        let dir = TempDir::new().unwrap();
        let scan = CommandScan::new("sh").args(["-c", "sleep 30", "sh"]);
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let killer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            trigger.cancel();
        });

        let started = Instant::now();
        let many: Vec<PathBuf> = (0..4).flat_map(|_| files(&dir)).collect();
        let report = scan.scan_files(&many, 2, |_, _, _, _| {}, &cancel).unwrap();
        killer.join().unwrap();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(report.cancelled);
        assert!(report.results.iter().all(|(_, v)| *v == Verdict::Aborted));
        assert!(report.processed <= 2);
    }
}
