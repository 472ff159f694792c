use std::sync::atomic::{AtomicUsize, Ordering};

use crate::common::errors::{ReclaimError, Result};
use crate::common::CancelToken;

/// Outcome of a pool run
#[derive(Debug)]
pub struct PoolReport<R> {
    /// `(input index, output)` pairs in input order; items never claimed are absent
    pub results: Vec<(usize, R)>,
    pub processed: usize,
    pub total: usize,
    /// True when the token stopped the pool before every item was claimed
    pub cancelled: bool,
}

/// Distribute `items` across `worker_count` threads.
///
/// Workers claim the next index from a shared cursor and stop claiming as
/// soon as `cancel` is set or the list is exhausted. Work already running
/// when the token fires is allowed to finish; nothing new starts after.
/// `on_progress(item, worker_id, scanned, total)` runs on the worker thread.
pub fn run_pool<T, R, P, G>(
    items: &[T],
    worker_count: usize,
    process: P,
    on_progress: G,
    cancel: &CancelToken,
) -> Result<PoolReport<R>>
where
    T: Sync,
    R: Send,
    P: Fn(&T) -> R + Sync,
    G: Fn(&T, usize, usize, usize) + Sync,
{
    if worker_count == 0 {
        return Err(ReclaimError::InvalidConcurrency(worker_count));
    }

    let total = items.len();
    let workers = worker_count.min(total.max(1));
    let cursor = AtomicUsize::new(0);
    let scanned = AtomicUsize::new(0);

    let mut results: Vec<(usize, R)> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker_id| {
                let (cursor, scanned, process, on_progress) = (&cursor, &scanned, &process, &on_progress);
                scope.spawn(move || {
                    let mut local = Vec::new();
                    loop {
                        if cancel.is_cancelled() {
                            break;
                        }
                        let index = cursor.fetch_add(1, Ordering::SeqCst);
                        if index >= total {
                            break;
                        }
                        let item = &items[index];
                        let output = process(item);
                        let count = scanned.fetch_add(1, Ordering::SeqCst) + 1;
                        on_progress(item, worker_id, count, total);
                        local.push((index, output));
                    }
                    local
                })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .flat_map(|(worker_id, handle)| match handle.join() {
                Ok(local) => local,
                Err(_) => {
                    tracing::warn!("Pool worker {} panicked; its results are lost", worker_id);
                    Vec::new()
                }
            })
            .collect()
    });

    results.sort_by_key(|(index, _)| *index);
    let processed = scanned.load(Ordering::SeqCst);

    Ok(PoolReport {
        results,
        processed,
        total,
        cancelled: cancel.is_cancelled() && processed < total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn test_processes_every_item_once() {
        let items: Vec<u64> = (1..=50).collect();
        let report = run_pool(&items, 4, |n| n * 2, |_, _, _, _| {}, &CancelToken::new()).unwrap();
        assert_eq!(report.processed, 50);
        assert!(!report.cancelled);
        let outputs: Vec<u64> = report.results.iter().map(|(_, r)| *r).collect();
        assert_eq!(outputs, items.iter().map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_progress_reports_each_item() {
        let items: Vec<u32> = (0..20).collect();
        let seen = Mutex::new(Vec::new());
        let workers = Mutex::new(HashSet::new());
        run_pool(
            &items,
            3,
            |n| *n,
            |_, worker_id, scanned, total| {
                assert_eq!(total, 20);
                seen.lock().unwrap().push(scanned);
                workers.lock().unwrap().insert(worker_id);
            },
            &CancelToken::new(),
        )
        .unwrap();

        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen, (1..=20).collect::<Vec<_>>());
        assert!(workers.into_inner().unwrap().iter().all(|w| *w < 3));
    }

    #[test]
    fn test_no_work_starts_after_cancel() {
        let items: Vec<u32> = (0..100).collect();
        let cancel = CancelToken::new();
        let report = run_pool(
            &items,
            2,
            |n| {
                if *n == 5 {
                    cancel.cancel_with_reason("abort requested");
                }
                std::thread::sleep(Duration::from_millis(2));
                *n
            },
            |_, _, _, _| {},
            &cancel,
        )
        .unwrap();

        assert!(report.cancelled);
        // Item 5 plus at most one in-flight item per worker
        assert!(report.processed <= 8, "processed {}", report.processed);
        assert_eq!(cancel.reason(), Some("abort requested"));
    }

    #[test]
    fn test_pre_cancelled_token_runs_nothing() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let report = run_pool(&[1, 2, 3], 2, |n| *n, |_, _, _, _| {}, &cancel).unwrap();
        assert_eq!(report.processed, 0);
        assert!(report.results.is_empty());
        assert!(report.cancelled);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = run_pool(&[1], 0, |n: &i32| *n, |_, _, _, _| {}, &CancelToken::new());
        assert!(matches!(result, Err(ReclaimError::InvalidConcurrency(0))));
    }

    #[test]
    fn test_empty_input() {
        let items: Vec<i32> = Vec::new();
        let report = run_pool(&items, 4, |n| *n, |_, _, _, _| {}, &CancelToken::new()).unwrap();
        assert_eq!(report.total, 0);
        assert!(!report.cancelled);
    }
}
