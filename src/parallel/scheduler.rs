use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;

use crate::common::errors::{ReclaimError, Result};
use crate::common::CancelToken;

/// A named unit of work for the scheduler
pub struct Task<'a, R> {
    pub id: String,
    job: Box<dyn FnOnce() -> R + Send + 'a>,
}

impl<'a, R> Task<'a, R> {
    pub fn new<F>(id: impl Into<String>, job: F) -> Self
    where
        F: FnOnce() -> R + Send + 'a,
    {
        Self {
            id: id.into(),
            job: Box::new(job),
        }
    }
}

/// Why a task produced no value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    /// The job panicked; carries the panic message
    Panicked(String),
    /// The cancel token fired before the job was launched
    Cancelled,
}

/// A finished or skipped task
#[derive(Debug)]
pub struct Completion<R> {
    /// Position of the task in the submitted list
    pub index: usize,
    pub id: String,
    pub outcome: std::result::Result<R, TaskFailure>,
    pub elapsed: Duration,
}

/// Runs tasks with at most `concurrency` in flight.
///
/// Completions are returned in the order tasks finished, which depends on
/// each task's latency. Callers needing a stable order sort afterwards.
#[derive(Debug, Clone)]
pub struct Scheduler {
    concurrency: usize,
    cancel: Option<CancelToken>,
}

impl Scheduler {
    pub const DEFAULT_CONCURRENCY: usize = 4;

    pub fn new(concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(ReclaimError::InvalidConcurrency(concurrency));
        }
        Ok(Self {
            concurrency,
            cancel: None,
        })
    }

    /// One task at a time, in submission order, on the calling thread
    pub fn sequential() -> Self {
        Self {
            concurrency: 1,
            cancel: None,
        }
    }

    /// Stop launching queued tasks once `token` is cancelled. Tasks already
    /// in flight finish; skipped ones complete with [`TaskFailure::Cancelled`].
    pub fn with_cancel(mut self, token: &CancelToken) -> Self {
        self.cancel = Some(token.clone());
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run every task. `on_complete(completion, completed_count, total)` is
    /// called on the calling thread once per task; a panic inside it is
    /// logged and does not stop the run.
    pub fn run<'a, R, F>(&self, tasks: Vec<Task<'a, R>>, mut on_complete: F) -> Vec<Completion<R>>
    where
        R: Send + 'a,
        F: FnMut(&Completion<R>, usize, usize),
    {
        let total = tasks.len();
        let mut done = Vec::with_capacity(total);
        let mut notify = |completion: &Completion<R>, completed: usize| {
            let call = panic::catch_unwind(AssertUnwindSafe(|| {
                on_complete(completion, completed, total)
            }));
            if let Err(payload) = call {
                tracing::warn!(
                    "Progress callback panicked for '{}': {}",
                    completion.id,
                    panic_message(payload)
                );
            }
        };

        if self.concurrency == 1 {
            for (index, task) in tasks.into_iter().enumerate() {
                let completion = if self.is_cancelled() {
                    skip(index, task)
                } else {
                    execute(index, task)
                };
                notify(&completion, done.len() + 1);
                done.push(completion);
            }
            return done;
        }

        let (tx, rx) = unbounded::<Completion<R>>();
        let mut queue = tasks.into_iter().enumerate();
        let mut in_flight: HashSet<usize> = HashSet::with_capacity(self.concurrency);

        std::thread::scope(|scope| {
            loop {
                while in_flight.len() < self.concurrency {
                    let Some((index, task)) = queue.next() else {
                        break;
                    };
                    if self.is_cancelled() {
                        let completion = skip(index, task);
                        notify(&completion, done.len() + 1);
                        done.push(completion);
                        continue;
                    }
                    in_flight.insert(index);
                    let tx = tx.clone();
                    scope.spawn(move || {
                        // The receiver outlives every worker inside this scope
                        let _ = tx.send(execute(index, task));
                    });
                }

                if in_flight.is_empty() {
                    break;
                }

                let Ok(completion) = rx.recv() else {
                    break;
                };
                in_flight.remove(&completion.index);
                notify(&completion, done.len() + 1);
                done.push(completion);
            }
        });

        done
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            concurrency: Self::DEFAULT_CONCURRENCY,
            cancel: None,
        }
    }
}

fn execute<R>(index: usize, task: Task<'_, R>) -> Completion<R> {
    let Task { id, job } = task;
    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(job))
        .map_err(|payload| TaskFailure::Panicked(panic_message(payload)));
    Completion {
        index,
        id,
        outcome,
        elapsed: started.elapsed(),
    }
}

fn skip<R>(index: usize, task: Task<'_, R>) -> Completion<R> {
    tracing::debug!("Skipping '{}': run cancelled", task.id);
    Completion {
        index,
        id: task.id,
        outcome: Err(TaskFailure::Cancelled),
        elapsed: Duration::ZERO,
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Barrier, Mutex};

    fn tracked_tasks<'a>(
        count: usize,
        running: &'a AtomicUsize,
        peak: &'a AtomicUsize,
    ) -> Vec<Task<'a, usize>> {
        (0..count)
            .map(|i| {
                Task::new(format!("task-{}", i), move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(15));
                    running.fetch_sub(1, Ordering::SeqCst);
                    i
                })
            })
            .collect()
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(matches!(
            Scheduler::new(0),
            Err(ReclaimError::InvalidConcurrency(0))
        ));
    }

    #[test]
    fn test_never_exceeds_concurrency() {
        for k in [1, 2, 3] {
            let running = AtomicUsize::new(0);
            let peak = AtomicUsize::new(0);
            let done = Scheduler::new(k)
                .unwrap()
                .run(tracked_tasks(10, &running, &peak), |_, _, _| {});
            assert_eq!(done.len(), 10);
            assert!(peak.load(Ordering::SeqCst) <= k, "peak exceeded {}", k);
        }
    }

    #[test]
    fn test_tasks_actually_overlap() {
        // Each pair must be in flight together to get past the barrier
        let barrier = Barrier::new(2);
        let tasks: Vec<Task<'_, ()>> = (0..4)
            .map(|i| {
                let barrier = &barrier;
                Task::new(format!("t{}", i), move || {
                    barrier.wait();
                })
            })
            .collect();
        let done = Scheduler::new(2).unwrap().run(tasks, |_, _, _| {});
        assert_eq!(done.len(), 4);
    }

    #[test]
    fn test_sequential_preserves_order() {
        let running = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let done = Scheduler::sequential().run(tracked_tasks(5, &running, &peak), |_, _, _| {});
        let order: Vec<usize> = done.iter().map(|c| c.index).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_every_task_completes_once() {
        let running = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let done = Scheduler::new(4).unwrap().run(tracked_tasks(9, &running, &peak), |_, _, _| {});
        let mut indices: Vec<usize> = done.iter().map(|c| c.index).collect();
        indices.sort();
        assert_eq!(indices, (0..9).collect::<Vec<_>>());
        for c in &done {
            assert_eq!(c.outcome.as_ref().copied().unwrap(), c.index);
        }
    }

    #[test]
    fn test_panicking_task_is_reported() {
        let tasks = vec![
            Task::new("ok", || 1),
            Task::new("boom", || -> i32 { panic!("scanner exploded") }),
            Task::new("ok2", || 2),
        ];
        let done = Scheduler::new(2).unwrap().run(tasks, |_, _, _| {});
        assert_eq!(done.len(), 3);
        let failed = done.iter().find(|c| c.id == "boom").unwrap();
        assert_eq!(
            failed.outcome.as_ref().unwrap_err(),
            &TaskFailure::Panicked("scanner exploded".into())
        );
    }

    #[test]
    fn test_progress_counts_and_callback_panics_are_contained() {
        let seen = Mutex::new(Vec::new());
        let tasks: Vec<Task<'_, u32>> = (0..5).map(|i| Task::new(i.to_string(), move || i)).collect();
        let done = Scheduler::new(3).unwrap().run(tasks, |c, completed, total| {
            seen.lock().unwrap().push((completed, total));
            if c.id == "2" {
                panic!("callback failure");
            }
        });
        assert_eq!(done.len(), 5);
        let seen = seen.into_inner().unwrap();
        assert_eq!(
            seen.iter().map(|(c, _)| *c).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
        assert!(seen.iter().all(|(_, t)| *t == 5));
    }

    #[test]
    fn test_cancel_stops_launching_queued_tasks() {
        for k in [1, 2] {
            let token = CancelToken::new();
            let started = AtomicUsize::new(0);
            let tasks: Vec<Task<'_, ()>> = (0..6)
                .map(|i| {
                    let token = &token;
                    let started = &started;
                    Task::new(format!("t{}", i), move || {
                        started.fetch_add(1, Ordering::SeqCst);
                        token.cancel();
                    })
                })
                .collect();

            let scheduler = if k == 1 {
                Scheduler::sequential()
            } else {
                Scheduler::new(k).unwrap()
            };
            let done = scheduler.with_cancel(&token).run(tasks, |_, _, _| {});

            assert_eq!(done.len(), 6, "every task completes exactly once");
            let ran = started.load(Ordering::SeqCst);
            assert!(ran >= 1 && ran <= k, "{} tasks started with concurrency {}", ran, k);
            let skipped = done
                .iter()
                .filter(|c| matches!(c.outcome, Err(TaskFailure::Cancelled)))
                .count();
            assert_eq!(skipped, 6 - ran);
        }
    }

    #[test]
    fn test_empty_task_list() {
        let done: Vec<Completion<()>> = Scheduler::default().run(Vec::new(), |_, _, _| {});
        assert!(done.is_empty());
    }
}
