//! Execution helpers shared by the scan orchestrator and file-level scans.
//!
//! - [`Scheduler`]: bounded number of independent tasks in flight, results
//!   collected as they complete.
//! - [`run_pool`]: a list of homogeneous items spread over a fixed number of
//!   workers with a shared cancel token.
//! - [`CommandScan`]: an external program run per file through the pool.

pub mod external;
pub mod pool;
pub mod scheduler;

pub use external::{CommandScan, Verdict};
pub use pool::{run_pool, PoolReport};
pub use scheduler::{Completion, Scheduler, Task, TaskFailure};
