//! rdk-backtest
//!
//! Task orchestration for engine-driven backtests.
//!
//! Pipeline per task: FILES -> FEED -> ENGINE (tick out / order in) -> LEDGER -> SUMMARY
//!
//! - One ledger and one engine per task, never shared
//! - Batches of at most N concurrent tasks, barrier between batches
//! - Summaries from concurrent tasks land in one sink, one whole row at a time
//! - Per-task failures (spawn, dead engine, missing files) stay inside the task

mod aggregator;
mod runner;
mod scheduler;
mod summary;
pub mod types;

pub use aggregator::{ResultAggregator, RESULTS_HEADER};
pub use runner::{TaskOutcome, TaskRunner, TaskStats};
pub use scheduler::{ActiveGauge, GaugeGuard, PoolReport, Scheduler, SchedulerError};
pub use summary::Summary;
pub use types::{BacktestConfig, Task, TaskState};

use std::io::Write;

use rdk_engine::EngineFactory;

/// Run every task under `cfg`, recording summaries into `results`.
///
/// Only pool-level failures are returned as `Err`; everything that goes wrong
/// inside a task is reflected in the [`PoolReport`] counts and the log.
pub fn run_tasks<F, W>(
    cfg: &BacktestConfig,
    tasks: &[Task],
    factory: &F,
    results: &ResultAggregator<W>,
) -> Result<PoolReport, SchedulerError>
where
    F: EngineFactory,
    W: Write + Send,
{
    let scheduler = Scheduler::new(cfg.concurrency)?;
    let runner = TaskRunner::new(cfg.initial_cash);
    scheduler.run(tasks, |task| runner.run(task, factory, results))
}
