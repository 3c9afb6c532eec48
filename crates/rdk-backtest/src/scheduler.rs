//! Batch-barrier worker pool.
//!
//! Tasks are dispatched in fixed batches of `concurrency`: every runner of
//! batch k is joined before batch k+1 starts. Peak live engines and open
//! files are therefore bounded by the batch size, at the cost of one slow
//! task holding up the next batch.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use tracing::{error, info};

use crate::runner::TaskOutcome;
use crate::types::Task;

/// Pool-level failures. These are the only errors that escape a run.
#[derive(Debug)]
pub enum SchedulerError {
    /// A concurrency ceiling of zero can never make progress.
    ZeroConcurrency,
    /// The OS refused to start a worker thread.
    WorkerSpawn { task_id: String, reason: String },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::ZeroConcurrency => write!(f, "concurrency must be >= 1"),
            SchedulerError::WorkerSpawn { task_id, reason } => {
                write!(f, "failed to start worker for task {}: {}", task_id, reason)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

/// Live-worker counter with a high-water mark.
#[derive(Debug, Default)]
pub struct ActiveGauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl ActiveGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one worker in until the guard drops.
    pub fn enter(&self) -> GaugeGuard<'_> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        GaugeGuard { gauge: self }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

pub struct GaugeGuard<'a> {
    gauge: &'a ActiveGauge,
}

impl Drop for GaugeGuard<'_> {
    fn drop(&mut self) {
        self.gauge.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Tallies for a finished pool run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub completed: usize,
    pub empty: usize,
    /// Launch failures plus runners that panicked.
    pub abandoned: usize,
    pub batches: usize,
    pub peak_concurrency: usize,
}

impl PoolReport {
    pub fn total(&self) -> usize {
        self.completed + self.empty + self.abandoned
    }

    fn tally(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Completed { .. } => self.completed += 1,
            TaskOutcome::Empty { .. } => self.empty += 1,
            TaskOutcome::Abandoned { .. } => self.abandoned += 1,
        }
    }
}

/// Fixed-ceiling batch scheduler.
#[derive(Clone, Copy, Debug)]
pub struct Scheduler {
    concurrency: NonZeroUsize,
}

impl Scheduler {
    pub fn new(concurrency: usize) -> Result<Self, SchedulerError> {
        NonZeroUsize::new(concurrency)
            .map(|concurrency| Self { concurrency })
            .ok_or(SchedulerError::ZeroConcurrency)
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency.get()
    }

    /// Run `work` once per task, at most `concurrency` at a time.
    ///
    /// A panicking worker is counted as abandoned and the pool carries on.
    pub fn run<F>(&self, tasks: &[Task], work: F) -> Result<PoolReport, SchedulerError>
    where
        F: Fn(&Task) -> TaskOutcome + Sync,
    {
        let gauge = ActiveGauge::new();
        let mut report = PoolReport::default();

        for (batch_no, batch) in tasks.chunks(self.concurrency.get()).enumerate() {
            info!(batch = batch_no, size = batch.len(), "dispatching batch");
            self.run_batch(batch, &work, &gauge, &mut report)?;
            report.batches += 1;
        }

        report.peak_concurrency = gauge.peak();
        info!(
            completed = report.completed,
            empty = report.empty,
            abandoned = report.abandoned,
            batches = report.batches,
            "pool finished"
        );
        Ok(report)
    }

    fn run_batch<F>(
        &self,
        batch: &[Task],
        work: &F,
        gauge: &ActiveGauge,
        report: &mut PoolReport,
    ) -> Result<(), SchedulerError>
    where
        F: Fn(&Task) -> TaskOutcome + Sync,
    {
        thread::scope(|s| {
            let mut handles = Vec::with_capacity(batch.len());
            let mut spawn_err = None;

            for (slot, task) in batch.iter().enumerate() {
                let spawned = thread::Builder::new()
                    .name(format!("rdk-worker-{slot}"))
                    .spawn_scoped(s, move || {
                        let _live = gauge.enter();
                        work(task)
                    });
                match spawned {
                    Ok(h) => handles.push((task, h)),
                    Err(e) => {
                        spawn_err = Some(SchedulerError::WorkerSpawn {
                            task_id: task.id.clone(),
                            reason: e.to_string(),
                        });
                        break;
                    }
                }
            }

            // Barrier: join every worker of this batch, even on the error path.
            for (task, h) in handles {
                match h.join() {
                    Ok(outcome) => report.tally(&outcome),
                    Err(_) => {
                        error!(task = %task.id, "task runner panicked; counted as abandoned");
                        report.abandoned += 1;
                    }
                }
            }

            spawn_err.map_or(Ok(()), Err)
        })
    }
}
