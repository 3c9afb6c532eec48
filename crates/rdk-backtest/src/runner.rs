//! Single-task driver.
//!
//! INIT -> STREAMING -> FINALIZING -> DONE
//!
//! - INIT: fresh ledger, launch engine. Launch failure abandons the task.
//! - STREAMING: files in order, header skipped, open tick then close tick per
//!   row. Each valid tick is exactly one engine round trip followed by one
//!   ledger apply. A dead engine ends streaming; a missing file is skipped.
//! - FINALIZING: summary computed and recorded, engine released.
//!
//! The engine is owned by the runner for the whole task and released by
//! `Drop`, so it is torn down on every path including a panic.

use std::io::Write;

use rdk_engine::{DecisionEngine, EngineFactory, TickMessage};
use rdk_feed::{FeedReader, Tick};
use rdk_portfolio::{Fill, Ledger};
use tracing::{debug, error, info, trace, warn};

use crate::aggregator::ResultAggregator;
use crate::summary::Summary;
use crate::types::{Task, TaskState};

/// Counters collected while a task streams.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub files_read: u32,
    pub files_skipped: u32,
    /// Valid ticks that completed a round trip.
    pub ticks: u64,
    pub executed: u64,
    pub rejected: u64,
    /// Streaming stopped because the engine went away.
    pub ended_early: bool,
}

/// How a task ended.
#[derive(Clone, Debug, PartialEq)]
pub enum TaskOutcome {
    /// A summary was produced and handed to the aggregator.
    Completed { summary: Summary, stats: TaskStats },
    /// No tick completed a round trip; there is no price to benchmark against.
    Empty { stats: TaskStats },
    /// The engine could not be launched; nothing was streamed.
    Abandoned { reason: String },
}

impl TaskOutcome {
    pub fn summary(&self) -> Option<&Summary> {
        match self {
            TaskOutcome::Completed { summary, .. } => Some(summary),
            _ => None,
        }
    }
}

/// Drives tasks end to end. Stateless across tasks; share freely.
#[derive(Clone, Debug)]
pub struct TaskRunner {
    initial_cash: f64,
}

impl TaskRunner {
    pub fn new(initial_cash: f64) -> Self {
        Self { initial_cash }
    }

    pub fn run<F, W>(&self, task: &Task, factory: &F, results: &ResultAggregator<W>) -> TaskOutcome
    where
        F: EngineFactory,
        W: Write,
    {
        let mut state = TaskState::Init;
        debug!(task = %task.id, files = task.files.len(), %state, "task starting");

        let ledger = Ledger::new(self.initial_cash);
        let engine = match factory.launch(&task.id) {
            Ok(e) => e,
            Err(e) => {
                error!(task = %task.id, error = %e, "engine launch failed; task abandoned");
                transition(&task.id, &mut state, TaskState::Done);
                return TaskOutcome::Abandoned {
                    reason: e.to_string(),
                };
            }
        };

        let mut run = TaskRun {
            task,
            engine,
            ledger,
            first_price: None,
            last_price: None,
            stats: TaskStats::default(),
        };

        transition(&task.id, &mut state, TaskState::Streaming);
        run.stream();

        transition(&task.id, &mut state, TaskState::Finalizing);
        let outcome = run.finalize(results);

        transition(&task.id, &mut state, TaskState::Done);
        outcome
    }
}

fn transition(task_id: &str, state: &mut TaskState, next: TaskState) {
    debug!(task = task_id, from = %state, to = %next, "task state");
    *state = next;
}

struct TaskRun<'a, E: DecisionEngine> {
    task: &'a Task,
    engine: E,
    ledger: Ledger,
    first_price: Option<f64>,
    last_price: Option<f64>,
    stats: TaskStats,
}

impl<'a, E: DecisionEngine> TaskRun<'a, E> {
    fn stream(&mut self) {
        let task: &'a Task = self.task;
        let task_id = task.id.as_str();

        for path in &task.files {
            let reader = match FeedReader::open(path) {
                Ok(r) => r,
                Err(e) => {
                    warn!(task = task_id, error = %e, "skipping input file");
                    self.stats.files_skipped += 1;
                    continue;
                }
            };
            self.stats.files_read += 1;

            for record in reader {
                let mut mark = None;
                for (source, price) in record.valid_prices() {
                    let tick = Tick::new(price, source, self.stats.ticks);
                    if !self.step(&tick) {
                        info!(
                            task = task_id,
                            file = %path.display(),
                            ticks = self.stats.ticks,
                            "engine gone; streaming ended early"
                        );
                        self.stats.ended_early = true;
                        return;
                    }
                    mark = Some(price);
                }
                if let Some(p) = mark {
                    trace!(task = task_id, wealth = self.ledger.wealth(p), "record done");
                }
            }
        }
    }

    /// One protocol round trip. `false` when the engine can no longer be reached.
    fn step(&mut self, tick: &Tick) -> bool {
        if self.first_price.is_none() {
            self.first_price = Some(tick.price);
        }

        let msg = TickMessage::new(self.ledger.cash(), tick.price, self.ledger.shares());
        let order = match self.engine.round_trip(&msg) {
            Ok(o) => o,
            Err(e) => {
                debug!(task = %self.task.id, seq = tick.seq, error = %e, "tick send failed");
                return false;
            }
        };

        match self.ledger.apply(order, tick.price) {
            Fill::Executed { order, price } => {
                self.stats.executed += 1;
                debug!(task = %self.task.id, seq = tick.seq, %order, price, "order executed");
            }
            Fill::Rejected { order, reason } => {
                self.stats.rejected += 1;
                debug!(task = %self.task.id, seq = tick.seq, %order, %reason, "order rejected");
            }
            Fill::NoOp => {}
        }

        self.stats.ticks += 1;
        self.last_price = Some(tick.price);
        true
    }

    fn finalize<W: Write>(self, results: &ResultAggregator<W>) -> TaskOutcome {
        let TaskRun {
            task,
            engine,
            ledger,
            first_price,
            last_price,
            stats,
        } = self;

        let outcome = match (first_price, last_price) {
            (Some(first), Some(last)) => {
                let summary = Summary::compute(&task.id, first, last, &ledger);
                if let Err(e) = results.record(&summary) {
                    error!(task = %task.id, error = %e, "failed to record summary");
                }
                info!(
                    task = %task.id,
                    roi_bot = summary.roi_bot,
                    roi_benchmark = summary.roi_benchmark,
                    diff = summary.diff,
                    ticks = stats.ticks,
                    executed = stats.executed,
                    rejected = stats.rejected,
                    files_skipped = stats.files_skipped,
                    ended_early = stats.ended_early,
                    "task complete"
                );
                TaskOutcome::Completed { summary, stats }
            }
            _ => {
                warn!(
                    task = %task.id,
                    files_read = stats.files_read,
                    files_skipped = stats.files_skipped,
                    "no valid ticks; no summary produced"
                );
                TaskOutcome::Empty { stats }
            }
        };

        drop(engine);
        outcome
    }
}
