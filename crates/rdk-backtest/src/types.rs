use std::fmt;
use std::path::PathBuf;

use rdk_portfolio::DEFAULT_INITIAL_CASH;

/// One backtest over an ordered group of input files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    /// Read in this order; together they form one contiguous period.
    pub files: Vec<PathBuf>,
}

impl Task {
    pub fn new<I, P>(id: impl Into<String>, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            id: id.into(),
            files: files.into_iter().map(Into::into).collect(),
        }
    }
}

/// Task runner lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    Init,
    Streaming,
    Finalizing,
    Done,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Init => "INIT",
            TaskState::Streaming => "STREAMING",
            TaskState::Finalizing => "FINALIZING",
            TaskState::Done => "DONE",
        };
        f.write_str(s)
    }
}

/// Knobs shared by every task of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct BacktestConfig {
    /// Starting cash of every task's ledger.
    pub initial_cash: f64,
    /// Maximum tasks in flight (batch size).
    pub concurrency: usize,
    /// Decimal places of the numeric result columns.
    pub precision: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_cash: DEFAULT_INITIAL_CASH,
            concurrency: 4,
            precision: 6,
        }
    }
}
