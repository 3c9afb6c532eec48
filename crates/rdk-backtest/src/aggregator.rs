//! Shared result sink.
//!
//! Every row is encoded and flushed while holding the lock, so rows from
//! concurrent tasks never interleave. Row order is completion order.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::summary::Summary;

/// Header row written once, before any summary.
pub const RESULTS_HEADER: [&str; 4] = ["task_id", "roi_bot", "roi_benchmark", "diff"];

/// Serialized writer of [`Summary`] rows.
pub struct ResultAggregator<W: Write> {
    sink: Mutex<csv::Writer<W>>,
    precision: usize,
    rows: AtomicU64,
}

impl<W: Write> ResultAggregator<W> {
    /// Wrap `sink` and write the header row.
    pub fn new(sink: W, precision: usize) -> io::Result<Self> {
        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(sink);
        w.write_record(RESULTS_HEADER).map_err(io::Error::from)?;
        w.flush()?;
        Ok(Self {
            sink: Mutex::new(w),
            precision,
            rows: AtomicU64::new(0),
        })
    }

    /// Append one summary row and flush it.
    pub fn record(&self, summary: &Summary) -> io::Result<()> {
        let fields = summary.fields(self.precision);
        let mut w = self.lock();
        w.write_record(&fields).map_err(io::Error::from)?;
        w.flush()?;
        self.rows.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Summary rows written so far (header excluded).
    pub fn rows_written(&self) -> u64 {
        self.rows.load(Ordering::SeqCst)
    }

    /// Flush and hand back the underlying sink.
    pub fn finish(self) -> io::Result<W> {
        let w = self.sink.into_inner().unwrap_or_else(PoisonError::into_inner);
        w.into_inner()
            .map_err(|e| io::Error::new(e.error().kind(), e.error().to_string()))
    }

    // The lock is only held inside `record`, which does not panic on its own,
    // so poisoning is recovered. An I/O error mid-row can still leave a
    // partial row buffered in the writer.
    fn lock(&self) -> MutexGuard<'_, csv::Writer<W>> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
