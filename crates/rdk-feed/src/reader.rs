//! Streaming file reader.
//!
//! One [`FeedReader`] per input file. The first record is the header and is
//! always discarded, whatever it contains. Records the csv layer cannot
//! decode (bad UTF-8, broken quoting) are dropped like any other malformed
//! row; an I/O failure mid-file ends the file.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::record::RecordPrices;

/// Errors surfaced by the feed reader.
#[derive(Debug)]
pub enum FeedError {
    /// The file could not be opened.
    Open { path: PathBuf, reason: String },
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Open { path, reason } => {
                write!(f, "cannot open feed file {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for FeedError {}

/// Iterator over the data records of one file, yielding decoded prices.
pub struct FeedReader<R: Read> {
    rdr: csv::Reader<R>,
    record: csv::StringRecord,
    header_skipped: bool,
    finished: bool,
    label: String,
    records_read: u64,
    records_dropped: u64,
}

impl FeedReader<File> {
    /// Open `path` for streaming.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| FeedError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self::with_label(file, path.display().to_string()))
    }
}

impl<R: Read> FeedReader<R> {
    /// Read from any byte source (tests, stdin).
    pub fn from_reader(src: R) -> Self {
        Self::with_label(src, "<reader>".to_string())
    }

    fn with_label(src: R, label: String) -> Self {
        let rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(src);
        Self {
            rdr,
            record: csv::StringRecord::new(),
            header_skipped: false,
            finished: false,
            label,
            records_read: 0,
            records_dropped: 0,
        }
    }

    /// Data records seen so far (header excluded).
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Data records the csv layer could not decode.
    pub fn records_dropped(&self) -> u64 {
        self.records_dropped
    }

    /// Advance one raw record. `None` at end of input.
    fn read_one(&mut self) -> Option<Result<(), csv::Error>> {
        if self.finished {
            return None;
        }
        match self.rdr.read_record(&mut self.record) {
            Ok(true) => Some(Ok(())),
            Ok(false) => {
                self.finished = true;
                None
            }
            Err(e) => {
                if e.is_io_error() {
                    warn!(file = %self.label, error = %e, "feed read failed; ending file");
                    self.finished = true;
                    return None;
                }
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> Iterator for FeedReader<R> {
    type Item = RecordPrices;

    fn next(&mut self) -> Option<RecordPrices> {
        if !self.header_skipped {
            self.header_skipped = true;
            // Header content is irrelevant, decodable or not.
            let _ = self.read_one()?;
        }

        loop {
            match self.read_one()? {
                Ok(()) => {
                    self.records_read += 1;
                    return Some(RecordPrices::from_fields(self.record.iter()));
                }
                Err(e) => {
                    self.records_read += 1;
                    self.records_dropped += 1;
                    debug!(file = %self.label, error = %e, "dropping undecodable record");
                }
            }
        }
    }
}
