//! rdk-feed
//!
//! Price feed reader: turns comma-delimited OHLC rows into price ticks.
//!
//! Row contract (0-indexed fields, at least 5 per row):
//! - field 1: open price
//! - field 4: close price
//!
//! Malformed input is never an error here. A short row or an unparsable field
//! yields price `0.0`, which [`Tick::is_valid`] rejects, so the row is silently
//! dropped downstream. Only failing to open a file is reported, via
//! [`FeedError`].

mod reader;
mod record;

pub use reader::{FeedError, FeedReader};
pub use record::{extract_price, RecordPrices, Tick, TickSource};

/// Field index of the open price.
pub const OPEN_FIELD: usize = 1;
/// Field index of the close price.
pub const CLOSE_FIELD: usize = 4;
/// Rows with fewer fields than this yield no valid ticks.
pub const MIN_FIELDS: usize = 5;
