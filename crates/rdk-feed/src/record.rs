use std::fmt;

use crate::{CLOSE_FIELD, MIN_FIELDS, OPEN_FIELD};

/// Which column of the row a tick was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickSource {
    Open,
    Close,
}

impl TickSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TickSource::Open => "open",
            TickSource::Close => "close",
        }
    }
}

impl fmt::Display for TickSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One price observation fed to the decision engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    pub price: f64,
    pub source: TickSource,
    /// Position of this tick in its task's stream of valid ticks (0-based).
    pub seq: u64,
}

impl Tick {
    pub fn new(price: f64, source: TickSource, seq: u64) -> Self {
        Self { price, source, seq }
    }

    /// A tick is usable only with a finite, strictly positive price.
    pub fn is_valid(&self) -> bool {
        is_valid_price(self.price)
    }
}

pub(crate) fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Open/close prices decoded from one row. Invalid prices are `0.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecordPrices {
    pub open: f64,
    pub close: f64,
}

impl RecordPrices {
    /// Decode from already-split fields.
    pub fn from_fields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let fields: Vec<&str> = fields.into_iter().collect();
        Self {
            open: extract_price(&fields, OPEN_FIELD),
            close: extract_price(&fields, CLOSE_FIELD),
        }
    }

    /// Decode a raw comma-delimited line (no quoting support).
    pub fn from_line(line: &str) -> Self {
        Self::from_fields(line.split(','))
    }

    /// Valid prices in stream order: open first, then close.
    pub fn valid_prices(&self) -> impl Iterator<Item = (TickSource, f64)> {
        [(TickSource::Open, self.open), (TickSource::Close, self.close)]
            .into_iter()
            .filter(|(_, p)| is_valid_price(*p))
    }
}

/// Price at `field`, or `0.0` when the row is short or the field is not a number.
pub fn extract_price(fields: &[&str], field: usize) -> f64 {
    if fields.len() < MIN_FIELDS {
        return 0.0;
    }
    fields
        .get(field)
        .and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}
