//! Text command -> [`Order`] decoding.
//!
//! Wire grammar (one line, trailing `\r\n` already stripped by the reader):
//!
//! - `BUY` / `SELL` at position 0, optionally followed by ` <qty>`
//! - no space at all: quantity defaults to 1
//! - after the first space: the leading integer (optional sign, digits), with
//!   anything following it ignored, so `BUY 5.5` is 5 and `BUY 10 shares` is 10
//! - no leading digits, a negative value, or a value out of range: quantity 0
//! - anything else: `HOLD`
//!
//! The two fallbacks (missing => 1, garbage => 0) are deliberately different.

use std::fmt;

/// A trading decision for the current tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    Buy(u64),
    Sell(u64),
    Hold,
}

impl Order {
    /// Decode one engine reply line. Never fails: unknown text is `Hold`.
    pub fn decode(line: &str) -> Self {
        if line.starts_with("BUY") {
            Order::Buy(decode_qty(line))
        } else if line.starts_with("SELL") {
            Order::Sell(decode_qty(line))
        } else {
            Order::Hold
        }
    }

    /// Quantity carried by the order (0 for `Hold`).
    pub fn qty(&self) -> u64 {
        match self {
            Order::Buy(q) | Order::Sell(q) => *q,
            Order::Hold => 0,
        }
    }

    /// True when applying this order can never change a ledger.
    pub fn is_noop(&self) -> bool {
        self.qty() == 0
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Buy(q) => write!(f, "BUY {q}"),
            Order::Sell(q) => write!(f, "SELL {q}"),
            Order::Hold => write!(f, "HOLD"),
        }
    }
}

fn decode_qty(line: &str) -> u64 {
    let Some((_, rest)) = line.split_once(' ') else {
        return 1;
    };
    match leading_int(rest) {
        Some(q) if q >= 0 => q as u64,
        _ => 0,
    }
}

/// `[+-]?digits` at the start of `s` (after whitespace); the rest is ignored.
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let sign = usize::from(s.starts_with(['+', '-']));
    let digits = s[sign..].bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    s[..sign + digits].parse().ok()
}
