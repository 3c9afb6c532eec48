//! Line codec for the engine protocol.

use std::fmt;

use rdk_portfolio::Order;

/// Portfolio state + current price, sent once per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickMessage {
    pub cash: f64,
    pub price: f64,
    pub shares: u64,
}

impl TickMessage {
    pub fn new(cash: f64, price: f64, shares: u64) -> Self {
        Self {
            cash,
            price,
            shares,
        }
    }

    /// Full wire line including the terminating newline.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

// f64 Display never uses exponent notation or digit grouping.
impl fmt::Display for TickMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{};{}", self.cash, self.price, self.shares)
    }
}

/// Decode raw reply bytes (one line, terminator optional).
///
/// Strips one trailing `\n` then one trailing `\r`. Non-UTF-8 bytes are
/// replaced, which can only ever turn a reply into HOLD.
pub fn decode_reply(raw: &[u8]) -> Order {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    Order::decode(&String::from_utf8_lossy(raw))
}
