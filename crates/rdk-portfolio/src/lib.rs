//! rdk-portfolio
//!
//! Order decoding + single-instrument cash/share ledger.
//! - Orders arrive as text commands from the decision engine
//! - Ledger enforces cash >= 0 and shares >= 0 by rejecting, never by erroring
//! - Pure deterministic logic (no IO, no time, no engine wiring)

mod ledger;
mod order;

pub use ledger::{Fill, Ledger, RejectReason};
pub use order::Order;

/// Starting cash used when a run plan does not override it.
pub const DEFAULT_INITIAL_CASH: f64 = 1_000_000.0;
