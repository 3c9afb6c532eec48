//! Per-task cash/share ledger.
//!
//! # Invariants
//! - `cash >= 0` after every [`Ledger::apply`]
//! - `shares >= 0` (enforced by the unsigned type and the SELL check)
//!
//! Orders are evaluated against the current state only: no lookahead, no
//! partial fills. A rejected order leaves the ledger untouched and is a
//! normal outcome, reported through [`Fill::Rejected`].

use std::fmt;

use crate::order::Order;

/// Why an order was not executed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RejectReason {
    InsufficientCash { needed: f64, available: f64 },
    InsufficientShares { needed: u64, held: u64 },
    /// The resulting share count would not fit in a `u64`.
    ShareOverflow { held: u64, qty: u64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientCash { needed, available } => {
                write!(f, "insufficient cash: need {needed}, have {available}")
            }
            Self::InsufficientShares { needed, held } => {
                write!(f, "insufficient shares: need {needed}, hold {held}")
            }
            Self::ShareOverflow { held, qty } => {
                write!(f, "share count overflow: hold {held}, buying {qty}")
            }
        }
    }
}

/// Result of applying one order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fill {
    /// The order moved cash and shares.
    Executed { order: Order, price: f64 },
    /// The order was refused; state unchanged.
    Rejected { order: Order, reason: RejectReason },
    /// HOLD or a zero quantity.
    NoOp,
}

impl Fill {
    pub fn is_executed(&self) -> bool {
        matches!(self, Fill::Executed { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Fill::Rejected { .. })
    }
}

/// Cash + shares for one task. Never shared across tasks.
#[derive(Clone, Debug, PartialEq)]
pub struct Ledger {
    initial_cash: f64,
    cash: f64,
    shares: u64,
    executed: u64,
    rejected: u64,
}

impl Ledger {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            shares: 0,
            executed: 0,
            rejected: 0,
        }
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn shares(&self) -> u64 {
        self.shares
    }

    /// Number of orders that moved state.
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Number of orders refused for lack of cash or shares.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Cash plus shares marked at `price`.
    pub fn wealth(&self, price: f64) -> f64 {
        self.cash + self.shares as f64 * price
    }

    /// Apply `order` at `price`.
    pub fn apply(&mut self, order: Order, price: f64) -> Fill {
        if order.is_noop() {
            return Fill::NoOp;
        }

        match order {
            Order::Buy(qty) => {
                let cost = price * qty as f64;
                if self.cash >= cost {
                    let Some(shares) = self.shares.checked_add(qty) else {
                        self.rejected += 1;
                        return Fill::Rejected {
                            order,
                            reason: RejectReason::ShareOverflow {
                                held: self.shares,
                                qty,
                            },
                        };
                    };
                    self.cash -= cost;
                    self.shares = shares;
                    self.executed += 1;
                    Fill::Executed { order, price }
                } else {
                    self.rejected += 1;
                    Fill::Rejected {
                        order,
                        reason: RejectReason::InsufficientCash {
                            needed: cost,
                            available: self.cash,
                        },
                    }
                }
            }
            Order::Sell(qty) => {
                if self.shares >= qty {
                    self.cash += price * qty as f64;
                    self.shares -= qty;
                    self.executed += 1;
                    Fill::Executed { order, price }
                } else {
                    self.rejected += 1;
                    Fill::Rejected {
                        order,
                        reason: RejectReason::InsufficientShares {
                            needed: qty,
                            held: self.shares,
                        },
                    }
                }
            }
            Order::Hold => Fill::NoOp,
        }
    }
}
