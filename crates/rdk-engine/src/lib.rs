//! rdk-engine
//!
//! Decision-engine session: one child process per task, two private pipes,
//! strictly synchronous tick -> order exchange.
//!
//! Wire protocol (newline terminated text):
//! - to engine:   `<cash>;<price>;<shares>`
//! - from engine: `BUY [qty]` | `SELL [qty]` | anything else (HOLD)
//!
//! Lifecycle guarantees:
//! - the child and both pipes are released exactly once, on every exit path
//!   (normal end, broken pipe, panic unwinding through the owner)
//! - a write to a dead engine returns [`EngineError::Send`]; it never kills
//!   the orchestrator (the Rust runtime ignores SIGPIPE)

mod command;
mod error;
mod protocol;
mod session;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use command::EngineCommand;
pub use error::EngineError;
pub use protocol::{decode_reply, TickMessage};
pub use session::EngineSession;

use rdk_portfolio::Order;

/// Environment variable carrying the task id into the engine process.
pub const ENV_TASK_ID: &str = "RDK_TASK_ID";

/// Anything that answers one tick with one order.
///
/// `round_trip` is the only entry point so a caller cannot pipeline ticks.
pub trait DecisionEngine {
    fn round_trip(&mut self, msg: &TickMessage) -> Result<Order, EngineError>;
}

/// Starts one [`DecisionEngine`] per task.
pub trait EngineFactory: Sync {
    type Engine: DecisionEngine;

    fn launch(&self, task_id: &str) -> Result<Self::Engine, EngineError>;
}

impl<F, E> EngineFactory for F
where
    F: Fn(&str) -> Result<E, EngineError> + Sync,
    E: DecisionEngine,
{
    type Engine = E;

    fn launch(&self, task_id: &str) -> Result<E, EngineError> {
        self(task_id)
    }
}
