//! In-process decision engine for tests.
//!
//! `ScriptedEngine` answers ticks from a fixed script and records what it was
//! sent. Teardowns are counted through a shared handle so tests can prove that
//! every launched engine was released exactly once.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rdk_portfolio::Order;

use crate::protocol::decode_reply;
use crate::{DecisionEngine, EngineError, TickMessage};

/// What the scripted engine does on its next tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Reply with this raw line (decoded exactly like a real reply).
    Reply(String),
    /// Close the reply channel: this and later ticks read as HOLD.
    Silence,
    /// The engine died: the send fails.
    Die,
}

impl Step {
    pub fn reply(s: &str) -> Self {
        Step::Reply(s.to_string())
    }
}

/// Shared counters observable after the engine is gone.
#[derive(Clone, Debug, Default)]
pub struct EngineProbe {
    inner: Arc<ProbeInner>,
}

#[derive(Debug, Default)]
struct ProbeInner {
    launched: AtomicUsize,
    torn_down: AtomicUsize,
    sent: Mutex<Vec<TickMessage>>,
}

impl EngineProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn launched(&self) -> usize {
        self.inner.launched.load(Ordering::SeqCst)
    }

    pub fn torn_down(&self) -> usize {
        self.inner.torn_down.load(Ordering::SeqCst)
    }

    /// Every tick message delivered to any engine sharing this probe.
    pub fn sent(&self) -> Vec<TickMessage> {
        self.inner
            .sent
            .lock()
            .map(|v| v.clone())
            .unwrap_or_else(|p| p.into_inner().clone())
    }
}

/// Scripted stand-in for [`crate::EngineSession`].
#[derive(Debug)]
pub struct ScriptedEngine {
    script: VecDeque<Step>,
    silent: bool,
    dead: bool,
    probe: EngineProbe,
}

impl ScriptedEngine {
    pub fn new(script: impl IntoIterator<Item = Step>, probe: &EngineProbe) -> Self {
        probe.inner.launched.fetch_add(1, Ordering::SeqCst);
        Self {
            script: script.into_iter().collect(),
            silent: false,
            dead: false,
            probe: probe.clone(),
        }
    }

    /// Engine that replies with each line in turn, then goes silent.
    pub fn replies(lines: &[&str], probe: &EngineProbe) -> Self {
        Self::new(lines.iter().map(|l| Step::reply(l)), probe)
    }
}

impl DecisionEngine for ScriptedEngine {
    fn round_trip(&mut self, msg: &TickMessage) -> Result<Order, EngineError> {
        if self.dead {
            return Err(broken_pipe());
        }
        if self.silent {
            self.record(msg);
            return Ok(Order::Hold);
        }

        match self.script.pop_front() {
            Some(Step::Die) => {
                self.dead = true;
                Err(broken_pipe())
            }
            Some(Step::Reply(line)) => {
                self.record(msg);
                Ok(decode_reply(line.as_bytes()))
            }
            Some(Step::Silence) | None => {
                self.record(msg);
                self.silent = true;
                Ok(Order::Hold)
            }
        }
    }
}

impl ScriptedEngine {
    fn record(&self, msg: &TickMessage) {
        if let Ok(mut sent) = self.probe.inner.sent.lock() {
            sent.push(*msg);
        }
    }
}

fn broken_pipe() -> EngineError {
    EngineError::Send {
        reason: "Broken pipe (os error 32)".to_string(),
    }
}

impl Drop for ScriptedEngine {
    fn drop(&mut self) {
        self.probe.inner.torn_down.fetch_add(1, Ordering::SeqCst);
    }
}
