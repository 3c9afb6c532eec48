//! Child-process engine session.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};

use rdk_portfolio::Order;
use tracing::{debug, warn};

use crate::protocol::decode_reply;
use crate::{DecisionEngine, EngineCommand, EngineError, TickMessage, ENV_TASK_ID};

/// One decision-engine child process and its two pipes.
///
/// Teardown (close both pipes, kill, reap) happens in [`Drop`] if
/// [`EngineSession::shutdown`] was not called first.
pub struct EngineSession {
    child: Child,
    to_engine: Option<BufWriter<ChildStdin>>,
    from_engine: Option<BufReader<ChildStdout>>,
    reply: Vec<u8>,
    task_id: String,
    torn_down: bool,
}

impl EngineSession {
    /// Start the engine with stdin/stdout wired to private pipes.
    /// Stderr is inherited so engine diagnostics reach the operator.
    pub fn spawn(cmd: &EngineCommand, task_id: &str) -> Result<Self, EngineError> {
        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .env(ENV_TASK_ID, task_id)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(dir) = &cmd.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| EngineError::Spawn {
            program: cmd.display(),
            reason: e.to_string(),
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let (stdin, stdout) = match (stdin, stdout) {
            (Some(i), Some(o)) => (i, o),
            (i, _) => {
                let which = if i.is_none() { "stdin" } else { "stdout" };
                let _ = child.kill();
                let _ = child.wait();
                return Err(EngineError::MissingPipe(which));
            }
        };

        debug!(task = task_id, pid = child.id(), engine = %cmd.display(), "engine spawned");

        Ok(Self {
            child,
            to_engine: Some(BufWriter::new(stdin)),
            from_engine: Some(BufReader::new(stdout)),
            reply: Vec::with_capacity(64),
            task_id: task_id.to_string(),
            torn_down: false,
        })
    }

    /// OS process id of the engine.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Write one tick line and flush it.
    pub fn send_tick(&mut self, msg: &TickMessage) -> Result<(), EngineError> {
        let w = self
            .to_engine
            .as_mut()
            .ok_or(EngineError::MissingPipe("stdin"))?;
        w.write_all(msg.to_line().as_bytes())
            .and_then(|_| w.flush())
            .map_err(|e| EngineError::Send {
                reason: e.to_string(),
            })
    }

    /// Block until one full reply line (or end of stream) arrives.
    ///
    /// End of stream is silence, not failure: it decodes to HOLD.
    pub fn recv_order(&mut self) -> Order {
        let Some(r) = self.from_engine.as_mut() else {
            return Order::Hold;
        };
        self.reply.clear();
        match r.read_until(b'\n', &mut self.reply) {
            Ok(0) => Order::Hold,
            Ok(_) => decode_reply(&self.reply),
            Err(e) => {
                warn!(task = %self.task_id, error = %e, "engine read failed; treating as HOLD");
                Order::Hold
            }
        }
    }

    /// Tear down now and report how the engine exited.
    pub fn shutdown(mut self) -> Option<ExitStatus> {
        self.teardown()
    }

    fn teardown(&mut self) -> Option<ExitStatus> {
        if self.torn_down {
            return None;
        }
        self.torn_down = true;

        // Dropping the writer flushes; a dead engine makes that fail, which is fine.
        drop(self.to_engine.take());
        drop(self.from_engine.take());

        if let Err(e) = self.child.kill() {
            debug!(task = %self.task_id, error = %e, "engine kill failed (already exited?)");
        }
        match self.child.wait() {
            Ok(status) => {
                debug!(task = %self.task_id, %status, "engine reaped");
                Some(status)
            }
            Err(e) => {
                warn!(task = %self.task_id, error = %e, "engine wait failed");
                None
            }
        }
    }
}

impl DecisionEngine for EngineSession {
    fn round_trip(&mut self, msg: &TickMessage) -> Result<Order, EngineError> {
        self.send_tick(msg)?;
        Ok(self.recv_order())
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
