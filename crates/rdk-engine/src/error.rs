use std::fmt;

/// Engine session failures. Kept small and `Clone` so they can be logged and
/// carried in task outcomes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// The child process could not be started.
    Spawn { program: String, reason: String },
    /// The child started but a pipe end was not handed over.
    MissingPipe(&'static str),
    /// Writing a tick failed; the engine is gone.
    Send { reason: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Spawn { program, reason } => {
                write!(f, "failed to spawn engine '{}': {}", program, reason)
            }
            EngineError::MissingPipe(which) => write!(f, "engine {} pipe unavailable", which),
            EngineError::Send { reason } => write!(f, "engine send failed: {}", reason),
        }
    }
}

impl std::error::Error for EngineError {}
