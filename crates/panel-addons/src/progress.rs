use serde::{Deserialize, Serialize};

/// One unit of streamed install feedback.
///
/// Events are emitted strictly in the order steps are attempted, and
/// `Error` or `Done` is always the final event of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    /// A command is about to run.
    Step { step: String, cmd: String },
    /// Captured combined stdout/stderr of the last command (non-empty only).
    Output {
        step: String,
        cmd: String,
        output: String,
    },
    /// Terminal failure; no further events follow.
    Error { message: String },
    /// Terminal success; no further events follow.
    Done { message: String },
}

impl ProgressEvent {
    pub fn step(step: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self::Step {
            step: step.into(),
            cmd: cmd.into(),
        }
    }

    pub fn output(
        step: impl Into<String>,
        cmd: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::Output {
            step: step.into(),
            cmd: cmd.into(),
            output: output.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn done(message: impl Into<String>) -> Self {
        Self::Done {
            message: message.into(),
        }
    }

    /// True for `Error` and `Done`, the events that end a session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::Done { .. })
    }
}
