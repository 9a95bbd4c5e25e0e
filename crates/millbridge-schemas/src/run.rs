//! Run-state supervisor types (§4.3).

use serde::{Deserialize, Serialize};

/// The four supervisory states.
///
/// Serializes in `SCREAMING_SNAKE_CASE` to match the wire tokens named in
/// §3 (`STOPPED`, `RUNNING`, `HOLDING`, `ESTOP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Stopped,
    Running,
    Holding,
    Estop,
}

impl RunState {
    /// `outputs_allowed ⇔ state ∈ {RUNNING, HOLDING}` (R3).
    #[must_use]
    pub fn outputs_allowed(self) -> bool {
        matches!(self, RunState::Running | RunState::Holding)
    }

    /// `run_allowed ⇔ state = RUNNING` (R3).
    #[must_use]
    pub fn run_allowed(self) -> bool {
        matches!(self, RunState::Running)
    }

    /// The stable operator-intent reason token for this state.
    #[must_use]
    pub fn operator_reason(self) -> &'static str {
        match self {
            RunState::Running => "operator_start",
            RunState::Holding => "operator_hold",
            RunState::Stopped => "operator_stop",
            RunState::Estop => "operator_estop",
        }
    }
}

/// Operator-issued run commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunCommand {
    Start,
    Stop,
    Hold,
    Reset,
}

/// Published/returned run status snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub state: RunState,
    pub reason: String,
    pub run_allowed: bool,
    pub outputs_allowed: bool,
}

impl Default for RunStatus {
    fn default() -> Self {
        Self {
            state: RunState::Stopped,
            reason: RunState::Stopped.operator_reason().to_string(),
            run_allowed: false,
            outputs_allowed: false,
        }
    }
}
