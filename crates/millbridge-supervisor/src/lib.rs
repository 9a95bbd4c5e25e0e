//! Run Control supervisor (§4.3): a four-state machine with two latches
//! that turns operator intent, interlock state, and system health into
//! what the machine is allowed to do right now.
//!
//! Grounded in `openracing-fmea::fmea::FmeaSystem`'s fault/soft-stop state
//! machine shape (latched fault state cleared only through an explicit
//! recovery call) and in the original firmware's `run_control.cpp`, whose
//! effective-state resolution is reproduced here as the pure function
//! [`RunControl::resolve`].
//!
//! ```text
//! ┌─────────┐  START   ┌─────────┐  HOLD   ┌─────────┐
//! │ STOPPED │─────────▶│ RUNNING │────────▶│ HOLDING │
//! └─────────┘◀─────────└─────────┘◀────────└─────────┘
//!      ▲         STOP        ▲        STOP
//!      │                     │
//!      │ interlocks trip or health_fault_latched
//!      │                     │
//!      └──────────┬──────────┘
//!                 ▼
//!            ┌─────────┐   RESET (interlocks_ok ∧ health ok)
//!            │  ESTOP  │───────────────────────────────────▶ STOPPED
//!            └─────────┘
//! ```

use millbridge_errors::CommandError;
use millbridge_schemas::{DinSnapshot, RunCommand, RunState, RunStatus, SystemHealth};

/// The Run Control supervisor (§4.3).
#[derive(Debug, Clone)]
pub struct RunControl {
    desired_state: RunState,
    estop_latched: bool,
    health_fault_latched: bool,
    last_estop_reason: String,
    status: RunStatus,
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

impl RunControl {
    #[must_use]
    pub fn new() -> Self {
        Self {
            desired_state: RunState::Stopped,
            estop_latched: false,
            health_fault_latched: false,
            last_estop_reason: "operator_stop".to_string(),
            status: RunStatus::default(),
        }
    }

    /// The most recently computed status (§4.3's effective state).
    #[must_use]
    pub fn status(&self) -> RunStatus {
        self.status.clone()
    }

    #[must_use]
    pub fn estop_latched(&self) -> bool {
        self.estop_latched
    }

    #[must_use]
    pub fn health_fault_latched(&self) -> bool {
        self.health_fault_latched
    }

    /// Called every loop iteration (§4.3). Applies the pre-latch rules,
    /// then recomputes the effective state.
    pub fn update(&mut self, health: &SystemHealth, din: &DinSnapshot, now_ms: u64) -> RunStatus {
        let _ = now_ms;
        if !din.interlocks_ok() {
            self.estop_latched = true;
            self.last_estop_reason = din.trip_reason().to_string();
        }
        if !health.run_allowed {
            self.health_fault_latched = true;
        }
        self.resolve(health, din)
    }

    /// Applies an operator command (§4.3). Returns `Ok(())` on success or
    /// the stable error token on rejection; always recomputes the
    /// effective state afterward, whether the command was accepted or not.
    pub fn handle_command(
        &mut self,
        cmd: RunCommand,
        health: &SystemHealth,
        din: &DinSnapshot,
        now_ms: u64,
    ) -> Result<RunStatus, CommandError> {
        let _ = now_ms;
        let latched = self.estop_latched || self.health_fault_latched;

        let result = match cmd {
            RunCommand::Reset => {
                if din.interlocks_ok() && health.run_allowed {
                    self.estop_latched = false;
                    self.health_fault_latched = false;
                    self.desired_state = RunState::Stopped;
                    Ok(())
                } else if latched {
                    Err(CommandError::ResetInhibited)
                } else {
                    self.desired_state = RunState::Stopped;
                    Ok(())
                }
            }
            RunCommand::Start if latched => Err(CommandError::Inhibited),
            RunCommand::Hold if latched => Err(CommandError::Inhibited),
            RunCommand::Stop if latched => Err(CommandError::Inhibited),
            RunCommand::Start => {
                if din.interlocks_ok() && health.run_allowed {
                    self.desired_state = RunState::Running;
                    Ok(())
                } else {
                    Err(CommandError::Inhibited)
                }
            }
            RunCommand::Hold => {
                self.desired_state = RunState::Holding;
                Ok(())
            }
            RunCommand::Stop => {
                self.desired_state = RunState::Stopped;
                Ok(())
            }
        };

        let status = self.resolve(health, din);
        result.map(|()| status)
    }

    /// The pure effective-state resolution function (§4.3).
    fn resolve(&mut self, health: &SystemHealth, din: &DinSnapshot) -> RunStatus {
        let (state, reason) = if self.estop_latched {
            let reason = if din.interlocks_ok() {
                "estop_latched".to_string()
            } else {
                self.last_estop_reason.clone()
            };
            (RunState::Estop, reason)
        } else if self.health_fault_latched || !health.run_allowed {
            (RunState::Stopped, "health_fault".to_string())
        } else {
            (self.desired_state, self.desired_state.operator_reason().to_string())
        };

        self.status = RunStatus {
            state,
            reason,
            run_allowed: state.run_allowed(),
            outputs_allowed: state.outputs_allowed(),
        };
        self.status.clone()
    }
}
