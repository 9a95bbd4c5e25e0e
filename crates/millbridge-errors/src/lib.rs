//! Centralized error types for the millbridge supervisory core.
//!
//! Three taxonomies, matching §7 of the specification:
//!
//! - [`ComponentFault`]: stable reason tokens surfaced through
//!   [`millbridge_schemas::HealthReport`] rather than propagated as
//!   `Result` — a component never fails the process.
//! - [`CommandError`]: command-rejection tokens shared by the bus
//!   gateway's relay/run command handlers (replied on the ack topic) and
//!   the run-state supervisor's `handle_command` (latch/interlock
//!   rejections), since both reject at the same granularity.
//! - [`ConfigError`]: configuration-time rejections from the health
//!   manager and config loader (ambient stack addition, §10.4).
//!
//! Every variant carries a `token()` accessor returning the exact
//! machine-readable string named in the spec, so the gateway can serialize
//! an error without a second lookup table.

use thiserror::Error;

/// Component-level operational fault, surfaced via a `HealthReport` reason
/// rather than returned from the main loop (§7.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ComponentFault {
    #[error("modbus transaction timed out with no response")]
    ModbusNoResponse,
    #[error("modbus read transaction failed")]
    ModbusReadFail,
    #[error("setpoint write rejected by controller")]
    SvWriteFail,
    #[error("i2c read failed")]
    I2cReadFail,
    #[error("estop interlock tripped")]
    EstopTripped,
    #[error("door interlock open")]
    DoorOpen,
    #[error("lid interlock unlocked")]
    LidUnlocked,
    #[error("component initialization failed")]
    InitFailed,
    #[error("hal write failed")]
    WriteFail,
    #[error("hal read failed")]
    ReadFail,
    #[error("link is up")]
    Up,
    #[error("link is down")]
    Down,
}

impl ComponentFault {
    /// The stable machine-readable reason token for this fault.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::ModbusNoResponse => "modbus_no_response",
            Self::ModbusReadFail => "modbus_read_fail",
            Self::SvWriteFail => "sv_write_fail",
            Self::I2cReadFail => "i2c_read_fail",
            Self::EstopTripped => "estop_tripped",
            Self::DoorOpen => "door_open",
            Self::LidUnlocked => "lid_unlocked",
            Self::InitFailed => "init_failed",
            Self::WriteFail => "write_fail",
            Self::ReadFail => "read_fail",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// Command validation error, replied on the gateway's ack topic (§7.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("outputs are inhibited by the current run state")]
    OutputsInhibited,
    #[error("command payload was malformed")]
    InvalidPayload,
    #[error("channel out of range or relay write failed")]
    InvalidChannelOrWriteFail,
    #[error("relay write failed")]
    WriteFail,
    #[error("unrecognized run command")]
    InvalidCmd,
    #[error("command rejected while a safety latch is set")]
    Inhibited,
    #[error("reset preconditions not satisfied")]
    ResetInhibited,
}

impl CommandError {
    /// The stable machine-readable error token for this failure.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::OutputsInhibited => "outputs_inhibited",
            Self::InvalidPayload => "invalid_payload",
            Self::InvalidChannelOrWriteFail => "invalid_channel_or_write_fail",
            Self::WriteFail => "write_fail",
            Self::InvalidCmd => "invalid_cmd",
            Self::Inhibited => "inhibited",
            Self::ResetInhibited => "reset_inhibited",
        }
    }
}

/// Configuration validation error (ambient stack addition, §10.4).
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("component `{0}` is marked required but not expected, which is a configuration error")]
    RequiredWithoutExpected(String),
    #[error("component table would exceed capacity of {0} entries")]
    CapacityExceeded(usize),
    #[error("failed to parse configuration file: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_fault_tokens_are_stable() {
        assert_eq!(ComponentFault::ModbusNoResponse.token(), "modbus_no_response");
        assert_eq!(ComponentFault::SvWriteFail.token(), "sv_write_fail");
    }

    #[test]
    fn command_error_tokens_are_stable() {
        assert_eq!(CommandError::OutputsInhibited.token(), "outputs_inhibited");
        assert_eq!(CommandError::ResetInhibited.token(), "reset_inhibited");
    }
}
