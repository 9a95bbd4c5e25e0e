//! Command payload parsing and pure decision logic (§4.5).
//!
//! Kept free of any `rumqttc`/I-O concerns so the relay-mask and
//! run-command policy can be unit tested without a broker; [`gateway`]
//! wires the results into the relay/run-control HAL calls and the actual
//! MQTT publish of the resulting ack.

use serde::{Deserialize, Serialize};

use millbridge_errors::CommandError;
use millbridge_schemas::{RunCommand, RunStatus};

/// Inbound relay command payload (§4.5): either an absolute mask set or a
/// single-channel patch.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayCommandPayload {
    pub mask: Option<u8>,
    pub channel: Option<u8>,
    pub state: Option<bool>,
    pub cmd_id: u64,
}

/// Inbound run command payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RunCommandPayload {
    pub cmd: String,
    pub cmd_id: u64,
}

/// Acknowledgement published in reply to any command (§4.5).
#[derive(Debug, Clone, Serialize)]
pub struct RelayAck {
    pub cmd_id: u64,
    pub ok: bool,
    pub mask: Option<u8>,
    pub err: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunAck {
    pub cmd_id: u64,
    pub ok: bool,
    pub state: Option<RunStatus>,
    pub err: Option<&'static str>,
}

/// Computes the absolute output mask a relay command resolves to, without
/// touching the HAL (§4.5 policy steps 1-4).
pub fn resolve_relay_mask(
    payload: &RelayCommandPayload,
    outputs_allowed: bool,
    current_mask: u8,
) -> Result<u8, CommandError> {
    if !outputs_allowed {
        return Err(CommandError::OutputsInhibited);
    }
    if let Some(mask) = payload.mask {
        return Ok(mask);
    }
    match (payload.channel, payload.state) {
        (Some(channel @ 1..=8), Some(state)) => {
            let bit = 1u8 << (channel - 1);
            Ok(if state { current_mask | bit } else { current_mask & !bit })
        }
        (Some(_), Some(_)) => Err(CommandError::InvalidChannelOrWriteFail),
        _ => Err(CommandError::InvalidPayload),
    }
}

/// Parses the `cmd` string of a run command payload (§4.5).
pub fn parse_run_command(payload: &RunCommandPayload) -> Result<RunCommand, CommandError> {
    match payload.cmd.as_str() {
        "start" => Ok(RunCommand::Start),
        "stop" => Ok(RunCommand::Stop),
        "hold" => Ok(RunCommand::Hold),
        "reset" => Ok(RunCommand::Reset),
        _ => Err(CommandError::InvalidCmd),
    }
}
