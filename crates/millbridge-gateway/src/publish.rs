//! Periodic publication payloads (§4.5's cadence table).
//!
//! Every published payload carries the same small envelope so a subscriber
//! can tell which schema and node a message came from without parsing the
//! topic string. Building an envelope never touches the network: the
//! [`gateway`] wiring decides when a cadence is due and calls the matching
//! builder here.

use serde::Serialize;

use millbridge_schemas::{DinSnapshot, HealthReport, PidParams, PidState, RunStatus, SystemHealth};

/// Schema version stamped on every published payload. Bump when a field is
/// removed or its meaning changes; additive fields don't require it.
pub const SCHEMA_VERSION: u16 = 1;

/// Common header included in every periodic publication (§6's wire
/// envelope: `{v, ts_ms, src, ...}`).
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    #[serde(rename = "v")]
    pub schema_version: u16,
    pub ts_ms: u64,
    #[serde(rename = "src")]
    pub node_id: String,
}

impl Envelope {
    #[must_use]
    pub fn new(node_id: &str, now_ms: u64) -> Self {
        Self { schema_version: SCHEMA_VERSION, node_id: node_id.to_string(), ts_ms: now_ms }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatPayload {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub uptime_s: u64,
}

#[must_use]
pub fn heartbeat(node_id: &str, now_ms: u64, uptime_s: u64) -> HeartbeatPayload {
    HeartbeatPayload { envelope: Envelope::new(node_id, now_ms), uptime_s }
}

#[derive(Debug, Clone, Serialize)]
pub struct SysHealthPayload {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(flatten)]
    pub health: SystemHealth,
    pub run: RunStatus,
}

#[must_use]
pub fn sys_health(node_id: &str, now_ms: u64, health: SystemHealth, run: RunStatus) -> SysHealthPayload {
    SysHealthPayload { envelope: Envelope::new(node_id, now_ms), health, run }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatePayload {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(flatten)]
    pub report: HealthReport,
}

#[must_use]
pub fn health_state(node_id: &str, now_ms: u64, report: HealthReport) -> HealthStatePayload {
    HealthStatePayload { envelope: Envelope::new(node_id, now_ms), report }
}

#[derive(Debug, Clone, Serialize)]
pub struct PidStatePayload {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(flatten)]
    pub state: PidState,
}

#[must_use]
pub fn pid_state(node_id: &str, now_ms: u64, state: PidState) -> PidStatePayload {
    PidStatePayload { envelope: Envelope::new(node_id, now_ms), state }
}

#[derive(Debug, Clone, Serialize)]
pub struct PidParamsPayload {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(flatten)]
    pub params: PidParams,
}

#[must_use]
pub fn pid_params(node_id: &str, now_ms: u64, params: PidParams) -> PidParamsPayload {
    PidParamsPayload { envelope: Envelope::new(node_id, now_ms), params }
}

#[derive(Debug, Clone, Serialize)]
pub struct DinStatePayload {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub mask: u8,
}

#[must_use]
pub fn din_state(node_id: &str, now_ms: u64, snapshot: DinSnapshot) -> DinStatePayload {
    DinStatePayload { envelope: Envelope::new(node_id, now_ms), mask: snapshot.mask }
}

#[derive(Debug, Clone, Serialize)]
pub struct DinEventPayload {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub mask: u8,
    pub prev_mask: u8,
    pub rising: u8,
    pub falling: u8,
}

#[must_use]
pub fn din_event(node_id: &str, now_ms: u64, prev_mask: u8, snapshot: DinSnapshot) -> DinEventPayload {
    DinEventPayload {
        envelope: Envelope::new(node_id, now_ms),
        mask: snapshot.mask,
        prev_mask,
        rising: snapshot.rising,
        falling: snapshot.falling,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DoutStatePayload {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub mask: u8,
    pub outputs_allowed: bool,
}

#[must_use]
pub fn dout_state(node_id: &str, now_ms: u64, mask: u8, outputs_allowed: bool) -> DoutStatePayload {
    DoutStatePayload { envelope: Envelope::new(node_id, now_ms), mask, outputs_allowed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use millbridge_schemas::HealthStatus;

    #[test]
    fn din_event_carries_both_masks_and_edges() {
        let snap = DinSnapshot { mask: 0b101, rising: 0b100, falling: 0b010 };
        let payload = din_event("node-a", 50, 0b011, snap);
        assert_eq!(payload.prev_mask, 0b011);
        assert_eq!(payload.mask, 0b101);
        assert_eq!(payload.rising, 0b100);
        assert_eq!(payload.falling, 0b010);
        assert_eq!(payload.envelope.node_id, "node-a");
    }

    #[test]
    fn sys_health_embeds_the_full_verdict() {
        let health = SystemHealth { system_state: HealthStatus::Ok, ..SystemHealth::default() };
        let payload = sys_health("node-a", 0, health, RunStatus::default());
        assert_eq!(payload.health.system_state, HealthStatus::Ok);
        assert_eq!(payload.run.state, millbridge_schemas::RunState::Stopped);
    }
}
