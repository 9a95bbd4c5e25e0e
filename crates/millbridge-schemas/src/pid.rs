//! PID controller state and parameter snapshots (§3).

use serde::{Deserialize, Serialize};

/// Live process values read from a PID controller's state register block
/// (PV..AL2, register map §6).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PidState {
    pub pv: f32,
    pub sv: f32,
    pub out_pct: f32,
    pub status: u16,
    pub alarm1: u16,
    pub alarm2: u16,
    pub alarm_active: bool,
    pub valid: bool,
}

/// Tuning parameters read from a PID controller's parameter register block
/// (P..USPL, register map §6).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PidParams {
    pub p: f32,
    pub i: f32,
    pub d: f32,
    pub output_min: f32,
    pub output_max: f32,
    pub sv_min: f32,
    pub sv_max: f32,
    pub valid: bool,
}
