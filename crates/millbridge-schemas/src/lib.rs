//! Data model for the millbridge supervisory core.
//!
//! This crate is intentionally I/O-free: it holds the value types shared by
//! the health model, the run-state supervisor, the fieldbus scheduler, and
//! the bus gateway, plus the fixed-point wire codec used to talk to the PID
//! controllers. No crate in this workspace should need to redefine these
//! types locally.

pub mod codec;
pub mod din;
pub mod health;
pub mod pid;
pub mod run;

pub use codec::{decode_fixed10, encode_fixed10};
pub use din::DinSnapshot;
pub use health::{HealthReport, HealthStatus, Severity, SystemHealth};
pub use pid::{PidParams, PidState};
pub use run::{RunCommand, RunState, RunStatus};
