//! Concrete Health Component implementations, one per managed device
//! (§2, §4.1): `eth`, `din`, `relay`, `pid`, and the optional `accel`.
//!
//! Grounded in the original firmware's `components/pid_modbus.cpp` for the
//! OK→DEGRADED→MISSING transition policy, generalized from a single
//! synchronous read into the scheduler-driven completion model of §4.4.

pub mod accel;
pub mod din;
pub mod eth;
pub mod pid;
pub mod relay;

pub use accel::AccelComponent;
pub use din::DinComponent;
pub use eth::EthComponent;
pub use pid::PidComponent;
pub use relay::RelayComponent;
