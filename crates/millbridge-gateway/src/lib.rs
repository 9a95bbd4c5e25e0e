//! Pub/sub bus gateway (§4.5): topic naming, command decision logic, and
//! periodic publication payloads, plus the thin `rumqttc` wiring that
//! drives them against a live broker.

pub mod command;
pub mod gateway;
pub mod publish;
pub mod topics;

pub use command::{parse_run_command, resolve_relay_mask, RelayAck, RelayCommandPayload, RunAck, RunCommandPayload};
pub use gateway::{BusGateway, GatewayConfig};
pub use topics::{CommandTopic, Topics};
