//! Configuration loading and validation (§9's config note: the recognized
//! options are enumerated at build time, not discovered at runtime).
//!
//! A TOML file supplies the deployment-specific shape (which components
//! exist, their expected/required flags, stale budgets, PID slave table);
//! `clap` supplies operator overrides for the handful of settings worth
//! changing without editing a file, mirroring `openracing`'s convention of
//! a typed config struct plus a thin CLI layer in front of it.

use std::path::{Path, PathBuf};

use clap::Parser;
use millbridge_errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Per-component expected/required/stale-budget triple, shared by every
/// entry in [`BridgeConfig`] (§3's `HealthReport` configuration fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentConfig {
    pub expected: bool,
    pub required: bool,
    pub stale_timeout_ms: u32,
}

impl ComponentConfig {
    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.required && !self.expected {
            return Err(ConfigError::RequiredWithoutExpected(name.to_string()));
        }
        Ok(())
    }
}

/// One entry in the PID slave table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PidSlaveConfig {
    pub name: String,
    pub slave_id: u8,
    #[serde(flatten)]
    pub component: ComponentConfig,
}

/// The full deployment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub machine_id: String,
    pub node_id: String,
    pub broker_host: String,
    #[serde(default = "default_broker_port")]
    pub broker_port: u16,
    #[serde(default = "default_heartbeat_period_ms")]
    pub heartbeat_period_ms: u32,
    #[serde(default = "default_pid_state_period_ms")]
    pub pid_state_period_ms: u32,
    #[serde(default = "default_pid_params_period_ms")]
    pub pid_params_period_ms: u32,
    #[serde(default = "default_io_state_period_ms")]
    pub io_state_period_ms: u32,
    pub eth: ComponentConfig,
    pub din: ComponentConfig,
    pub relay: ComponentConfig,
    pub accel: Option<ComponentConfig>,
    #[serde(default)]
    pub pid_slaves: Vec<PidSlaveConfig>,
}

const fn default_broker_port() -> u16 {
    1883
}

const fn default_heartbeat_period_ms() -> u32 {
    1_000
}

const fn default_pid_state_period_ms() -> u32 {
    200
}

const fn default_pid_params_period_ms() -> u32 {
    5_000
}

const fn default_io_state_period_ms() -> u32 {
    200
}

impl BridgeConfig {
    /// Parses a TOML configuration file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.as_ref().display())))?;
        let config: Self = toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies the `required=true ⇒ expected=true` invariant across every
    /// configured component, and rejects a PID slave table larger than the
    /// health manager's capacity (§4.2).
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.eth.validate("eth")?;
        self.din.validate("din")?;
        self.relay.validate("relay")?;
        if let Some(accel) = &self.accel {
            accel.validate("accel")?;
        }
        for slave in &self.pid_slaves {
            slave.component.validate(&slave.name)?;
        }
        let total = 3 + usize::from(self.accel.is_some()) + self.pid_slaves.len();
        if total > millbridge_health_capacity() {
            return Err(ConfigError::CapacityExceeded(millbridge_health_capacity()));
        }
        Ok(())
    }

    /// Applies CLI overrides on top of a loaded (or default) configuration.
    #[must_use]
    pub fn with_cli_overrides(mut self, cli: &CliArgs) -> Self {
        if let Some(host) = &cli.broker_host {
            self.broker_host = host.clone();
        }
        if let Some(port) = cli.broker_port {
            self.broker_port = port;
        }
        if let Some(node_id) = &cli.node_id {
            self.node_id = node_id.clone();
        }
        self
    }
}

/// The health manager's component table capacity (§4.2). Duplicated here
/// as a plain constant rather than a dependency on `millbridge-health`, to
/// keep this crate's dependency footprint limited to parsing concerns.
const fn millbridge_health_capacity() -> usize {
    16
}

/// Command-line overrides for the bridge daemon (§9's config note).
#[derive(Debug, Parser)]
#[command(name = "millbridged", about = "Supervisory core for a cryo-mill fieldbus/relay bridge node")]
pub struct CliArgs {
    /// Path to the TOML configuration file.
    #[arg(long, env = "MILLBRIDGE_CONFIG", default_value = "millbridge.toml")]
    pub config: PathBuf,

    /// Overrides `broker_host` from the config file.
    #[arg(long, env = "MILLBRIDGE_BROKER_HOST")]
    pub broker_host: Option<String>,

    /// Overrides `broker_port` from the config file.
    #[arg(long, env = "MILLBRIDGE_BROKER_PORT")]
    pub broker_port: Option<u16>,

    /// Overrides `node_id` from the config file.
    #[arg(long, env = "MILLBRIDGE_NODE_ID")]
    pub node_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BridgeConfig {
        BridgeConfig {
            machine_id: "cryomill-01".to_string(),
            node_id: "node-a".to_string(),
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            heartbeat_period_ms: 1_000,
            pid_state_period_ms: 200,
            pid_params_period_ms: 5_000,
            io_state_period_ms: 200,
            eth: ComponentConfig { expected: true, required: false, stale_timeout_ms: 0 },
            din: ComponentConfig { expected: true, required: true, stale_timeout_ms: 1_000 },
            relay: ComponentConfig { expected: true, required: true, stale_timeout_ms: 1_000 },
            accel: None,
            pid_slaves: vec![PidSlaveConfig {
                name: "pid_heat1".to_string(),
                slave_id: 1,
                component: ComponentConfig { expected: true, required: true, stale_timeout_ms: 1_500 },
            }],
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn required_without_expected_is_rejected() {
        let mut cfg = sample();
        cfg.relay.expected = false;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::RequiredWithoutExpected(name) if name == "relay"));
    }

    #[test]
    fn toml_round_trip_applies_defaults() {
        let toml_text = r#"
            machine_id = "cryomill-01"
            node_id = "node-a"
            broker_host = "localhost"

            [eth]
            expected = true
            required = false
            stale_timeout_ms = 0

            [din]
            expected = true
            required = true
            stale_timeout_ms = 1000

            [relay]
            expected = true
            required = true
            stale_timeout_ms = 1000
        "#;
        let cfg: BridgeConfig = toml::from_str(toml_text).unwrap();
        assert_eq!(cfg.broker_port, 1883);
        assert_eq!(cfg.heartbeat_period_ms, 1_000);
        assert_eq!(cfg.pid_state_period_ms, 200);
        assert!(cfg.pid_slaves.is_empty());
    }

    #[test]
    fn cli_overrides_take_precedence() {
        let cli = CliArgs {
            config: PathBuf::from("millbridge.toml"),
            broker_host: Some("10.0.0.9".to_string()),
            broker_port: Some(8883),
            node_id: None,
        };
        let cfg = sample().with_cli_overrides(&cli);
        assert_eq!(cfg.broker_host, "10.0.0.9");
        assert_eq!(cfg.broker_port, 8883);
        assert_eq!(cfg.node_id, "node-a");
    }
}
