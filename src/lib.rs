//! Wiring for the `millbridged` binary (§10.1): constructs the HAL layer,
//! the five managed components, the health manager, the run-state
//! supervisor, the fieldbus scheduler, and the bus gateway, then drives
//! them through one cooperative tick loop.
//!
//! Real vendor I/O drivers are out of scope (`millbridge-hal`'s crate
//! doc); this wiring uses the in-memory HAL fakes directly so the
//! supervisory core has something concrete to run against. A deployment
//! with real hardware swaps the fake constructions below for its own
//! `DigitalInputs`/`RelayBank`/`NetworkLink`/`AccelSensor`/`Fieldbus`
//! implementations — nothing above the HAL boundary changes.
//!
//! Mirrors `crates/service`'s `WheelService` shape: a struct built once in
//! `new`, a `run` method that owns the event loop, `tracing` at every
//! state transition rather than every tick.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use millbridge_components::{AccelComponent, DinComponent, EthComponent, PidComponent, RelayComponent};
use millbridge_config::BridgeConfig;
use millbridge_fieldbus::FieldbusScheduler;
use millbridge_gateway::{command, gateway::GatewayConfig, publish, BusGateway, CommandTopic};
use millbridge_hal::fakes::{FakeAccel, FakeDin, FakeFieldbus, FakeNetwork, FakeRelay};
use millbridge_health::{HealthComponent, HealthManager};
use millbridge_schemas::{DinSnapshot, RunCommand, SystemHealth};
use millbridge_supervisor::RunControl;

const ETH_NAME: &str = "eth";
const DIN_NAME: &str = "din";
const RELAY_NAME: &str = "relay";
const ACCEL_NAME: &str = "accel";

/// Owns every managed device and the supervisory loop tying them together.
pub struct BridgeService {
    config: BridgeConfig,
    gateway: BusGateway,
    eth: EthComponent<FakeNetwork>,
    din: DinComponent<FakeDin>,
    relay: RelayComponent<FakeRelay>,
    accel: Option<AccelComponent<FakeAccel>>,
    pid_slaves: Vec<PidComponent>,
    fieldbus: FakeFieldbus,
    scheduler: FieldbusScheduler,
    health: HealthManager,
    supervisor: RunControl,
    started_at: Instant,
    last_health: SystemHealth,
    last_din: DinSnapshot,
    last_heartbeat_ms: u64,
    last_sys_health_ms: u64,
    last_health_state_ms: u64,
    last_pid_params_ms: u64,
    last_run_state: millbridge_schemas::RunState,
}

impl BridgeService {
    /// Builds every component from `config`, runs one `configure`+`probe`
    /// pass so the health manager starts with a real initial verdict
    /// rather than the all-`Missing` cold-start snapshot, and connects the
    /// gateway.
    pub async fn new(config: BridgeConfig) -> Result<Self> {
        info!(machine_id = %config.machine_id, node_id = %config.node_id, "initializing millbridge core");

        let mut eth = EthComponent::new(FakeNetwork { connected: true, local_ip: Some([10, 0, 0, 20]) });
        let mut din = DinComponent::new(FakeDin::default());
        let mut relay = RelayComponent::new(FakeRelay::default());
        let mut accel = config.accel.as_ref().map(|_| AccelComponent::new(FakeAccel::default()));

        let mut health = HealthManager::new();
        configure_and_add(&mut eth, config.eth.expected, config.eth.required, config.eth.stale_timeout_ms, &mut health, ETH_NAME)?;
        configure_and_add(&mut din, config.din.expected, config.din.required, config.din.stale_timeout_ms, &mut health, DIN_NAME)?;
        configure_and_add(&mut relay, config.relay.expected, config.relay.required, config.relay.stale_timeout_ms, &mut health, RELAY_NAME)?;
        if let (Some(accel_component), Some(accel_config)) = (accel.as_mut(), config.accel.as_ref()) {
            configure_and_add(
                accel_component,
                accel_config.expected,
                accel_config.required,
                accel_config.stale_timeout_ms,
                &mut health,
                ACCEL_NAME,
            )?;
        }

        let mut pid_slaves = Vec::with_capacity(config.pid_slaves.len());
        for slave_cfg in &config.pid_slaves {
            let mut slave = PidComponent::new(slave_cfg.name.clone(), slave_cfg.slave_id);
            configure_and_add(
                &mut slave,
                slave_cfg.component.expected,
                slave_cfg.component.required,
                slave_cfg.component.stale_timeout_ms,
                &mut health,
                &slave_cfg.name,
            )?;
            pid_slaves.push(slave);
        }

        let mut fieldbus = FakeFieldbus::new();
        fieldbus.begin();

        let scheduler = FieldbusScheduler::new(config.pid_state_period_ms, config.pid_params_period_ms);

        let gateway = BusGateway::new(&GatewayConfig {
            machine_id: config.machine_id.clone(),
            node_id: config.node_id.clone(),
            broker_host: config.broker_host.clone(),
            broker_port: config.broker_port,
            keep_alive: Duration::from_secs(30),
        });

        Ok(Self {
            config,
            gateway,
            eth,
            din,
            relay,
            accel,
            pid_slaves,
            fieldbus,
            scheduler,
            health,
            supervisor: RunControl::new(),
            started_at: Instant::now(),
            last_health: SystemHealth::default(),
            last_din: DinSnapshot::default(),
            last_heartbeat_ms: 0,
            last_sys_health_ms: 0,
            last_health_state_ms: 0,
            last_pid_params_ms: 0,
            last_run_state: millbridge_schemas::RunState::Stopped,
        })
    }

    fn now_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    /// Drives the gateway connection and one tick interval until ctrl-c or
    /// a fatal gateway error; mirrors `WheelService::run`'s
    /// `tokio::select!` shape one layer up, in `main`.
    pub async fn run(&mut self) -> Result<()> {
        self.gateway.announce_online().await.context("announcing gateway presence")?;

        let mut ticker = tokio::time::interval(Duration::from_millis(u64::from(self.config.io_state_period_ms)));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.on_tick().await?;
                }
                incoming = self.gateway.poll() => {
                    if let Some((kind, payload)) = incoming? {
                        self.handle_command(kind, &payload).await?;
                    }
                }
            }
        }
    }

    /// One supervisory pass (§4.1-§4.3 interleaved): refresh every
    /// component, run the fieldbus scheduler, recompute the system health
    /// verdict and run state, then publish whatever cadence is due.
    async fn on_tick(&mut self) -> Result<()> {
        let now_ms = self.now_ms();

        let prev_din = self.din.snapshot();
        self.din.tick(now_ms);
        self.eth.tick(now_ms);
        self.relay.tick(now_ms);
        if let Some(accel) = self.accel.as_mut() {
            accel.tick(now_ms);
        }

        self.health.update(DIN_NAME, self.din.report());
        self.health.update(ETH_NAME, self.eth.report());
        self.health.update(RELAY_NAME, self.relay.report());
        if let Some(accel) = self.accel.as_ref() {
            self.health.update(ACCEL_NAME, accel.report());
        }

        {
            let mut slaves: Vec<&mut dyn millbridge_fieldbus::PidSlave> =
                self.pid_slaves.iter_mut().map(|p| p as &mut dyn millbridge_fieldbus::PidSlave).collect();
            self.scheduler.tick(&mut self.fieldbus, &mut slaves, now_ms);
        }
        for slave in &self.pid_slaves {
            self.health.update(slave.name(), slave.report());
        }

        let din_snapshot = self.din.snapshot();
        self.last_health = self.health.evaluate(now_ms);
        let run_status = self.supervisor.update(&self.last_health, &din_snapshot, now_ms);
        if run_status.state != self.last_run_state {
            warn!(from = ?self.last_run_state, to = ?run_status.state, reason = %run_status.reason, "run state changed");
            self.last_run_state = run_status.state;
        }
        self.last_din = din_snapshot;

        self.publish_periodic(now_ms, prev_din, din_snapshot, run_status).await
    }

    async fn publish_periodic(
        &mut self,
        now_ms: u64,
        prev_din: DinSnapshot,
        din_snapshot: DinSnapshot,
        run_status: millbridge_schemas::RunStatus,
    ) -> Result<()> {
        let node_id = self.config.node_id.clone();

        let topic = self.gateway.topics().din_state();
        self.gateway.publish(&topic, false, &publish::din_state(&node_id, now_ms, din_snapshot)).await.context("publishing din state")?;

        if prev_din.mask != din_snapshot.mask {
            let topic = self.gateway.topics().din_event();
            self.gateway
                .publish(&topic, false, &publish::din_event(&node_id, now_ms, prev_din.mask, din_snapshot))
                .await
                .context("publishing din event")?;
        }

        let topic = self.gateway.topics().dout_state();
        self.gateway
            .publish(&topic, false, &publish::dout_state(&node_id, now_ms, self.relay.cache(), run_status.outputs_allowed))
            .await
            .context("publishing dout state")?;

        if now_ms.saturating_sub(self.last_pid_params_ms) >= u64::from(self.config.pid_params_period_ms) {
            self.last_pid_params_ms = now_ms;
            let params: Vec<(String, millbridge_schemas::PidParams)> =
                self.pid_slaves.iter().map(|s| (s.name().to_string(), s.params())).collect();
            for (name, params) in params {
                let topic = self.gateway.topics().pid_params(&name);
                self.gateway.publish(&topic, true, &publish::pid_params(&node_id, now_ms, params)).await.context("publishing pid params")?;
            }
        }

        let states: Vec<(String, millbridge_schemas::PidState)> =
            self.pid_slaves.iter().map(|s| (s.name().to_string(), s.state())).collect();
        for (name, state) in states {
            let topic = self.gateway.topics().pid_state(&name);
            self.gateway.publish(&topic, false, &publish::pid_state(&node_id, now_ms, state)).await.context("publishing pid state")?;
        }

        if now_ms.saturating_sub(self.last_heartbeat_ms) >= u64::from(self.config.heartbeat_period_ms) {
            self.last_heartbeat_ms = now_ms;
            let topic = self.gateway.topics().heartbeat();
            self.gateway.publish(&topic, false, &publish::heartbeat(&node_id, now_ms, now_ms / 1000)).await.context("publishing heartbeat")?;
        }

        if now_ms.saturating_sub(self.last_sys_health_ms) >= u64::from(self.config.heartbeat_period_ms) {
            self.last_sys_health_ms = now_ms;
            let topic = self.gateway.topics().sys_health();
            self.gateway
                .publish(&topic, false, &publish::sys_health(&node_id, now_ms, self.last_health, run_status.clone()))
                .await
                .context("publishing system health")?;
        }

        if now_ms.saturating_sub(self.last_health_state_ms) >= u64::from(self.config.heartbeat_period_ms) {
            self.last_health_state_ms = now_ms;
            let reports: Vec<(String, millbridge_schemas::HealthReport)> =
                self.health.iter().map(|(name, report)| (name.to_string(), report.clone())).collect();
            for (name, report) in reports {
                let topic = self.gateway.topics().health_state(&name);
                self.gateway.publish(&topic, false, &publish::health_state(&node_id, now_ms, report)).await.context("publishing component health")?;
            }
        }

        Ok(())
    }

    async fn handle_command(&mut self, kind: CommandTopic, payload: &[u8]) -> Result<()> {
        match kind {
            CommandTopic::Relay => self.handle_relay_command(payload).await,
            CommandTopic::Run => self.handle_run_command(payload).await,
        }
    }

    async fn handle_relay_command(&mut self, payload: &[u8]) -> Result<()> {
        let now_ms = self.now_ms();
        let ack_topic = self.gateway.topics().relay_cmd();

        let parsed: Result<command::RelayCommandPayload, _> = serde_json::from_slice(payload);
        let ack = match parsed {
            Err(_) => command::RelayAck { cmd_id: 0, ok: false, mask: None, err: Some("invalid_payload") },
            Ok(cmd) => {
                let cmd_id = cmd.cmd_id;
                match command::resolve_relay_mask(&cmd, self.last_health.outputs_allowed, self.relay.cache()) {
                    Err(err) => command::RelayAck { cmd_id, ok: false, mask: None, err: Some(err.token()) },
                    Ok(mask) => match self.relay.write(mask, now_ms) {
                        Ok(applied) => {
                            self.health.update(RELAY_NAME, self.relay.report());
                            command::RelayAck { cmd_id, ok: true, mask: Some(applied), err: None }
                        }
                        Err(_) => command::RelayAck {
                            cmd_id,
                            ok: false,
                            mask: None,
                            err: Some(millbridge_errors::CommandError::WriteFail.token()),
                        },
                    },
                }
            }
        };

        self.gateway.publish_ack(&ack_topic, &ack).await.context("publishing relay command ack")
    }

    async fn handle_run_command(&mut self, payload: &[u8]) -> Result<()> {
        let now_ms = self.now_ms();
        let ack_topic = self.gateway.topics().run_cmd();

        let parsed: Result<command::RunCommandPayload, _> = serde_json::from_slice(payload);
        let ack = match parsed {
            Err(_) => command::RunAck { cmd_id: 0, ok: false, state: None, err: Some("invalid_payload") },
            Ok(raw) => {
                let cmd_id = raw.cmd_id;
                match command::parse_run_command(&raw) {
                    Err(err) => command::RunAck { cmd_id, ok: false, state: None, err: Some(err.token()) },
                    Ok(cmd) => self.apply_run_command(cmd, cmd_id, now_ms),
                }
            }
        };

        self.gateway.publish_ack(&ack_topic, &ack).await.context("publishing run command ack")
    }

    fn apply_run_command(&mut self, cmd: RunCommand, cmd_id: u64, now_ms: u64) -> command::RunAck {
        match self.supervisor.handle_command(cmd, &self.last_health, &self.last_din, now_ms) {
            Ok(status) => command::RunAck { cmd_id, ok: true, state: Some(status), err: None },
            Err(err) => command::RunAck { cmd_id, ok: false, state: Some(self.supervisor.status()), err: Some(err.token()) },
        }
    }
}

/// Runs `configure` then a one-shot `probe`, logs the initial status, and
/// registers the component with the health manager.
fn configure_and_add<C: HealthComponent>(
    component: &mut C,
    expected: bool,
    required: bool,
    stale_timeout_ms: u32,
    health: &mut HealthManager,
    name: &str,
) -> Result<()> {
    component.configure(expected, required, 0);
    if expected {
        let ok = component.probe(0);
        debug!(component = %name, ok, "initial probe");
    }
    let report = component.report();
    info!(component = %name, status = ?report.status, "component registered");
    health.add(name, report, stale_timeout_ms).context("registering component with health manager")?;
    Ok(())
}

/// Surfaced so `main` can log a reconnect warning without duplicating the
/// gateway's own error formatting.
pub fn log_gateway_warning(context: &str, err: &anyhow::Error) {
    warn!(context, error = %err, "gateway error");
}
