//! End-to-end scenarios from the specification's testable-properties
//! section, composed directly from the library crates the same way
//! `BridgeService::on_tick` wires them, minus the gateway/network layer.

use millbridge_components::{EthComponent, PidComponent, RelayComponent};
use millbridge_hal::fakes::{FakeFieldbus, FakeNetwork, FakeRelay};
use millbridge_hal::FieldbusCompletion;
use millbridge_fieldbus::{FieldbusScheduler, PidSlave};
use millbridge_health::{HealthComponent, HealthManager};
use millbridge_schemas::{DinSnapshot, HealthStatus, RunCommand, RunState};
use millbridge_supervisor::RunControl;

fn din_ok() -> DinSnapshot {
    DinSnapshot { mask: 0b111, rising: 0, falling: 0 }
}

fn din_estop() -> DinSnapshot {
    DinSnapshot { mask: 0b110, rising: 0, falling: 0b001 }
}

/// Scenario 1: cold start, all devices present, interlocks OK. After one
/// scheduler sweep plus one START command, the machine reaches RUNNING
/// with a clean verdict and the PID slave publishing valid state.
#[test]
fn cold_start_to_running_with_clean_health() {
    let mut eth = EthComponent::new(FakeNetwork { connected: true, local_ip: Some([10, 0, 0, 5]) });
    let mut relay = RelayComponent::new(FakeRelay::new());
    let mut heat1 = PidComponent::new("pid_heat1", 1);

    eth.configure(true, true, 0);
    relay.configure(true, true, 0);
    heat1.configure(true, true, 0);
    eth.probe(0);
    relay.probe(0);

    let mut health = HealthManager::new();
    health.add("eth", eth.report(), 0).unwrap();
    health.add("relay", relay.report(), 1_000).unwrap();
    health.add("din", millbridge_schemas::HealthReport::initial(true, true, 0), 1_000).unwrap();
    health.update("din", millbridge_schemas::HealthReport {
        status: HealthStatus::Ok,
        severity: millbridge_schemas::Severity::Info,
        expected: true,
        required: true,
        reason: "ok".to_string(),
        since_ms: 0,
        last_ok_ms: 0,
    });
    health.add("pid_heat1", heat1.report(), 1_500).unwrap();

    let mut fieldbus = FakeFieldbus::new();
    let mut scheduler = FieldbusScheduler::new(200, 5_000);
    {
        let mut slaves: Vec<&mut dyn PidSlave> = vec![&mut heat1];
        scheduler.tick(&mut fieldbus, &mut slaves, 0);
    }
    assert!(scheduler.busy());
    fieldbus.complete_now();
    {
        let mut slaves: Vec<&mut dyn PidSlave> = vec![&mut heat1];
        scheduler.tick(&mut fieldbus, &mut slaves, 200);
    }
    health.update("pid_heat1", heat1.report());

    let snapshot = din_ok();
    let verdict = health.evaluate(200);
    assert_eq!(verdict.crit_count, 0);
    assert_eq!(verdict.warn_count, 0);
    assert_eq!(verdict.system_state, HealthStatus::Ok);

    let mut supervisor = RunControl::new();
    let status = supervisor.handle_command(RunCommand::Start, &verdict, &snapshot, 200).unwrap();
    assert_eq!(status.state, RunState::Running);
    assert!(heat1.state().valid);
}

/// Scenario 2: an interlock trip latches ESTOP; restoring the input lets a
/// RESET return the machine to STOPPED. RESET while still tripped is
/// rejected.
#[test]
fn interlock_trip_latches_estop_then_resets() {
    let health = millbridge_schemas::SystemHealth::default();
    let mut supervisor = RunControl::new();
    supervisor.handle_command(RunCommand::Start, &health, &din_ok(), 0).unwrap();

    let status = supervisor.update(&health, &din_estop(), 10);
    assert_eq!(status.state, RunState::Estop);
    assert_eq!(status.reason, "estop_tripped");

    let err = supervisor.handle_command(RunCommand::Reset, &health, &din_estop(), 20).unwrap_err();
    assert_eq!(err, millbridge_errors::CommandError::ResetInhibited);

    let status = supervisor.handle_command(RunCommand::Reset, &health, &din_ok(), 30).unwrap();
    assert_eq!(status.state, RunState::Stopped);
}

/// Scenario 3: a PID slave goes unresponsive across two consecutive state
/// reads, degrading then going missing, which blocks a subsequent START.
#[test]
fn unresponsive_pid_blocks_start_command() {
    let mut heat1 = PidComponent::new("pid_heat1", 1);
    heat1.configure(true, true, 0);

    heat1.deliver_completion(
        millbridge_hal::FieldbusRequestKind::ReadState,
        Some(FieldbusCompletion { tx_id: 1, registers: None }),
    );
    heat1.tick(200);
    assert_eq!(heat1.report().status, HealthStatus::Degraded);
    assert_eq!(heat1.report().reason, "modbus_read_fail");

    heat1.deliver_completion(
        millbridge_hal::FieldbusRequestKind::ReadState,
        Some(FieldbusCompletion { tx_id: 2, registers: None }),
    );
    heat1.tick(400);
    assert_eq!(heat1.report().status, HealthStatus::Missing);
    assert_eq!(heat1.report().reason, "modbus_no_response");

    let mut health = HealthManager::new();
    health.add("pid_heat1", heat1.report(), 1_500).unwrap();
    let verdict = health.evaluate(400);
    assert_eq!(verdict.system_state, HealthStatus::Error);
    assert!(!verdict.run_allowed);

    let mut supervisor = RunControl::new();
    let err = supervisor.handle_command(RunCommand::Start, &verdict, &din_ok(), 400).unwrap_err();
    assert_eq!(err, millbridge_errors::CommandError::Inhibited);
}

/// Scenario 4: a relay mask command is accepted while outputs are allowed
/// (RUNNING), and writes through to the HAL cache.
#[test]
fn relay_write_succeeds_while_outputs_allowed() {
    let mut relay = RelayComponent::new(FakeRelay::new());
    relay.configure(true, true, 0);

    let health = millbridge_schemas::SystemHealth::default();
    let mut supervisor = RunControl::new();
    let status = supervisor.handle_command(RunCommand::Start, &health, &din_ok(), 0).unwrap();
    assert!(status.outputs_allowed);

    let mask = relay.write(0b0101, 10).unwrap();
    assert_eq!(mask, 0b0101);
    assert_eq!(relay.cache(), 0b0101);
}

/// Scenario 5: setting a PID setpoint writes through the fieldbus and the
/// decoded state reflects the new value on the next successful state read.
#[test]
fn set_sv_round_trips_through_fieldbus_and_state_read() {
    let mut bus = FakeFieldbus::new();
    let mut heat1 = PidComponent::new("pid_heat1", 1);
    heat1.configure(true, true, 0);

    heat1.set_sv(55.0, &mut bus, 0).unwrap();
    assert!((heat1.state().sv - 55.0).abs() < 0.01);
    assert_eq!(heat1.report().status, HealthStatus::Ok);

    let mut scheduler = FieldbusScheduler::new(200, 5_000);
    {
        let mut slaves: Vec<&mut dyn PidSlave> = vec![&mut heat1];
        scheduler.tick(&mut bus, &mut slaves, 0);
    }
    bus.complete_now();
    {
        let mut slaves: Vec<&mut dyn PidSlave> = vec![&mut heat1];
        scheduler.tick(&mut bus, &mut slaves, 200);
    }
    assert_eq!(heat1.report().status, HealthStatus::Ok);
}
