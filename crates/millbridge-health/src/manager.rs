//! Health Manager: aggregates component reports into one [`SystemHealth`]
//! verdict (§4.2).
//!
//! The manager does not hold `dyn HealthComponent` trait objects — wiring
//! code owns the concrete components and pushes a value-copy of each
//! report in on every loop pass via [`HealthManager::update`], mirroring
//! the spec's "the manager reads a value copy per evaluation" lifecycle
//! note. This sidesteps object-safety entirely and keeps the manager a
//! plain data aggregator, the same shape as `openracing-watchdog`'s
//! registry-of-`HealthCheck` pattern but keyed by name instead of a fixed
//! enum.

use millbridge_errors::ConfigError;
use millbridge_schemas::{HealthReport, HealthStatus, SystemHealth};
use tracing::{debug, info};

use crate::MAX_COMPONENTS;

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    report: HealthReport,
    stale_timeout_ms: u32,
}

/// Aggregates per-component reports into a [`SystemHealth`] verdict.
///
/// Bounded to [`MAX_COMPONENTS`] entries (§4.2); registering past capacity
/// is a configuration error rather than a silent truncation.
#[derive(Debug, Default)]
pub struct HealthManager {
    slots: Vec<Slot>,
}

impl HealthManager {
    #[must_use]
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Registers a component under `name` with its initial report and
    /// stale budget. `required=true ∧ expected=false` is rejected as a
    /// configuration error per §3's invariant.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        report: HealthReport,
        stale_timeout_ms: u32,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if report.required && !report.expected {
            return Err(ConfigError::RequiredWithoutExpected(name));
        }
        if self.slots.len() >= MAX_COMPONENTS {
            return Err(ConfigError::CapacityExceeded(MAX_COMPONENTS));
        }
        self.slots.push(Slot { name, report, stale_timeout_ms });
        Ok(())
    }

    /// Pushes a fresh value-copy of `report` for the named component,
    /// overwriting whatever was previously recorded. Called once per
    /// component per loop pass, before [`HealthManager::evaluate`].
    pub fn update(&mut self, name: &str, report: HealthReport) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.name == name) {
            if slot.report.status != report.status {
                debug!(component = %name, from = ?slot.report.status, to = ?report.status, reason = %report.reason, "component status changed");
            }
            slot.report = report;
        }
    }

    /// Looks up the last report recorded for `name`, ignoring staleness.
    #[must_use]
    pub fn report_of(&self, name: &str) -> Option<&HealthReport> {
        self.slots.iter().find(|s| s.name == name).map(|s| &s.report)
    }

    /// Runs the §4.2 evaluation algorithm and returns the new verdict.
    #[must_use]
    pub fn evaluate(&self, now_ms: u64) -> SystemHealth {
        let mut warn_count = 0u16;
        let mut crit_count = 0u16;

        for slot in &self.slots {
            if !slot.report.expected {
                continue;
            }
            let effective_status = if slot.report.status == HealthStatus::Ok
                && slot.stale_timeout_ms > 0
                && slot.report.last_ok_ms > 0
                && now_ms.saturating_sub(slot.report.last_ok_ms) > u64::from(slot.stale_timeout_ms)
            {
                HealthStatus::Stale
            } else {
                slot.report.status
            };

            let bad = matches!(
                effective_status,
                HealthStatus::Missing | HealthStatus::Error | HealthStatus::Stale
            );
            if !bad {
                continue;
            }
            if slot.report.required {
                crit_count += 1;
            } else {
                warn_count += 1;
            }
        }

        if crit_count > 0 {
            info!(crit_count, warn_count, "system health verdict: ERROR");
            SystemHealth {
                system_state: HealthStatus::Error,
                degraded: true,
                run_allowed: false,
                outputs_allowed: false,
                warn_count,
                crit_count,
            }
        } else if warn_count > 0 {
            info!(warn_count, "system health verdict: DEGRADED");
            SystemHealth {
                system_state: HealthStatus::Degraded,
                degraded: true,
                run_allowed: true,
                outputs_allowed: true,
                warn_count,
                crit_count,
            }
        } else {
            SystemHealth {
                system_state: HealthStatus::Ok,
                degraded: false,
                run_allowed: true,
                outputs_allowed: true,
                warn_count: 0,
                crit_count: 0,
            }
        }
    }

    /// Iterates registered component names with their last-recorded report,
    /// for the gateway's per-component `health/<name>/state` publications.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HealthReport)> {
        self.slots.iter().map(|s| (s.name.as_str(), &s.report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use millbridge_schemas::Severity;

    fn ok_report(required: bool, last_ok_ms: u64) -> HealthReport {
        HealthReport {
            status: HealthStatus::Ok,
            severity: if required { Severity::Crit } else { Severity::Info },
            expected: true,
            required,
            reason: "ok".to_string(),
            since_ms: 0,
            last_ok_ms,
        }
    }

    #[test]
    fn all_ok_yields_system_ok() {
        let mut mgr = HealthManager::new();
        mgr.add("eth", ok_report(true, 100), 0).unwrap();
        mgr.add("din", ok_report(true, 100), 1_000).unwrap();
        let health = mgr.evaluate(500);
        assert_eq!(health.system_state, HealthStatus::Ok);
        assert!(health.run_allowed);
        assert!(health.outputs_allowed);
    }

    #[test]
    fn required_bad_blocks_run_and_outputs() {
        let mut mgr = HealthManager::new();
        let mut bad = ok_report(true, 0);
        bad.status = HealthStatus::Missing;
        mgr.add("pid_heat1", bad, 0).unwrap();
        let health = mgr.evaluate(100);
        assert_eq!(health.system_state, HealthStatus::Error);
        assert!(!health.run_allowed);
        assert!(!health.outputs_allowed);
        assert_eq!(health.crit_count, 1);
    }

    #[test]
    fn optional_bad_degrades_but_allows_run() {
        let mut mgr = HealthManager::new();
        let mut bad = ok_report(false, 0);
        bad.status = HealthStatus::Error;
        mgr.add("accel", bad, 0).unwrap();
        let health = mgr.evaluate(100);
        assert_eq!(health.system_state, HealthStatus::Degraded);
        assert!(health.run_allowed);
        assert!(health.outputs_allowed);
        assert_eq!(health.warn_count, 1);
    }

    #[test]
    fn stale_ok_component_is_treated_as_bad_without_mutation() {
        let mut mgr = HealthManager::new();
        mgr.add("pid_heat1", ok_report(true, 100), 500).unwrap();
        let health = mgr.evaluate(700);
        assert_eq!(health.system_state, HealthStatus::Error);
        // The underlying report is untouched; only aggregation saw STALE.
        assert_eq!(mgr.report_of("pid_heat1").unwrap().status, HealthStatus::Ok);
    }

    #[test]
    fn unexpected_component_is_ignored() {
        let mut mgr = HealthManager::new();
        let mut unexpected = ok_report(false, 0);
        unexpected.expected = false;
        unexpected.status = HealthStatus::Error;
        mgr.add("accel", unexpected, 0).unwrap();
        let health = mgr.evaluate(100);
        assert_eq!(health.system_state, HealthStatus::Ok);
    }

    #[test]
    fn required_without_expected_is_rejected() {
        let mut mgr = HealthManager::new();
        let mut bad_cfg = ok_report(true, 0);
        bad_cfg.expected = false;
        let err = mgr.add("ghost", bad_cfg, 0).unwrap_err();
        assert!(matches!(err, ConfigError::RequiredWithoutExpected(_)));
    }

    #[test]
    fn capacity_is_enforced() {
        let mut mgr = HealthManager::new();
        for i in 0..MAX_COMPONENTS {
            mgr.add(format!("c{i}"), ok_report(false, 0), 0).unwrap();
        }
        let err = mgr.add("overflow", ok_report(false, 0), 0).unwrap_err();
        assert!(matches!(err, ConfigError::CapacityExceeded(MAX_COMPONENTS)));
    }
}
