//! Health status contract shared by every managed component and the
//! health manager that aggregates them.

use serde::{Deserialize, Serialize};

/// Per-component health status.
///
/// Serializes in `SCREAMING_SNAKE_CASE` to match the wire tokens named in
/// §3 (`UNCONFIGURED`, `MISSING`, `OK`, `DEGRADED`, `STALE`, `ERROR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    /// The component is not part of this deployment.
    Unconfigured,
    /// The component is expected but has not yet produced a successful probe.
    Missing,
    /// The component is healthy and fresh.
    Ok,
    /// The component degraded after a prior success.
    Degraded,
    /// The component's last success is older than its stale budget.
    ///
    /// This variant is only ever assigned by the health manager during
    /// aggregation (§4.2 step 2); components themselves never set it.
    Stale,
    /// The component has failed in a way that requires operator attention.
    Error,
}

/// Severity of a component's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warn,
    Crit,
}

/// A component's self-reported health snapshot.
///
/// `reason` is a short, stable, machine-readable token (see §7 for the
/// recognized set) rather than a human sentence, so the bus gateway can
/// forward it verbatim without translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub severity: Severity,
    /// Is this component supposed to exist in this deployment?
    pub expected: bool,
    /// Must it be OK for the machine to be allowed to run?
    pub required: bool,
    pub reason: String,
    /// Monotonic milliseconds when the current status began.
    pub since_ms: u64,
    /// Monotonic milliseconds of the last successful refresh (0 = never).
    pub last_ok_ms: u64,
}

impl HealthReport {
    /// The initial report for a component at `configure` time (§4.1).
    #[must_use]
    pub fn initial(expected: bool, required: bool, since_ms: u64) -> Self {
        let status = if expected {
            HealthStatus::Missing
        } else {
            HealthStatus::Unconfigured
        };
        let severity = if required { Severity::Crit } else { Severity::Info };
        let reason = if expected { "not_probed" } else { "unconfigured" };
        Self {
            status,
            severity,
            expected,
            required,
            reason: reason.to_string(),
            since_ms,
            last_ok_ms: 0,
        }
    }
}

/// Whole-system health verdict recomputed every evaluation (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemHealth {
    pub system_state: HealthStatus,
    pub degraded: bool,
    pub run_allowed: bool,
    pub outputs_allowed: bool,
    pub warn_count: u16,
    pub crit_count: u16,
}

impl Default for SystemHealth {
    fn default() -> Self {
        Self {
            system_state: HealthStatus::Ok,
            degraded: false,
            run_allowed: true,
            outputs_allowed: true,
            warn_count: 0,
            crit_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_report_expected_required() {
        let r = HealthReport::initial(true, true, 10);
        assert_eq!(r.status, HealthStatus::Missing);
        assert_eq!(r.severity, Severity::Crit);
        assert_eq!(r.reason, "not_probed");
        assert_eq!(r.since_ms, 10);
        assert_eq!(r.last_ok_ms, 0);
    }

    #[test]
    fn initial_report_unexpected() {
        let r = HealthReport::initial(false, false, 0);
        assert_eq!(r.status, HealthStatus::Unconfigured);
        assert_eq!(r.severity, Severity::Info);
        assert_eq!(r.reason, "unconfigured");
    }

    #[test]
    fn status_and_severity_serialize_to_wire_tokens() {
        assert_eq!(serde_json::to_string(&HealthStatus::Ok).unwrap(), "\"OK\"");
        assert_eq!(serde_json::to_string(&HealthStatus::Unconfigured).unwrap(), "\"UNCONFIGURED\"");
        assert_eq!(serde_json::to_string(&Severity::Crit).unwrap(), "\"CRIT\"");
    }
}
