//! Health Component contract (§4.1) and Health Manager aggregation (§4.2).
//!
//! Grounded in `openracing-watchdog::health`'s `HealthCheck`/`SystemComponent`
//! split, generalized from that crate's fixed six-variant device enum to a
//! bounded, runtime-registered component table keyed by name, since the
//! bridge's component set (eth, din, relay, three-to-five PIDs) is a
//! deployment-time configuration rather than a compile-time constant.

pub mod manager;

pub use manager::HealthManager;

use millbridge_schemas::HealthReport;

/// Maximum number of components the [`HealthManager`] can hold (§4.2).
pub const MAX_COMPONENTS: usize = 16;

/// The Health Component contract every managed device implements (§4.1).
///
/// `configure` is called once at startup; `probe` is a one-shot detection
/// attempt the wiring layer drives before the main loop starts; `tick` is
/// called on the component's own schedule thereafter. A component never
/// returns a process-level `Result` for an operational fault — faults are
/// surfaced only through `report()`.
pub trait HealthComponent {
    /// Sets `expected`/`required` and the component's initial report.
    /// Called exactly once, before `probe` or `tick`.
    fn configure(&mut self, expected: bool, required: bool, now_ms: u64);

    /// One-shot detection attempt. On success the component transitions to
    /// `OK` with `last_ok_ms := now_ms`. On failure it remains `MISSING`
    /// with `since_ms` held sticky. Returns whether the probe succeeded.
    fn probe(&mut self, now_ms: u64) -> bool;

    /// Refreshes data or issues the component's next asynchronous step on
    /// its own schedule. Returns `true` iff this call produced fresh data.
    fn tick(&mut self, now_ms: u64) -> bool;

    /// Per-component stale budget in milliseconds; `0` disables the
    /// centralized stale check for this component.
    fn stale_timeout_ms(&self) -> u32;

    /// An internally consistent snapshot of the component's current report.
    fn report(&self) -> HealthReport;
}

#[cfg(test)]
mod tests {
    use super::*;
    use millbridge_schemas::{HealthStatus, Severity};

    /// A minimal component used to exercise the trait's default transition
    /// policy (§4.1) without pulling in a real HAL dependency.
    struct Dummy {
        report: HealthReport,
        fail_next: bool,
    }

    impl Dummy {
        fn new() -> Self {
            Self { report: HealthReport::initial(false, false, 0), fail_next: false }
        }
    }

    impl HealthComponent for Dummy {
        fn configure(&mut self, expected: bool, required: bool, now_ms: u64) {
            self.report = HealthReport::initial(expected, required, now_ms);
        }

        fn probe(&mut self, now_ms: u64) -> bool {
            if self.fail_next {
                return false;
            }
            self.report.status = HealthStatus::Ok;
            self.report.severity = if self.report.required { Severity::Crit } else { Severity::Info };
            self.report.reason = "ok".to_string();
            self.report.since_ms = now_ms;
            self.report.last_ok_ms = now_ms;
            true
        }

        fn tick(&mut self, now_ms: u64) -> bool {
            self.probe(now_ms)
        }

        fn stale_timeout_ms(&self) -> u32 {
            1_000
        }

        fn report(&self) -> HealthReport {
            self.report.clone()
        }
    }

    #[test]
    fn configure_then_probe_transitions_to_ok() {
        let mut d = Dummy::new();
        d.configure(true, true, 0);
        assert_eq!(d.report().status, HealthStatus::Missing);
        assert!(d.probe(100));
        assert_eq!(d.report().status, HealthStatus::Ok);
        assert_eq!(d.report().last_ok_ms, 100);
    }

    #[test]
    fn failed_probe_keeps_missing_sticky_since() {
        let mut d = Dummy::new();
        d.configure(true, true, 0);
        d.fail_next = true;
        assert!(!d.probe(100));
        assert_eq!(d.report().status, HealthStatus::Missing);
        assert_eq!(d.report().since_ms, 0);
    }
}
