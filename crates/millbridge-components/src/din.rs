//! Digital-input bank health component. Wraps the HAL's debounced read and
//! exposes the latest [`DinSnapshot`] for the run-state supervisor to
//! consume; interlock policy itself lives in `millbridge-supervisor`, not
//! here — this component only reports whether the input bank itself is
//! responding.

use millbridge_health::HealthComponent;
use millbridge_hal::DigitalInputs;
use millbridge_schemas::{DinSnapshot, HealthReport, HealthStatus, Severity};

pub struct DinComponent<D: DigitalInputs> {
    hal: D,
    report: HealthReport,
    snapshot: DinSnapshot,
}

impl<D: DigitalInputs> DinComponent<D> {
    #[must_use]
    pub fn new(hal: D) -> Self {
        Self { hal, report: HealthReport::initial(false, false, 0), snapshot: DinSnapshot::default() }
    }

    #[must_use]
    pub fn snapshot(&self) -> DinSnapshot {
        self.snapshot
    }
}

impl<D: DigitalInputs> HealthComponent for DinComponent<D> {
    fn configure(&mut self, expected: bool, required: bool, now_ms: u64) {
        self.report = HealthReport::initial(expected, required, now_ms);
        if expected {
            self.hal.begin();
        }
    }

    fn probe(&mut self, now_ms: u64) -> bool {
        if !self.report.expected {
            return false;
        }
        self.snapshot = self.hal.read_all();
        self.report.status = HealthStatus::Ok;
        self.report.severity = Severity::Info;
        self.report.reason = "ok".to_string();
        self.report.since_ms = now_ms;
        self.report.last_ok_ms = now_ms;
        true
    }

    fn tick(&mut self, now_ms: u64) -> bool {
        if !self.report.expected {
            return false;
        }
        self.snapshot = self.hal.read_all();
        if self.report.status != HealthStatus::Ok {
            self.report.since_ms = now_ms;
        }
        self.report.status = HealthStatus::Ok;
        self.report.severity = Severity::Info;
        self.report.reason = "ok".to_string();
        self.report.last_ok_ms = now_ms;
        true
    }

    fn stale_timeout_ms(&self) -> u32 {
        1_000
    }

    fn report(&self) -> HealthReport {
        self.report.clone()
    }
}
