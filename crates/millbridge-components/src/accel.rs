//! Optional accelerometer component. Not part of the machine's safety
//! chain — it never carries `required=true` in practice — but follows the
//! same Health Component contract as every other device so the manager
//! needs no special case for it.

use millbridge_errors::ComponentFault;
use millbridge_health::HealthComponent;
use millbridge_hal::AccelSensor;
use millbridge_schemas::{HealthReport, HealthStatus, Severity};

pub struct AccelComponent<A: AccelSensor> {
    hal: A,
    report: HealthReport,
    last_reading_g: f32,
}

impl<A: AccelSensor> AccelComponent<A> {
    #[must_use]
    pub fn new(hal: A) -> Self {
        Self { hal, report: HealthReport::initial(false, false, 0), last_reading_g: 0.0 }
    }

    #[must_use]
    pub fn last_reading_g(&self) -> f32 {
        self.last_reading_g
    }
}

impl<A: AccelSensor> HealthComponent for AccelComponent<A> {
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
        match self.hal.read_g() {
            Some(g) => {
                self.last_reading_g = g;
                self.report.status = HealthStatus::Ok;
                self.report.severity = Severity::Info;
                self.report.reason = "ok".to_string();
                self.report.since_ms = now_ms;
                self.report.last_ok_ms = now_ms;
                true
            }
            None => false,
        }
    }

    fn tick(&mut self, now_ms: u64) -> bool {
        if !self.report.expected {
            return false;
        }
        match self.hal.read_g() {
            Some(g) => {
                if self.report.status != HealthStatus::Ok {
                    self.report.since_ms = now_ms;
                }
                self.last_reading_g = g;
                self.report.status = HealthStatus::Ok;
                self.report.severity = Severity::Info;
                self.report.reason = "ok".to_string();
                self.report.last_ok_ms = now_ms;
                true
            }
            None => {
                let was_ok = self.report.status == HealthStatus::Ok;
                self.report.status = if was_ok { HealthStatus::Degraded } else { HealthStatus::Missing };
                self.report.severity = Severity::Warn;
                self.report.reason = ComponentFault::I2cReadFail.token().to_string();
                self.report.since_ms = now_ms;
                false
            }
        }
    }

    fn stale_timeout_ms(&self) -> u32 {
        2_000
    }

    fn report(&self) -> HealthReport {
        self.report.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use millbridge_hal::fakes::FakeAccel;

    #[test]
    fn missing_sensor_stays_uninitialized_until_probe_succeeds() {
        let mut accel = AccelComponent::new(FakeAccel { reading: None });
        accel.configure(true, false, 0);
        assert!(!accel.probe(10));
        assert_eq!(accel.report().status, HealthStatus::Missing);
    }

    #[test]
    fn successful_reading_updates_state() {
        let mut accel = AccelComponent::new(FakeAccel { reading: Some(0.02) });
        accel.configure(true, false, 0);
        assert!(accel.probe(10));
        assert!((accel.last_reading_g() - 0.02).abs() < f32::EPSILON);
    }
}
