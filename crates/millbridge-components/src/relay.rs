//! Relay/output bank health component. Owns the cached output mask: the
//! bus gateway's command handler writes through `write`, and the
//! periodic `tick` re-reads the HAL to confirm the cache still matches
//! what the hardware is actually driving (§5's shared-resource note).

use millbridge_errors::ComponentFault;
use millbridge_health::HealthComponent;
use millbridge_hal::RelayBank;
use millbridge_schemas::{HealthReport, HealthStatus, Severity};

pub struct RelayComponent<R: RelayBank> {
    hal: R,
    report: HealthReport,
    cache: u8,
}

impl<R: RelayBank> RelayComponent<R> {
    #[must_use]
    pub fn new(hal: R) -> Self {
        Self { hal, report: HealthReport::initial(false, false, 0), cache: 0 }
    }

    #[must_use]
    pub fn cache(&self) -> u8 {
        self.cache
    }

    /// Writes an absolute output mask through the HAL (§4.5 relay command
    /// policy). Updates the cache on success and the health report on
    /// failure.
    pub fn write(&mut self, mask: u8, now_ms: u64) -> Result<u8, ComponentFault> {
        if self.hal.write_mask(mask) {
            self.cache = mask;
            self.mark_ok(now_ms);
            Ok(self.cache)
        } else {
            self.mark_fault(ComponentFault::WriteFail, now_ms);
            Err(ComponentFault::WriteFail)
        }
    }

    fn mark_ok(&mut self, now_ms: u64) {
        if self.report.status != HealthStatus::Ok {
            self.report.since_ms = now_ms;
        }
        self.report.status = HealthStatus::Ok;
        self.report.severity = Severity::Info;
        self.report.reason = "ok".to_string();
        self.report.last_ok_ms = now_ms;
    }

    fn mark_fault(&mut self, fault: ComponentFault, now_ms: u64) {
        let was_ok = self.report.status == HealthStatus::Ok;
        self.report.status = if was_ok { HealthStatus::Degraded } else { HealthStatus::Missing };
        self.report.severity = if self.report.required { Severity::Crit } else { Severity::Warn };
        self.report.reason = fault.token().to_string();
        self.report.since_ms = now_ms;
    }
}

impl<R: RelayBank> HealthComponent for RelayComponent<R> {
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
        match self.hal.read_mask() {
            Some(mask) => {
                self.cache = mask;
                self.mark_ok(now_ms);
                true
            }
            None => false,
        }
    }

    fn tick(&mut self, now_ms: u64) -> bool {
        if !self.report.expected {
            return false;
        }
        match self.hal.read_mask() {
            Some(mask) => {
                self.cache = mask;
                self.mark_ok(now_ms);
                true
            }
            None => {
                self.mark_fault(ComponentFault::ReadFail, now_ms);
                false
            }
        }
    }

    fn stale_timeout_ms(&self) -> u32 {
        1_000
    }

    fn report(&self) -> HealthReport {
        self.report.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use millbridge_hal::fakes::FakeRelay;

    #[test]
    fn write_then_read_round_trips_through_cache() {
        let mut relay = RelayComponent::new(FakeRelay::new());
        relay.configure(true, true, 0);
        assert_eq!(relay.write(0b0101, 10).unwrap(), 0b0101);
        assert_eq!(relay.cache(), 0b0101);
        assert_eq!(relay.report().status, HealthStatus::Ok);
    }

    #[test]
    fn write_failure_degrades_component() {
        let mut relay = RelayComponent::new(FakeRelay::new());
        relay.configure(true, true, 0);
        relay.write(0b0001, 0).unwrap();
        relay.hal.fail_writes = true;
        let err = relay.write(0b0011, 10).unwrap_err();
        assert_eq!(err, ComponentFault::WriteFail);
        assert_eq!(relay.report().status, HealthStatus::Degraded);
        assert_eq!(relay.report().reason, "write_fail");
    }

    #[test]
    fn tick_read_failure_transitions_ok_to_degraded() {
        let mut relay = RelayComponent::new(FakeRelay::new());
        relay.configure(true, true, 0);
        relay.probe(0);
        relay.hal.fail_reads = true;
        assert!(!relay.tick(10));
        assert_eq!(relay.report().status, HealthStatus::Degraded);
        assert_eq!(relay.report().reason, "read_fail");
    }
}
