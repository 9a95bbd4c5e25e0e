//! Ethernet link health component.
//!
//! Event-driven: `stale_timeout_ms() == 0` disables the centralized stale
//! check (§4.1), since link-up/link-down is observed directly rather than
//! inferred from a refresh cadence.

use millbridge_errors::ComponentFault;
use millbridge_health::HealthComponent;
use millbridge_hal::NetworkLink;
use millbridge_schemas::{HealthReport, Severity};

pub struct EthComponent<L: NetworkLink> {
    link: L,
    report: HealthReport,
}

impl<L: NetworkLink> EthComponent<L> {
    #[must_use]
    pub fn new(link: L) -> Self {
        Self { link, report: HealthReport::initial(false, false, 0) }
    }

    #[must_use]
    pub fn local_ip(&self) -> Option<[u8; 4]> {
        self.link.local_ip()
    }
}

impl<L: NetworkLink> HealthComponent for EthComponent<L> {
    fn configure(&mut self, expected: bool, required: bool, now_ms: u64) {
        self.report = HealthReport::initial(expected, required, now_ms);
    }

    fn probe(&mut self, now_ms: u64) -> bool {
        if !self.report.expected {
            return false;
        }
        let connected = self.link.connected();
        if connected {
            self.report.status = millbridge_schemas::HealthStatus::Ok;
            self.report.severity = Severity::Info;
            self.report.reason = ComponentFault::Up.token().to_string();
            self.report.since_ms = now_ms;
            self.report.last_ok_ms = now_ms;
        }
        connected
    }

    fn tick(&mut self, now_ms: u64) -> bool {
        if !self.report.expected {
            return false;
        }
        let connected = self.link.connected();
        let was_ok = self.report.status == millbridge_schemas::HealthStatus::Ok;
        if connected {
            if !was_ok {
                self.report.since_ms = now_ms;
            }
            self.report.status = millbridge_schemas::HealthStatus::Ok;
            self.report.severity = Severity::Info;
            self.report.reason = ComponentFault::Up.token().to_string();
            self.report.last_ok_ms = now_ms;
        } else {
            if was_ok {
                self.report.since_ms = now_ms;
            }
            self.report.status = millbridge_schemas::HealthStatus::Missing;
            self.report.severity = if self.report.required { Severity::Crit } else { Severity::Warn };
            self.report.reason = ComponentFault::Down.token().to_string();
        }
        connected
    }

    fn stale_timeout_ms(&self) -> u32 {
        0
    }

    fn report(&self) -> HealthReport {
        self.report.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use millbridge_hal::fakes::FakeNetwork;
    use millbridge_schemas::HealthStatus;

    #[test]
    fn link_up_reports_ok() {
        let mut eth = EthComponent::new(FakeNetwork { connected: true, local_ip: Some([10, 0, 0, 5]) });
        eth.configure(true, true, 0);
        assert!(eth.probe(10));
        assert_eq!(eth.report().status, HealthStatus::Ok);
        assert_eq!(eth.report().reason, "up");
    }

    #[test]
    fn link_down_then_up_transitions_correctly() {
        let mut eth = EthComponent::new(FakeNetwork { connected: false, local_ip: None });
        eth.configure(true, true, 0);
        assert!(!eth.probe(10));
        assert_eq!(eth.report().status, HealthStatus::Missing);

        eth.tick(20);
        assert_eq!(eth.report().status, HealthStatus::Missing);
        assert_eq!(eth.report().reason, "down");

        eth.link.connected = true;
        eth.tick(30);
        assert_eq!(eth.report().status, HealthStatus::Ok);
        assert_eq!(eth.report().reason, "up");
        assert_eq!(eth.report().last_ok_ms, 30);
    }

    #[test]
    fn stale_timeout_is_disabled() {
        let eth = EthComponent::new(FakeNetwork { connected: true, local_ip: None });
        assert_eq!(eth.stale_timeout_ms(), 0);
    }
}
