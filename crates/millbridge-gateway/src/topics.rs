//! Topic naming (§4.5). Every topic is rooted at `{machine_id}/{node_id}`
//! so one broker can host several machines, each with several bridge
//! nodes, side by side.

/// The two command subtopics the gateway subscribes to on link-up.
pub const RELAY_CMD_SUFFIX: &str = "io/cmd/event";
pub const RUN_CMD_SUFFIX: &str = "run/cmd";

/// Builds the full topic string `"{machine_id}/{node_id}/{suffix}"` for a
/// given node.
pub struct Topics {
    machine_id: String,
    node_id: String,
}

impl Topics {
    #[must_use]
    pub fn new(machine_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self { machine_id: machine_id.into(), node_id: node_id.into() }
    }

    #[must_use]
    pub fn full(&self, suffix: &str) -> String {
        format!("{}/{}/{}", self.machine_id, self.node_id, suffix)
    }

    #[must_use]
    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    #[must_use]
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    #[must_use]
    pub fn relay_cmd(&self) -> String {
        self.full(RELAY_CMD_SUFFIX)
    }

    #[must_use]
    pub fn run_cmd(&self) -> String {
        self.full(RUN_CMD_SUFFIX)
    }

    #[must_use]
    pub fn heartbeat(&self) -> String {
        self.full("sys/heartbeat")
    }

    #[must_use]
    pub fn sys_health(&self) -> String {
        self.full("sys/health")
    }

    #[must_use]
    pub fn health_state(&self, component: &str) -> String {
        self.full(&format!("health/{component}/state"))
    }

    #[must_use]
    pub fn pid_state(&self, name: &str) -> String {
        self.full(&format!("pid/{name}/state"))
    }

    #[must_use]
    pub fn pid_params(&self, name: &str) -> String {
        self.full(&format!("pid/{name}/params"))
    }

    #[must_use]
    pub fn din_state(&self) -> String {
        self.full("io/din/state")
    }

    #[must_use]
    pub fn din_event(&self) -> String {
        self.full("io/din/event")
    }

    #[must_use]
    pub fn dout_state(&self) -> String {
        self.full("io/dout/state")
    }

    #[must_use]
    pub fn lwt(&self) -> String {
        self.full("status/lwt")
    }

    #[must_use]
    pub fn boot(&self) -> String {
        self.full("status/boot")
    }

    /// Matches an inbound topic against the two recognized command
    /// subtopics, stripping the node prefix.
    #[must_use]
    pub fn classify(&self, topic: &str) -> Option<CommandTopic> {
        if topic == self.relay_cmd() {
            Some(CommandTopic::Relay)
        } else if topic == self.run_cmd() {
            Some(CommandTopic::Run)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandTopic {
    Relay,
    Run,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_are_rooted_at_machine_and_node_id() {
        let t = Topics::new("cryomill-01", "node-a");
        assert_eq!(t.relay_cmd(), "cryomill-01/node-a/io/cmd/event");
        assert_eq!(t.run_cmd(), "cryomill-01/node-a/run/cmd");
        assert_eq!(t.pid_state("pid_heat1"), "cryomill-01/node-a/pid/pid_heat1/state");
        assert_eq!(t.lwt(), "cryomill-01/node-a/status/lwt");
    }

    #[test]
    fn classify_matches_only_the_two_command_topics() {
        let t = Topics::new("cryomill-01", "node-a");
        assert_eq!(t.classify("cryomill-01/node-a/io/cmd/event"), Some(CommandTopic::Relay));
        assert_eq!(t.classify("cryomill-01/node-a/run/cmd"), Some(CommandTopic::Run));
        assert_eq!(t.classify("cryomill-01/node-a/sys/health"), None);
    }
}
