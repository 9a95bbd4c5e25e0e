//! Thin async wiring around `rumqttc` (§4.5, §5).
//!
//! This module intentionally does as little as possible: it owns the MQTT
//! connection, subscribes to the two command subtopics on link-up, and
//! turns `BusGateway::publish_*` calls into `AsyncClient::publish` calls.
//! Every decision about what a payload looks like or whether a command is
//! allowed lives in [`crate::publish`] and [`crate::command`], which take
//! no network dependency and are exercised directly by unit tests. Shaped
//! after `service::ipc_simple::IpcServer`: a config struct, a thin
//! constructor, and `tracing` at the connect/publish/error boundaries
//! rather than on every message.

use std::time::Duration;

use anyhow::{Context, Result};
use rumqttc::{AsyncClient, Event, EventLoop, LastWill, MqttOptions, Packet, QoS};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::topics::{CommandTopic, Topics};

/// Connection parameters for the bus gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub machine_id: String,
    pub node_id: String,
    pub broker_host: String,
    pub broker_port: u16,
    pub keep_alive: Duration,
}

/// Owns the MQTT client/event loop and the node's topic namespace.
pub struct BusGateway {
    client: AsyncClient,
    eventloop: EventLoop,
    topics: Topics,
}

impl BusGateway {
    /// Connects with a last-will of `{"state":"offline"}` on `status/lwt`
    /// (§4.5), matching the retained-offline/retained-online convention of
    /// a supervisory bridge that may restart without a clean disconnect.
    #[must_use]
    pub fn new(config: &GatewayConfig) -> Self {
        let topics = Topics::new(config.machine_id.clone(), config.node_id.clone());
        let client_id = format!("millbridge-{}-{}", config.machine_id, config.node_id);

        let mut opts = MqttOptions::new(client_id, config.broker_host.clone(), config.broker_port);
        opts.set_keep_alive(config.keep_alive);
        opts.set_last_will(LastWill::new(
            topics.lwt(),
            br#"{"state":"offline"}"#.to_vec(),
            QoS::AtLeastOnce,
            true,
        ));

        let (client, eventloop) = AsyncClient::new(opts, 64);
        Self { client, eventloop, topics }
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    /// Subscribes to the two command subtopics and announces presence.
    /// Called once after the first successful connect event.
    pub async fn announce_online(&self) -> Result<()> {
        self.client
            .subscribe(self.topics.relay_cmd(), QoS::AtLeastOnce)
            .await
            .context("subscribing to relay command topic")?;
        self.client
            .subscribe(self.topics.run_cmd(), QoS::AtLeastOnce)
            .await
            .context("subscribing to run command topic")?;

        self.client
            .publish(self.topics.full("status/online"), QoS::AtLeastOnce, true, br#"{"state":"online"}"#.to_vec())
            .await
            .context("publishing online status")?;
        self.client
            .publish(self.topics.boot(), QoS::AtLeastOnce, true, br#"{"event":"boot"}"#.to_vec())
            .await
            .context("publishing boot status")?;
        info!(node_id = %self.topics.node_id(), "bus gateway online");
        Ok(())
    }

    /// Publishes any serializable payload on a fully-qualified topic.
    pub async fn publish(&self, topic: &str, retain: bool, payload: &impl Serialize) -> Result<()> {
        let body = serde_json::to_vec(payload).context("serializing publish payload")?;
        self.client
            .publish(topic, QoS::AtMostOnce, retain, body)
            .await
            .with_context(|| format!("publishing to {topic}"))
    }

    /// Publishes a command ack on the matching ack suffix of a command
    /// topic (`{cmd_topic}/ack`).
    pub async fn publish_ack(&self, cmd_topic: &str, payload: &impl Serialize) -> Result<()> {
        let ack_topic = format!("{cmd_topic}/ack");
        self.publish(&ack_topic, false, payload).await
    }

    /// Polls the next broker event, classifying inbound publishes against
    /// the two recognized command subtopics. Returns `Ok(None)` for events
    /// the gateway doesn't act on (pings, acks, disconnects).
    pub async fn poll(&mut self) -> Result<Option<(CommandTopic, Vec<u8>)>> {
        match self.eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                debug!(topic = %publish.topic, "inbound publish");
                Ok(self.topics.classify(&publish.topic).map(|kind| (kind, publish.payload.to_vec())))
            }
            Ok(_) => Ok(None),
            Err(err) => {
                warn!(error = %err, "mqtt event loop error");
                Err(err).context("polling mqtt event loop")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_drives_a_distinct_topic_namespace_per_node() {
        let gw = BusGateway::new(&GatewayConfig {
            machine_id: "cryomill-01".to_string(),
            node_id: "node-a".to_string(),
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            keep_alive: Duration::from_secs(5),
        });
        assert_eq!(gw.topics().relay_cmd(), "cryomill-01/node-a/io/cmd/event");
    }
}
