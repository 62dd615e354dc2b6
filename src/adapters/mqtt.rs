//! MQTT link adapter.
//!
//! [`MqttConnector`] opens one `EspMqttClient` session per
//! [`LinkConnector::open`] call.  The client's event callback runs in the
//! ESP-MQTT task; it records the connection flag and queues complete
//! inbound messages in a bounded inbox that [`LinkSession::try_recv`]
//! drains without blocking.
//!
//! ```text
//!   ESP-MQTT task ──callback──▶ connected flag + inbox ──try_recv──▶ LinkManager
//!   LinkManager   ──publish──▶  EspMqttClient
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::ports::InboundMessage;

/// Inbound commands buffered between two polls.  The loop takes one per
/// iteration, so a burst beyond this is dropped.
pub const INBOX_CAP: usize = 4;

pub type Inbox = Channel<CriticalSectionRawMutex, InboundMessage, INBOX_CAP>;

/// Queue one received message.  Oversized or fragmented messages and a
/// full inbox drop the message with a warning.
pub fn deliver(inbox: &Inbox, topic: Option<&str>, data: &[u8], complete: bool) -> bool {
    if !complete {
        warn!("mqtt: dropping fragmented message ({} bytes)", data.len());
        return false;
    }
    let Some(topic) = topic else {
        warn!("mqtt: dropping message without topic");
        return false;
    };
    let Ok(msg) = InboundMessage::new(topic, data) else {
        warn!("mqtt: dropping oversized message on '{}' ({} bytes)", topic, data.len());
        return false;
    };
    if inbox.try_send(msg).is_err() {
        warn!("mqtt: inbox full, dropping message on '{}'", topic);
        return false;
    }
    true
}

#[cfg(target_os = "espidf")]
mod esp {
    use std::sync::Arc;
    use std::time::Duration;

    use core::sync::atomic::{AtomicBool, Ordering};

    use embassy_sync::channel::Channel;
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::mqtt::client::{
        Details, EspMqttClient, EventPayload, MqttClientConfiguration, QoS,
    };
    use log::{info, warn};

    use super::{deliver, Inbox};
    use crate::app::ports::{InboundMessage, LinkConnector, LinkSession, Publisher};
    use crate::config::{secrets, SystemConfig, TOPIC_CAP};
    use crate::error::LinkError;

    /// How often `open` checks for the broker's CONNACK.
    const CONNECT_POLL_MS: u32 = 50;

    fn non_empty(s: &str) -> Option<&str> {
        if s.is_empty() { None } else { Some(s) }
    }

    pub struct MqttConnector {
        url: &'static str,
        client_id: heapless::String<TOPIC_CAP>,
        keepalive_secs: u16,
        connect_timeout_ms: u32,
    }

    impl MqttConnector {
        pub fn new(config: &SystemConfig) -> Self {
            Self {
                url: secrets::MQTT_URL,
                client_id: config.client_id.clone(),
                keepalive_secs: config.keepalive_secs,
                connect_timeout_ms: config.link_connect_timeout_ms,
            }
        }
    }

    impl LinkConnector for MqttConnector {
        type Session = MqttSession;

        fn open(&mut self) -> Result<MqttSession, LinkError> {
            let connected = Arc::new(AtomicBool::new(false));
            let inbox: Arc<Inbox> = Arc::new(Channel::new());

            let conf = MqttClientConfiguration {
                client_id: Some(self.client_id.as_str()),
                username: non_empty(secrets::MQTT_USERNAME),
                password: non_empty(secrets::MQTT_PASSWORD),
                keep_alive_interval: Some(Duration::from_secs(u64::from(self.keepalive_secs))),
                ..Default::default()
            };

            let cb_connected = Arc::clone(&connected);
            let cb_inbox = Arc::clone(&inbox);
            let client = EspMqttClient::new_cb(self.url, &conf, move |event| {
                match event.payload() {
                    EventPayload::Connected(_) => cb_connected.store(true, Ordering::Release),
                    EventPayload::Disconnected => cb_connected.store(false, Ordering::Release),
                    EventPayload::Received { topic, data, details, .. } => {
                        deliver(&cb_inbox, topic, data, matches!(details, Details::Complete));
                    }
                    EventPayload::Error(e) => warn!("mqtt: client error: {:?}", e),
                    _ => {}
                }
            })
            .map_err(|e| {
                warn!("mqtt: client create failed: {}", e);
                LinkError::ConnectFailed
            })?;

            let mut waited_ms = 0;
            while !connected.load(Ordering::Acquire) {
                if waited_ms >= self.connect_timeout_ms {
                    return Err(LinkError::Timeout);
                }
                FreeRtos::delay_ms(CONNECT_POLL_MS);
                waited_ms += CONNECT_POLL_MS;
            }
            info!("mqtt: connected to {} as '{}'", self.url, self.client_id);
            Ok(MqttSession { client, connected, inbox })
        }
    }

    /// One live broker session.  Dropping it destroys the client.
    pub struct MqttSession {
        client: EspMqttClient<'static>,
        connected: Arc<AtomicBool>,
        inbox: Arc<Inbox>,
    }

    impl Publisher for MqttSession {
        fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), LinkError> {
            self.client
                .publish(topic, QoS::AtMostOnce, false, payload)
                .map(|_| ())
                .map_err(|e| {
                    warn!("mqtt: publish to '{}' failed: {}", topic, e);
                    LinkError::PublishFailed
                })
        }
    }

    impl LinkSession for MqttSession {
        fn subscribe(&mut self, topic: &str) -> Result<(), LinkError> {
            self.client
                .subscribe(topic, QoS::AtMostOnce)
                .map(|_| ())
                .map_err(|e| {
                    warn!("mqtt: subscribe to '{}' failed: {}", topic, e);
                    LinkError::SubscribeFailed
                })
        }

        fn try_recv(&mut self) -> Result<Option<InboundMessage>, LinkError> {
            if let Ok(msg) = self.inbox.try_receive() {
                return Ok(Some(msg));
            }
            if self.connected.load(Ordering::Acquire) {
                Ok(None)
            } else {
                Err(LinkError::ConnectionLost)
            }
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::{MqttConnector, MqttSession};
