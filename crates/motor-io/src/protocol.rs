use motor_core::SensorSample;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOPIC: &str = "sensors/motor";

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    pub const fn v1() -> Self {
        Self { major: 1, minor: 0 }
    }

    pub fn is_supported(&self) -> bool {
        self.major == 1
    }
}

/// One sample as published on a topic.
#[derive(Debug, Serialize)]
pub struct SampleMsg<'a> {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub protocol_version: ProtocolVersion,
    pub topic: &'a str,
    pub sequence: u64,
    #[serde(flatten)]
    pub sample: &'a SensorSample,
}

impl<'a> SampleMsg<'a> {
    pub fn new(topic: &'a str, sequence: u64, sample: &'a SensorSample) -> Self {
        Self {
            msg_type: "sample",
            protocol_version: ProtocolVersion::v1(),
            topic,
            sequence,
            sample,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HelloMsg {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub protocol_version: ProtocolVersion,
    #[serde(default)]
    pub client_id: Option<String>,
    /// Topic filters to subscribe to as part of the handshake.
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeMsg {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub topic: String,
}

#[derive(Debug)]
pub enum IncomingMessage {
    Hello(HelloMsg),
    Subscribe(SubscribeMsg),
}

impl IncomingMessage {
    pub fn parse(line: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(line).ok()?;
        let msg_type = value.get("type")?.as_str()?;
        match msg_type {
            "hello" => serde_json::from_value(value)
                .ok()
                .map(IncomingMessage::Hello),
            "subscribe" => serde_json::from_value(value)
                .ok()
                .map(IncomingMessage::Subscribe),
            _ => None,
        }
    }
}

/// MQTT-style topic matching: `+` matches one level, a trailing `#` matches
/// the rest of the topic.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');
    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return filter_levels.next().is_none(),
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}
