use crate::fault::{FaultKind, Regime};
use crate::tags::Channel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last emitted value of every channel, carried across ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelState {
    pub vibration: f64,
    pub temperature: f64,
    pub current: f64,
    pub speed: f64,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            vibration: 0.2,
            temperature: 55.0,
            current: 8.0,
            speed: 1480.0,
        }
    }
}

impl ChannelState {
    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Vibration => self.vibration,
            Channel::Temperature => self.temperature,
            Channel::Current => self.current,
            Channel::Speed => self.speed,
        }
    }

    pub fn set(&mut self, channel: Channel, value: f64) {
        match channel {
            Channel::Vibration => self.vibration = value,
            Channel::Temperature => self.temperature = value,
            Channel::Current => self.current = value,
            Channel::Speed => self.speed = value,
        }
    }
}

/// One multi-channel reading. Field names follow the published payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "etat_moteur")]
    pub regime: Regime,
    #[serde(rename = "anomalie")]
    pub fault: Option<FaultKind>,
    pub vibration: f64,
    pub temperature: f64,
    #[serde(rename = "courant")]
    pub current: f64,
    #[serde(rename = "vitesse")]
    pub speed: f64,
}

impl SensorSample {
    pub fn value(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Vibration => self.vibration,
            Channel::Temperature => self.temperature,
            Channel::Current => self.current,
            Channel::Speed => self.speed,
        }
    }
}
