use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy)]
pub struct Tag {
    pub key: &'static str,
    pub metric: &'static str,
    pub unit: &'static str,
}

pub const VIBRATION: Tag = Tag {
    key: "vibration",
    metric: "motor_vibration_mm_per_second",
    unit: "mm/s",
};

pub const TEMPERATURE: Tag = Tag {
    key: "temperature",
    metric: "motor_temperature_celsius",
    unit: "°C",
};

pub const CURRENT: Tag = Tag {
    key: "courant",
    metric: "motor_current_amperes",
    unit: "A",
};

pub const SPEED: Tag = Tag {
    key: "vitesse",
    metric: "motor_speed_rpm",
    unit: "rpm",
};

pub const REGIME: Tag = Tag {
    key: "etat_moteur",
    metric: "motor_regime_faulted",
    unit: "",
};

pub const FAULT: Tag = Tag {
    key: "anomalie",
    metric: "motor_fault_onsets_total",
    unit: "",
};

/// One of the four sensor channels carried by every sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Vibration,
    Temperature,
    Current,
    Speed,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Vibration,
        Channel::Temperature,
        Channel::Current,
        Channel::Speed,
    ];

    pub const fn tag(self) -> Tag {
        match self {
            Channel::Vibration => VIBRATION,
            Channel::Temperature => TEMPERATURE,
            Channel::Current => CURRENT,
            Channel::Speed => SPEED,
        }
    }

    pub const fn key(self) -> &'static str {
        self.tag().key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_keys_match_payload_fields() {
        let keys: Vec<&str> = Channel::ALL.iter().map(|c| c.key()).collect();
        assert_eq!(keys, ["vibration", "temperature", "courant", "vitesse"]);
    }
}
