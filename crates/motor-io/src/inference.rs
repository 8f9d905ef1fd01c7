//! Downstream inference boundary.
//!
//! Turns a published sample payload into the feature row an externally
//! trained classifier expects, and decodes the classifier's numeric class
//! code back into a `(regime, fault)` pair using the two lookup tables shipped
//! with the model artifact.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use motor_core::Channel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Column order of the feature row.
pub const FEATURE_COLUMNS: [&str; 8] = [
    "vibration",
    "temperature",
    "courant",
    "vitesse",
    "hour",
    "dayofweek",
    "month",
    "day_night",
];

/// Fault name reported when the fault sub-code has no table entry.
pub const NO_FAULT: &str = "aucune";
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Error, PartialEq)]
pub enum InferenceError {
    #[error("payload is not a JSON object: {0}")]
    MalformedPayload(String),
    #[error("missing or non-numeric field `{0}`")]
    MissingField(&'static str),
    #[error("unparseable timestamp `{0}`")]
    InvalidTimestamp(String),
    #[error("class code {0} has no usable entry in the label mapping")]
    UnknownClassCode(i64),
}

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("failed to read label mapping: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse label mapping: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Model inputs for one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceFeatures {
    pub vibration: f64,
    pub temperature: f64,
    pub current: f64,
    pub speed: f64,
    pub hour: u32,
    /// Monday = 0.
    pub dayofweek: u32,
    pub month: u32,
    /// 1 between 06:00 and 18:00, else 0.
    pub day_night: u32,
}

impl InferenceFeatures {
    pub fn new(channels: [f64; 4], timestamp: NaiveDateTime) -> Self {
        let [vibration, temperature, current, speed] = channels;
        let hour = timestamp.hour();
        Self {
            vibration,
            temperature,
            current,
            speed,
            hour,
            dayofweek: timestamp.weekday().num_days_from_monday(),
            month: timestamp.month(),
            day_night: u32::from((6..18).contains(&hour)),
        }
    }

    /// Extract features from a payload. A missing timestamp falls back to `now`.
    pub fn from_payload(
        payload: &serde_json::Value,
        now: NaiveDateTime,
    ) -> Result<(Self, Option<String>), InferenceError> {
        let object = payload
            .as_object()
            .ok_or_else(|| InferenceError::MalformedPayload(payload.to_string()))?;

        let mut channels = [0.0; 4];
        for (slot, channel) in channels.iter_mut().zip(Channel::ALL) {
            *slot = object
                .get(channel.key())
                .and_then(serde_json::Value::as_f64)
                .ok_or(InferenceError::MissingField(channel.key()))?;
        }

        let raw_timestamp = match object.get("timestamp") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => return Err(InferenceError::InvalidTimestamp(other.to_string())),
        };
        let timestamp = match &raw_timestamp {
            Some(raw) => parse_timestamp(raw)?,
            None => now,
        };

        Ok((Self::new(channels, timestamp), raw_timestamp))
    }

    pub fn to_row(&self) -> [f64; 8] {
        [
            self.vibration,
            self.temperature,
            self.current,
            self.speed,
            f64::from(self.hour),
            f64::from(self.dayofweek),
            f64::from(self.month),
            f64::from(self.day_night),
        ]
    }
}

/// Parse ISO-8601 timestamps with or without an offset.
///
/// Calendar features use the wall-clock time written in the timestamp, so an
/// offset is dropped rather than applied. A bare date is taken at midnight.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, InferenceError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt);
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight);
    }
    Err(InferenceError::InvalidTimestamp(raw.to_string()))
}

/// Externally trained model. Returns the raw regression score for one row.
pub trait Classifier {
    fn predict(&self, row: &[f64; 8]) -> f64;
}

impl<F: Fn(&[f64; 8]) -> f64> Classifier for F {
    fn predict(&self, row: &[f64; 8]) -> f64 {
        self(row)
    }
}

/// Round a raw score to the nearest class code, ties to even.
pub fn class_code(score: f64) -> i64 {
    score.round_ties_even() as i64
}

/// Decoded prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    /// `"normal"`, `"anormal"` or `"unknown"`.
    pub etat_moteur: String,
    pub anomalie: String,
}

impl Prediction {
    pub fn unknown() -> Self {
        Self {
            etat_moteur: UNKNOWN.to_string(),
            anomalie: UNKNOWN.to_string(),
        }
    }
}

/// Lookup tables shipped with the model artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelMapping {
    /// Class code → `"<regime>_<fault sub-code>"`.
    pub label_mapping: HashMap<String, String>,
    /// Fault sub-code → fault name.
    pub anomalie_mapping: HashMap<String, String>,
}

impl LabelMapping {
    pub fn load(path: &Path) -> Result<Self, MappingError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn decode(&self, code: i64) -> Result<Prediction, InferenceError> {
        let combined = self
            .label_mapping
            .get(&code.to_string())
            .ok_or(InferenceError::UnknownClassCode(code))?;

        let mut parts = combined.split('_');
        let (Some(etat_code), Some(anomalie_code), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(InferenceError::UnknownClassCode(code));
        };
        let anomalie_code: i64 = anomalie_code
            .trim()
            .parse()
            .map_err(|_| InferenceError::UnknownClassCode(code))?;

        let etat_moteur = if etat_code == "1" { "anormal" } else { "normal" };
        let anomalie = self
            .anomalie_mapping
            .get(&anomalie_code.to_string())
            .map(String::as_str)
            .unwrap_or(NO_FAULT);

        Ok(Prediction {
            etat_moteur: etat_moteur.to_string(),
            anomalie: anomalie.to_string(),
        })
    }
}

/// Prediction as published downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionMsg {
    pub timestamp: String,
    pub etat_moteur: String,
    pub anomalie: String,
}

/// Classifies incoming sample payloads.
pub struct EdgeProcessor<C> {
    classifier: C,
    mapping: LabelMapping,
}

impl<C: Classifier> EdgeProcessor<C> {
    pub fn new(classifier: C, mapping: LabelMapping) -> Self {
        Self {
            classifier,
            mapping,
        }
    }

    /// Classify one raw payload line.
    ///
    /// Unknown class codes degrade to an "unknown" prediction; malformed
    /// input is returned as an [`InferenceError`] for the caller to log.
    pub fn process(&self, payload: &str, now: NaiveDateTime) -> Result<PredictionMsg, InferenceError> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| InferenceError::MalformedPayload(e.to_string()))?;
        let (features, raw_timestamp) = InferenceFeatures::from_payload(&value, now)?;

        let code = class_code(self.classifier.predict(&features.to_row()));
        debug!(code, "Predicted class code");

        let prediction = match self.mapping.decode(code) {
            Ok(prediction) => prediction,
            Err(err @ InferenceError::UnknownClassCode(_)) => {
                warn!(error = %err, "Falling back to unknown prediction");
                Prediction::unknown()
            }
            Err(err) => return Err(err),
        };

        Ok(PredictionMsg {
            timestamp: raw_timestamp
                .unwrap_or_else(|| now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()),
            etat_moteur: prediction.etat_moteur,
            anomalie: prediction.anomalie,
        })
    }
}
