// Reading domain model and inbound frame decoding
use super::channel::ChannelSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

const SENSOR_DATA_TYPE: &str = "sensor_data";

/// One set of channel values, index-aligned with the deployment's `ChannelSet`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    values: Vec<f64>,
}

impl Reading {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    fn from_object(object: &Map<String, Value>, channels: &ChannelSet) -> Self {
        let values = channels
            .iter()
            .map(|c| object.get(&c.key).and_then(Value::as_f64).unwrap_or(0.0))
            .collect();
        Self { values }
    }
}

/// Acknowledgement envelope sent by the device in reply to a command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AckResponse {
    pub response_for: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl AckResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Text shown to the user for this acknowledgement
    pub fn notice(&self) -> String {
        if self.is_success() {
            format!("{}: ok", self.response_for)
        } else {
            let detail = self.message.as_deref().unwrap_or(&self.status);
            format!("{} failed: {}", self.response_for, detail)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Reading(Reading),
    Ack(AckResponse),
    Unrecognized,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("frame is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("acknowledgement for {response_for:?} has no usable status")]
    InvalidAck { response_for: String },
}

/// Decode one inbound text frame.
///
/// Enveloped sensor frames (`"type": "sensor_data"`) win over everything else,
/// then acknowledgements (`response_for`), then bare objects carrying at least
/// one declared channel key. Anything else that parses is `Unrecognized`.
pub fn decode(payload: &str, channels: &ChannelSet) -> Result<Decoded, DecodeError> {
    let value: Value = serde_json::from_str(payload)?;

    let Value::Object(object) = value else {
        return Ok(Decoded::Unrecognized);
    };

    if object.get("type").and_then(Value::as_str) == Some(SENSOR_DATA_TYPE) {
        return Ok(Decoded::Reading(Reading::from_object(&object, channels)));
    }

    if let Some(response_for) = object.get("response_for") {
        let response_for = match response_for {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let status = object.get("status").and_then(Value::as_str);
        let Some(status) = status else {
            return Err(DecodeError::InvalidAck { response_for });
        };
        let message = object
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        return Ok(Decoded::Ack(AckResponse {
            response_for,
            status: status.to_string(),
            message,
        }));
    }

    if channels.iter().any(|c| object.contains_key(&c.key)) {
        return Ok(Decoded::Reading(Reading::from_object(&object, channels)));
    }

    Ok(Decoded::Unrecognized)
}
