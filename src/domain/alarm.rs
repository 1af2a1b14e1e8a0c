// Alarm-clock device configuration domain model
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_SUNRISE_MINUTES: u32 = 120;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmConfig {
    pub hours: u32,
    pub minutes: u32,
    pub enabled: bool,
    pub sunrise: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmTime {
    pub hours: u32,
    pub minutes: u32,
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("alarm time must look like HH:MM, got {0:?}")]
    TimeFormat(String),
    #[error("hours must be below 24, got {0}")]
    Hours(u32),
    #[error("minutes must be below 60, got {0}")]
    Minutes(u32),
    #[error("sunrise must be at most {MAX_SUNRISE_MINUTES} minutes, got {0}")]
    Sunrise(u32),
}

impl AlarmTime {
    /// Parse the `HH:MM` value of a time selection
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let format_err = || ValidationError::TimeFormat(text.to_string());

        let (h, m) = text.trim().split_once(':').ok_or_else(format_err)?;
        if h.is_empty() || m.len() != 2 {
            return Err(format_err());
        }
        let hours: u32 = h.parse().map_err(|_| format_err())?;
        let minutes: u32 = m.parse().map_err(|_| format_err())?;

        if hours >= 24 {
            return Err(ValidationError::Hours(hours));
        }
        if minutes >= 60 {
            return Err(ValidationError::Minutes(minutes));
        }
        Ok(Self { hours, minutes })
    }
}

pub fn validate_sunrise(minutes: u32) -> Result<u32, ValidationError> {
    if minutes > MAX_SUNRISE_MINUTES {
        return Err(ValidationError::Sunrise(minutes));
    }
    Ok(minutes)
}
