// Alarm service - Use case for reading and writing the alarm-clock settings
use crate::application::device_config_repository::{DeviceConfigError, DeviceConfigRepository};
use crate::domain::alarm::{validate_sunrise, AlarmConfig, AlarmTime, ValidationError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlarmError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Device(#[from] DeviceConfigError),
}

#[derive(Clone)]
pub struct AlarmService {
    repository: Arc<dyn DeviceConfigRepository>,
}

impl AlarmService {
    pub fn new(repository: Arc<dyn DeviceConfigRepository>) -> Self {
        Self { repository }
    }

    pub async fn get_alarm(&self) -> Result<AlarmConfig, AlarmError> {
        Ok(self.repository.get_alarm().await?)
    }

    /// Validate the time selection, then push it to the device.
    /// Nothing is sent when validation fails.
    pub async fn set_alarm(&self, time: &str, sunrise: u32) -> Result<AlarmTime, AlarmError> {
        let alarm_time = AlarmTime::parse(time)?;
        let sunrise = validate_sunrise(sunrise)?;

        self.repository
            .put_alarm(alarm_time.hours, alarm_time.minutes, sunrise)
            .await?;

        tracing::info!(
            hours = alarm_time.hours,
            minutes = alarm_time.minutes,
            sunrise,
            "Alarm updated"
        );
        Ok(alarm_time)
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<(), AlarmError> {
        self.repository.put_enabled(enabled).await?;
        tracing::info!(enabled, "Alarm enable flag updated");
        Ok(())
    }
}
