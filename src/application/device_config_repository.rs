// Repository trait for device configuration access
use crate::domain::alarm::AlarmConfig;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceConfigError {
    #[error("device request failed: {0}")]
    Request(String),
    #[error("device answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected device response: {0}")]
    Response(String),
}

#[async_trait]
pub trait DeviceConfigRepository: Send + Sync {
    /// Read the current alarm settings
    async fn get_alarm(&self) -> Result<AlarmConfig, DeviceConfigError>;

    /// Write alarm time and sunrise ramp length
    async fn put_alarm(&self, hours: u32, minutes: u32, sunrise: u32) -> Result<(), DeviceConfigError>;

    async fn put_enabled(&self, enabled: bool) -> Result<(), DeviceConfigError>;
}
