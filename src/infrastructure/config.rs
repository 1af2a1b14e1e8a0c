use crate::application::chart_renderer::ChartSettings;
use crate::domain::channel::{Channel, ChannelSet};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DashboardConfig {
    pub device: DeviceSettings,
    pub buffer: BufferSettings,
    pub chart: ChartConfig,
    pub rate: RateSettings,
    pub server: ServerSettings,
    pub channels: Vec<ChannelConfig>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DeviceSettings {
    pub host: String,
    pub secure: bool,
    pub stream_path: String,
    pub reconnect_delay_ms: u64,
    pub send_hello: bool,
    pub request_timeout_ms: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            host: "sps30.local".to_string(),
            secure: false,
            stream_path: "/ws".to_string(),
            reconnect_delay_ms: 3000,
            send_hello: true,
            request_timeout_ms: 5000,
        }
    }
}

impl DeviceSettings {
    /// Stream endpoint, `ws://` or `wss://` depending on how the device is reached
    pub fn stream_endpoint(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}{}", scheme, self.host, self.stream_path)
    }

    pub fn http_base(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}", scheme, self.host)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BufferSettings {
    pub capacity: usize,
}

impl Default for BufferSettings {
    fn default() -> Self {
        // 5 minutes at one reading per second
        Self { capacity: 300 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub padding: f64,
    pub min_scale: f64,
    pub headroom: f64,
    pub grid_divisions: u32,
    pub unit_label: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        let defaults = ChartSettings::default();
        Self {
            width: defaults.width,
            height: defaults.height,
            padding: defaults.padding,
            min_scale: defaults.min_scale,
            headroom: defaults.headroom,
            grid_divisions: defaults.grid_divisions,
            unit_label: defaults.unit_label,
        }
    }
}

impl ChartConfig {
    pub fn to_settings(&self) -> ChartSettings {
        ChartSettings {
            width: self.width,
            height: self.height,
            padding: self.padding,
            min_scale: self.min_scale,
            headroom: self.headroom,
            grid_divisions: self.grid_divisions,
            unit_label: self.unit_label.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RateSettings {
    pub tick_ms: u64,
}

impl Default for RateSettings {
    fn default() -> Self {
        Self { tick_ms: 1000 }
    }
}

impl RateSettings {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChannelConfig {
    pub key: String,
    pub label: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("buffer.capacity must be at least 2, got {0}")]
    Capacity(usize),
    #[error("device.host must not be empty")]
    EmptyHost,
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("chart.min_scale must be positive, got {0}")]
    MinScale(f64),
    #[error("chart.headroom must not be negative, got {0}")]
    Headroom(f64),
    #[error("chart must be larger than twice its padding")]
    ChartSize,
    #[error("channel {0:?} is declared more than once")]
    DuplicateChannel(String),
    #[error("channel keys must not be empty")]
    EmptyChannelKey,
}

const FALLBACK_COLOR: &str = "#6b7280";

impl DashboardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer.capacity < 2 {
            return Err(ConfigError::Capacity(self.buffer.capacity));
        }
        if self.device.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.device.reconnect_delay_ms == 0 {
            return Err(ConfigError::ZeroDuration("device.reconnect_delay_ms"));
        }
        if self.device.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("device.request_timeout_ms"));
        }
        if self.rate.tick_ms == 0 {
            return Err(ConfigError::ZeroDuration("rate.tick_ms"));
        }
        if self.chart.min_scale.is_nan() || self.chart.min_scale <= 0.0 {
            return Err(ConfigError::MinScale(self.chart.min_scale));
        }
        if self.chart.headroom.is_nan() || self.chart.headroom < 0.0 {
            return Err(ConfigError::Headroom(self.chart.headroom));
        }
        if (self.chart.width as f64) <= self.chart.padding * 2.0
            || (self.chart.height as f64) <= self.chart.padding * 2.0
        {
            return Err(ConfigError::ChartSize);
        }

        let mut seen = HashSet::new();
        for channel in &self.channels {
            if channel.key.trim().is_empty() {
                return Err(ConfigError::EmptyChannelKey);
            }
            if !seen.insert(channel.key.as_str()) {
                return Err(ConfigError::DuplicateChannel(channel.key.clone()));
            }
        }
        Ok(())
    }

    /// Declared channels, falling back to the four-metric layout
    pub fn channel_set(&self) -> ChannelSet {
        if self.channels.is_empty() {
            return ChannelSet::particulate();
        }
        ChannelSet::new(
            self.channels
                .iter()
                .map(|c| Channel {
                    key: c.key.clone(),
                    label: c.label.clone().unwrap_or_else(|| c.key.clone()),
                    color: c.color.clone().unwrap_or_else(|| FALLBACK_COLOR.to_string()),
                })
                .collect(),
        )
    }
}

fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> anyhow::Result<DashboardConfig> {
    let settings = builder.build()?;
    let config: DashboardConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Load `config/dashboard.*` (optional) with `PM_DASHBOARD_*` environment overrides
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    build(
        config::Config::builder()
            .add_source(config::File::with_name("config/dashboard").required(false))
            .add_source(
                config::Environment::with_prefix("PM_DASHBOARD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            ),
    )
}
