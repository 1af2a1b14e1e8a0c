// Channel domain model

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub key: String,
    pub label: String,
    pub color: String,
}

impl Channel {
    pub fn new(key: &str, label: &str, color: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            color: color.to_string(),
        }
    }
}

/// The fixed, ordered set of channels a deployment declares up front.
///
/// Readings, the series store and the renderer all index channels by their
/// position in this set.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSet {
    channels: Vec<Channel>,
}

impl ChannelSet {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self { channels }
    }

    /// The four-metric particulate monitor layout
    pub fn particulate() -> Self {
        Self::new(vec![
            Channel::new("pm1", "PM1.0", "#3b82f6"),
            Channel::new("pm25", "PM2.5", "#ef4444"),
            Channel::new("pm4", "PM4.0", "#f59e0b"),
            Channel::new("pm10", "PM10", "#8b5cf6"),
        ])
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.key == key)
    }

}

#[cfg(test)]
impl ChannelSet {
    pub fn get(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index_of(key).is_some()
    }
}
