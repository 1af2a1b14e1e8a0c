// Rolling time-series store - fixed-capacity window over the declared channels
use super::reading::Reading;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("capacity must be at least 2, got {0}")]
    InvalidCapacity(usize),
    #[error("reading carries {actual} channel values, store expects {expected}")]
    ChannelCountMismatch { expected: usize, actual: usize },
    #[error("at least one channel must be declared")]
    NoChannels,
}

/// Sliding window of the last `capacity` readings.
///
/// `timestamps` and every entry of `channels` always have the same length.
#[derive(Debug, Clone)]
pub struct SeriesStore {
    capacity: usize,
    timestamps: VecDeque<i64>,
    channels: Vec<VecDeque<f64>>,
}

impl SeriesStore {
    pub fn new(capacity: usize, channel_count: usize) -> Result<Self, SeriesError> {
        if capacity < 2 {
            return Err(SeriesError::InvalidCapacity(capacity));
        }
        Ok(Self {
            capacity,
            timestamps: VecDeque::with_capacity(capacity + 1),
            channels: (0..channel_count)
                .map(|_| VecDeque::with_capacity(capacity + 1))
                .collect(),
        })
    }

    /// Append a reading stamped with the client's wall clock
    pub fn append(&mut self, reading: &Reading) -> Result<i64, SeriesError> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.append_at(reading, now_ms)?;
        Ok(now_ms)
    }

    pub fn append_at(&mut self, reading: &Reading, timestamp_ms: i64) -> Result<(), SeriesError> {
        if reading.len() != self.channels.len() {
            return Err(SeriesError::ChannelCountMismatch {
                expected: self.channels.len(),
                actual: reading.len(),
            });
        }

        self.timestamps.push_back(timestamp_ms);
        for (series, value) in self.channels.iter_mut().zip(reading.values()) {
            series.push_back(*value);
        }

        if self.timestamps.len() > self.capacity {
            self.timestamps.pop_front();
            for series in &mut self.channels {
                series.pop_front();
            }
        }

        Ok(())
    }

    pub fn snapshot(&self) -> SeriesSnapshot {
        SeriesSnapshot {
            capacity: self.capacity,
            timestamps: self.timestamps.iter().copied().collect(),
            channels: self
                .channels
                .iter()
                .map(|series| series.iter().copied().collect())
                .collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Most recent values, one per channel
    pub fn latest(&self) -> Option<Reading> {
        if self.is_empty() {
            return None;
        }
        let values = self
            .channels
            .iter()
            .filter_map(|series| series.back().copied())
            .collect();
        Some(Reading::new(values))
    }

    pub fn clear(&mut self) {
        self.timestamps.clear();
        for series in &mut self.channels {
            series.clear();
        }
    }
}

/// Owned, read-only copy of the store contents handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSnapshot {
    pub capacity: usize,
    pub timestamps: Vec<i64>,
    pub channels: Vec<Vec<f64>>,
}

impl SeriesSnapshot {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn channel(&self, index: usize) -> &[f64] {
        self.channels.get(index).map(Vec::as_slice).unwrap_or(&[])
    }
}
