// Rate tracker - samples per reporting interval and last-update bookkeeping
use chrono::{DateTime, Local, Utc};

#[derive(Debug, Clone, Default)]
pub struct RateTracker {
    count: u64,
    last_report: Option<u64>,
    last_update: Option<DateTime<Utc>>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one appended reading
    pub fn record(&mut self, at: DateTime<Utc>) {
        self.count += 1;
        self.last_update = Some(at);
    }

    /// Report the samples seen since the previous tick and start over
    pub fn tick(&mut self) -> u64 {
        let count = self.count;
        self.count = 0;
        self.last_report = Some(count);
        count
    }

    pub fn rate_text(&self) -> Option<String> {
        self.last_report.map(|n| format!("{} updates/sec", n))
    }

    /// Local wall-clock time of the most recent reading
    pub fn last_update_text(&self) -> Option<String> {
        self.last_update
            .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
    }
}

#[cfg(test)]
impl RateTracker {
    pub fn pending(&self) -> u64 {
        self.count
    }

    pub fn last_report(&self) -> Option<u64> {
        self.last_report
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }
}
