// Traits for the streaming link and reconnect timer used by the connection manager
use std::time::Duration;

/// Opens streaming links to a device endpoint.
///
/// `open` must not block: the outcome is reported later as `LinkEvent`s tagged
/// with `generation`.
pub trait Transport: Send {
    fn open(&mut self, endpoint: &str, generation: u64) -> Box<dyn Link>;
}

/// A single live (or still-opening) streaming link
pub trait Link: Send {
    /// Queue an outbound text frame. Returns false if the link is gone.
    fn send(&self, text: String) -> bool;

    /// Release the link. Safe to call more than once.
    fn close(&mut self);
}

/// Schedules the single delayed reconnect attempt
pub trait ReconnectScheduler: Send {
    fn schedule(&mut self, delay: Duration, generation: u64) -> Box<dyn PendingReconnect>;
}

pub trait PendingReconnect: Send {
    fn cancel(&mut self);
}
