// Connection manager - owns the device link and its reconnect policy
use crate::application::transport::{Link, PendingReconnect, ReconnectScheduler, Transport};
use crate::domain::connection::{hello_frame, ConnectionState, LinkEvent};
use std::time::Duration;
use tokio::sync::broadcast;

const STATUS_CHANNEL_CAPACITY: usize = 16;

/// State machine for a single device connection.
///
/// Transitions: `Disconnected -> Connecting -> Connected -> Disconnected`, plus
/// `Connecting -> Disconnected` on failure. Every entry into `Disconnected`
/// caused by the link (not by `close`) schedules exactly one reconnect after a
/// fixed delay, replacing any reconnect that was already pending. Retries are
/// unbounded and the delay never grows.
pub struct ConnectionManager {
    endpoint: String,
    reconnect_delay: Duration,
    send_hello: bool,
    transport: Box<dyn Transport>,
    scheduler: Box<dyn ReconnectScheduler>,
    state: ConnectionState,
    generation: u64,
    link: Option<Box<dyn Link>>,
    pending: Option<(u64, Box<dyn PendingReconnect>)>,
    status_tx: broadcast::Sender<ConnectionState>,
}

impl ConnectionManager {
    pub fn new(
        endpoint: String,
        reconnect_delay: Duration,
        send_hello: bool,
        transport: Box<dyn Transport>,
        scheduler: Box<dyn ReconnectScheduler>,
    ) -> Self {
        let (status_tx, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Self {
            endpoint,
            reconnect_delay,
            send_hello,
            transport,
            scheduler,
            state: ConnectionState::Disconnected,
            generation: 0,
            link: None,
            pending: None,
            status_tx,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Receive every state transition from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionState> {
        self.status_tx.subscribe()
    }

    /// Open a new link, replacing any existing one
    pub fn connect(&mut self) {
        self.cancel_pending();
        if let Some(mut old) = self.link.take() {
            old.close();
        }

        self.generation += 1;
        tracing::info!(
            endpoint = %self.endpoint,
            generation = self.generation,
            "Connecting to device"
        );
        self.link = Some(self.transport.open(&self.endpoint, self.generation));
        self.transition(ConnectionState::Connecting);
    }

    /// Apply a link event. Returns the frame text for frames that should be
    /// ingested, in arrival order.
    pub fn handle(&mut self, generation: u64, event: LinkEvent) -> Option<String> {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "Dropping event from superseded connection"
            );
            return None;
        }

        match event {
            LinkEvent::Opened => {
                if self.state != ConnectionState::Connecting {
                    return None;
                }
                self.cancel_pending();
                self.transition(ConnectionState::Connected);
                tracing::info!(endpoint = %self.endpoint, "Connected to device");

                if self.send_hello {
                    self.send(hello_frame());
                }
                None
            }
            LinkEvent::Frame(text) => {
                if self.state == ConnectionState::Connected {
                    Some(text)
                } else {
                    tracing::debug!(state = ?self.state, "Dropping frame received while not connected");
                    None
                }
            }
            LinkEvent::Closed(reason) => {
                if self.state == ConnectionState::Disconnected {
                    return None;
                }
                tracing::warn!(
                    endpoint = %self.endpoint,
                    %reason,
                    "Connection lost, reconnecting in {:?}",
                    self.reconnect_delay
                );
                if let Some(mut link) = self.link.take() {
                    link.close();
                }
                self.transition(ConnectionState::Disconnected);
                self.schedule_reconnect();
                None
            }
        }
    }

    /// Called when a scheduled reconnect fires. Stale timers are ignored.
    pub fn reconnect_due(&mut self, generation: u64) -> bool {
        match &self.pending {
            Some((pending_generation, _)) if *pending_generation == generation => {
                tracing::info!("Attempting to reconnect...");
                self.connect();
                true
            }
            _ => false,
        }
    }

    /// Send an outbound frame; only possible while connected
    pub fn send(&self, text: String) -> bool {
        match (&self.link, self.state) {
            (Some(link), ConnectionState::Connected) => link.send(text),
            _ => {
                tracing::warn!(state = ?self.state, "Not connected, cannot send frame");
                false
            }
        }
    }

    /// Tear the connection down without scheduling a reconnect
    pub fn close(&mut self) {
        self.cancel_pending();
        if let Some(mut link) = self.link.take() {
            link.close();
        }
        if self.state != ConnectionState::Disconnected {
            tracing::info!(endpoint = %self.endpoint, "Connection closed");
            self.transition(ConnectionState::Disconnected);
        }
    }

    fn schedule_reconnect(&mut self) {
        self.cancel_pending();
        let timer = self.scheduler.schedule(self.reconnect_delay, self.generation);
        self.pending = Some((self.generation, timer));
    }

    fn cancel_pending(&mut self) {
        if let Some((_, mut timer)) = self.pending.take() {
            timer.cancel();
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state == next {
            return;
        }
        tracing::debug!(from = ?self.state, to = ?next, "Connection state change");
        self.state = next;
        let _ = self.status_tx.send(next);
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.cancel_pending();
        if let Some(mut link) = self.link.take() {
            link.close();
        }
    }
}

#[cfg(test)]
impl ConnectionManager {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_pending_reconnect(&self) -> bool {
        self.pending.is_some()
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::{FakeScheduler, FakeTransport};
    use super::*;
    use std::sync::atomic::Ordering;

    fn manager(send_hello: bool) -> (ConnectionManager, FakeTransport, FakeScheduler) {
        let transport = FakeTransport::default();
        let scheduler = FakeScheduler::default();
        let manager = ConnectionManager::new(
            "ws://device.local/ws".to_string(),
            Duration::from_secs(3),
            send_hello,
            Box::new(transport.clone()),
            Box::new(scheduler.clone()),
        );
        (manager, transport, scheduler)
    }

    #[test]
    fn test_open_connects_and_sends_hello() {
        let (mut manager, transport, _) = manager(true);
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        manager.connect();
        assert_eq!(manager.state(), ConnectionState::Connecting);

        manager.handle(1, LinkEvent::Opened);
        assert_eq!(manager.state(), ConnectionState::Connected);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("\"hello\""));
    }

    #[test]
    fn test_frames_delivered_only_when_connected() {
        let (mut manager, _, _) = manager(false);
        manager.connect();
        assert_eq!(manager.handle(1, LinkEvent::Frame("early".into())), None);

        manager.handle(1, LinkEvent::Opened);
        assert_eq!(
            manager.handle(1, LinkEvent::Frame("a".into())),
            Some("a".to_string())
        );
        assert_eq!(
            manager.handle(1, LinkEvent::Frame("b".into())),
            Some("b".to_string())
        );
    }

    #[test]
    fn test_failure_while_connecting_schedules_reconnect() {
        let (mut manager, _, scheduler) = manager(false);
        manager.connect();
        manager.handle(1, LinkEvent::Closed("refused".into()));

        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(scheduler.pending.load(Ordering::SeqCst), 1);
        assert_eq!(
            scheduler.scheduled.lock().unwrap().as_slice(),
            &[(Duration::from_secs(3), 1)]
        );
    }

    #[test]
    fn test_reconnect_single_flight_across_repeated_disconnects() {
        let (mut manager, transport, scheduler) = manager(false);
        manager.connect();

        for _ in 0..5 {
            let generation = manager.generation();
            manager.handle(generation, LinkEvent::Closed("gone".into()));
            manager.handle(generation, LinkEvent::Closed("gone again".into()));
            assert!(scheduler.pending.load(Ordering::SeqCst) <= 1);

            assert!(manager.reconnect_due(generation));
            assert_eq!(manager.state(), ConnectionState::Connecting);
            assert!(scheduler.pending.load(Ordering::SeqCst) <= 1);
        }

        assert_eq!(transport.opened.lock().unwrap().len(), 6);
        assert_eq!(transport.live_links.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_connected_cancels_pending_reconnect() {
        let (mut manager, _, scheduler) = manager(false);
        manager.connect();
        manager.handle(1, LinkEvent::Closed("gone".into()));
        assert_eq!(scheduler.pending.load(Ordering::SeqCst), 1);

        // user reconnects by hand before the timer fires
        manager.connect();
        assert_eq!(scheduler.pending.load(Ordering::SeqCst), 0);
        manager.handle(2, LinkEvent::Opened);
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert!(!manager.reconnect_due(1));
    }

    #[test]
    fn test_stale_generation_events_are_ignored() {
        let (mut manager, transport, _) = manager(false);
        manager.connect();
        manager.connect();
        assert_eq!(transport.live_links.load(Ordering::SeqCst), 1);

        manager.handle(1, LinkEvent::Opened);
        assert_eq!(manager.state(), ConnectionState::Connecting);

        manager.handle(2, LinkEvent::Opened);
        assert_eq!(manager.handle(1, LinkEvent::Frame("old".into())), None);
        manager.handle(1, LinkEvent::Closed("old link".into()));
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_close_is_idempotent_and_cancels_reconnect() {
        let (mut manager, transport, scheduler) = manager(false);
        manager.connect();
        manager.handle(1, LinkEvent::Opened);
        manager.handle(1, LinkEvent::Closed("gone".into()));
        assert_eq!(scheduler.pending.load(Ordering::SeqCst), 1);

        manager.close();
        manager.close();
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(scheduler.pending.load(Ordering::SeqCst), 0);
        assert_eq!(transport.live_links.load(Ordering::SeqCst), 0);
        assert!(!manager.reconnect_due(1));
    }

    #[test]
    fn test_close_from_connected_does_not_schedule() {
        let (mut manager, _, scheduler) = manager(false);
        manager.connect();
        manager.handle(1, LinkEvent::Opened);
        manager.close();

        assert_eq!(scheduler.pending.load(Ordering::SeqCst), 0);
        assert!(scheduler.scheduled.lock().unwrap().is_empty());
    }

    #[test]
    fn test_send_requires_connection() {
        let (mut manager, transport, _) = manager(false);
        assert!(!manager.send("x".into()));

        manager.connect();
        assert!(!manager.send("x".into()));

        manager.handle(1, LinkEvent::Opened);
        assert!(manager.send("x".into()));
        assert_eq!(transport.sent.lock().unwrap().as_slice(), &["x".to_string()]);
    }

    #[test]
    fn test_observers_see_every_transition() {
        let (mut manager, _, _) = manager(false);
        let mut status = manager.subscribe();

        manager.connect();
        manager.handle(1, LinkEvent::Opened);
        manager.handle(1, LinkEvent::Closed("gone".into()));

        assert_eq!(status.try_recv().unwrap(), ConnectionState::Connecting);
        assert_eq!(status.try_recv().unwrap(), ConnectionState::Connected);
        assert_eq!(status.try_recv().unwrap(), ConnectionState::Disconnected);
        assert!(status.try_recv().is_err());
    }
}
