// Dashboard session - single-writer event loop tying connection, store, renderer and rate tracking together
use crate::application::chart_renderer::ChartRenderer;
use crate::application::connection_manager::ConnectionManager;
use crate::application::rate_tracker::RateTracker;
use crate::domain::channel::ChannelSet;
use crate::domain::chart::ChartFrame;
use crate::domain::connection::{ConnectionState, DeviceCommand, LinkEvent};
use crate::domain::reading::{decode, Decoded};
use crate::domain::series::{SeriesError, SeriesStore};
use crate::domain::visibility::Visibility;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Link { generation: u64, event: LinkEvent },
    ReconnectDue { generation: u64 },
    RateTick,
    SetVisibility { channel: String, visible: bool },
    Resize { width: u32 },
    ClearHistory,
    Command(DeviceCommand),
    Shutdown,
}

/// What happened to one inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    Sample,
    Ack,
    Ignored,
    Rejected,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelView {
    pub key: String,
    pub label: String,
    pub color: String,
    pub visible: bool,
    pub value: Option<f64>,
    pub text: String,
}

/// Immutable picture of the dashboard published after every event
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub connection: ConnectionState,
    pub status: &'static str,
    pub channels: Vec<ChannelView>,
    pub samples: usize,
    pub capacity: usize,
    pub rate: Option<String>,
    pub last_update: Option<String>,
    pub notice: Option<String>,
    pub decode_failures: u64,
    #[serde(skip)]
    pub chart: ChartFrame,
}

pub struct Session {
    channels: ChannelSet,
    store: SeriesStore,
    visibility: Visibility,
    connection: ConnectionManager,
    renderer: ChartRenderer,
    rate: RateTracker,
    frame: ChartFrame,
    notice: Option<String>,
    decode_failures: u64,
}

impl Session {
    pub fn new(
        channels: ChannelSet,
        capacity: usize,
        renderer: ChartRenderer,
        connection: ConnectionManager,
    ) -> Result<Self, SeriesError> {
        if channels.is_empty() {
            return Err(SeriesError::NoChannels);
        }
        let store = SeriesStore::new(capacity, channels.len())?;
        let visibility = Visibility::all_visible(&channels);
        let frame = renderer.render(&store.snapshot(), &channels, &visibility);

        Ok(Self {
            channels,
            store,
            visibility,
            connection,
            renderer,
            rate: RateTracker::new(),
            frame,
            notice: None,
            decode_failures: 0,
        })
    }

    pub fn start(&mut self) {
        self.connection.connect();
    }

    pub fn subscribe_status(&self) -> broadcast::Receiver<ConnectionState> {
        self.connection.subscribe()
    }

    /// Handle one event to completion. Returns false once the session is shut down.
    pub fn handle(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Link { generation, event } => {
                if let Some(frame) = self.connection.handle(generation, event) {
                    self.ingest(&frame);
                }
            }
            SessionEvent::ReconnectDue { generation } => {
                self.connection.reconnect_due(generation);
            }
            SessionEvent::RateTick => {
                let count = self.rate.tick();
                tracing::debug!(
                    count,
                    state = ?self.connection.state(),
                    "Samples in last interval"
                );
            }
            SessionEvent::SetVisibility { channel, visible } => {
                match self.channels.index_of(&channel) {
                    Some(index) => {
                        self.visibility.set(index, visible);
                        self.redraw();
                    }
                    None => tracing::warn!(%channel, "Ignoring visibility change for unknown channel"),
                }
            }
            SessionEvent::Resize { width } => {
                self.renderer.resize(width);
                self.redraw();
            }
            SessionEvent::ClearHistory => {
                self.store.clear();
                self.redraw();
                tracing::info!("Cleared series history");
            }
            SessionEvent::Command(command) => {
                if self.connection.send(command.to_frame()) {
                    tracing::info!(action = command.action(), "Sent command");
                }
            }
            SessionEvent::Shutdown => {
                self.connection.close();
                return false;
            }
        }
        true
    }

    /// Decode one frame and apply it
    pub fn ingest(&mut self, frame: &str) -> Ingested {
        match decode(frame, &self.channels) {
            Ok(Decoded::Reading(reading)) => {
                let stamped = match self.store.append(&reading) {
                    Ok(stamped) => stamped,
                    Err(e) => {
                        tracing::warn!(error = %e, "Dropping reading");
                        self.decode_failures += 1;
                        return Ingested::Rejected;
                    }
                };
                let at = chrono::DateTime::from_timestamp_millis(stamped)
                    .unwrap_or_else(chrono::Utc::now);
                self.rate.record(at);
                self.redraw();
                Ingested::Sample
            }
            Ok(Decoded::Ack(ack)) => {
                let notice = ack.notice();
                if ack.is_success() {
                    tracing::info!(%notice, "Device acknowledged command");
                } else {
                    tracing::warn!(%notice, "Device rejected command");
                }
                self.notice = Some(notice);
                Ingested::Ack
            }
            Ok(Decoded::Unrecognized) => {
                tracing::debug!(%frame, "Ignoring unrecognized message");
                Ingested::Ignored
            }
            Err(e) => {
                tracing::warn!(error = %e, %frame, "Failed to decode message");
                self.decode_failures += 1;
                Ingested::Rejected
            }
        }
    }

    fn redraw(&mut self) {
        self.frame = self
            .renderer
            .render(&self.store.snapshot(), &self.channels, &self.visibility);
    }

    pub fn view(&self) -> DashboardView {
        let latest = self.store.latest();
        let channels = self
            .channels
            .iter()
            .enumerate()
            .map(|(index, channel)| {
                let value = latest.as_ref().and_then(|r| r.value(index));
                ChannelView {
                    key: channel.key.clone(),
                    label: channel.label.clone(),
                    color: channel.color.clone(),
                    visible: self.visibility.is_visible(index),
                    value,
                    text: value.map_or_else(|| "--".to_string(), |v| format!("{:.1}", v)),
                }
            })
            .collect();

        let state = self.connection.state();
        DashboardView {
            connection: state,
            status: state.label(),
            channels,
            samples: self.store.len(),
            capacity: self.store.capacity(),
            rate: self.rate.rate_text(),
            last_update: self.rate.last_update_text(),
            notice: self.notice.clone(),
            decode_failures: self.decode_failures,
            chart: self.frame.clone(),
        }
    }

}

#[cfg(test)]
impl Session {
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    pub fn rate(&self) -> &RateTracker {
        &self.rate
    }

    pub fn frame(&self) -> &ChartFrame {
        &self.frame
    }
}

/// Drive the session until shutdown or until every event sender is gone
pub async fn run(
    mut session: Session,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
    view_tx: watch::Sender<DashboardView>,
) {
    session.start();
    view_tx.send_replace(session.view());

    while let Some(event) = events.recv().await {
        let keep_running = session.handle(event);
        view_tx.send_replace(session.view());
        if !keep_running {
            break;
        }
    }

    tracing::info!("Dashboard session stopped");
}
