// Application state for HTTP handlers
use crate::application::alarm_service::AlarmService;
use crate::application::session::{DashboardView, SessionEvent};
use tokio::sync::{mpsc, watch};

/// Handlers read the latest published view and write only by posting events,
/// so the session stays the single writer of dashboard state.
#[derive(Clone)]
pub struct AppState {
    pub alarm_service: AlarmService,
    pub events: mpsc::UnboundedSender<SessionEvent>,
    pub view: watch::Receiver<DashboardView>,
}
