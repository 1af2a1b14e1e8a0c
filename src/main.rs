// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tokio::sync::{mpsc, watch};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::alarm_service::AlarmService;
use crate::application::chart_renderer::ChartRenderer;
use crate::application::connection_manager::ConnectionManager;
use crate::application::session::{self, Session, SessionEvent};
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::device_config_client::HttpDeviceConfig;
use crate::infrastructure::websocket_transport::{TokioReconnectScheduler, WebSocketTransport};
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    clear_history, get_alarm, get_chart, get_status, health_check, put_alarm, put_alarm_enabled,
    resize_chart, send_command, set_visibility,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_dashboard_config()?;
    let channels = config.channel_set();
    tracing::info!(
        endpoint = %config.device.stream_endpoint(),
        channels = channels.len(),
        capacity = config.buffer.capacity,
        "Loaded dashboard configuration"
    );

    // Session wiring: transport and timer post back into the same event queue
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let connection = ConnectionManager::new(
        config.device.stream_endpoint(),
        config.device.reconnect_delay(),
        config.device.send_hello,
        Box::new(WebSocketTransport::new(events_tx.clone())),
        Box::new(TokioReconnectScheduler::new(events_tx.clone())),
    );
    let session = Session::new(
        channels,
        config.buffer.capacity,
        ChartRenderer::new(config.chart.to_settings()),
        connection,
    )?;

    let mut status = session.subscribe_status();
    tokio::spawn(async move {
        while let Ok(state) = status.recv().await {
            tracing::info!(status = state.label(), "Connection status changed");
        }
    });

    let ticker = events_tx.clone();
    let tick = config.rate.tick();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        interval.tick().await;
        loop {
            interval.tick().await;
            if ticker.send(SessionEvent::RateTick).is_err() {
                break;
            }
        }
    });

    let (view_tx, view_rx) = watch::channel(session.view());
    let session_task = tokio::spawn(session::run(session, events_rx, view_tx));

    // Device configuration (application layer over reqwest)
    let device = HttpDeviceConfig::new(config.device.http_base(), config.device.request_timeout())?;
    let alarm_service = AlarmService::new(Arc::new(device));

    let state = Arc::new(AppState {
        alarm_service,
        events: events_tx.clone(),
        view: view_rx,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/status", get(get_status))
        .route("/chart.svg", get(get_chart))
        .route("/chart/size", put(resize_chart))
        .route("/history", delete(clear_history))
        .route("/channels/:key", put(set_visibility))
        .route("/commands/:action", post(send_command))
        .route("/alarm", get(get_alarm).put(put_alarm))
        .route("/alarm/enabled", put(put_alarm_enabled))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!(%addr, "Starting pm-dashboard");

    let shutdown_tx = events_tx;
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            let _ = shutdown_tx.send(SessionEvent::Shutdown);
        })
        .await?;

    session_task.await?;
    Ok(())
}
