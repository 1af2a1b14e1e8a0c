// WebSocket transport and tokio reconnect timer feeding the session event loop
use crate::application::session::SessionEvent;
use crate::application::transport::{Link, PendingReconnect, ReconnectScheduler, Transport};
use crate::domain::connection::LinkEvent;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

pub struct WebSocketTransport {
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl WebSocketTransport {
    pub fn new(events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { events }
    }
}

impl Transport for WebSocketTransport {
    fn open(&mut self, endpoint: &str, generation: u64) -> Box<dyn Link> {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(drive_link(
            endpoint.to_string(),
            generation,
            self.events.clone(),
            outbound_rx,
            shutdown_rx,
        ));

        Box::new(WebSocketLink {
            outbound: outbound_tx,
            shutdown: Some(shutdown_tx),
        })
    }
}

struct WebSocketLink {
    outbound: mpsc::UnboundedSender<String>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Link for WebSocketLink {
    fn send(&self, text: String) -> bool {
        self.outbound.send(text).is_ok()
    }

    fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Runs one connection attempt and its read/write loop.
///
/// Emits `Opened`, then `Frame`s, then exactly one `Closed` unless the link was
/// shut down locally, in which case nothing further is emitted.
async fn drive_link(
    endpoint: String,
    generation: u64,
    events: mpsc::UnboundedSender<SessionEvent>,
    mut outbound: mpsc::UnboundedReceiver<String>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let emit = |event: LinkEvent| {
        let _ = events.send(SessionEvent::Link { generation, event });
    };

    let stream = tokio::select! {
        _ = &mut shutdown => return,
        result = connect_async(endpoint.as_str()) => match result {
            Ok((stream, _)) => stream,
            Err(e) => {
                tracing::error!(%endpoint, error = %e, "Failed to open WebSocket");
                emit(LinkEvent::Closed(format!("connect failed: {}", e)));
                return;
            }
        },
    };

    emit(LinkEvent::Opened);
    let (mut write, mut read) = stream.split();

    let reason = loop {
        tokio::select! {
            _ = &mut shutdown => {
                let _ = write.send(Message::Close(None)).await;
                return;
            }
            Some(text) = outbound.recv() => {
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    break format!("send failed: {}", e);
                }
            }
            item = read.next() => match item {
                Some(Ok(Message::Text(text))) => emit(LinkEvent::Frame(text.as_str().to_string())),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => emit(LinkEvent::Frame(text)),
                    Err(_) => tracing::warn!(len = bytes.len(), "Dropping non UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    break match frame {
                        Some(f) => format!("closed by device: {} {}", f.code, f.reason.as_str()),
                        None => "closed by device".to_string(),
                    };
                }
                // ping/pong are answered by tungstenite
                Some(Ok(_)) => {}
                Some(Err(e)) => break format!("read error: {}", e),
                None => break "stream ended".to_string(),
            },
        }
    };

    emit(LinkEvent::Closed(reason));
}

pub struct TokioReconnectScheduler {
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl TokioReconnectScheduler {
    pub fn new(events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { events }
    }
}

impl ReconnectScheduler for TokioReconnectScheduler {
    fn schedule(&mut self, delay: Duration, generation: u64) -> Box<dyn PendingReconnect> {
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(SessionEvent::ReconnectDue { generation });
        });
        Box::new(TokioPendingReconnect {
            task: task.abort_handle(),
        })
    }
}

struct TokioPendingReconnect {
    task: AbortHandle,
}

impl PendingReconnect for TokioPendingReconnect {
    fn cancel(&mut self) {
        self.task.abort();
    }
}
