// Connection lifecycle domain model
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
        }
    }
}

/// Typed events emitted by a live link, tagged by the session with the
/// generation of the connection that produced them.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Opened,
    Frame(String),
    Closed(String),
}

/// Commands the dashboard can send to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    RegisterClient,
    CloseConnection,
}

impl DeviceCommand {
    pub fn action(&self) -> &'static str {
        match self {
            DeviceCommand::RegisterClient => "registerClient",
            DeviceCommand::CloseConnection => "closeConnection",
        }
    }

    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "registerClient" => Some(DeviceCommand::RegisterClient),
            "closeConnection" => Some(DeviceCommand::CloseConnection),
            _ => None,
        }
    }

    pub fn to_frame(&self) -> String {
        serde_json::json!({ "action": self.action() }).to_string()
    }
}

pub fn hello_frame() -> String {
    serde_json::json!({ "type": "hello", "message": "Client connected" }).to_string()
}
