// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod device_config_client;
pub mod svg;
pub mod websocket_transport;
