// Application layer - Use cases and the session state machine
pub mod alarm_service;
pub mod chart_renderer;
pub mod connection_manager;
pub mod device_config_repository;
pub mod rate_tracker;
pub mod session;
pub mod transport;
