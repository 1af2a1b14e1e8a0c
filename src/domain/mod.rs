// Domain layer - Core data types and pure rules
pub mod alarm;
pub mod channel;
pub mod chart;
pub mod connection;
pub mod reading;
pub mod series;
pub mod visibility;
