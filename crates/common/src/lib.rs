pub mod device_manager;
pub mod domain;
pub mod garde;
pub mod nats;
pub mod telemetry;
