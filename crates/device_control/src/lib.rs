pub mod device_control;
pub mod domain;
pub mod nats;

pub use device_control::*;
