pub mod device_api;
pub mod domain;
pub mod http;

pub use device_api::*;
