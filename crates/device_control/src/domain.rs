mod state_ingest_service;
mod telemetry_ingest_service;

pub use state_ingest_service::*;
pub use telemetry_ingest_service::*;
