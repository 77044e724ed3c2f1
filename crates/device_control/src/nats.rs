mod events;
mod state_processor;
mod telemetry_processor;

pub use events::*;
pub use state_processor::*;
pub use telemetry_processor::*;
