mod client;
mod consumer;
mod inbound;
mod trace_context;
mod traits;

pub use client::*;
pub use consumer::*;
pub use inbound::*;
pub use trace_context::*;
pub use traits::*;
