mod configuration;
mod control_policy;
mod device;
mod dispatch;
mod registry;
mod result;
mod sample_window;

pub use configuration::*;
pub use control_policy::*;
pub use device::*;
pub use dispatch::*;
pub use registry::*;
pub use result::*;
pub use sample_window::*;
