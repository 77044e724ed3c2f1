use crate::domain::{Configuration, DomainResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Payload of an actuator command as understood by the device firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorCommand {
    #[serde(rename = "is_ac_on")]
    pub is_actuator_on: bool,
}

impl ActuatorCommand {
    pub fn new(is_actuator_on: bool) -> Self {
        Self { is_actuator_on }
    }
}

/// Sends commands to a device through the device-management service.
/// Infrastructure (e.g. the device manager HTTP client) implements this trait.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DeviceCommandSender: Send + Sync {
    async fn send_command(&self, device_path: &str, command: &ActuatorCommand) -> DomainResult<()>;
}

/// Pushes a new configuration to a device.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DeviceConfigUpdater: Send + Sync {
    /// Returns the configuration version assigned by the device-management
    /// service.
    async fn update_config(
        &self,
        device_path: &str,
        configuration: &Configuration,
    ) -> DomainResult<i64>;
}
