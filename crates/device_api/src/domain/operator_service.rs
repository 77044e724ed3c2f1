use common::domain::{
    ActuatorCommand, Configuration, DeviceCommandSender, DeviceConfigUpdater, DeviceRegistry,
    DomainResult,
};
use garde::Validate;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Validate)]
pub struct ConfigureDeviceInput {
    #[garde(length(min = 1))]
    pub device_id: String,
    #[garde(dive)]
    pub configuration: Configuration,
}

#[derive(Debug, Clone, Validate)]
pub struct SendCommandInput {
    #[garde(length(min = 1))]
    pub device_id: String,
    #[garde(skip)]
    pub is_actuator_on: bool,
}

/// Result of an operator action that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorOutcome {
    /// Dispatched to the device. Carries the config version for configure.
    Applied { config_version: Option<i64> },
    /// Nothing known about the device yet; nothing was dispatched.
    DeviceNotFound,
}

/// Operator actions against known devices. Never creates registry entries.
pub struct OperatorService {
    registry: Arc<DeviceRegistry>,
    command_sender: Arc<dyn DeviceCommandSender>,
    config_updater: Arc<dyn DeviceConfigUpdater>,
}

impl OperatorService {
    pub fn new(
        registry: Arc<DeviceRegistry>,
        command_sender: Arc<dyn DeviceCommandSender>,
        config_updater: Arc<dyn DeviceConfigUpdater>,
    ) -> Self {
        Self {
            registry,
            command_sender,
            config_updater,
        }
    }

    /// Push a new configuration and, once the device manager accepted it,
    /// replace the local one wholesale.
    #[instrument(skip(self, input), fields(device_id = %input.device_id))]
    pub async fn configure_device(&self, input: ConfigureDeviceInput) -> DomainResult<OperatorOutcome> {
        common::garde::validate_struct(&input)?;
        input.configuration.validate_bounds()?;

        let Some(handle) = self.registry.get(&input.device_id).await else {
            info!("configure requested for unknown device");
            return Ok(OperatorOutcome::DeviceNotFound);
        };

        let device_path = handle.read(|record| record.identity().path()).await;
        let version = self
            .config_updater
            .update_config(&device_path, &input.configuration)
            .await?;

        handle
            .update(|record| record.replace_configuration(input.configuration))
            .await;

        info!(version, "device configuration replaced");
        Ok(OperatorOutcome::Applied {
            config_version: Some(version),
        })
    }

    /// Send an actuator command directly. The local actuator state is left
    /// for the device's own state report to reconcile.
    #[instrument(skip(self, input), fields(device_id = %input.device_id, is_ac_on = input.is_actuator_on))]
    pub async fn send_command(&self, input: SendCommandInput) -> DomainResult<OperatorOutcome> {
        common::garde::validate_struct(&input)?;

        let Some(handle) = self.registry.get(&input.device_id).await else {
            info!("command requested for unknown device");
            return Ok(OperatorOutcome::DeviceNotFound);
        };

        let device_path = handle.read(|record| record.identity().path()).await;
        self.command_sender
            .send_command(&device_path, &ActuatorCommand::new(input.is_actuator_on))
            .await?;

        debug!("operator command dispatched");
        Ok(OperatorOutcome::Applied {
            config_version: None,
        })
    }
}
