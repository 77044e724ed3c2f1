use common::domain::{
    decide, ActuatorCommand, DeviceCommandSender, DeviceRegistry, TelemetryEvent, Transition,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// What handling one telemetry event did to the device.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryOutcome {
    /// Sample recorded, actuator left as is.
    Unchanged { average: Option<f64> },
    /// Command dispatched and the new actuator state recorded.
    Switched {
        is_actuator_on: bool,
        average: f64,
    },
    /// The policy asked for a switch but the command could not be delivered.
    /// Local actuator state is untouched; the next reading re-evaluates.
    DispatchFailed { requested: bool, reason: String },
}

/// Feeds telemetry into the registry and drives the actuator from the
/// rolling average.
pub struct TelemetryIngestService {
    registry: Arc<DeviceRegistry>,
    command_sender: Arc<dyn DeviceCommandSender>,
}

impl TelemetryIngestService {
    pub fn new(registry: Arc<DeviceRegistry>, command_sender: Arc<dyn DeviceCommandSender>) -> Self {
        Self {
            registry,
            command_sender,
        }
    }

    #[instrument(
        skip(self, event),
        fields(device_id = %event.identity.device_id, temperature = event.temperature)
    )]
    pub async fn process_telemetry(&self, event: TelemetryEvent) -> TelemetryOutcome {
        let handle = self.registry.get_or_create(&event.identity).await;

        let (average, transition, device_path) = handle
            .update(|record| {
                record.record_sample(event.temperature);
                let average = record.average_temperature();
                let transition =
                    decide(average, record.configuration(), record.is_actuator_on());
                (average, transition, record.identity().path())
            })
            .await;

        let (Some(target), Some(average)) = (transition.target_state(), average) else {
            debug!(?average, "no actuator change required");
            return TelemetryOutcome::Unchanged { average };
        };

        let command = ActuatorCommand::new(target);
        match self.command_sender.send_command(&device_path, &command).await {
            Ok(()) => {
                handle.update(|record| record.set_actuator(target)).await;
                info!(
                    average,
                    is_ac_on = target,
                    turned_on = transition == Transition::TurnOn,
                    "actuator switched"
                );
                TelemetryOutcome::Switched {
                    is_actuator_on: target,
                    average,
                }
            }
            Err(e) => {
                warn!(error = %e, is_ac_on = target, "actuator command not delivered");
                TelemetryOutcome::DispatchFailed {
                    requested: target,
                    reason: e.to_string(),
                }
            }
        }
    }
}
