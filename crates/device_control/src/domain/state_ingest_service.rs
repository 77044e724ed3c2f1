use common::domain::{DeviceRegistry, StateEvent};
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateOutcome {
    Applied { previous: bool, current: bool },
    /// Reports for devices that never sent telemetry are ignored.
    UnknownDevice,
}

/// Reconciles actuator state reported by devices into the registry.
/// Once a device reports, its word overrides whatever was last commanded.
pub struct StateIngestService {
    registry: Arc<DeviceRegistry>,
}

impl StateIngestService {
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self { registry }
    }

    #[instrument(skip(self, event), fields(device_id = %event.device_id, is_ac_on = event.is_actuator_on))]
    pub async fn process_state(&self, event: StateEvent) -> StateOutcome {
        let Some(handle) = self.registry.get(&event.device_id).await else {
            debug!("state report for unknown device ignored");
            return StateOutcome::UnknownDevice;
        };

        let previous = handle
            .update(|record| {
                let previous = record.is_actuator_on();
                record.apply_state_report(event.is_actuator_on);
                previous
            })
            .await;

        if previous != event.is_actuator_on {
            info!(previous, "device reported actuator change");
        }

        StateOutcome::Applied {
            previous,
            current: event.is_actuator_on,
        }
    }
}
