use crate::domain::{Configuration, SampleWindow};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Identity of a device within the device-management service.
/// Immutable once the record exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceIdentity {
    pub device_id: String,
    pub registry_id: String,
    pub location: String,
    pub project_id: String,
}

impl DeviceIdentity {
    pub fn new(
        device_id: impl Into<String>,
        registry_id: impl Into<String>,
        location: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            registry_id: registry_id.into(),
            location: location.into(),
            project_id: project_id.into(),
        }
    }

    /// Fully qualified resource name used to address the device remotely.
    pub fn path(&self) -> String {
        format!(
            "projects/{}/locations/{}/registries/{}/devices/{}",
            self.project_id, self.location, self.registry_id, self.device_id
        )
    }
}

/// In-memory state of one device. Only reachable through the registry.
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    identity: DeviceIdentity,
    samples: SampleWindow,
    is_actuator_on: bool,
    configuration: Configuration,
    last_telemetry_at: Option<DateTime<Utc>>,
    last_state_report_at: Option<DateTime<Utc>>,
}

impl DeviceRecord {
    pub fn new(identity: DeviceIdentity, configuration: Configuration) -> Self {
        Self {
            identity,
            samples: SampleWindow::default(),
            is_actuator_on: false,
            configuration,
            last_telemetry_at: None,
            last_state_report_at: None,
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn is_actuator_on(&self) -> bool {
        self.is_actuator_on
    }

    /// Append a temperature reading, evicting the oldest one when the window
    /// is full.
    pub fn record_sample(&mut self, temperature: i32) {
        self.samples.push(temperature);
        self.last_telemetry_at = Some(Utc::now());
    }

    pub fn average_temperature(&self) -> Option<f64> {
        self.samples.average()
    }

    /// Actuator state confirmed by a successful command dispatch.
    pub fn set_actuator(&mut self, on: bool) {
        self.is_actuator_on = on;
    }

    /// Actuator state reported by the device itself.
    pub fn apply_state_report(&mut self, on: bool) {
        self.is_actuator_on = on;
        self.last_state_report_at = Some(Utc::now());
    }

    pub fn replace_configuration(&mut self, configuration: Configuration) {
        self.configuration = configuration;
    }

    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            identity: self.identity.clone(),
            samples: self.samples.to_vec(),
            average_temperature: self.samples.average(),
            is_actuator_on: self.is_actuator_on,
            configuration: self.configuration,
            last_telemetry_at: self.last_telemetry_at,
            last_state_report_at: self.last_state_report_at,
        }
    }
}

/// Owned copy of a record, safe to hand out of the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSnapshot {
    pub identity: DeviceIdentity,
    pub samples: Vec<i32>,
    pub average_temperature: Option<f64>,
    pub is_actuator_on: bool,
    pub configuration: Configuration,
    pub last_telemetry_at: Option<DateTime<Utc>>,
    pub last_state_report_at: Option<DateTime<Utc>>,
}

/// A temperature reading reported by a device.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryEvent {
    pub identity: DeviceIdentity,
    pub temperature: i32,
    pub humidity: Option<i32>,
}

/// Actuator state reported by a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEvent {
    pub device_id: String,
    pub is_actuator_on: bool,
}
