use common::domain::{DeviceIdentity, DomainError, DomainResult, StateEvent, TelemetryEvent};
use common::nats::InboundMessage;
use serde::Deserialize;

pub const DEVICE_ID_HEADER: &str = "deviceId";
pub const REGISTRY_ID_HEADER: &str = "deviceRegistryId";
pub const LOCATION_HEADER: &str = "deviceRegistryLocation";
pub const PROJECT_ID_HEADER: &str = "projectId";

#[derive(Deserialize)]
struct TelemetryPayload {
    temperature: i32,
    #[serde(default)]
    humidity: Option<i32>,
}

#[derive(Deserialize)]
struct StatePayload {
    ac: bool,
}

fn device_id(message: &InboundMessage) -> DomainResult<String> {
    match message.header(DEVICE_ID_HEADER) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(DomainError::MalformedEvent(format!(
            "missing {} header",
            DEVICE_ID_HEADER
        ))),
    }
}

/// Decode a telemetry message: identity from headers, reading from the JSON body.
pub fn decode_telemetry(message: &InboundMessage) -> DomainResult<TelemetryEvent> {
    let device_id = device_id(message)?;
    let payload: TelemetryPayload = serde_json::from_slice(&message.payload)
        .map_err(|e| DomainError::MalformedEvent(format!("telemetry payload: {}", e)))?;

    let attribute = |name| message.header(name).unwrap_or_default();
    Ok(TelemetryEvent {
        identity: DeviceIdentity::new(
            device_id,
            attribute(REGISTRY_ID_HEADER),
            attribute(LOCATION_HEADER),
            attribute(PROJECT_ID_HEADER),
        ),
        temperature: payload.temperature,
        humidity: payload.humidity,
    })
}

/// Decode a device state report (`{"ac": bool}`).
pub fn decode_state(message: &InboundMessage) -> DomainResult<StateEvent> {
    let device_id = device_id(message)?;
    let payload: StatePayload = serde_json::from_slice(&message.payload)
        .map_err(|e| DomainError::MalformedEvent(format!("state payload: {}", e)))?;

    Ok(StateEvent {
        device_id,
        is_actuator_on: payload.ac,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telemetry_message(payload: &'static str) -> InboundMessage {
        InboundMessage::new(0, "device_telemetry.acme", payload)
            .with_header(DEVICE_ID_HEADER, "thermo-1")
            .with_header(REGISTRY_ID_HEADER, "greenhouse")
            .with_header(LOCATION_HEADER, "europe-west1")
            .with_header(PROJECT_ID_HEADER, "acme")
    }

    #[test]
    fn test_decode_telemetry() {
        let event = decode_telemetry(&telemetry_message(r#"{"temperature":26,"humidity":40}"#))
            .unwrap();
        assert_eq!(
            event.identity,
            DeviceIdentity::new("thermo-1", "greenhouse", "europe-west1", "acme")
        );
        assert_eq!(event.temperature, 26);
        assert_eq!(event.humidity, Some(40));
    }

    #[test]
    fn test_decode_telemetry_without_humidity() {
        let event = decode_telemetry(&telemetry_message(r#"{"temperature":-3}"#)).unwrap();
        assert_eq!(event.temperature, -3);
        assert_eq!(event.humidity, None);
    }

    #[test]
    fn test_decode_telemetry_missing_device_id() {
        let message = InboundMessage::new(0, "device_telemetry.acme", r#"{"temperature":26}"#);
        let err = decode_telemetry(&message).unwrap_err();
        assert!(matches!(err, DomainError::MalformedEvent(_)));
    }

    #[test]
    fn test_decode_telemetry_bad_payload() {
        let err = decode_telemetry(&telemetry_message(r#"{"temperature":"hot"}"#)).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(decode_telemetry(&telemetry_message("not json")).is_err());
    }

    #[test]
    fn test_decode_state() {
        let message = InboundMessage::new(0, "device_state.acme", r#"{"ac":true}"#)
            .with_header(DEVICE_ID_HEADER, "thermo-1");
        let event = decode_state(&message).unwrap();
        assert_eq!(event.device_id, "thermo-1");
        assert!(event.is_actuator_on);
    }

    #[test]
    fn test_decode_state_rejects_empty_device_id() {
        let message = InboundMessage::new(0, "device_state.acme", r#"{"ac":false}"#)
            .with_header(DEVICE_ID_HEADER, "");
        assert!(decode_state(&message).is_err());
    }
}
