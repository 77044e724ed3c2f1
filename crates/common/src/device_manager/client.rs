use crate::domain::{
    ActuatorCommand, Configuration, DeviceCommandSender, DeviceConfigUpdater, DomainError,
    DomainResult,
};
use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Clone, Debug)]
pub struct DeviceManagerConfig {
    /// e.g. `https://cloudiot.googleapis.com/v1`
    pub base_url: String,
    pub access_token: Option<String>,
    pub request_timeout: Duration,
}

impl Default for DeviceManagerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8085/v1".to_string(),
            access_token: None,
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendCommandRequest {
    binary_data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModifyConfigRequest {
    version_to_update: String,
    binary_data: String,
}

/// int64 fields come back as JSON strings from the device manager, but some
/// emulators answer with plain numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum Int64Field {
    Number(i64),
    Text(String),
}

#[derive(Deserialize)]
struct DeviceConfigResponse {
    version: Int64Field,
}

/// HTTP client for the device-management service.
pub struct DeviceManagerClient {
    http: reqwest::Client,
    config: DeviceManagerConfig,
}

impl DeviceManagerClient {
    pub fn new(config: DeviceManagerConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build device manager HTTP client")?;

        Ok(Self { http, config })
    }

    fn verb_url(&self, device_path: &str, verb: &str) -> String {
        format!(
            "{}/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            device_path,
            verb
        )
    }

    async fn post<B: Serialize>(&self, url: &str, body: &B) -> Result<reqwest::Response, String> {
        let mut request = self.http.post(url).json(body);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(format!("device manager returned {}: {}", status, body))
    }
}

fn encode_payload<T: Serialize>(payload: &T) -> DomainResult<String> {
    let json = serde_json::to_vec(payload).context("Failed to serialize device payload")?;
    Ok(STANDARD.encode(json))
}

#[async_trait]
impl DeviceCommandSender for DeviceManagerClient {
    #[instrument(skip(self), fields(is_ac_on = command.is_actuator_on))]
    async fn send_command(&self, device_path: &str, command: &ActuatorCommand) -> DomainResult<()> {
        let body = SendCommandRequest {
            binary_data: encode_payload(command)?,
        };
        let url = self.verb_url(device_path, "sendCommandToDevice");

        self.post(&url, &body).await.map_err(|reason| {
            warn!(device_path, reason = %reason, "Command dispatch failed");
            DomainError::CommandDispatchFailed {
                device_path: device_path.to_string(),
                reason,
            }
        })?;

        debug!(device_path, "Command sent to device");
        Ok(())
    }
}

#[async_trait]
impl DeviceConfigUpdater for DeviceManagerClient {
    #[instrument(skip(self, configuration))]
    async fn update_config(
        &self,
        device_path: &str,
        configuration: &Configuration,
    ) -> DomainResult<i64> {
        let body = ModifyConfigRequest {
            version_to_update: "0".to_string(),
            binary_data: encode_payload(configuration)?,
        };
        let url = self.verb_url(device_path, "modifyCloudToDeviceConfig");

        let failed = |reason: String| {
            warn!(device_path, reason = %reason, "Configuration update failed");
            DomainError::ConfigUpdateFailed {
                device_path: device_path.to_string(),
                reason,
            }
        };

        let response = self.post(&url, &body).await.map_err(failed)?;
        let parsed: DeviceConfigResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("invalid response body: {}", e)))?;

        let version = match parsed.version {
            Int64Field::Number(version) => version,
            Int64Field::Text(text) => text
                .parse()
                .map_err(|_| failed(format!("invalid config version: {}", text)))?,
        };

        debug!(device_path, version, "Configuration pushed to device");
        Ok(version)
    }
}
