use crate::domain::{ConfigureDeviceInput, OperatorOutcome, OperatorService, SendCommandInput};
use crate::http::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use common::domain::Configuration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiState {
    pub operator_service: Arc<OperatorService>,
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub ac: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct OperatorResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_version: Option<i64>,
}

impl From<OperatorOutcome> for OperatorResponse {
    fn from(outcome: OperatorOutcome) -> Self {
        match outcome {
            OperatorOutcome::Applied { config_version } => Self {
                status: "ok",
                config_version,
            },
            OperatorOutcome::DeviceNotFound => Self {
                status: "device_not_found",
                config_version: None,
            },
        }
    }
}

/// `POST /devices/{device_id}/config`
pub async fn configure_device(
    State(state): State<ApiState>,
    Path(device_id): Path<String>,
    payload: Result<Json<Configuration>, JsonRejection>,
) -> Result<Json<OperatorResponse>, ApiError> {
    let Json(configuration) = payload?;
    let outcome = state
        .operator_service
        .configure_device(ConfigureDeviceInput {
            device_id,
            configuration,
        })
        .await?;
    Ok(Json(outcome.into()))
}

/// `POST /devices/{device_id}/command`
pub async fn send_command(
    State(state): State<ApiState>,
    Path(device_id): Path<String>,
    payload: Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Json<OperatorResponse>, ApiError> {
    let Json(request) = payload?;
    let outcome = state
        .operator_service
        .send_command(SendCommandInput {
            device_id,
            is_actuator_on: request.ac,
        })
        .await?;
    Ok(Json(outcome.into()))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
