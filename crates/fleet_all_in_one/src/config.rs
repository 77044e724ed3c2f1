use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Console log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub log_format: String,

    // NATS configuration
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    #[serde(default = "default_telemetry_stream")]
    pub telemetry_stream: String,

    /// Subject filter of the telemetry consumer
    #[serde(default = "default_telemetry_subject")]
    pub telemetry_subject: String,

    /// Durable consumer name for telemetry
    #[serde(default = "default_telemetry_consumer")]
    pub telemetry_consumer: String,

    #[serde(default = "default_state_stream")]
    pub state_stream: String,

    #[serde(default = "default_state_subject")]
    pub state_subject: String,

    #[serde(default = "default_state_consumer")]
    pub state_consumer: String,

    #[serde(default = "default_nats_batch_size")]
    pub nats_batch_size: usize,

    /// Max wait time for batches in seconds
    #[serde(default = "default_nats_batch_wait_secs")]
    pub nats_batch_wait_secs: u64,

    /// Startup timeout for initialization operations in seconds
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    // HTTP control surface
    #[serde(default = "default_http_host")]
    pub http_host: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    // Device-management API
    #[serde(default = "default_device_manager_url")]
    pub device_manager_url: String,

    /// Bearer token sent to the device-management API, if set
    #[serde(default)]
    pub device_manager_token: Option<String>,

    #[serde(default = "default_device_manager_timeout_secs")]
    pub device_manager_timeout_secs: u64,

    // Configuration given to devices seen for the first time
    #[serde(default = "default_min_temperature")]
    pub default_min_temperature: i32,

    #[serde(default = "default_max_temperature")]
    pub default_max_temperature: i32,

    #[serde(default = "default_ping_period_secs")]
    pub default_ping_period_secs: i32,

    // OpenTelemetry configuration
    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    #[serde(default = "default_otel_enabled")]
    pub otel_enabled: bool,

    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_telemetry_stream() -> String {
    "device_telemetry".to_string()
}

fn default_telemetry_subject() -> String {
    "device_telemetry.>".to_string()
}

fn default_telemetry_consumer() -> String {
    "fleet-telemetry".to_string()
}

fn default_state_stream() -> String {
    "device_state".to_string()
}

fn default_state_subject() -> String {
    "device_state.>".to_string()
}

fn default_state_consumer() -> String {
    "fleet-state".to_string()
}

fn default_nats_batch_size() -> usize {
    50
}

fn default_nats_batch_wait_secs() -> u64 {
    5
}

fn default_startup_timeout_secs() -> u64 {
    30
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_device_manager_url() -> String {
    "https://cloudiot.googleapis.com/v1".to_string()
}

fn default_device_manager_timeout_secs() -> u64 {
    10
}

fn default_min_temperature() -> i32 {
    20
}

fn default_max_temperature() -> i32 {
    30
}

fn default_ping_period_secs() -> i32 {
    10
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_enabled() -> bool {
    false
}

fn default_otel_service_name() -> String {
    "fleet".to_string()
}

impl ServiceConfig {
    /// Load configuration from `FLEET_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("FLEET"))
            .build()?
            .try_deserialize()
    }
}
