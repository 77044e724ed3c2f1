mod config;

use common::device_manager::{DeviceManagerClient, DeviceManagerConfig};
use common::domain::{Configuration, DeviceRegistry};
use common::nats::NatsClient;
use common::telemetry::{
    init_telemetry, shutdown_telemetry, LogFormat, TelemetryConfig, TelemetryProviders,
};
use crate::config::ServiceConfig;
use device_api::domain::OperatorService;
use device_api::http::HttpServerConfig;
use device_api::DeviceApi;
use device_control::{DeviceControlConfig, DeviceControlWorker};
use fleet_runner::Runner;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let log_format: LogFormat = match config.log_format.parse() {
        Ok(format) => format,
        Err(e) => {
            eprintln!("Invalid log format: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry_providers: Option<TelemetryProviders> = match init_telemetry(&TelemetryConfig {
        service_name: config.otel_service_name.clone(),
        otel_endpoint: config.otel_endpoint.clone(),
        otel_enabled: config.otel_enabled,
        log_level: config.log_level.clone(),
        log_format,
    }) {
        Ok(providers) => providers,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        otel_enabled = config.otel_enabled,
        otel_endpoint = %config.otel_endpoint,
        "Starting fleet-all-in-one service"
    );
    debug!("Configuration: {:?}", config);

    let default_configuration = Configuration {
        min_temperature: config.default_min_temperature,
        max_temperature: config.default_max_temperature,
        ping_period_seconds: config.default_ping_period_secs,
    };
    if let Err(e) = default_configuration.validate_bounds() {
        error!("Invalid default device configuration: {}", e);
        std::process::exit(1);
    }
    let registry = Arc::new(DeviceRegistry::with_default_configuration(
        default_configuration,
    ));

    let device_manager = match DeviceManagerClient::new(DeviceManagerConfig {
        base_url: config.device_manager_url.clone(),
        access_token: config.device_manager_token.clone(),
        request_timeout: Duration::from_secs(config.device_manager_timeout_secs),
    }) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create device manager client: {:#}", e);
            std::process::exit(1);
        }
    };

    let nats_client = match initialize_nats(&config).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to initialize NATS: {:#}", e);
            std::process::exit(1);
        }
    };

    let control_worker = match DeviceControlWorker::new(
        registry.clone(),
        device_manager.clone(),
        nats_client.create_consumer_client(),
        DeviceControlConfig {
            telemetry_stream: config.telemetry_stream.clone(),
            telemetry_subject: config.telemetry_subject.clone(),
            telemetry_consumer: config.telemetry_consumer.clone(),
            state_stream: config.state_stream.clone(),
            state_subject: config.state_subject.clone(),
            state_consumer: config.state_consumer.clone(),
            nats_batch_size: config.nats_batch_size,
            nats_batch_wait_secs: config.nats_batch_wait_secs,
        },
    )
    .await
    {
        Ok(worker) => worker,
        Err(e) => {
            error!("Failed to initialize device control worker: {:#}", e);
            std::process::exit(1);
        }
    };

    let operator_service = Arc::new(OperatorService::new(
        registry,
        device_manager.clone(),
        device_manager,
    ));
    let device_api = DeviceApi::new(
        operator_service,
        HttpServerConfig {
            host: config.http_host.clone(),
            port: config.http_port,
        },
    );

    let mut runner = Runner::new().with_named_process("device_api", device_api.into_runner_process());

    for (name, process) in control_worker.into_runner_processes() {
        runner = runner.with_named_process(name, process);
    }

    runner = runner
        .with_closer({
            let nats_for_close = Arc::clone(&nats_client);
            move || {
                Box::pin(async move {
                    info!("Running cleanup tasks...");
                    if let Err(e) = nats_for_close.close().await {
                        error!("Failed to close NATS connection: {:#}", e);
                    }

                    shutdown_telemetry(telemetry_providers);

                    info!("Cleanup complete");
                    Ok(())
                })
            }
        })
        .with_closer_timeout(Duration::from_secs(10));

    runner.run().await;
}

async fn initialize_nats(config: &ServiceConfig) -> anyhow::Result<Arc<NatsClient>> {
    info!("Initializing NATS...");
    let nats_client = NatsClient::connect(
        &config.nats_url,
        Duration::from_secs(config.startup_timeout_secs),
    )
    .await?;

    nats_client
        .ensure_stream(&config.telemetry_stream, &config.telemetry_subject)
        .await?;
    nats_client
        .ensure_stream(&config.state_stream, &config.state_subject)
        .await?;

    Ok(Arc::new(nats_client))
}
