use crate::domain::{StateIngestService, TelemetryIngestService};
use crate::nats::{create_state_processor, create_telemetry_processor};
use common::domain::{DeviceCommandSender, DeviceRegistry};
use common::nats::{JetStreamConsumer, NatsConsumer};
use fleet_runner::AppProcess;
use std::sync::Arc;
use tracing::info;

#[derive(Clone, Debug)]
pub struct DeviceControlConfig {
    pub telemetry_stream: String,
    pub telemetry_subject: String,
    pub telemetry_consumer: String,
    pub state_stream: String,
    pub state_subject: String,
    pub state_consumer: String,
    pub nats_batch_size: usize,
    pub nats_batch_wait_secs: u64,
}

/// The two ingest loops of the control service, one JetStream consumer each.
pub struct DeviceControlWorker {
    telemetry_consumer: NatsConsumer,
    state_consumer: NatsConsumer,
}

impl DeviceControlWorker {
    pub async fn new(
        registry: Arc<DeviceRegistry>,
        command_sender: Arc<dyn DeviceCommandSender>,
        jetstream: Arc<dyn JetStreamConsumer>,
        config: DeviceControlConfig,
    ) -> anyhow::Result<Self> {
        info!("Initializing device control worker");

        let telemetry_service = Arc::new(TelemetryIngestService::new(
            registry.clone(),
            command_sender,
        ));
        let telemetry_consumer = NatsConsumer::new(
            jetstream.clone(),
            &config.telemetry_stream,
            &config.telemetry_consumer,
            &config.telemetry_subject,
            config.nats_batch_size,
            config.nats_batch_wait_secs,
            create_telemetry_processor(telemetry_service),
        )
        .await?;

        let state_service = Arc::new(StateIngestService::new(registry));
        let state_consumer = NatsConsumer::new(
            jetstream,
            &config.state_stream,
            &config.state_consumer,
            &config.state_subject,
            config.nats_batch_size,
            config.nats_batch_wait_secs,
            create_state_processor(state_service),
        )
        .await?;

        info!("Device control worker initialized");

        Ok(Self {
            telemetry_consumer,
            state_consumer,
        })
    }

    pub fn into_runner_processes(self) -> Vec<(&'static str, AppProcess)> {
        vec![
            ("telemetry_ingest", consumer_process(self.telemetry_consumer)),
            ("state_ingest", consumer_process(self.state_consumer)),
        ]
    }
}

fn consumer_process(consumer: NatsConsumer) -> AppProcess {
    Box::new(move |ctx| Box::pin(async move { consumer.run(ctx).await }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::MockDeviceCommandSender;
    use common::nats::{MockJetStreamConsumer, MockPullConsumer};
    use tokio_util::sync::CancellationToken;

    fn config() -> DeviceControlConfig {
        DeviceControlConfig {
            telemetry_stream: "device_telemetry".to_string(),
            telemetry_subject: "device_telemetry.>".to_string(),
            telemetry_consumer: "fleet-telemetry".to_string(),
            state_stream: "device_state".to_string(),
            state_subject: "device_state.>".to_string(),
            state_consumer: "fleet-state".to_string(),
            nats_batch_size: 20,
            nats_batch_wait_secs: 1,
        }
    }

    #[tokio::test]
    async fn test_worker_creates_one_consumer_per_stream() {
        let mut jetstream = MockJetStreamConsumer::new();
        jetstream
            .expect_create_consumer()
            .withf(|config, stream| {
                stream == "device_telemetry"
                    && config.durable_name.as_deref() == Some("fleet-telemetry")
            })
            .times(1)
            .returning(|_, _| {
                let mut pull = MockPullConsumer::new();
                pull.expect_fetch_messages().returning(|_, _| Ok(Vec::new()));
                Ok(Box::new(pull))
            });
        jetstream
            .expect_create_consumer()
            .withf(|config, stream| {
                stream == "device_state" && config.filter_subject == "device_state.>"
            })
            .times(1)
            .returning(|_, _| {
                let mut pull = MockPullConsumer::new();
                pull.expect_fetch_messages().returning(|_, _| Ok(Vec::new()));
                Ok(Box::new(pull))
            });

        let worker = DeviceControlWorker::new(
            Arc::new(DeviceRegistry::new()),
            Arc::new(MockDeviceCommandSender::new()),
            Arc::new(jetstream),
            config(),
        )
        .await
        .unwrap();

        let processes = worker.into_runner_processes();
        let names: Vec<_> = processes.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["telemetry_ingest", "state_ingest"]);

        let ctx = CancellationToken::new();
        ctx.cancel();
        for (_, process) in processes {
            process(ctx.clone()).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_worker_fails_when_consumer_cannot_be_created() {
        let mut jetstream = MockJetStreamConsumer::new();
        jetstream
            .expect_create_consumer()
            .returning(|_, _| Err(anyhow::anyhow!("stream device_telemetry not found")));

        let result = DeviceControlWorker::new(
            Arc::new(DeviceRegistry::new()),
            Arc::new(MockDeviceCommandSender::new()),
            Arc::new(jetstream),
            config(),
        )
        .await;

        assert!(result.is_err());
    }
}
