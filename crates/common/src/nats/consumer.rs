use crate::nats::{InboundMessage, JetStreamConsumer, PullConsumer};
use anyhow::{Context, Result};
use async_nats::jetstream::{self, Message};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Result of processing a batch of messages
/// Provides fine-grained control over which messages to acknowledge vs reject
#[derive(Debug, Default, PartialEq)]
pub struct ProcessingResult {
    /// Indices of messages to acknowledge (Ack)
    pub ack: Vec<usize>,
    /// Indices of messages to reject (Nak) for redelivery, with optional error details
    pub nak: Vec<(usize, Option<String>)>,
}

impl ProcessingResult {
    pub fn ack_all(count: usize) -> Self {
        Self {
            ack: (0..count).collect(),
            nak: Vec::new(),
        }
    }

    pub fn nak_all(count: usize, error: Option<String>) -> Self {
        Self {
            ack: Vec::new(),
            nak: (0..count).map(|i| (i, error.clone())).collect(),
        }
    }
}

/// Batch processor: decodes and handles a batch, then says which message
/// indices to ack or nak. Returning an error naks the whole batch.
pub type BatchProcessor =
    Box<dyn Fn(Vec<InboundMessage>) -> BoxFuture<'static, Result<ProcessingResult>> + Send + Sync>;

/// Durable JetStream pull consumer that feeds batches to a [`BatchProcessor`].
///
/// Only consumer creation can fail the process; errors while fetching or
/// processing a batch are logged and the loop keeps going.
pub struct NatsConsumer {
    consumer: Box<dyn PullConsumer>,
    stream_name: String,
    consumer_name: String,
    batch_size: usize,
    max_wait: Duration,
    processor: BatchProcessor,
}

impl NatsConsumer {
    pub async fn new(
        jetstream: Arc<dyn JetStreamConsumer>,
        stream_name: &str,
        consumer_name: &str,
        subject_filter: &str,
        batch_size: usize,
        max_wait_secs: u64,
        processor: BatchProcessor,
    ) -> Result<Self> {
        debug!(
            stream = stream_name,
            consumer = consumer_name,
            subject = subject_filter,
            "Creating JetStream consumer"
        );

        let consumer = jetstream
            .create_consumer(
                jetstream::consumer::pull::Config {
                    name: Some(consumer_name.to_string()),
                    durable_name: Some(consumer_name.to_string()),
                    filter_subject: subject_filter.to_string(),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    ..Default::default()
                },
                stream_name,
            )
            .await
            .with_context(|| format!("Failed to create consumer {}", consumer_name))?;

        info!(
            stream = stream_name,
            consumer = consumer_name,
            "Consumer created successfully"
        );

        Ok(Self {
            consumer,
            stream_name: stream_name.to_string(),
            consumer_name: consumer_name.to_string(),
            batch_size,
            max_wait: Duration::from_secs(max_wait_secs),
            processor,
        })
    }

    pub async fn run(&self, ctx: CancellationToken) -> Result<()> {
        info!(
            stream = %self.stream_name,
            consumer = %self.consumer_name,
            "Starting consumer loop"
        );

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!(consumer = %self.consumer_name, "Received shutdown signal, stopping consumer");
                    break;
                }
                result = self.fetch_and_process_batch() => {
                    if let Err(e) = result {
                        error!(consumer = %self.consumer_name, error = %e, "Error processing batch");
                        tokio::select! {
                            _ = ctx.cancelled() => break,
                            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                        }
                    }
                }
            }
        }

        info!(consumer = %self.consumer_name, "Consumer stopped gracefully");
        Ok(())
    }

    async fn fetch_and_process_batch(&self) -> Result<()> {
        let raw_messages = self
            .consumer
            .fetch_messages(self.batch_size, self.max_wait)
            .await?;

        if raw_messages.is_empty() {
            debug!(consumer = %self.consumer_name, "No messages in batch");
            return Ok(());
        }

        debug!(
            consumer = %self.consumer_name,
            message_count = raw_messages.len(),
            "Received message batch"
        );

        let inbound = to_inbound(&raw_messages);
        let processing_result = match (self.processor)(inbound).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Processor returned error, rejecting all messages");
                ProcessingResult::nak_all(raw_messages.len(), Some(e.to_string()))
            }
        };

        settle(&raw_messages, processing_result).await;
        Ok(())
    }
}

fn to_inbound(messages: &[Message]) -> Vec<InboundMessage> {
    messages
        .iter()
        .enumerate()
        .map(|(index, msg)| InboundMessage {
            index,
            subject: msg.subject.to_string(),
            payload: msg.payload.clone(),
            headers: msg.headers.clone(),
        })
        .collect()
}

async fn settle(messages: &[Message], result: ProcessingResult) {
    let ack_count = result.ack.len();
    for idx in result.ack {
        match messages.get(idx) {
            Some(msg) => {
                if let Err(e) = msg.ack().await {
                    error!(error = %e, message_index = idx, "Failed to acknowledge message");
                }
            }
            None => warn!(
                message_index = idx,
                batch_size = messages.len(),
                "Invalid ack index in ProcessingResult"
            ),
        }
    }
    if ack_count > 0 {
        debug!(ack_count, "Acknowledged messages");
    }

    let nak_count = result.nak.len();
    for (idx, reason) in result.nak {
        match messages.get(idx) {
            Some(msg) => {
                warn!(
                    message_index = idx,
                    subject = %msg.subject,
                    reason = reason.as_deref().unwrap_or("unspecified"),
                    "Rejecting message for redelivery"
                );
                if let Err(e) = msg.ack_with(jetstream::AckKind::Nak(None)).await {
                    error!(error = %e, message_index = idx, "Failed to reject message");
                }
            }
            None => warn!(
                message_index = idx,
                batch_size = messages.len(),
                "Invalid nak index in ProcessingResult"
            ),
        }
    }
    if nak_count > 0 {
        debug!(nak_count, "Rejected messages for redelivery");
    }
}
