use crate::domain::TelemetryIngestService;
use crate::nats::decode_telemetry;
use common::domain::TelemetryEvent;
use common::nats::{BatchProcessor, InboundMessage, ProcessingResult};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{warn, Instrument, Span};

/// Telemetry batch processor.
///
/// Events are grouped by device: one device's readings are applied in
/// delivery order, different devices proceed concurrently. Every message is
/// acked, malformed ones included, since redelivery would not fix them and
/// dispatch failures are re-evaluated on the next reading.
pub fn create_telemetry_processor(service: Arc<TelemetryIngestService>) -> BatchProcessor {
    Box::new(move |messages: Vec<InboundMessage>| {
        let service = Arc::clone(&service);

        Box::pin(async move {
            let count = messages.len();

            join_all(group_by_device(messages).into_iter().map(|events| {
                let service = Arc::clone(&service);
                async move {
                    for (span, event) in events {
                        service.process_telemetry(event).instrument(span).await;
                    }
                }
            }))
            .await;

            Ok(ProcessingResult::ack_all(count))
        })
    })
}

fn group_by_device(messages: Vec<InboundMessage>) -> Vec<Vec<(Span, TelemetryEvent)>> {
    let mut groups: Vec<Vec<(Span, TelemetryEvent)>> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for message in messages {
        let event = match decode_telemetry(&message) {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    error = %e,
                    subject = %message.subject,
                    index = message.index,
                    "dropping malformed telemetry message"
                );
                continue;
            }
        };

        let span = message.consume_span("telemetry");
        let position = *positions
            .entry(event.identity.device_id.clone())
            .or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
        groups[position].push((span, event));
    }

    groups
}
