use crate::domain::StateIngestService;
use crate::nats::decode_state;
use common::nats::{BatchProcessor, InboundMessage, ProcessingResult};
use std::sync::Arc;
use tracing::{warn, Instrument};

/// State report batch processor. Reports are applied in delivery order and
/// every message is acked.
pub fn create_state_processor(service: Arc<StateIngestService>) -> BatchProcessor {
    Box::new(move |messages: Vec<InboundMessage>| {
        let service = Arc::clone(&service);

        Box::pin(async move {
            let count = messages.len();

            for message in messages {
                match decode_state(&message) {
                    Ok(event) => {
                        let span = message.consume_span("state");
                        service.process_state(event).instrument(span).await;
                    }
                    Err(e) => warn!(
                        error = %e,
                        subject = %message.subject,
                        index = message.index,
                        "dropping malformed state message"
                    ),
                }
            }

            Ok(ProcessingResult::ack_all(count))
        })
    })
}
