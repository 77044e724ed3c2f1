use crate::nats::link_span_to_headers;
use async_nats::HeaderMap;
use bytes::Bytes;

/// Owned view of a fetched JetStream message handed to batch processors.
///
/// Processors work on these instead of `jetstream::Message` so they can run
/// (and be tested) without a live NATS connection. Acknowledgement stays
/// with the consumer, keyed by `index`.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Position of the message in the fetched batch
    pub index: usize,
    pub subject: String,
    pub payload: Bytes,
    pub headers: Option<HeaderMap>,
}

impl InboundMessage {
    pub fn new(index: usize, subject: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            index,
            subject: subject.into(),
            payload: payload.into(),
            headers: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .get_or_insert_with(HeaderMap::new)
            .insert(name, value);
        self
    }

    /// Header value (message attribute), if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()
            .and_then(|headers| headers.get(name))
            .map(|value| value.as_str())
    }

    /// Span for handling this message, parented on the publisher's trace.
    pub fn consume_span(&self, name: &'static str) -> tracing::Span {
        let span = tracing::info_span!(
            "consume_message",
            handler = name,
            subject = %self.subject,
            message_index = self.index
        );
        link_span_to_headers(&span, self.headers.as_ref());
        span
    }
}
