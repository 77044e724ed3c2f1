use async_nats::HeaderMap;
use opentelemetry::{global, propagation::Extractor, Context};
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// W3C Trace Context header names
const TRACEPARENT: &str = "traceparent";
const TRACESTATE: &str = "tracestate";

/// Extractor implementation for NATS HeaderMap
struct NatsHeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for NatsHeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|v| v.as_str())
    }

    fn keys(&self) -> Vec<&str> {
        vec![TRACEPARENT, TRACESTATE]
    }
}

/// Extract the publisher's trace context from NATS headers.
pub fn extract_trace_context(headers: &HeaderMap) -> Context {
    global::get_text_map_propagator(|propagator| propagator.extract(&NatsHeaderExtractor(headers)))
}

/// Parent `span` on the trace carried by the message headers, if any.
pub fn link_span_to_headers(span: &tracing::Span, headers: Option<&HeaderMap>) {
    if let Some(headers) = headers {
        span.set_parent(extract_trace_context(headers));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::TraceContextExt;

    #[test]
    fn test_extract_from_empty_headers_has_no_remote_parent() {
        let headers = HeaderMap::new();
        let ctx = extract_trace_context(&headers);
        assert!(!ctx.has_active_span());
        assert!(!ctx.span().span_context().is_valid());
    }

    #[test]
    fn test_link_without_headers_leaves_span_unparented() {
        let span = tracing::info_span!("consume_event");
        link_span_to_headers(&span, None);
        assert!(!span.context().span().span_context().is_valid());
    }

    #[test]
    fn test_extractor_reads_traceparent() {
        let mut headers = HeaderMap::new();
        headers.insert(
            TRACEPARENT,
            "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01",
        );

        let extractor = NatsHeaderExtractor(&headers);
        let value = extractor.get(TRACEPARENT);
        assert!(value.is_some_and(|v| v.starts_with("00-")));
        assert!(extractor.get(TRACESTATE).is_none());
    }
}
