//! Observability subsystem for confcentral
//!
//! - Typed lifecycle events, emitted through `tracing`
//! - Monotonic counters
//!
//! Observability is read-only: nothing here changes the outcome of a request.
//!
//! # Usage
//!
//! ```ignore
//! use confcentral::observability::{log_event_with_fields, Event, MetricsRegistry};
//!
//! log_event_with_fields(Event::QueryExecuted, &[("rows", "42")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_queries_executed();
//! ```

mod events;
mod metrics;

pub use events::Event;
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
///
/// Fatal events log at ERROR, rejections at WARN, everything else at INFO.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let rendered = render_fields(fields);
    if event.is_fatal() {
        tracing::error!(event = event.as_str(), fields = %rendered);
    } else if event.is_rejection() {
        tracing::warn!(event = event.as_str(), fields = %rendered);
    } else {
        tracing::info!(event = event.as_str(), fields = %rendered);
    }
}

/// Renders fields as `key=value` pairs in input order
fn render_fields(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}
