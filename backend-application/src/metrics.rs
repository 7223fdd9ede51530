use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    messages_received: AtomicU64,
    messages_skipped: AtomicU64,
    events_detected: AtomicU64,
    events_delivered: AtomicU64,
    events_stored_locally: AtomicU64,
    model_unavailable: AtomicU64,
    delivery_failures: AtomicU64,
    store_errors: AtomicU64,
}

impl Metrics {
    pub fn record_message(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.messages_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detected(&self) {
        self.events_detected.fetch_add(1, Ordering::Relaxed);
    }

    /// Persisted by the outbound deadline API.
    pub fn record_delivered(&self) {
        self.events_delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Persisted directly through the record store.
    pub fn record_stored_locally(&self) {
        self.events_stored_locally.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_model_unavailable(&self) {
        self.model_unavailable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn events_recorded(&self) -> u64 {
        self.events_delivered.load(Ordering::Relaxed)
            + self.events_stored_locally.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let counters = [
            ("eventory_messages_received_total", &self.messages_received),
            ("eventory_messages_skipped_total", &self.messages_skipped),
            ("eventory_events_detected_total", &self.events_detected),
            ("eventory_events_delivered_total", &self.events_delivered),
            ("eventory_events_stored_locally_total", &self.events_stored_locally),
            ("eventory_model_unavailable_total", &self.model_unavailable),
            ("eventory_delivery_failures_total", &self.delivery_failures),
            ("eventory_store_errors_total", &self.store_errors),
        ];

        let mut out = String::new();
        for (name, counter) in counters {
            out.push_str(&format!(
                "# TYPE {name} counter\n{name} {}\n",
                counter.load(Ordering::Relaxed)
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_every_counter() {
        let metrics = Metrics::default();
        metrics.record_message();
        metrics.record_delivered();
        metrics.record_stored_locally();
        metrics.record_stored_locally();
        let text = metrics.render_prometheus();
        assert!(text.contains("eventory_messages_received_total 1\n"));
        assert!(text.contains("eventory_events_delivered_total 1\n"));
        assert!(text.contains("eventory_events_stored_locally_total 2\n"));
        assert!(text.contains("# TYPE eventory_store_errors_total counter\n"));
        assert_eq!(metrics.events_recorded(), 3);
    }
}
