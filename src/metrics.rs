//! Prometheus counters for the alias and telemetry paths.
//!
//! Counters live in a process-wide registry and are exported in the
//! Prometheus text format by `GET /metrics`.

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

/// Global metrics instance
pub static METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);

/// Application metrics container
pub struct Metrics {
    registry: Registry,

    /// Hit events accepted by the telemetry queue
    pub hits_enqueued_total: IntCounter,
    /// Hit events applied to the row store
    pub hits_recorded_total: IntCounter,
    /// Hit events the aggregator failed to apply
    pub hits_failed_total: IntCounter,
    /// Creations rejected because all ten offsets of an alias were taken
    pub collisions_exhausted_total: IntCounter,
}

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new();

        let hits_enqueued_total = IntCounter::new(
            "url_alias_hits_enqueued_total",
            "Hit events accepted by the telemetry queue",
        )
        .expect("Failed to create hits_enqueued_total metric");

        let hits_recorded_total = IntCounter::new(
            "url_alias_hits_recorded_total",
            "Hit events applied to the row store",
        )
        .expect("Failed to create hits_recorded_total metric");

        let hits_failed_total = IntCounter::new(
            "url_alias_hits_failed_total",
            "Hit events that could not be applied",
        )
        .expect("Failed to create hits_failed_total metric");

        let collisions_exhausted_total = IntCounter::new(
            "url_alias_collisions_exhausted_total",
            "Creations rejected with every alias offset taken",
        )
        .expect("Failed to create collisions_exhausted_total metric");

        for counter in [
            &hits_enqueued_total,
            &hits_recorded_total,
            &hits_failed_total,
            &collisions_exhausted_total,
        ] {
            registry
                .register(Box::new(counter.clone()))
                .expect("Failed to register counter");
        }

        Self {
            registry,
            hits_enqueued_total,
            hits_recorded_total,
            hits_failed_total,
            collisions_exhausted_total,
        }
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_lists_every_counter() {
        let text = METRICS.export().unwrap();

        for name in [
            "url_alias_hits_enqueued_total",
            "url_alias_hits_recorded_total",
            "url_alias_hits_failed_total",
            "url_alias_collisions_exhausted_total",
        ] {
            assert!(text.contains(name), "missing {name}");
        }
    }

    #[test]
    fn test_increment_is_exported() {
        let before = METRICS.collisions_exhausted_total.get();
        METRICS.collisions_exhausted_total.inc();

        assert!(METRICS.collisions_exhausted_total.get() > before);
        assert!(METRICS.export().unwrap().contains("# TYPE url_alias_collisions_exhausted_total counter"));
    }
}
