//! Ambient Prometheus metrics (`SPEC_FULL.md §10`). Grounded on the
//! project's `prometheus` + `axum` metrics exporter: a small set of
//! gauges updated by the membership and recovery loops, served on an
//! opt-in HTTP endpoint.

use prometheus::{IntGauge, Registry};

pub struct Metrics {
    pub registry: Registry,
    pub known_nodes: IntGauge,
    pub clique_size: IntGauge,
    pub membership_generation: IntGauge,
    pub recoveries_in_flight: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let known_nodes = IntGauge::new("admind_known_nodes", "Number of nodes in the configured cluster").unwrap();
        let clique_size = IntGauge::new("admind_clique_size", "Size of the locally computed clique").unwrap();
        let membership_generation =
            IntGauge::new("admind_membership_generation", "Last committed membership generation").unwrap();
        let recoveries_in_flight =
            IntGauge::new("admind_recoveries_in_flight", "Number of recoveries currently running").unwrap();

        for gauge in [&known_nodes, &clique_size, &membership_generation, &recoveries_in_flight] {
            registry.register(Box::new(gauge.clone())).ok();
        }

        Metrics {
            registry,
            known_nodes,
            clique_size,
            membership_generation,
            recoveries_in_flight,
        }
    }

    pub fn render(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&families, &mut buf).ok();
        String::from_utf8(buf).unwrap_or_default()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
