use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::models::matching::{MatchingResult, Tier};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub match_requests_total: IntCounterVec,
    pub match_latency_seconds: HistogramVec,
    pub match_candidates: HistogramVec,
    pub transitions_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let match_requests_total = IntCounterVec::new(
            Opts::new("match_requests_total", "Pilot match computations by outcome"),
            &["outcome"],
        )
        .expect("valid match_requests_total metric");

        let match_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "match_latency_seconds",
                "Latency of pilot match computation in seconds",
            ),
            &["outcome"],
        )
        .expect("valid match_latency_seconds metric");

        let match_candidates = HistogramVec::new(
            HistogramOpts::new("match_candidates", "Operators ranked into each tier")
                .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0]),
            &["tier"],
        )
        .expect("valid match_candidates metric");

        let transitions_total = IntCounterVec::new(
            Opts::new("transitions_total", "Booking status transitions by outcome"),
            &["transition", "outcome"],
        )
        .expect("valid transitions_total metric");

        registry
            .register(Box::new(match_requests_total.clone()))
            .expect("register match_requests_total");
        registry
            .register(Box::new(match_latency_seconds.clone()))
            .expect("register match_latency_seconds");
        registry
            .register(Box::new(match_candidates.clone()))
            .expect("register match_candidates");
        registry
            .register(Box::new(transitions_total.clone()))
            .expect("register transitions_total");

        Self {
            registry,
            match_requests_total,
            match_latency_seconds,
            match_candidates,
            transitions_total,
        }
    }

    pub fn observe_match(&self, outcome: &str, elapsed_secs: f64) {
        self.match_requests_total
            .with_label_values(&[outcome])
            .inc();
        self.match_latency_seconds
            .with_label_values(&[outcome])
            .observe(elapsed_secs);
    }

    pub fn observe_tiers(&self, result: &MatchingResult) {
        for tier in Tier::ALL {
            self.match_candidates
                .with_label_values(&[tier.as_str()])
                .observe(result.tier(tier).len() as f64);
        }
    }

    pub fn observe_transition(&self, transition: &str, outcome: &str) {
        self.transitions_total
            .with_label_values(&[transition, outcome])
            .inc();
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
