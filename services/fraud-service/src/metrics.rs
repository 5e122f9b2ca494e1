use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Business metrics - fraud decisions
    pub static ref FRAUD_DECISIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("fraud_decisions_total", "Total fraud decisions by verdict"),
        &["decision"]
    ).expect("metric can be created");

    pub static ref FRAUD_EVALUATION_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("fraud_evaluation_failures_total", "Evaluations aborted by a hard failure"),
        &["kind"]
    ).expect("metric can be created");

    pub static ref FRAUD_EVALUATION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "fraud_evaluation_duration_seconds",
            "Fraud evaluation duration in seconds"
        )
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0])
    ).expect("metric can be created");

    pub static ref PAYMENT_LINK_CHECKS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("payment_link_checks_total", "Payment link checks by outcome"),
        &["outcome"]
    ).expect("metric can be created");

    pub static ref PAYMENT_CHANNEL_CHECKS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("payment_channel_checks_total", "Payment channel checks by outcome"),
        &["outcome"]
    ).expect("metric can be created");

    pub static ref RATE_LIMITED_REQUESTS_TOTAL: IntCounter = IntCounter::new(
        "rate_limited_requests_total",
        "Requests rejected by the per-key rate limiter"
    ).expect("metric can be created");
}

/// Register all metrics with the given registry
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(FRAUD_DECISIONS_TOTAL.clone()))?;
    registry.register(Box::new(FRAUD_EVALUATION_FAILURES_TOTAL.clone()))?;
    registry.register(Box::new(FRAUD_EVALUATION_DURATION.clone()))?;
    registry.register(Box::new(PAYMENT_LINK_CHECKS_TOTAL.clone()))?;
    registry.register(Box::new(PAYMENT_CHANNEL_CHECKS_TOTAL.clone()))?;
    registry.register(Box::new(RATE_LIMITED_REQUESTS_TOTAL.clone()))?;
    Ok(())
}

/// Register with the service registry; repeated calls are no-ops
pub fn init() {
    if let Err(e) = register_metrics(&REGISTRY) {
        tracing::debug!("Metrics already registered: {}", e);
    }
}

/// Generate metrics output in Prometheus text format
pub fn render() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
