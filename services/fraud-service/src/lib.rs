//! HTTP boundary of the Kodra Pay fraud engine

pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;

use fraud_engine::{
    DecisionEngine, PaymentChannelValidator, PaymentLinkValidator, TransactionAuthority,
};
use std::sync::Arc;
use std::time::Instant;

/// Components shared by every worker
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DecisionEngine>,
    pub link_validator: Arc<PaymentLinkValidator>,
    pub channel_validator: Arc<PaymentChannelValidator>,
    pub authority: Arc<dyn TransactionAuthority>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        engine: DecisionEngine,
        authority: Arc<dyn TransactionAuthority>,
        link_validator: PaymentLinkValidator,
        channel_validator: PaymentChannelValidator,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            link_validator: Arc::new(link_validator),
            channel_validator: Arc::new(channel_validator),
            authority,
            started_at: Instant::now(),
        }
    }
}
