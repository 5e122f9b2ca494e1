//! Historical and reputation data for data-dependent rules

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Past transaction of a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Transaction id
    pub id: String,
    /// Amount in major currency units
    pub amount: f64,
    /// ISO currency code
    pub currency: String,
    /// When the transaction happened
    pub timestamp: DateTime<Utc>,
}

/// Reputation of an IP address or device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reputation {
    /// Known VPN exit
    #[serde(default)]
    pub is_vpn: bool,
    /// Known proxy
    #[serde(default)]
    pub is_proxy: bool,
    /// Tor exit node
    #[serde(default)]
    pub is_tor: bool,
    /// On a blacklist
    #[serde(default)]
    pub blacklisted: bool,
    /// Provider risk score, 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<u8>,
}

impl Reputation {
    /// Traffic is relayed through an anonymizing service
    pub fn is_anonymizer(&self) -> bool {
        self.is_vpn || self.is_proxy || self.is_tor
    }
}

/// Source of historical and contextual fraud data
///
/// A customer with no history is an empty result, never an error. Unknown
/// addresses and devices are `None`. `Error::DataUnavailable` is reserved for
/// backend failures.
#[async_trait]
pub trait FraudDataProvider: Send + Sync {
    /// History records of a customer within `lookback` of now, in no particular order
    async fn transaction_history(
        &self,
        customer_id: &str,
        lookback: Duration,
    ) -> Result<Vec<HistoryRecord>>;

    /// Reputation of an IP address, `None` if unknown
    async fn ip_reputation(&self, address: &str) -> Result<Option<Reputation>>;

    /// Reputation of a device, `None` if unknown
    async fn device_reputation(&self, device_id: &str) -> Result<Option<Reputation>>;
}

/// Seed document for the in-memory provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    /// customer_id -> history
    #[serde(default)]
    pub transactions: HashMap<String, Vec<HistoryRecord>>,
    /// address -> reputation
    #[serde(default)]
    pub ip_reputation: HashMap<String, Reputation>,
    /// device_id -> reputation
    #[serde(default)]
    pub device_reputation: HashMap<String, Reputation>,
    /// channel_type -> known fraudulent transaction ids
    #[serde(default)]
    pub flagged_channel_transactions: HashMap<String, Vec<String>>,
}

/// Process-lifetime, in-memory fraud data with no eviction
#[derive(Debug, Clone, Default)]
pub struct InMemoryFraudDataProvider {
    // Map: customer_id -> history
    transactions: Arc<DashMap<String, Vec<HistoryRecord>>>,
    ip_data: Arc<DashMap<String, Reputation>>,
    device_data: Arc<DashMap<String, Reputation>>,
}

impl InMemoryFraudDataProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider loaded with `seed`
    pub fn from_seed(seed: &SeedData) -> Self {
        let provider = Self::new();
        provider.load_seed(seed);
        provider
    }

    /// Append a history record for a customer
    pub fn add_transaction(&self, customer_id: &str, record: HistoryRecord) {
        self.transactions
            .entry(customer_id.to_string())
            .or_default()
            .push(record);
    }

    /// Set or replace the reputation of an IP address
    pub fn set_ip_reputation(&self, address: &str, reputation: Reputation) {
        self.ip_data.insert(address.to_string(), reputation);
    }

    /// Set or replace the reputation of a device
    pub fn set_device_reputation(&self, device_id: &str, reputation: Reputation) {
        self.device_data.insert(device_id.to_string(), reputation);
    }

    /// Append seeded history and replace seeded reputations
    pub fn load_seed(&self, seed: &SeedData) {
        for (customer_id, records) in &seed.transactions {
            for record in records {
                self.add_transaction(customer_id, record.clone());
            }
        }
        for (address, reputation) in &seed.ip_reputation {
            self.set_ip_reputation(address, reputation.clone());
        }
        for (device_id, reputation) in &seed.device_reputation {
            self.set_device_reputation(device_id, reputation.clone());
        }

        info!(
            "Seeded fraud data: {} customers, {} IP reputations, {} device reputations",
            seed.transactions.len(),
            seed.ip_reputation.len(),
            seed.device_reputation.len()
        );
    }

    /// Number of customers with history
    pub fn tracked_customers(&self) -> usize {
        self.transactions.len()
    }
}

#[async_trait]
impl FraudDataProvider for InMemoryFraudDataProvider {
    async fn transaction_history(
        &self,
        customer_id: &str,
        lookback: Duration,
    ) -> Result<Vec<HistoryRecord>> {
        // Windows reaching past the representable range cover all history
        let cutoff = Utc::now()
            .checked_sub_signed(lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let recent: Vec<HistoryRecord> = self
            .transactions
            .get(customer_id)
            .map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|record| record.timestamp > cutoff)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        debug!(
            "Customer {} has {} transactions since {}",
            customer_id,
            recent.len(),
            cutoff
        );

        Ok(recent)
    }

    async fn ip_reputation(&self, address: &str) -> Result<Option<Reputation>> {
        Ok(self.ip_data.get(address).map(|entry| entry.value().clone()))
    }

    async fn device_reputation(&self, device_id: &str) -> Result<Option<Reputation>> {
        Ok(self.device_data.get(device_id).map(|entry| entry.value().clone()))
    }
}
