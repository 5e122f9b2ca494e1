//! Client for the transaction authority holding ground-truth transaction records

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Transaction record as held by the transaction service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthoritativeTransaction {
    /// Transaction service id
    #[serde(default)]
    pub id: i64,
    /// Public transaction reference
    pub reference: String,
    /// Merchant the payment belongs to
    pub merchant_id: i64,
    /// Payer email
    #[serde(default)]
    pub customer_email: String,
    /// Payer id
    #[serde(default)]
    pub customer_id: i64,
    /// Payer name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    /// Smallest currency unit
    pub amount: i64,
    /// ISO currency code
    pub currency: String,
    /// Transaction status
    #[serde(default)]
    pub status: String,
    /// Payment description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Transaction lookup failure
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthorityError {
    /// No transaction with this reference
    #[error("transaction with reference {0} not found")]
    NotFound(String),

    /// Non-success response
    #[error("transaction service returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// Response body is not a transaction
    #[error("failed to decode transaction response from transaction service: {0}")]
    Decode(String),

    /// Request could not be sent
    #[error("failed to get transaction from transaction service: {0}")]
    Transport(String),

    /// Request timed out
    #[error("transaction service request timed out")]
    Timeout,

    /// Client could not be built
    #[error("transaction service not configured: {0}")]
    NotConfigured(String),
}

impl AuthorityError {
    /// Whether the reference is unknown to the authority
    pub fn is_not_found(&self) -> bool {
        matches!(self, AuthorityError::NotFound(_))
    }
}

/// Source of authoritative transaction records
#[async_trait]
pub trait TransactionAuthority: Send + Sync {
    /// Fetch the transaction with this reference
    async fn transaction_by_reference(
        &self,
        reference: &str,
    ) -> Result<AuthoritativeTransaction, AuthorityError>;
}

/// Transaction service reached over HTTP: `GET {base}/transactions/{reference}`
#[derive(Debug, Clone)]
pub struct HttpTransactionAuthority {
    base_url: Url,
    http_client: Client,
}

impl HttpTransactionAuthority {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AuthorityError> {
        if base_url.trim().is_empty() {
            return Err(AuthorityError::NotConfigured("empty base URL".to_string()));
        }
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| AuthorityError::NotConfigured(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AuthorityError::NotConfigured(format!(
                "{} cannot be used as a base URL",
                base_url
            )));
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthorityError::NotConfigured(e.to_string()))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    fn transaction_url(&self, reference: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("transactions").push(reference);
        }
        url
    }
}

#[async_trait]
impl TransactionAuthority for HttpTransactionAuthority {
    async fn transaction_by_reference(
        &self,
        reference: &str,
    ) -> Result<AuthoritativeTransaction, AuthorityError> {
        let url = self.transaction_url(reference);
        debug!("Fetching transaction {} from {}", reference, url);

        let response = self
            .http_client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AuthorityError::Timeout
                } else {
                    AuthorityError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AuthorityError::NotFound(reference.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                "Transaction service returned {} for reference {}",
                status, reference
            );
            return Err(AuthorityError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<AuthoritativeTransaction>()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AuthorityError::Timeout
                } else {
                    AuthorityError::Decode(e.to_string())
                }
            })
    }
}

/// In-memory transaction records keyed by reference
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransactionAuthority {
    transactions: Arc<DashMap<String, AuthoritativeTransaction>>,
}

impl InMemoryTransactionAuthority {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a transaction, keyed by reference
    pub fn insert(&self, transaction: AuthoritativeTransaction) {
        self.transactions
            .insert(transaction.reference.clone(), transaction);
    }
}

#[async_trait]
impl TransactionAuthority for InMemoryTransactionAuthority {
    async fn transaction_by_reference(
        &self,
        reference: &str,
    ) -> Result<AuthoritativeTransaction, AuthorityError> {
        self.transactions
            .get(reference)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AuthorityError::NotFound(reference.to_string()))
    }
}
