//! Payment-link validation against the transaction authority
//!
//! A payment link carries transaction terms in its query string. Anyone
//! holding the link can edit it, so the terms are checked against the record
//! held by the transaction authority. Malformed links are a suspicious-link
//! signal and never an error.

use crate::authority::{AuthoritativeTransaction, AuthorityError, TransactionAuthority};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default budget for the authority fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

const LEGITIMATE: &str = "payment link is legitimate";

/// Transaction terms embedded in a payment link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkParams {
    /// Transaction reference (`ref`)
    pub reference: String,
    /// Merchant id
    pub merchant_id: i64,
    /// Smallest currency unit
    pub amount: i64,
    /// Currency code
    pub currency: String,
    /// Reserved for open-amount links; not used for validation yet
    pub mode: Option<String>,
}

/// Why a link could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkDefect {
    /// Not a URL
    InvalidUrl(String),
    /// A required query parameter is absent or empty
    MissingParameters,
    /// `merchant_id` is not an integer
    InvalidMerchantId,
    /// `amount` is not an integer
    InvalidAmount,
}

impl fmt::Display for LinkDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkDefect::InvalidUrl(detail) => write!(f, "invalid URL format: {}", detail),
            LinkDefect::MissingParameters => write!(
                f,
                "missing required parameters in payment link (ref, merchant_id, amount, currency)"
            ),
            LinkDefect::InvalidMerchantId => {
                write!(f, "invalid merchant_id format in payment link")
            }
            LinkDefect::InvalidAmount => write!(f, "invalid amount format in payment link"),
        }
    }
}

impl LinkParams {
    /// Parse the link and its required query parameters
    pub fn parse(link: &str) -> Result<Self, LinkDefect> {
        let url = parse_url(link)?;

        // First occurrence wins; empty counts as absent.
        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty())
        };

        let (Some(reference), Some(merchant_id), Some(amount), Some(currency)) = (
            param("ref"),
            param("merchant_id"),
            param("amount"),
            param("currency"),
        ) else {
            return Err(LinkDefect::MissingParameters);
        };

        let merchant_id = merchant_id
            .parse::<i64>()
            .map_err(|_| LinkDefect::InvalidMerchantId)?;
        let amount = amount
            .parse::<i64>()
            .map_err(|_| LinkDefect::InvalidAmount)?;

        Ok(Self {
            reference,
            merchant_id,
            amount,
            currency,
            mode: param("mode"),
        })
    }

    /// First field that disagrees with the authoritative record, in
    /// merchant, amount, currency order
    pub fn mismatch_against(&self, original: &AuthoritativeTransaction) -> Option<String> {
        if self.merchant_id != original.merchant_id {
            return Some(format!(
                "merchant ID mismatch: link has {}, original has {}",
                self.merchant_id, original.merchant_id
            ));
        }
        if self.amount != original.amount {
            return Some(format!(
                "amount mismatch: link has {}, original has {}",
                self.amount, original.amount
            ));
        }
        if self.currency != original.currency {
            return Some(format!(
                "currency mismatch: link has {}, original has {}",
                self.currency, original.currency
            ));
        }
        None
    }
}

// Only the query string matters, so links without scheme and host are read
// relative to a placeholder base. Absolute links replace the base on join.
fn parse_url(link: &str) -> Result<Url, LinkDefect> {
    Url::parse("http://payment-link.invalid/")
        .and_then(|base| base.join(link))
        .map_err(|e| LinkDefect::InvalidUrl(e.to_string()))
}

/// Outcome of a link check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkVerdict {
    /// Link is malformed, unknown or tampered with
    pub is_suspicious: bool,
    /// Human-readable explanation
    pub reason: String,
}

impl LinkVerdict {
    fn suspicious(reason: impl Into<String>) -> Self {
        Self {
            is_suspicious: true,
            reason: reason.into(),
        }
    }

    fn legitimate() -> Self {
        Self {
            is_suspicious: false,
            reason: LEGITIMATE.to_string(),
        }
    }
}

/// Cross-checks payment links with the transaction authority
pub struct PaymentLinkValidator {
    authority: Arc<dyn TransactionAuthority>,
    fetch_timeout: Duration,
}

impl PaymentLinkValidator {
    /// Create a validator backed by `authority`
    pub fn new(authority: Arc<dyn TransactionAuthority>) -> Self {
        Self {
            authority,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Set the fetch budget used by `validate_link`
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Validate a link with the configured fetch budget
    pub async fn validate_link(&self, link: &str) -> LinkVerdict {
        self.validate_link_until(link, Instant::now() + self.fetch_timeout)
            .await
    }

    /// Validate a link; a fetch still running at `deadline` counts as failed
    pub async fn validate_link_until(&self, link: &str, deadline: Instant) -> LinkVerdict {
        let params = match LinkParams::parse(link) {
            Ok(params) => params,
            Err(defect) => {
                debug!("Rejecting unreadable payment link: {}", defect);
                return LinkVerdict::suspicious(defect.to_string());
            }
        };

        let fetch = self.authority.transaction_by_reference(&params.reference);
        let original = match tokio::time::timeout_at(deadline, fetch).await {
            Ok(Ok(original)) => original,
            Ok(Err(AuthorityError::NotFound(reference))) => {
                warn!("Payment link references unknown transaction {}", reference);
                return LinkVerdict::suspicious(format!(
                    "transaction reference {} not found for payment link",
                    reference
                ));
            }
            Ok(Err(e)) => {
                warn!(
                    "Could not fetch transaction {} for payment link: {}",
                    params.reference, e
                );
                return LinkVerdict::suspicious(format!(
                    "error fetching original transaction details: {}",
                    e
                ));
            }
            Err(_) => {
                warn!("Fetching transaction {} timed out", params.reference);
                return LinkVerdict::suspicious(format!(
                    "error fetching original transaction details: {}",
                    AuthorityError::Timeout
                ));
            }
        };

        match params.mismatch_against(&original) {
            Some(reason) => {
                warn!("Tampered payment link for {}: {}", params.reference, reason);
                LinkVerdict::suspicious(reason)
            }
            None => {
                info!("Payment link for {} matches the original", params.reference);
                LinkVerdict::legitimate()
            }
        }
    }
}
