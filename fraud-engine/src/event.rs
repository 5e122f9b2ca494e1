//! Event data submitted for fraud evaluation
//!
//! Every field a rule may read is optional. A rule whose field is absent is
//! simply not applicable to the event.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A card or account transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    /// Customer the event belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Amount in major currency units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// ISO currency code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Originating IP address or origin tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Device fingerprint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Merchant receiving the payment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<i64>,
    /// Fields no typed rule knows about
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A payment link shared with a payer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkEvent {
    /// Payment link as shared
    pub url: String,
    /// Customer the event belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Originating IP address or origin tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Fields no typed rule knows about
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A transaction confirmed through a payment channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelEvent {
    /// Channel name, e.g. `credit_card`
    pub channel_type: String,
    /// Channel transaction id
    pub transaction_id: String,
    /// Customer the event belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Amount in major currency units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// ISO currency code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Originating IP address or origin tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Device fingerprint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Fields no typed rule knows about
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Any event the decision engine can score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// Card or account transaction
    Transaction(TransactionEvent),
    /// Payment link check
    Link(LinkEvent),
    /// Payment channel confirmation
    Channel(ChannelEvent),
}

impl Event {
    /// Customer id, if present and non-empty
    pub fn customer_id(&self) -> Option<&str> {
        match self {
            Event::Transaction(tx) => tx.customer_id.as_deref(),
            Event::Link(link) => link.customer_id.as_deref(),
            Event::Channel(ch) => ch.customer_id.as_deref(),
        }
        .filter(|id| !id.is_empty())
    }

    /// Amount, if the event carries one
    pub fn amount(&self) -> Option<f64> {
        match self {
            Event::Transaction(tx) => tx.amount,
            Event::Link(_) => None,
            Event::Channel(ch) => ch.amount,
        }
    }

    /// Currency, if the event carries one
    pub fn currency(&self) -> Option<&str> {
        match self {
            Event::Transaction(tx) => tx.currency.as_deref(),
            Event::Link(_) => None,
            Event::Channel(ch) => ch.currency.as_deref(),
        }
    }

    /// Origin, if present and non-empty
    pub fn origin(&self) -> Option<&str> {
        match self {
            Event::Transaction(tx) => tx.origin.as_deref(),
            Event::Link(link) => link.origin.as_deref(),
            Event::Channel(ch) => ch.origin.as_deref(),
        }
        .filter(|origin| !origin.is_empty())
    }

    /// Device id, if present and non-empty
    pub fn device_id(&self) -> Option<&str> {
        match self {
            Event::Transaction(tx) => tx.device_id.as_deref(),
            Event::Link(_) => None,
            Event::Channel(ch) => ch.device_id.as_deref(),
        }
        .filter(|id| !id.is_empty())
    }

    /// Untyped field outside the typed model
    pub fn extension(&self, name: &str) -> Option<&Value> {
        match self {
            Event::Transaction(tx) => tx.extra.get(name),
            Event::Link(link) => link.extra.get(name),
            Event::Channel(ch) => ch.extra.get(name),
        }
    }
}

impl From<TransactionEvent> for Event {
    fn from(event: TransactionEvent) -> Self {
        Event::Transaction(event)
    }
}

impl From<LinkEvent> for Event {
    fn from(event: LinkEvent) -> Self {
        Event::Link(event)
    }
}

impl From<ChannelEvent> for Event {
    fn from(event: ChannelEvent) -> Self {
        Event::Channel(event)
    }
}
