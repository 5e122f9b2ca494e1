//! Payment-channel transaction validation

use crate::event::ChannelEvent;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Supported payment channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentChannel {
    /// Card payments
    CreditCard,
    /// Bank transfers
    BankTransfer,
}

impl PaymentChannel {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentChannel::CreditCard => "credit_card",
            PaymentChannel::BankTransfer => "bank_transfer",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            PaymentChannel::CreditCard => "credit card",
            PaymentChannel::BankTransfer => "bank transfer",
        }
    }
}

impl fmt::Display for PaymentChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit_card" => Ok(PaymentChannel::CreditCard),
            "bank_transfer" => Ok(PaymentChannel::BankTransfer),
            other => Err(other.to_string()),
        }
    }
}

/// Outcome of a channel check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelVerdict {
    /// False for unknown channels and known-fraudulent transactions
    pub is_valid: bool,
    /// Human-readable explanation
    pub reason: String,
}

/// Checks channel transactions against known-fraudulent transaction ids
#[derive(Debug, Clone, Default)]
pub struct PaymentChannelValidator {
    flagged: HashMap<PaymentChannel, HashSet<String>>,
}

impl PaymentChannelValidator {
    /// Create a validator with no flagged transactions
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `channel_type -> transaction ids`; unknown channel names are skipped
    pub fn from_flagged(flagged: &HashMap<String, Vec<String>>) -> Self {
        let mut validator = Self::new();
        for (channel, ids) in flagged {
            match channel.parse::<PaymentChannel>() {
                Ok(channel) => {
                    for id in ids {
                        validator = validator.with_flagged(channel, id);
                    }
                }
                Err(name) => warn!("Ignoring flagged transactions for unknown channel {}", name),
            }
        }
        validator
    }

    /// Mark a transaction id as fraudulent for a channel
    pub fn with_flagged(mut self, channel: PaymentChannel, transaction_id: &str) -> Self {
        self.flagged
            .entry(channel)
            .or_default()
            .insert(transaction_id.to_string());
        self
    }

    /// Check a channel transaction
    pub fn validate(&self, event: &ChannelEvent) -> ChannelVerdict {
        let channel = match event.channel_type.parse::<PaymentChannel>() {
            Ok(channel) => channel,
            Err(name) => {
                return ChannelVerdict {
                    is_valid: false,
                    reason: format!("unsupported or unknown payment channel: {}", name),
                }
            }
        };

        let fraudulent = self
            .flagged
            .get(&channel)
            .map(|ids| ids.contains(&event.transaction_id))
            .unwrap_or(false);

        if fraudulent {
            warn!(
                "Known fraudulent {} transaction {}",
                channel, event.transaction_id
            );
            return ChannelVerdict {
                is_valid: false,
                reason: format!(
                    "transaction {} via {} is fraudulent",
                    event.transaction_id,
                    channel.label()
                ),
            };
        }

        info!("Validated {} transaction {}", channel, event.transaction_id);
        ChannelVerdict {
            is_valid: true,
            reason: "payment channel transaction validated".to_string(),
        }
    }
}
