//! Fraud Engine for Kodra Pay
//!
//! Rule-based fraud decisions for transactions and payment-channel
//! confirmations, and payment-link tamper detection against the transaction
//! service.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod authority;
pub mod channel;
pub mod engine;
pub mod error;
pub mod event;
pub mod link;
pub mod provider;
pub mod rules;
pub mod types;

pub use authority::{
    AuthoritativeTransaction, AuthorityError, HttpTransactionAuthority,
    InMemoryTransactionAuthority, TransactionAuthority,
};
pub use channel::{ChannelVerdict, PaymentChannel, PaymentChannelValidator};
pub use engine::DecisionEngine;
pub use error::{Error, Result};
pub use event::{ChannelEvent, Event, LinkEvent, TransactionEvent};
pub use link::{LinkParams, LinkVerdict, PaymentLinkValidator};
pub use provider::{
    FraudDataProvider, HistoryRecord, InMemoryFraudDataProvider, Reputation, SeedData,
};
pub use rules::{DecisionHint, Lookup, Predicate, Rule, RuleCatalog, RuleKind};
pub use types::*;
