//! Fraud rules and the rule catalog

use crate::event::Event;
use crate::provider::Reputation;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Longest velocity window a catalog may configure (ten years)
pub const MAX_LOOKBACK_HOURS: i64 = 24 * 366 * 10;

/// Decision a rule forces when it triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionHint {
    /// Contributes score only
    #[default]
    None,
    /// Raises the verdict to flag
    Flag,
    /// Denies immediately and stops evaluation
    Deny,
}

/// Check evaluated directly against the event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "predicate", content = "args", rename_all = "snake_case")]
pub enum Predicate {
    /// amount > threshold
    AmountAbove,
    /// origin is one of the listed values
    OriginIn(Vec<String>),
    /// currency is present and not one of the listed values
    CurrencyNotIn(Vec<String>),
    /// extension field is JSON `true`
    ExtensionFlag(String),
}

impl Predicate {
    /// Returns `Err(reason)` only when the predicate itself cannot be computed.
    pub fn evaluate(&self, threshold: f64, event: &Event) -> std::result::Result<bool, String> {
        match self {
            Predicate::AmountAbove => match event.amount() {
                Some(amount) if !amount.is_finite() => {
                    Err(format!("amount {} is not a finite number", amount))
                }
                Some(amount) => Ok(amount > threshold),
                None => Ok(false),
            },
            Predicate::OriginIn(origins) => Ok(event
                .origin()
                .map(|origin| origins.iter().any(|o| o == origin))
                .unwrap_or(false)),
            Predicate::CurrencyNotIn(currencies) => Ok(event
                .currency()
                .map(|currency| !currencies.iter().any(|c| c.eq_ignore_ascii_case(currency)))
                .unwrap_or(false)),
            Predicate::ExtensionFlag(field) => {
                Ok(matches!(event.extension(field), Some(Value::Bool(true))))
            }
        }
    }
}

/// Check that needs data from the fraud data provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "lookup", rename_all = "snake_case")]
pub enum Lookup {
    /// Customer history count within the window > threshold
    Velocity {
        /// Window size, `1..=MAX_LOOKBACK_HOURS`
        lookback_hours: i64,
    },
    /// Origin has a bad reputation or matches a known bad pattern
    IpReputation {
        /// Origins treated as bad without a reputation lookup result
        #[serde(default)]
        bad_origins: Vec<String>,
    },
    /// Device has a blacklisted reputation
    DeviceReputation,
}

impl Lookup {
    pub(crate) fn ip_triggered(&self, origin: &str, reputation: Option<&Reputation>) -> bool {
        let bad_origin = match self {
            Lookup::IpReputation { bad_origins } => bad_origins.iter().any(|o| o == origin),
            _ => false,
        };
        bad_origin || reputation.map(|r| r.is_anonymizer() || r.blacklisted).unwrap_or(false)
    }
}

/// How a rule decides whether it triggered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Decided from the event alone
    Pure(Predicate),
    /// Needs fraud data from the provider
    DataDependent(Lookup),
}

/// A named, weighted fraud rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique rule id
    pub id: String,
    /// Surfaced in decision reasons
    pub description: String,
    /// Trigger boundary; count, binary 0/1 or amount depending on the rule
    pub threshold: f64,
    /// Added to the overall score when triggered
    pub score_impact: f64,
    /// Verdict forced when triggered
    #[serde(default)]
    pub decision_hint: DecisionHint,
    /// Disabled rules are skipped
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// How the rule is evaluated
    pub kind: RuleKind,
}

fn enabled_by_default() -> bool {
    true
}

impl Rule {
    /// Amount above 1000
    pub fn high_amount() -> Self {
        Self {
            id: "HIGH_AMOUNT_TRANSACTION".to_string(),
            description: "Flags transactions with amounts exceeding a high threshold.".to_string(),
            threshold: 1000.0,
            score_impact: 50.0,
            decision_hint: DecisionHint::Flag,
            enabled: true,
            kind: RuleKind::Pure(Predicate::AmountAbove),
        }
    }

    /// Bad IP reputation or the `suspicious_ip` origin
    pub fn suspicious_ip_origin() -> Self {
        Self {
            id: "SUSPICIOUS_IP_ORIGIN".to_string(),
            description: "Flags transactions originating from suspicious IP addresses.".to_string(),
            threshold: 1.0,
            score_impact: 70.0,
            decision_hint: DecisionHint::Flag,
            enabled: true,
            kind: RuleKind::DataDependent(Lookup::IpReputation {
                bad_origins: vec!["suspicious_ip".to_string()],
            }),
        }
    }

    /// More than 5 transactions in 24h
    pub fn high_velocity_customer() -> Self {
        Self {
            id: "HIGH_VELOCITY_CUSTOMER".to_string(),
            description: "Flags customers with unusually high transaction velocity.".to_string(),
            threshold: 5.0,
            score_impact: 60.0,
            decision_hint: DecisionHint::Flag,
            enabled: true,
            kind: RuleKind::DataDependent(Lookup::Velocity { lookback_hours: 24 }),
        }
    }

    /// Blacklisted device
    pub fn blacklisted_device() -> Self {
        Self {
            id: "BLACKLISTED_DEVICE".to_string(),
            description: "Flags transactions from devices with a blacklisted reputation."
                .to_string(),
            threshold: 1.0,
            score_impact: 40.0,
            decision_hint: DecisionHint::Flag,
            enabled: true,
            kind: RuleKind::DataDependent(Lookup::DeviceReputation),
        }
    }
}

/// Ordered, immutable set of rules
///
/// Order defines evaluation order, which rule denies first, and the order of
/// reasons in a decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RuleCatalog {
    rules: Vec<Rule>,
}

impl RuleCatalog {
    /// Build a catalog, rejecting duplicate ids, non-finite thresholds, invalid
    /// score weights and velocity windows outside `1..=MAX_LOOKBACK_HOURS`
    pub fn new(rules: Vec<Rule>) -> Result<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(Error::InvalidConfig(format!("Duplicate rule id {}", rule.id)));
            }
            if !rule.threshold.is_finite() {
                return Err(Error::InvalidConfig(format!(
                    "Rule {} has non-finite threshold {}",
                    rule.id, rule.threshold
                )));
            }
            if !rule.score_impact.is_finite() || rule.score_impact < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "Rule {} has invalid score impact {}",
                    rule.id, rule.score_impact
                )));
            }
            if let RuleKind::DataDependent(Lookup::Velocity { lookback_hours }) = &rule.kind {
                if !(1..=MAX_LOOKBACK_HOURS).contains(lookback_hours) {
                    return Err(Error::InvalidConfig(format!(
                        "Rule {} has lookback {}h outside 1..={}h",
                        rule.id, lookback_hours, MAX_LOOKBACK_HOURS
                    )));
                }
            }
        }

        Ok(Self { rules })
    }

    /// Load a catalog from a JSON array of rules
    pub fn from_json(json: &str) -> Result<Self> {
        let rules: Vec<Rule> = serde_json::from_str(json)
            .map_err(|e| Error::InvalidConfig(format!("Invalid rules document: {}", e)))?;
        Self::new(rules)
    }

    /// The built-in catalog
    pub fn default_rules() -> Self {
        Self {
            rules: vec![
                Rule::high_amount(),
                Rule::suspicious_ip_origin(),
                Rule::high_velocity_customer(),
                Rule::blacklisted_device(),
            ],
        }
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rule with this id
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the catalog has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
