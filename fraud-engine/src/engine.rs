//! Rule-based decision engine

use crate::event::Event;
use crate::provider::FraudDataProvider;
use crate::rules::{DecisionHint, Lookup, Rule, RuleCatalog, RuleKind};
use crate::{Decision, Error, Result, RiskThresholds, Verdict};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default budget for all provider lookups of one evaluation
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// Evaluates events against a shared, read-only rule catalog
pub struct DecisionEngine {
    catalog: Arc<RuleCatalog>,
    provider: Arc<dyn FraudDataProvider>,
    thresholds: RiskThresholds,
    lookup_timeout: Duration,
}

impl DecisionEngine {
    /// Create new decision engine
    pub fn new(catalog: Arc<RuleCatalog>, provider: Arc<dyn FraudDataProvider>) -> Self {
        Self {
            catalog,
            provider,
            thresholds: RiskThresholds::default(),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Set the risk thresholds
    pub fn with_thresholds(mut self, thresholds: RiskThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set the provider lookup budget used by `evaluate`
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Rules in evaluation order
    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Evaluate an event with the configured lookup budget
    pub async fn evaluate(&self, event: &Event) -> Result<Decision> {
        self.evaluate_until(event, Instant::now() + self.lookup_timeout)
            .await
    }

    /// Evaluate an event; provider lookups past `deadline` fail the evaluation
    ///
    /// Rules run in catalog order. A triggered deny rule stops evaluation, so
    /// later rules add neither score nor reasons. Without an early deny the
    /// overall score is checked against the risk thresholds.
    pub async fn evaluate_until(&self, event: &Event, deadline: Instant) -> Result<Decision> {
        let mut decision = Decision::approve();
        let mut denied = false;

        for rule in self.catalog.rules().iter().filter(|rule| rule.enabled) {
            if !self.is_triggered(rule, event, deadline).await? {
                continue;
            }

            decision.overall_score += rule.score_impact;
            decision.reasons.push(rule.description.clone());
            debug!(
                "Rule {} triggered (+{}, score {})",
                rule.id, rule.score_impact, decision.overall_score
            );

            match rule.decision_hint {
                DecisionHint::Deny => {
                    warn!("Rule {} denied the event, skipping remaining rules", rule.id);
                    decision.decision = Verdict::Deny;
                    denied = true;
                    break;
                }
                DecisionHint::Flag => decision.decision = Verdict::Flag,
                DecisionHint::None => {}
            }
        }

        if !denied {
            decision.decision = self
                .thresholds
                .apply(decision.overall_score, decision.decision);
        }

        info!(
            "Fraud decision: {} (score {:.2}, {} rules triggered)",
            decision.decision,
            decision.overall_score,
            decision.reasons.len()
        );

        Ok(decision)
    }

    async fn is_triggered(&self, rule: &Rule, event: &Event, deadline: Instant) -> Result<bool> {
        match &rule.kind {
            RuleKind::Pure(predicate) => {
                predicate
                    .evaluate(rule.threshold, event)
                    .map_err(|reason| Error::RuleEvaluation {
                        rule_id: rule.id.clone(),
                        reason,
                    })
            }
            RuleKind::DataDependent(lookup) => self.lookup(rule, lookup, event, deadline).await,
        }
    }

    async fn lookup(
        &self,
        rule: &Rule,
        lookup: &Lookup,
        event: &Event,
        deadline: Instant,
    ) -> Result<bool> {
        match lookup {
            Lookup::Velocity { lookback_hours } => {
                let Some(customer_id) = event.customer_id() else {
                    return Ok(false);
                };
                // Bounded by MAX_LOOKBACK_HOURS in RuleCatalog::new
                let lookback = chrono::Duration::hours(*lookback_hours);
                let history = within_deadline(
                    rule,
                    "transaction history",
                    deadline,
                    self.provider.transaction_history(customer_id, lookback),
                )
                .await?;
                Ok(history.len() as f64 > rule.threshold)
            }
            Lookup::IpReputation { .. } => {
                let Some(origin) = event.origin() else {
                    return Ok(false);
                };
                let reputation = within_deadline(
                    rule,
                    "IP data",
                    deadline,
                    self.provider.ip_reputation(origin),
                )
                .await?;
                Ok(lookup.ip_triggered(origin, reputation.as_ref()))
            }
            Lookup::DeviceReputation => {
                let Some(device_id) = event.device_id() else {
                    return Ok(false);
                };
                let reputation = within_deadline(
                    rule,
                    "device data",
                    deadline,
                    self.provider.device_reputation(device_id),
                )
                .await?;
                Ok(reputation.map(|r| r.blacklisted).unwrap_or(false))
            }
        }
    }
}

async fn within_deadline<T>(
    rule: &Rule,
    what: &str,
    deadline: Instant,
    fetch: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout_at(deadline, fetch).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(Error::DataUnavailable(format!(
            "failed to get {} for rule {}: {}",
            what, rule.id, e
        ))),
        Err(_) => Err(Error::DataUnavailable(format!(
            "timed out getting {} for rule {}",
            what, rule.id
        ))),
    }
}
