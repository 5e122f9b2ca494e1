//! Core types for fraud engine

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict of an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Low risk, proceed
    Approve,
    /// Proceed with manual review
    Flag,
    /// Block
    Deny,
}

impl Verdict {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Approve => "approve",
            Verdict::Flag => "flag",
            Verdict::Deny => "deny",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one event against the rule catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Sum of score impacts of triggered rules
    pub overall_score: f64,

    /// Final verdict
    pub decision: Verdict,

    /// Descriptions of triggered rules, in catalog order
    pub reasons: Vec<String>,
}

impl Decision {
    pub(crate) fn approve() -> Self {
        Self {
            overall_score: 0.0,
            decision: Verdict::Approve,
            reasons: Vec::new(),
        }
    }
}

/// Overall-score boundaries applied after all rules ran without a deny
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    /// Score at or above which the verdict is at least flag
    pub medium: f64,

    /// Score at or above which the verdict is deny
    pub high: f64,
}

impl RiskThresholds {
    /// Validated thresholds; both finite and `medium <= high`
    pub fn new(medium: f64, high: f64) -> Result<Self> {
        if !medium.is_finite() || !high.is_finite() || medium > high {
            return Err(Error::InvalidConfig(format!(
                "Risk thresholds must be finite with medium <= high (medium {}, high {})",
                medium, high
            )));
        }
        Ok(Self { medium, high })
    }

    pub(crate) fn apply(&self, score: f64, verdict: Verdict) -> Verdict {
        if score >= self.high {
            Verdict::Deny
        } else if score >= self.medium {
            verdict.max(Verdict::Flag)
        } else {
            verdict
        }
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: 50.0,
            high: 100.0,
        }
    }
}
