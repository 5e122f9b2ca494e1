//! Property-based tests for decision engine invariants
//!
//! - Disabled rules have no effect on score, reasons or verdict
//! - A triggered deny rule stops evaluation
//! - Evaluation is idempotent for unchanged provider state
//! - Score never decreases as catalog prefixes grow

use fraud_engine::{
    DecisionEngine, DecisionHint, Event, InMemoryFraudDataProvider, Predicate, Rule,
    RuleCatalog, RuleKind, TransactionEvent, Verdict,
};
use proptest::prelude::*;
use std::sync::Arc;

/// (score impact, hint, enabled, triggers)
type RuleShape = (u32, DecisionHint, bool, bool);

fn hint_strategy() -> impl Strategy<Value = DecisionHint> {
    prop_oneof![
        4 => Just(DecisionHint::None),
        3 => Just(DecisionHint::Flag),
        1 => Just(DecisionHint::Deny),
    ]
}

fn rule_shapes_strategy() -> impl Strategy<Value = Vec<RuleShape>> {
    prop::collection::vec((0u32..80, hint_strategy(), any::<bool>(), any::<bool>()), 0..12)
}

fn build_rules(shapes: &[RuleShape]) -> Vec<Rule> {
    shapes
        .iter()
        .enumerate()
        .map(|(i, (impact, hint, enabled, triggers))| Rule {
            id: format!("RULE_{}", i),
            description: format!("rule {} triggered", i),
            threshold: 0.0,
            score_impact: *impact as f64,
            decision_hint: *hint,
            enabled: *enabled,
            kind: RuleKind::Pure(Predicate::OriginIn(vec![if *triggers {
                "hit".to_string()
            } else {
                "miss".to_string()
            }])),
        })
        .collect()
}

fn event() -> Event {
    Event::from(TransactionEvent {
        customer_id: Some("c1".to_string()),
        amount: Some(10.0),
        currency: Some("NGN".to_string()),
        origin: Some("hit".to_string()),
        ..Default::default()
    })
}

fn engine(rules: Vec<Rule>) -> DecisionEngine {
    DecisionEngine::new(
        Arc::new(RuleCatalog::new(rules).unwrap()),
        Arc::new(InMemoryFraudDataProvider::new()),
    )
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_disabled_rules_have_no_effect(shapes in rule_shapes_strategy()) {
        let rt = runtime();
        let rules = build_rules(&shapes);
        let enabled_only: Vec<Rule> = rules.iter().filter(|r| r.enabled).cloned().collect();

        let with_disabled = rt.block_on(engine(rules).evaluate(&event())).unwrap();
        let without_disabled = rt.block_on(engine(enabled_only).evaluate(&event())).unwrap();

        prop_assert_eq!(with_disabled, without_disabled);
    }

    #[test]
    fn prop_deny_stops_evaluation(shapes in rule_shapes_strategy()) {
        let rt = runtime();
        let decision = rt.block_on(engine(build_rules(&shapes)).evaluate(&event())).unwrap();

        let mut expected_reasons = Vec::new();
        let mut expected_score = 0.0;
        let mut denied = false;
        for (i, (impact, hint, enabled, triggers)) in shapes.iter().enumerate() {
            if !enabled || !triggers {
                continue;
            }
            expected_score += *impact as f64;
            expected_reasons.push(format!("rule {} triggered", i));
            if *hint == DecisionHint::Deny {
                denied = true;
                break;
            }
        }

        prop_assert_eq!(&decision.reasons, &expected_reasons);
        prop_assert_eq!(decision.overall_score, expected_score);
        if denied {
            prop_assert_eq!(decision.decision, Verdict::Deny);
        }
    }

    #[test]
    fn prop_evaluation_is_idempotent(shapes in rule_shapes_strategy()) {
        let rt = runtime();
        let engine = engine(build_rules(&shapes));

        let first = rt.block_on(engine.evaluate(&event())).unwrap();
        let second = rt.block_on(engine.evaluate(&event())).unwrap();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_score_is_monotonic_over_prefixes(shapes in rule_shapes_strategy()) {
        let rt = runtime();
        let rules = build_rules(&shapes);

        let mut previous = 0.0;
        for k in 0..=rules.len() {
            let decision = rt
                .block_on(engine(rules[..k].to_vec()).evaluate(&event()))
                .unwrap();
            prop_assert!(decision.overall_score >= previous);
            previous = decision.overall_score;
        }
    }

    #[test]
    fn prop_verdict_respects_score_thresholds(shapes in rule_shapes_strategy()) {
        let rt = runtime();
        let decision = rt.block_on(engine(build_rules(&shapes)).evaluate(&event())).unwrap();

        if decision.overall_score >= 100.0 {
            prop_assert_eq!(decision.decision, Verdict::Deny);
        } else if decision.overall_score >= 50.0 {
            prop_assert!(decision.decision >= Verdict::Flag);
        }
        if decision.reasons.is_empty() {
            prop_assert_eq!(decision.decision, Verdict::Approve);
        }
    }
}
