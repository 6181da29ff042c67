//! Risk classifier — aggregates threshold breaches into an ordinal risk level.
//!
//! For each configured rule:
//! 1. Skip it when its indicator is absent from the snapshot (a well-defined
//!    absence, excluded from numerator and denominator alike)
//! 2. Breach on strict inequality in the rule's direction
//! 3. Count tier-1 breaches and map the count through a fixed step table
//!
//! Classification is stateless per call; escalation memory lives in
//! `EscalationTracker`, never here.

use std::collections::BTreeSet;

use serde::Serialize;

use cycle_common::config::RiskConfig;
use cycle_common::types::{Direction, IndicatorSnapshot, RiskLevel, ThresholdRule, Tier};

/// Outcome of evaluating a rule set against a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct BreachEvaluation {
    /// Names of the rules that breached.
    pub breached: BTreeSet<String>,
    /// Number of rules actually evaluated (indicator present).
    pub evaluated: usize,
    /// Rules skipped because their indicator was absent from the snapshot.
    pub skipped: Vec<String>,
}

impl BreachEvaluation {
    pub fn breach_count(&self) -> usize {
        self.breached.len()
    }
}

/// Full assessment outcome: breach detail across every tier plus the tier-1
/// derivation that produced the risk level.
#[derive(Debug, Clone, Serialize)]
pub struct RiskOutcome {
    /// Breach detail across every configured rule.
    pub evaluation: BreachEvaluation,
    /// Tier-1 rules that breached; the confluence count input.
    pub core_breached: BTreeSet<String>,
    /// Tier-1 rules with a present indicator (the display denominator).
    pub core_evaluated: usize,
    /// Risk level derived from the tier-1 breach count.
    pub level: RiskLevel,
}

/// Stateless confluence risk classifier.
pub struct RiskClassifier;

impl RiskClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate each rule whose indicator is present in the snapshot.
    ///
    /// Comparisons are strict: a value exactly at its threshold is not a
    /// breach. Absent indicators are reported in `skipped`, keeping the
    /// displayed "N of M" denominator honest.
    pub fn evaluate_breaches(
        snapshot: &IndicatorSnapshot,
        rules: &[ThresholdRule],
    ) -> BreachEvaluation {
        let mut breached = BTreeSet::new();
        let mut evaluated = 0;
        let mut skipped = Vec::new();

        for rule in rules {
            let Some(value) = snapshot.get(&rule.name) else {
                tracing::debug!(
                    indicator = %rule.name,
                    "Rule skipped — indicator absent from snapshot"
                );
                skipped.push(rule.name.clone());
                continue;
            };

            evaluated += 1;
            let is_breach = match rule.direction {
                Direction::Above => value > rule.threshold,
                Direction::Below => value < rule.threshold,
            };
            if is_breach {
                tracing::debug!(
                    indicator = %rule.name,
                    value,
                    threshold = rule.threshold,
                    direction = %rule.direction,
                    "Threshold breached"
                );
                breached.insert(rule.name.clone());
            }
        }

        BreachEvaluation {
            breached,
            evaluated,
            skipped,
        }
    }

    /// Map a tier-1 breach count to its risk level.
    ///
    /// Fixed, monotonic step function; each call is independent and yields
    /// the same output for the same count.
    pub fn classify_risk(breach_count: usize) -> RiskLevel {
        match breach_count {
            0 => RiskLevel::AccumulationHold,
            1 => RiskLevel::ElevatedCaution,
            2 => RiskLevel::HighRisk,
            _ => RiskLevel::ExtremeDanger,
        }
    }

    /// Evaluate every configured rule, then derive the risk level from tier-1
    /// breaches only. Macro and market-structure tiers inform the dashboard
    /// but never enter the count.
    pub fn assess(snapshot: &IndicatorSnapshot, config: &RiskConfig) -> RiskOutcome {
        let evaluation = Self::evaluate_breaches(snapshot, &config.rules);

        // Rule names are unique (validated at config construction), so the
        // tier-1 subset can be carved out of the full evaluation.
        let core_rules = config.tier_rules(Tier::Core);
        let core_evaluated = core_rules
            .iter()
            .filter(|r| snapshot.contains(&r.name))
            .count();
        let core_breached: BTreeSet<String> = core_rules
            .iter()
            .filter(|r| evaluation.breached.contains(&r.name))
            .map(|r| r.name.clone())
            .collect();

        let level = Self::classify_risk(core_breached.len());
        tracing::info!(
            level = %level,
            core_breaches = core_breached.len(),
            core_evaluated,
            "Risk level classified"
        );

        RiskOutcome {
            evaluation,
            core_breached,
            core_evaluated,
            level,
        }
    }
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::new()
    }
}
