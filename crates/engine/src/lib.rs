//! Indicator computation and confluence risk-classification engine.
//!
//! Data flows one way: historical series → derived-metric calculator →
//! indicator snapshot → risk classifier → risk level. Every component is a
//! pure function of its inputs; the only cross-evaluation state lives in the
//! escalation tracker.

pub mod calculator;
pub mod classifier;
pub mod escalation;
pub mod pipeline;

pub use calculator::MetricCalculator;
pub use classifier::{BreachEvaluation, RiskClassifier, RiskOutcome};
pub use escalation::{Escalation, EscalationTracker};
pub use pipeline::{
    AssessmentSummary, ExcludedIndicator, Reading, RiskAssessment, RiskProcessor,
};
