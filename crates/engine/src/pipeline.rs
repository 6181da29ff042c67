//! Assessment pipeline.
//!
//! Receives per-indicator readings from the data-access collaborator and:
//! 1. Builds the indicator snapshot, setting aside unavailable readings
//! 2. Evaluates breaches and derives the risk level (via `RiskClassifier`)
//! 3. Produces a presentation-ready assessment whose "N of M" denominator
//!    accounts for every excluded indicator

use chrono::{DateTime, Utc};
use serde::Serialize;

use cycle_common::config::RiskConfig;
use cycle_common::error::EngineError;
use cycle_common::types::{IndicatorSnapshot, IndicatorValue, RiskLevel};

use crate::classifier::{RiskClassifier, RiskOutcome};

/// One named indicator outcome from the data-access collaborator or the
/// derived-metric calculator.
///
/// A failed computation travels as the error that caused it, never as a
/// substituted value.
#[derive(Debug)]
pub struct Reading {
    name: String,
    outcome: Result<f64, EngineError>,
}

impl Reading {
    /// An available reading.
    pub fn available(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            outcome: Ok(value),
        }
    }

    /// An indicator that could not be fetched or computed.
    pub fn unavailable(name: impl Into<String>, error: EngineError) -> Self {
        Self {
            name: name.into(),
            outcome: Err(error),
        }
    }

    /// Wrap a calculator or provider result under the indicator's name.
    pub fn from_result(name: impl Into<String>, outcome: Result<f64, EngineError>) -> Self {
        Self {
            name: name.into(),
            outcome,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// An indicator left out of breach evaluation, with the reason why.
#[derive(Debug, Clone, Serialize)]
pub struct ExcludedIndicator {
    pub name: String,
    pub reason: String,
}

/// Full result of one classification run.
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    /// The readings that entered breach evaluation.
    pub snapshot: IndicatorSnapshot,
    /// Breach detail and the derived risk level.
    pub outcome: RiskOutcome,
    /// Indicators excluded from evaluation, with reasons.
    pub excluded: Vec<ExcludedIndicator>,
    /// When the assessment was made.
    pub evaluated_at: DateTime<Utc>,
}

impl RiskAssessment {
    pub fn level(&self) -> RiskLevel {
        self.outcome.level
    }

    /// Tier-1 breach count feeding the level.
    pub fn core_breach_count(&self) -> usize {
        self.outcome.core_breached.len()
    }

    /// Render the assessment as a payload for the presentation/alerting
    /// collaborator.
    pub fn summary(&self) -> AssessmentSummary {
        let mut body = format!(
            "{} of {} core indicators triggered",
            self.core_breach_count(),
            self.outcome.core_evaluated
        );
        if !self.outcome.core_breached.is_empty() {
            let names: Vec<&str> = self
                .outcome
                .core_breached
                .iter()
                .map(String::as_str)
                .collect();
            body.push_str(&format!(" ({})", names.join(", ")));
        }
        if !self.excluded.is_empty() {
            let names: Vec<&str> = self.excluded.iter().map(|e| e.name.as_str()).collect();
            body.push_str(&format!("; unavailable: {}", names.join(", ")));
        }

        AssessmentSummary {
            title: format!("Cycle risk: {}", self.level()),
            body,
            level: self.level(),
        }
    }
}

/// Human-readable payload ready for rendering or delivery.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentSummary {
    pub title: String,
    pub body: String,
    pub level: RiskLevel,
}

/// Central processor that orchestrates readings → snapshot → risk level.
pub struct RiskProcessor {
    config: RiskConfig,
}

impl RiskProcessor {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Run one classification over a batch of readings.
    ///
    /// Unavailable readings are excluded from breach evaluation and reported
    /// with their reason; the classification proceeds over the remaining
    /// indicators rather than guessing a value. A non-finite reading is a
    /// hard `TypeMismatch` failure.
    pub fn process(&self, readings: Vec<Reading>) -> Result<RiskAssessment, EngineError> {
        let mut snapshot = IndicatorSnapshot::new();
        let mut excluded = Vec::new();

        for reading in readings {
            match reading.outcome {
                Ok(value) => {
                    snapshot.insert(IndicatorValue::new(reading.name, value)?);
                }
                Err(error) => {
                    tracing::warn!(
                        indicator = %reading.name,
                        %error,
                        "Indicator unavailable — excluded from evaluation"
                    );
                    excluded.push(ExcludedIndicator {
                        name: reading.name,
                        reason: error.to_string(),
                    });
                }
            }
        }

        let outcome = RiskClassifier::assess(&snapshot, &self.config);

        Ok(RiskAssessment {
            snapshot,
            outcome,
            excluded,
            evaluated_at: Utc::now(),
        })
    }
}
