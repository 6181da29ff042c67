use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::{Direction, ThresholdRule, Tier};

/// Canonical names of the core early-warning indicators.
pub mod indicators {
    pub const MVRV_Z: &str = "mvrv_z";
    pub const PI_CYCLE_PROXIMITY: &str = "pi_cycle_proximity";
    pub const PUELL_MULTIPLE: &str = "puell_multiple";
    pub const LTH_SOPR: &str = "lth_sopr";
    pub const RESERVE_RISK: &str = "reserve_risk";
}

/// Named, versioned threshold table supplied by the operator.
///
/// Thresholds are policy inputs rather than system-derived constants, so the
/// table is plain data: changing a threshold never requires a code change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Free-form version label for the table (e.g., "btc-cycle-top-v1").
    pub version: String,
    /// Threshold rules across all tiers.
    pub rules: Vec<ThresholdRule>,
}

impl RiskConfig {
    /// Build a config from rules, validating at construction time.
    pub fn new(
        version: impl Into<String>,
        rules: Vec<ThresholdRule>,
    ) -> Result<Self, EngineError> {
        let config = Self {
            version: version.into(),
            rules,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a config from its JSON representation.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| EngineError::Config(format!("failed to parse risk config: {}", e)))?;
        config.validate()?;

        tracing::info!(
            version = %config.version,
            rules = config.rules.len(),
            "Risk config loaded"
        );

        Ok(config)
    }

    /// Load and validate a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read risk config {}: {}", path.display(), e))?;
        Ok(Self::from_json_str(&json)?)
    }

    /// Reject malformed rule tables up front.
    ///
    /// A duplicated or empty indicator name would otherwise skip silently at
    /// evaluation time.
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut seen = BTreeSet::new();
        for rule in &self.rules {
            if rule.name.trim().is_empty() {
                return Err(EngineError::Validation(
                    "rule with empty indicator name".to_string(),
                ));
            }
            if !rule.threshold.is_finite() {
                return Err(EngineError::Validation(format!(
                    "rule '{}' has a non-finite threshold",
                    rule.name
                )));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(EngineError::Validation(format!(
                    "duplicate rule for indicator '{}'",
                    rule.name
                )));
            }
        }
        Ok(())
    }

    /// Rules belonging to a tier, in table order.
    pub fn tier_rules(&self, tier: Tier) -> Vec<&ThresholdRule> {
        self.rules.iter().filter(|r| r.tier == tier).collect()
    }

    /// Look up the rule for an indicator name.
    pub fn rule(&self, name: &str) -> Option<&ThresholdRule> {
        self.rules.iter().find(|r| r.name == name)
    }
}

impl Default for RiskConfig {
    /// The Bitcoin cycle-top table: five core early-warning indicators, all
    /// breaching above their threshold.
    fn default() -> Self {
        let rule = |name: &str, threshold: f64| ThresholdRule {
            name: name.to_string(),
            threshold,
            direction: Direction::Above,
            tier: Tier::Core,
        };

        Self {
            version: "btc-cycle-top-v1".to_string(),
            rules: vec![
                rule(indicators::MVRV_Z, 6.0),
                rule(indicators::PI_CYCLE_PROXIMITY, 0.95),
                rule(indicators::PUELL_MULTIPLE, 3.0),
                rule(indicators::LTH_SOPR, 8.0),
                rule(indicators::RESERVE_RISK, 0.015),
            ],
        }
    }
}
