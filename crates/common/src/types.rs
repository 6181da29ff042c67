use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Side of a threshold that counts as a breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Above => write!(f, "above"),
            Direction::Below => write!(f, "below"),
        }
    }
}

/// Priority grouping of indicators.
///
/// Tier 1 feeds the risk classifier directly; tiers 2 and 3 are dashboard
/// context only and never enter the breach count. Serialized as the
/// integers 1, 2, 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tier {
    /// Core early-warning indicators.
    Core,
    /// Macroeconomic context.
    Macro,
    /// Market-structure context.
    MarketStructure,
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::Core),
            2 => Ok(Tier::Macro),
            3 => Ok(Tier::MarketStructure),
            other => Err(format!("tier must be 1, 2 or 3, got {}", other)),
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Core => 1,
            Tier::Macro => 2,
            Tier::MarketStructure => 3,
        }
    }
}

/// Ordinal market-cycle risk levels, ordered by severity.
///
/// Derived purely from the tier-1 breach count; callers never construct
/// a level directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    AccumulationHold,
    ElevatedCaution,
    HighRisk,
    ExtremeDanger,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::AccumulationHold => write!(f, "ACCUMULATION/HOLD"),
            RiskLevel::ElevatedCaution => write!(f, "ELEVATED CAUTION"),
            RiskLevel::HighRisk => write!(f, "HIGH RISK"),
            RiskLevel::ExtremeDanger => write!(f, "EXTREME DANGER"),
        }
    }
}

/// A single observation in a time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// An ordered sequence of timestamped observations.
///
/// Timestamps are strictly increasing, validated at construction. The series
/// is owned by the caller and never mutated by the engine; no gap-free
/// spacing is assumed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    points: Vec<SeriesPoint>,
}

impl TimeSeries {
    /// Build a series from timestamped points.
    pub fn new(points: Vec<SeriesPoint>) -> Result<Self, EngineError> {
        for pair in points.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(EngineError::Validation(format!(
                    "series timestamps must be strictly increasing ({} followed by {})",
                    pair[0].timestamp, pair[1].timestamp
                )));
            }
        }
        Ok(Self { points })
    }

    /// Convenience constructor from (timestamp, value) pairs.
    pub fn from_pairs(pairs: Vec<(DateTime<Utc>, f64)>) -> Result<Self, EngineError> {
        Self::new(
            pairs
                .into_iter()
                .map(|(timestamp, value)| SeriesPoint { timestamp, value })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    /// Observation values in timestamp order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Pair up observations with exactly-equal timestamps.
    ///
    /// Mismatched timestamps are dropped from both sides. Both series are
    /// already sorted, so a two-pointer merge suffices.
    pub fn inner_join(&self, other: &TimeSeries) -> Vec<(f64, f64)> {
        let mut joined = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.points.len() && j < other.points.len() {
            let a = &self.points[i];
            let b = &other.points[j];
            match a.timestamp.cmp(&b.timestamp) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    joined.push((a.value, b.value));
                    i += 1;
                    j += 1;
                }
            }
        }
        joined
    }
}

/// A named numeric scalar: a direct provider reading or a derived metric.
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorValue {
    name: String,
    value: f64,
}

impl IndicatorValue {
    /// Tag a finite value with its canonical indicator name.
    ///
    /// Non-finite values are rejected: a NaN compares false against every
    /// threshold and would silently never breach.
    pub fn new(name: impl Into<String>, value: f64) -> Result<Self, EngineError> {
        let name = name.into();
        if !value.is_finite() {
            return Err(EngineError::TypeMismatch {
                name,
                detail: format!("expected a finite number, got {}", value),
            });
        }
        Ok(Self { name, value })
    }

    /// Interpret a raw JSON reading as a numeric value.
    ///
    /// Accepts JSON numbers and numeric strings (providers frequently quote
    /// large values); anything else fails fast.
    pub fn from_raw(
        name: impl Into<String>,
        raw: &serde_json::Value,
    ) -> Result<Self, EngineError> {
        let name = name.into();
        let parsed = match raw {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(value) => Self::new(name, value),
            None => Err(EngineError::TypeMismatch {
                name,
                detail: format!("expected a numeric value, got {}", raw),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Current indicator readings at one evaluation instant.
///
/// Keys are canonical indicator names, unique per snapshot. Constructed
/// fresh per classification call; carries no persisted identity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndicatorSnapshot {
    values: BTreeMap<String, f64>,
}

impl IndicatorSnapshot {
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Insert a reading, replacing any previous reading under the same name.
    pub fn insert(&mut self, value: IndicatorValue) {
        self.values.insert(value.name, value.value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

/// A configured danger threshold for one indicator.
///
/// Wire format: `{"name": "...", "threshold": 6.0, "direction": "above",
/// "tier": 1}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    /// Canonical indicator name this rule applies to.
    pub name: String,
    /// Danger threshold the current value is compared against.
    pub threshold: f64,
    /// Side of the threshold that counts as a breach.
    pub direction: Direction,
    /// Priority tier; only tier 1 feeds the risk level.
    pub tier: Tier,
}
