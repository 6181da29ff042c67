//! Integration tests for the engine: series in, risk level out.
//!
//! Everything here runs against the public API only, with no environment
//! dependencies. Run with:
//!
//! ```bash
//! cargo test -p cycle-engine --test integration
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};

use cycle_common::config::{RiskConfig, indicators};
use cycle_common::error::EngineError;
use cycle_common::types::{Direction, RiskLevel, ThresholdRule, Tier, TimeSeries};
use cycle_engine::calculator::MetricCalculator;
use cycle_engine::escalation::EscalationTracker;
use cycle_engine::pipeline::{Reading, RiskProcessor};

// ============================================================
// Shared helpers
// ============================================================

fn day(i: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap() + Duration::days(i)
}

fn daily_series(values: &[f64]) -> TimeSeries {
    TimeSeries::from_pairs(
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (day(i as i64), v))
            .collect(),
    )
    .unwrap()
}

fn rule(name: &str, threshold: f64, tier: Tier) -> ThresholdRule {
    ThresholdRule {
        name: name.to_string(),
        threshold,
        direction: Direction::Above,
        tier,
    }
}

/// The tier-1 table from the dashboard scenarios.
fn scenario_config() -> RiskConfig {
    RiskConfig::new(
        "scenario",
        vec![
            rule(indicators::MVRV_Z, 7.0, Tier::Core),
            rule(indicators::PI_CYCLE_PROXIMITY, 1.0, Tier::Core),
            rule(indicators::PUELL_MULTIPLE, 4.0, Tier::Core),
            rule(indicators::LTH_SOPR, 10.0, Tier::Core),
            rule(indicators::RESERVE_RISK, 0.02, Tier::Core),
        ],
    )
    .unwrap()
}

// ============================================================
// Snapshot scenarios
// ============================================================

#[test]
fn test_calm_market_scenario() {
    let processor = RiskProcessor::new(scenario_config());
    let assessment = processor
        .process(vec![
            Reading::available(indicators::MVRV_Z, 2.60),
            Reading::available(indicators::PI_CYCLE_PROXIMITY, 0.88),
            Reading::available(indicators::PUELL_MULTIPLE, 1.33),
            Reading::available(indicators::LTH_SOPR, 3.00),
            Reading::available(indicators::RESERVE_RISK, 0.0026),
        ])
        .unwrap();

    assert_eq!(assessment.core_breach_count(), 0);
    assert_eq!(assessment.level(), RiskLevel::AccumulationHold);
    assert_eq!(assessment.outcome.core_evaluated, 5);
}

#[test]
fn test_hot_market_scenario() {
    let processor = RiskProcessor::new(scenario_config());
    let assessment = processor
        .process(vec![
            Reading::available(indicators::MVRV_Z, 7.5),
            Reading::available(indicators::PI_CYCLE_PROXIMITY, 0.88),
            Reading::available(indicators::PUELL_MULTIPLE, 4.2),
            Reading::available(indicators::LTH_SOPR, 11.0),
            Reading::available(indicators::RESERVE_RISK, 0.0026),
        ])
        .unwrap();

    assert_eq!(assessment.core_breach_count(), 3);
    assert_eq!(assessment.level(), RiskLevel::ExtremeDanger);
    assert_eq!(
        assessment
            .outcome
            .core_breached
            .iter()
            .collect::<Vec<_>>(),
        vec!["lth_sopr", "mvrv_z", "puell_multiple"]
    );
}

// ============================================================
// Derived metrics feeding the pipeline
// ============================================================

#[test]
fn test_series_to_risk_level_end_to_end() {
    // A constant price series keeps the Pi-Cycle ratio at exactly 0.5,
    // well under the 1.0 danger threshold.
    let prices = daily_series(&vec![42_000.0; 400]);
    let processor = RiskProcessor::new(scenario_config());

    let assessment = processor
        .process(vec![
            Reading::available(indicators::MVRV_Z, 2.60),
            Reading::from_result(
                indicators::PI_CYCLE_PROXIMITY,
                MetricCalculator::pi_cycle_proximity(&prices),
            ),
            Reading::available(indicators::PUELL_MULTIPLE, 1.33),
            Reading::available(indicators::LTH_SOPR, 3.00),
            Reading::available(indicators::RESERVE_RISK, 0.0026),
        ])
        .unwrap();

    assert_eq!(assessment.snapshot.get(indicators::PI_CYCLE_PROXIMITY), Some(0.5));
    assert_eq!(assessment.level(), RiskLevel::AccumulationHold);
    assert!(assessment.excluded.is_empty());
}

#[test]
fn test_short_history_is_reported_not_defaulted() {
    // 200 days of history cannot fill the 350-day window; the classification
    // proceeds over the remaining four indicators with an honest denominator.
    let prices = daily_series(&vec![42_000.0; 200]);
    let processor = RiskProcessor::new(scenario_config());

    let assessment = processor
        .process(vec![
            Reading::available(indicators::MVRV_Z, 7.5),
            Reading::from_result(
                indicators::PI_CYCLE_PROXIMITY,
                MetricCalculator::pi_cycle_proximity(&prices),
            ),
            Reading::available(indicators::PUELL_MULTIPLE, 1.33),
            Reading::available(indicators::LTH_SOPR, 3.00),
            Reading::available(indicators::RESERVE_RISK, 0.0026),
        ])
        .unwrap();

    assert_eq!(assessment.outcome.core_evaluated, 4);
    assert_eq!(assessment.core_breach_count(), 1);
    assert_eq!(assessment.level(), RiskLevel::ElevatedCaution);

    assert_eq!(assessment.excluded.len(), 1);
    assert_eq!(assessment.excluded[0].name, indicators::PI_CYCLE_PROXIMITY);
    assert!(
        assessment.excluded[0]
            .reason
            .contains("required 350 points, got 200")
    );

    let summary = assessment.summary();
    assert!(summary.body.contains("1 of 4"));
    assert!(summary.body.contains("unavailable: pi_cycle_proximity"));
}

#[test]
fn test_rolling_correlation_as_context_indicator() {
    // Two risk assets moving in lockstep show ~1.0 ninety-day correlation;
    // wired in as a tier-3 context rule it must not move the risk level.
    let btc: Vec<f64> = (0..120)
        .map(|i| 40_000.0 * (1.0 + 0.01 * (i as f64 * 0.4).sin()))
        .collect();
    let ndx: Vec<f64> = btc.iter().map(|v| v * 0.4 + 3_000.0).collect();
    let corr = MetricCalculator::rolling_correlation(
        &daily_series(&btc),
        &daily_series(&ndx),
        90,
    )
    .unwrap();
    assert!(corr > 0.99);

    let mut config = scenario_config();
    config.rules.push(rule("btc_ndx_corr_90d", 0.8, Tier::MarketStructure));
    config.validate().unwrap();

    let processor = RiskProcessor::new(config);
    let assessment = processor
        .process(vec![
            Reading::available(indicators::MVRV_Z, 2.60),
            Reading::available(indicators::PI_CYCLE_PROXIMITY, 0.88),
            Reading::available(indicators::PUELL_MULTIPLE, 1.33),
            Reading::available(indicators::LTH_SOPR, 3.00),
            Reading::available(indicators::RESERVE_RISK, 0.0026),
            Reading::available("btc_ndx_corr_90d", corr),
        ])
        .unwrap();

    // The context breach shows up in the full evaluation but not the count.
    assert!(assessment.outcome.evaluation.breached.contains("btc_ndx_corr_90d"));
    assert_eq!(assessment.core_breach_count(), 0);
    assert_eq!(assessment.level(), RiskLevel::AccumulationHold);
}

// ============================================================
// Escalation flow
// ============================================================

#[test]
fn test_escalation_fires_once_per_increase() {
    let processor = RiskProcessor::new(scenario_config());
    let mut tracker = EscalationTracker::new();

    let calm = processor
        .process(vec![
            Reading::available(indicators::MVRV_Z, 2.60),
            Reading::available(indicators::LTH_SOPR, 3.00),
        ])
        .unwrap();
    assert!(tracker.observe(calm.level()).is_none());

    let hot = processor
        .process(vec![
            Reading::available(indicators::MVRV_Z, 7.5),
            Reading::available(indicators::LTH_SOPR, 11.0),
        ])
        .unwrap();
    let escalation = tracker.observe(hot.level()).unwrap();
    assert_eq!(escalation.from, RiskLevel::AccumulationHold);
    assert_eq!(escalation.to, RiskLevel::HighRisk);

    // Unchanged conditions do not re-alert.
    let hot_again = processor
        .process(vec![
            Reading::available(indicators::MVRV_Z, 7.5),
            Reading::available(indicators::LTH_SOPR, 11.0),
        ])
        .unwrap();
    assert!(tracker.observe(hot_again.level()).is_none());
}

// ============================================================
// Configuration surface
// ============================================================

#[test]
fn test_json_config_drives_classification() {
    let config = RiskConfig::from_json_str(
        r#"{
            "version": "2025-q3",
            "rules": [
                {"name": "mvrv_z", "threshold": 5.0, "direction": "above", "tier": 1},
                {"name": "reserve_risk", "threshold": 0.01, "direction": "above", "tier": 1}
            ]
        }"#,
    )
    .unwrap();

    let processor = RiskProcessor::new(config);
    let assessment = processor
        .process(vec![
            Reading::available(indicators::MVRV_Z, 5.5),
            Reading::available(indicators::RESERVE_RISK, 0.005),
        ])
        .unwrap();

    assert_eq!(assessment.core_breach_count(), 1);
    assert_eq!(assessment.level(), RiskLevel::ElevatedCaution);
}

#[test]
fn test_boundary_values_never_breach() {
    let processor = RiskProcessor::new(scenario_config());
    let assessment = processor
        .process(vec![
            Reading::available(indicators::MVRV_Z, 7.0),
            Reading::available(indicators::PI_CYCLE_PROXIMITY, 1.0),
            Reading::available(indicators::PUELL_MULTIPLE, 4.0),
            Reading::available(indicators::LTH_SOPR, 10.0),
            Reading::available(indicators::RESERVE_RISK, 0.02),
        ])
        .unwrap();

    assert_eq!(assessment.core_breach_count(), 0);
    assert_eq!(assessment.level(), RiskLevel::AccumulationHold);
}

#[test]
fn test_division_error_propagates_from_calculator() {
    let flat = daily_series(&vec![100.0; 40]);
    let moving = daily_series(&(0..40).map(|i| 100.0 + i as f64).collect::<Vec<_>>());

    let result = MetricCalculator::rolling_correlation(&flat, &moving, 30);
    let error = result.unwrap_err();
    assert!(matches!(error, EngineError::Division(_)));
    assert!(error.to_string().contains("zero variance"));
}
