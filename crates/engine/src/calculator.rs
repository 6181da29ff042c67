//! Derived-metric calculator — indicators not directly available from any
//! single data point.
//!
//! Two computations, both pure functions of the input series:
//! 1. Moving-average ratio proximity (the Pi-Cycle cycle-top signal)
//! 2. Rolling cross-asset correlation of day-over-day percentage changes
//!
//! Failures propagate to the caller instead of degrading to NaN or zero; a
//! silently wrong proximity value could flip a risk classification undetected.

use cycle_common::error::EngineError;
use cycle_common::types::TimeSeries;

/// Points in the short Pi-Cycle moving average.
pub const PI_CYCLE_SHORT_WINDOW: usize = 111;
/// Points in the long Pi-Cycle moving average.
pub const PI_CYCLE_LONG_WINDOW: usize = 350;
/// Multiplier applied to the long Pi-Cycle moving average.
pub const PI_CYCLE_LONG_MULTIPLIER: f64 = 2.0;

/// Stateless calculator for derived indicator values.
pub struct MetricCalculator;

impl MetricCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Proximity of the short moving average to the scaled long moving average.
    ///
    /// Simple moving averages over the most recent `short_window` and
    /// `long_window` points; the result is
    /// `sma_short / (long_multiplier * sma_long)`. Values approaching or
    /// exceeding 1.0 mean the short average is catching up to the scaled long
    /// average, historically associated with cycle-top proximity.
    pub fn moving_average_ratio_proximity(
        series: &TimeSeries,
        short_window: usize,
        long_window: usize,
        long_multiplier: f64,
    ) -> Result<f64, EngineError> {
        if short_window == 0 || short_window >= long_window {
            return Err(EngineError::Validation(format!(
                "window sizes must satisfy 0 < short < long, got {}/{}",
                short_window, long_window
            )));
        }
        if !long_multiplier.is_finite() || long_multiplier <= 0.0 {
            return Err(EngineError::Validation(format!(
                "long multiplier must be a positive number, got {}",
                long_multiplier
            )));
        }
        if series.len() < long_window {
            return Err(EngineError::InsufficientData {
                required: long_window,
                actual: series.len(),
            });
        }

        let values = series.values();
        let sma_short = Self::mean(&values[values.len() - short_window..]);
        let sma_long = Self::mean(&values[values.len() - long_window..]);

        let scaled_long = long_multiplier * sma_long;
        if scaled_long == 0.0 {
            return Err(EngineError::Division(
                "long moving average is zero".to_string(),
            ));
        }

        let proximity = sma_short / scaled_long;
        tracing::debug!(
            short_window,
            long_window,
            proximity,
            "Computed moving-average ratio proximity"
        );
        Ok(proximity)
    }

    /// Pi-Cycle proximity with the canonical 111/350/x2 windows.
    pub fn pi_cycle_proximity(series: &TimeSeries) -> Result<f64, EngineError> {
        Self::moving_average_ratio_proximity(
            series,
            PI_CYCLE_SHORT_WINDOW,
            PI_CYCLE_LONG_WINDOW,
            PI_CYCLE_LONG_MULTIPLIER,
        )
    }

    /// Pearson correlation of day-over-day percentage changes over the most
    /// recent `window` observations aligned by timestamp.
    ///
    /// Mismatched timestamps are dropped via an inner join before
    /// differencing. The `window + 1` minimum accounts for the first
    /// difference being undefined.
    pub fn rolling_correlation(
        series_a: &TimeSeries,
        series_b: &TimeSeries,
        window: usize,
    ) -> Result<f64, EngineError> {
        if window == 0 {
            return Err(EngineError::Validation(
                "correlation window must be positive".to_string(),
            ));
        }

        let joined = series_a.inner_join(series_b);
        if joined.len() < window + 1 {
            return Err(EngineError::InsufficientData {
                required: window + 1,
                actual: joined.len(),
            });
        }

        let recent = &joined[joined.len() - (window + 1)..];
        let mut changes_a = Vec::with_capacity(window);
        let mut changes_b = Vec::with_capacity(window);
        for pair in recent.windows(2) {
            changes_a.push(Self::pct_change(pair[0].0, pair[1].0)?);
            changes_b.push(Self::pct_change(pair[0].1, pair[1].1)?);
        }

        let correlation = Self::pearson(&changes_a, &changes_b)?;
        tracing::debug!(window, correlation, "Computed rolling correlation");
        Ok(correlation)
    }

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Day-over-day percentage change.
    fn pct_change(previous: f64, current: f64) -> Result<f64, EngineError> {
        if previous == 0.0 {
            return Err(EngineError::Division(
                "zero base value in day-over-day change".to_string(),
            ));
        }
        Ok((current - previous) / previous * 100.0)
    }

    /// Pearson correlation coefficient of two equal-length samples.
    ///
    /// Zero variance in either sample leaves the coefficient undefined and
    /// is surfaced rather than defaulted.
    fn pearson(x: &[f64], y: &[f64]) -> Result<f64, EngineError> {
        let n = x.len() as f64;
        let mean_x = x.iter().sum::<f64>() / n;
        let mean_y = y.iter().sum::<f64>() / n;

        let mut cov = 0.0;
        let mut var_x = 0.0;
        let mut var_y = 0.0;
        for (xi, yi) in x.iter().zip(y.iter()) {
            let dx = xi - mean_x;
            let dy = yi - mean_y;
            cov += dx * dy;
            var_x += dx * dx;
            var_y += dy * dy;
        }

        if var_x == 0.0 || var_y == 0.0 {
            return Err(EngineError::Division(
                "zero variance in correlation window".to_string(),
            ));
        }
        Ok(cov / (var_x * var_y).sqrt())
    }
}

impl Default for MetricCalculator {
    fn default() -> Self {
        Self::new()
    }
}
