//! Forecasting engine: four interchangeable strategies over validated
//! daily time series.
//!
//! The contract for every strategy is identical: exactly `periods` points,
//! one per subsequent day, each with a non-negative predicted value and a
//! confidence interval of width `2 * z * sqrt(variance * (i + 1))` for the
//! i-th future step, so uncertainty never shrinks with horizon. When the
//! lower bound would go negative it is clamped to zero and the upper bound
//! absorbs the clamped amount, preserving the width rule.
//!
//! None of the strategies fit parameters. `DampedDifference` in
//! particular is a heuristic, not ARIMA: it damps the last observed
//! difference with a fixed coefficient and carries no p/d/q estimation.

use crate::config::ForecastingConfig;
use crate::error::{Error, Result};
use crate::stats;
use crate::types::{ConfidenceInterval, ForecastMethod, ForecastPoint, Observation};
use crate::validate::TimeSeriesValidator;
use chrono::Duration;

/// Damping applied to the last observed difference each future step.
const DIFF_DAMPING: f64 = 0.3;
/// Fixed smoothing parameter for exponential smoothing.
const SMOOTHING_ALPHA: f64 = 0.3;
/// Window for the seasonal-naive strategy (trailing week).
const SEASONAL_WINDOW: usize = 7;
/// Normal quantile for the 95% interval.
const Z_95: f64 = 1.96;

/// Produces point forecasts with confidence intervals from historical
/// observations.
pub struct ForecastingEngine {
    validator: TimeSeriesValidator,
    confidence_level: f64,
    max_forecast_periods: usize,
}

impl ForecastingEngine {
    pub fn new(config: &ForecastingConfig) -> Self {
        Self {
            validator: TimeSeriesValidator::new(config.min_data_points),
            confidence_level: config.default_confidence_level,
            max_forecast_periods: config.max_forecast_periods,
        }
    }

    pub fn validator(&self) -> &TimeSeriesValidator {
        &self.validator
    }

    /// Forecast `periods` future days using the selected strategy.
    ///
    /// The series must pass validation (enough finite observations),
    /// otherwise this fails with [`Error::InsufficientData`] and never
    /// computes a partial forecast.
    pub fn forecast(
        &self,
        series: &[Observation],
        periods: usize,
        method: ForecastMethod,
    ) -> Result<Vec<ForecastPoint>> {
        if periods == 0 {
            return Err(Error::Config("forecast periods must be positive".to_string()));
        }
        if periods > self.max_forecast_periods {
            return Err(Error::Config(format!(
                "forecast periods {} exceeds maximum {}",
                periods, self.max_forecast_periods
            )));
        }
        if !self.validator.validate(series) {
            return Err(Error::InsufficientData {
                needed: self.validator.min_data_points(),
                got: self.validator.valid_count(series),
            });
        }

        let sorted = self.validator.sort_chronological(series);
        let values: Vec<f64> = sorted.iter().map(|obs| obs.value).collect();
        let last_timestamp = sorted
            .last()
            .map(|obs| obs.timestamp)
            .unwrap_or_else(chrono::Utc::now);

        let predictions = match method {
            ForecastMethod::DampedDifference => damped_difference(&values, periods),
            ForecastMethod::ExponentialSmoothing => exponential_smoothing(&values, periods),
            ForecastMethod::LinearRegression => linear_regression(&values, periods),
            ForecastMethod::SeasonalNaive => seasonal_naive(&values, periods),
        };

        let variance = stats::variance(&values);

        tracing::debug!(
            method = method.as_str(),
            observations = values.len(),
            periods,
            variance,
            "Computed forecast"
        );

        Ok(predictions
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                let predicted = raw.max(0.0);
                let half_width = Z_95 * (variance * (i as f64 + 1.0)).sqrt();
                // Clamping the lower bound shifts the interval up instead
                // of shrinking it, so width stays 2 * half_width
                let lower = (predicted - half_width).max(0.0);
                ForecastPoint {
                    timestamp: last_timestamp + Duration::days(i as i64 + 1),
                    predicted_value: predicted,
                    confidence_interval: ConfidenceInterval {
                        lower,
                        upper: lower + 2.0 * half_width,
                    },
                    confidence_level: self.confidence_level,
                }
            })
            .collect())
    }
}

impl Default for ForecastingEngine {
    fn default() -> Self {
        Self::new(&ForecastingConfig::default())
    }
}

/// Damped last-difference heuristic.
///
/// Treats the first-differenced series as a rough AR(1) with a fixed
/// damping coefficient: each step the carried difference shrinks by
/// `DIFF_DAMPING` and is accumulated onto the running level.
fn damped_difference(values: &[f64], periods: usize) -> Vec<f64> {
    let n = values.len();
    let mut level = values[n - 1];
    let mut diff = if n >= 2 { values[n - 1] - values[n - 2] } else { 0.0 };

    (0..periods)
        .map(|_| {
            diff *= DIFF_DAMPING;
            level += diff;
            level
        })
        .collect()
}

/// Single exponential smoothing with fixed alpha, projected flat.
fn exponential_smoothing(values: &[f64], periods: usize) -> Vec<f64> {
    let mut level = values[0];
    for &value in &values[1..] {
        level = SMOOTHING_ALPHA * value + (1.0 - SMOOTHING_ALPHA) * level;
    }
    vec![level; periods]
}

/// OLS fit of value vs 0-based index, extrapolated past the last index.
fn linear_regression(values: &[f64], periods: usize) -> Vec<f64> {
    let n = values.len();
    let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let fit = stats::linear_regression(&x, values);

    (0..periods)
        .map(|i| fit.slope * (n + i) as f64 + fit.intercept)
        .collect()
}

/// Mean of the trailing week, repeated for every future step.
///
/// Series shorter than one week fall back to exponential smoothing.
fn seasonal_naive(values: &[f64], periods: usize) -> Vec<f64> {
    if values.len() < SEASONAL_WINDOW {
        return exponential_smoothing(values, periods);
    }
    let window = &values[values.len() - SEASONAL_WINDOW..];
    let level = stats::mean(window);
    vec![level; periods]
}
