//! Time series validation and normalization.
//!
//! Validation fails closed: an invalid series yields `false`, never a
//! panic or an error, so callers can gate forecasting with a single check.

use crate::types::Observation;

/// Validates and sorts raw observation sequences.
#[derive(Debug, Clone)]
pub struct TimeSeriesValidator {
    min_data_points: usize,
}

impl TimeSeriesValidator {
    pub fn new(min_data_points: usize) -> Self {
        Self { min_data_points }
    }

    /// Minimum valid observations required for a series to be forecastable.
    pub fn min_data_points(&self) -> usize {
        self.min_data_points
    }

    /// True iff the series has at least `min_data_points` observations and
    /// every value is finite.
    pub fn validate(&self, series: &[Observation]) -> bool {
        series.len() >= self.min_data_points && series.iter().all(|obs| obs.value.is_finite())
    }

    /// Number of observations with a finite value, for error reporting.
    pub fn valid_count(&self, series: &[Observation]) -> usize {
        series.iter().filter(|obs| obs.value.is_finite()).count()
    }

    /// Stable sort ascending by timestamp; the input is not mutated.
    pub fn sort_chronological(&self, series: &[Observation]) -> Vec<Observation> {
        let mut sorted = series.to_vec();
        sorted.sort_by_key(|obs| obs.timestamp);
        sorted
    }
}

impl Default for TimeSeriesValidator {
    fn default() -> Self {
        Self::new(crate::config::ForecastingConfig::default().min_data_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn daily_series(values: &[f64]) -> Vec<Observation> {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Observation::new(base + Duration::days(i as i64), v))
            .collect()
    }

    #[test]
    fn test_validate_minimum_length() {
        let validator = TimeSeriesValidator::new(10);
        assert!(!validator.validate(&daily_series(&[1.0; 9])));
        assert!(validator.validate(&daily_series(&[1.0; 10])));
    }

    #[test]
    fn test_validate_rejects_non_finite_values() {
        let validator = TimeSeriesValidator::new(3);
        let mut series = daily_series(&[1.0, 2.0, 3.0, 4.0]);
        series[2].value = f64::NAN;
        assert!(!validator.validate(&series));

        series[2].value = f64::INFINITY;
        assert!(!validator.validate(&series));
    }

    #[test]
    fn test_valid_count_skips_non_finite() {
        let validator = TimeSeriesValidator::new(3);
        let mut series = daily_series(&[1.0, 2.0, 3.0, 4.0]);
        series[0].value = f64::NAN;
        assert_eq!(validator.valid_count(&series), 3);
    }

    #[test]
    fn test_sort_chronological_is_stable_and_non_mutating() {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let series = vec![
            Observation::new(base + Duration::days(2), 3.0),
            Observation::new(base, 1.0),
            // Duplicate timestamp: stable sort keeps insertion order
            Observation::new(base, 2.0),
        ];

        let validator = TimeSeriesValidator::new(1);
        let sorted = validator.sort_chronological(&series);

        assert_eq!(sorted[0].value, 1.0);
        assert_eq!(sorted[1].value, 2.0);
        assert_eq!(sorted[2].value, 3.0);
        // Input untouched
        assert_eq!(series[0].value, 3.0);
    }
}
