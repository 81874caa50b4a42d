//! Statistical toolkit shared by the forecasting engine and analytics
//! services.
//!
//! All functions are pure and total over finite-value inputs: empty input
//! returns 0 rather than erroring, and the one historically degenerate
//! case (zero-variance regression input) is resolved to a "no trend" fit
//! instead of propagating non-finite values.

/// Result of an ordinary least squares fit of `y` against `x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

/// Shortest seasonal lag considered by the autocorrelation scan.
pub const SEASONALITY_MIN_LAG: usize = 7;
/// Longest seasonal lag considered by the autocorrelation scan.
pub const SEASONALITY_MAX_LAG: usize = 30;
/// Minimum |autocorrelation| for a lag to count as seasonality.
///
/// Tunable design choice, not statistically derived.
pub const SEASONALITY_THRESHOLD: f64 = 0.3;

/// Arithmetic mean; 0 on empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median; 0 on empty input.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population variance (divide by N); 0 on empty input.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 on empty input.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Ordinary least squares fit via the closed-form normal equations.
///
/// Zero-variance `x` (or length mismatch / empty input) has no defined
/// slope; those cases return a flat fit at the mean of `y`.
pub fn linear_regression(x: &[f64], y: &[f64]) -> LinearFit {
    if x.is_empty() || x.len() != y.len() {
        return LinearFit {
            slope: 0.0,
            intercept: mean(y),
        };
    }

    let mean_x = mean(x);
    let mean_y = mean(y);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        sxy += (xi - mean_x) * (yi - mean_y);
        sxx += (xi - mean_x) * (xi - mean_x);
    }

    if sxx == 0.0 {
        return LinearFit {
            slope: 0.0,
            intercept: mean_y,
        };
    }

    let slope = sxy / sxx;
    LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
    }
}

/// Pearson correlation coefficient, clamped to [-1, 1].
///
/// Returns 0 on length mismatch, empty input, or when either series has
/// zero variance.
pub fn correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.is_empty() || x.len() != y.len() {
        return 0.0;
    }

    let mean_x = mean(x);
    let mean_y = mean(y);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        sxy += (xi - mean_x) * (yi - mean_y);
        sxx += (xi - mean_x) * (xi - mean_x);
        syy += (yi - mean_y) * (yi - mean_y);
    }

    let denom = (sxx * syy).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (sxy / denom).clamp(-1.0, 1.0)
}

/// Standard lag-k autocorrelation.
///
/// Returns 0 when the lag leaves no overlapping pairs or the series has
/// zero variance.
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    let n = values.len();
    if lag == 0 || lag >= n {
        return 0.0;
    }

    let m = mean(values);
    let denom: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    if denom == 0.0 {
        return 0.0;
    }

    let numer: f64 = (0..n - lag)
        .map(|i| (values[i] - m) * (values[i + lag] - m))
        .sum();

    numer / denom
}

/// Detect a seasonal period via autocorrelation scanning.
///
/// Scans lags in `[7, min(30, n/2)]` and returns the lag with the highest
/// |autocorrelation| if it exceeds [`SEASONALITY_THRESHOLD`], else `None`.
pub fn detect_seasonality(values: &[f64]) -> Option<usize> {
    let max_lag = SEASONALITY_MAX_LAG.min(values.len() / 2);
    if max_lag < SEASONALITY_MIN_LAG {
        return None;
    }

    let mut best_lag = None;
    let mut best_acf = SEASONALITY_THRESHOLD;
    for lag in SEASONALITY_MIN_LAG..=max_lag {
        let acf = autocorrelation(values, lag).abs();
        if acf > best_acf {
            best_acf = acf;
            best_lag = Some(lag);
        }
    }
    best_lag
}
