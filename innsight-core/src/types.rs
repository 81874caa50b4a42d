//! Core domain types for innsight
//!
//! These types form the shared data model between the forecasting engine
//! and the three analytics services built on top of it.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Observation** | One sample in a time series (timestamp + value) |
//! | **ForecastPoint** | A predicted value for a future day with its confidence interval |
//! | **DemandForecast** | A forecast enriched with domain context (seasonality, trend, external factors) |
//! | **RFM** | Recency/Frequency/Monetary customer-value scoring |
//! | **LTV** | Customer Lifetime Value |
//! | **Cohort** | Customers sharing the same acquisition period (day/week/month of first purchase) |
//! | **ADR** | Average Daily Rate, a hospitality KPI |
//! | **RevPAR** | Revenue per Available Room, a hospitality KPI |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================
// Time series
// ============================================

/// One sample in a time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// When the value was observed
    pub timestamp: DateTime<Utc>,
    /// Observed value; must be finite for the series to validate
    pub value: f64,
    /// Optional category tag (e.g., "rooms", "restaurant")
    pub category: Option<String>,
    /// Extensible metadata
    pub metadata: Option<serde_json::Value>,
}

impl Observation {
    /// Create a plain observation with no category or metadata.
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            value,
            category: None,
            metadata: None,
        }
    }
}

/// A range around a point forecast expressing uncertainty.
///
/// Invariant: `0 <= lower <= upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    /// Interval width.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// A single predicted value for a future day.
///
/// Produced by the forecasting engine; read-only once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// The future day this prediction is for
    pub timestamp: DateTime<Utc>,
    /// Predicted value, clamped to be non-negative
    pub predicted_value: f64,
    /// Uncertainty range, widening with the forecast horizon
    pub confidence_interval: ConfidenceInterval,
    /// Confidence level of the interval, in (0, 1]
    pub confidence_level: f64,
}

// ============================================
// Forecast method & service type
// ============================================

/// Forecasting strategy selector.
///
/// There is no default priority order; callers choose explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    /// Damped last-difference heuristic. Historically labeled "ARIMA"
    /// upstream, but it fits no parameters; the legacy tag still parses.
    DampedDifference,
    /// Single exponential smoothing with fixed alpha, flat projection
    ExponentialSmoothing,
    /// Ordinary least squares on value vs observation index
    LinearRegression,
    /// Mean of the trailing week, repeated for every future step
    SeasonalNaive,
}

impl ForecastMethod {
    /// Parse a strategy tag. Unknown tags are a programmer error and
    /// surface as [`crate::Error::UnknownMethod`].
    pub fn parse(tag: &str) -> crate::error::Result<Self> {
        match tag {
            "damped_difference" | "arima" => Ok(Self::DampedDifference),
            "exponential_smoothing" => Ok(Self::ExponentialSmoothing),
            "linear_regression" => Ok(Self::LinearRegression),
            "seasonal_naive" => Ok(Self::SeasonalNaive),
            other => Err(crate::error::Error::UnknownMethod(other.to_string())),
        }
    }

    /// Canonical tag for logging and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DampedDifference => "damped_difference",
            Self::ExponentialSmoothing => "exponential_smoothing",
            Self::LinearRegression => "linear_regression",
            Self::SeasonalNaive => "seasonal_naive",
        }
    }
}

/// Hospitality service line a forecast or plan applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Rooms,
    Restaurant,
    Spa,
    Other,
}

impl ServiceType {
    /// Tag used in cache keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rooms => "rooms",
            Self::Restaurant => "restaurant",
            Self::Spa => "spa",
            Self::Other => "other",
        }
    }
}

// ============================================
// Demand & capacity
// ============================================

/// Demand forecast for one property and service line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandForecast {
    pub property_id: String,
    pub service_type: ServiceType,
    /// Horizon in days the caller asked for
    pub forecast_period: usize,
    /// Representative prediction: the first (next-period) forecast point
    pub predicted_demand: f64,
    pub confidence_interval: ConfidenceInterval,
    /// Detected seasonal period length; 1 means no detected seasonality
    pub seasonality_factor: usize,
    /// Regression slope expressed as % of mean value per period
    pub trend_factor: f64,
    /// Multiplicative calendar adjustments (weather/holiday/event/economic)
    pub external_factors: HashMap<String, f64>,
    /// Full forecast curve over the requested horizon
    pub horizon: Vec<ForecastPoint>,
}

/// Capacity recommendation produced from a demand forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityPlan {
    pub property_id: String,
    pub service_type: ServiceType,
    /// Forecasted demand with a service-specific safety buffer applied
    pub recommended_capacity: u64,
    /// Forecasted demand as % of current capacity, capped at 100
    pub utilization_rate: f64,
    /// Diagnostic flags such as `capacity_overload` or `underutilization`
    pub bottlenecks: Vec<String>,
}

// ============================================
// Customer value
// ============================================

/// One purchase in a customer's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub amount: f64,
    pub occurred_at: DateTime<Utc>,
}

/// One non-purchase interaction event (visit, review, inquiry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub kind: String,
    pub occurred_at: DateTime<Utc>,
}

/// Full interaction history for one customer, supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerHistory {
    pub purchases: Vec<Purchase>,
    pub interactions: Vec<Interaction>,
}

/// RFM + engagement features behind an LTV prediction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LtvFactors {
    /// Days since the most recent purchase (999 sentinel when none)
    pub recency: f64,
    /// Number of purchases
    pub frequency: f64,
    /// Total purchase amount
    pub monetary: f64,
    /// Number of interaction events
    pub engagement: f64,
}

/// Predicted lifetime value for one customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerLifetimeValue {
    pub customer_id: String,
    /// Always non-negative
    pub predicted_ltv: f64,
    /// Confidence in the prediction, in [0, 1]
    pub confidence_score: f64,
    pub factors: LtvFactors,
    pub recommendations: Vec<String>,
}

/// An LTV-sorted customer bucket.
///
/// Segments are recomputed wholesale each invocation; there is no
/// persisted segment identity across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSegment {
    pub segment_id: String,
    pub segment_name: String,
    pub customer_count: usize,
    pub average_ltv: f64,
    pub characteristics: Vec<String>,
    pub recommendations: Vec<String>,
}

// ============================================
// Cohorts
// ============================================

/// Acquisition-period granularity for cohort analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortPeriod {
    Daily,
    /// Sunday-aligned week start
    Weekly,
    Monthly,
}

/// Number of elapsed periods a cohort's retention is tracked for.
pub const RETENTION_HORIZON: usize = 12;

/// Retention and revenue profile of one acquisition cohort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortAnalysis {
    /// Bucket label, e.g. "2025-07" or "2025-07-13"
    pub cohort_period: String,
    pub cohort_size: usize,
    /// Fraction of the cohort active in each elapsed period; always
    /// [`RETENTION_HORIZON`] entries
    pub retention_rates: Vec<f64>,
    /// Revenue attributed to the cohort per elapsed period
    pub revenue_per_cohort: Vec<f64>,
    /// Total cohort revenue divided by cohort size
    pub lifetime_value: f64,
}

/// Aggregate retention picture across all cohorts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionSummary {
    /// Mean retention per elapsed period across cohorts
    pub average_retention: Vec<f64>,
    pub cohort_count: usize,
    /// Mean first-period retention, the usual headline number
    pub overall_retention: f64,
}

// ============================================
// Business intelligence
// ============================================

/// The five headline hospitality KPIs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KpiSet {
    /// Occupied rooms as % of available rooms
    pub occupancy_rate: f64,
    /// Average Daily Rate
    pub adr: f64,
    /// Revenue per Available Room
    pub revpar: f64,
    /// Customer satisfaction score (1-5 scale)
    pub customer_satisfaction: f64,
    /// Employee productivity index in [0, 1]
    pub employee_productivity: f64,
}

/// Direction of a metric over the analyzed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// Trend classification for the tracked metrics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrendReport {
    pub revenue: TrendDirection,
    pub occupancy: TrendDirection,
    pub satisfaction: TrendDirection,
}

/// Complete business-intelligence report for one property.
///
/// Always fully populated: partial data failures degrade individual
/// fields to documented neutral values instead of failing the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessIntelligence {
    pub property_id: String,
    pub period_days: usize,
    pub kpis: KpiSet,
    pub trends: TrendReport,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Operational efficiency assessment for one property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationalEfficiency {
    pub property_id: String,
    /// Score in [0, 1]; 0.5 is the neutral default under degraded data
    pub efficiency_score: f64,
    pub notes: Vec<String>,
}

/// Pearson correlation between two metric series, with a plain-words label.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationReport {
    /// Coefficient in [-1, 1]
    pub coefficient: f64,
    /// "strong", "moderate", "weak", or "none"
    pub strength: &'static str,
}

// ============================================
// Provider records
// ============================================

/// A booking or purchase order from the history store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub property_id: String,
    pub customer_id: String,
    pub service_type: ServiceType,
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

/// A bookable room in a property's inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    /// Nightly rate
    pub rate: f64,
}

/// A restaurant table in a property's inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: String,
    pub seats: u32,
}
