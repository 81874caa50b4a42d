//! Business-intelligence aggregation.
//!
//! Rolls order history and KPI sources into a complete report: five
//! headline KPIs, trend classification, and threshold-rule insights and
//! recommendations. The report is always fully populated; partial data
//! failures degrade individual fields to documented neutral values with
//! the original cause logged.

use crate::analytics::{Analytics, HealthStatus};
use crate::cache::SharedCache;
use crate::config::Config;
use crate::providers::{HistoryProvider, OrderFilter};
use crate::stats;
use crate::types::{
    BusinessIntelligence, CorrelationReport, KpiSet, OperationalEfficiency, Order, ServiceType,
    TrendDirection, TrendReport,
};
use chrono::{Duration, Utc};
use std::time::Duration as StdDuration;

/// Neutral efficiency score reported under degraded data.
const NEUTRAL_EFFICIENCY: f64 = 0.5;
/// Slope smaller than this share of the mean counts as stable.
const STABLE_BAND: f64 = 0.01;

/// Source of KPIs the engine cannot yet compute from order history.
///
/// Keeping these behind a trait makes the unimplemented branches
/// explicit: tests can tell real computation from placeholder numbers,
/// and a real satisfaction/occupancy feed can be dropped in without
/// touching the aggregator.
pub trait KpiSource: Send + Sync {
    /// Occupied rooms as % of available rooms, if known.
    fn occupancy_rate(&self, property_id: &str) -> Option<f64>;

    /// Customer satisfaction on a 1-5 scale, if known.
    fn customer_satisfaction(&self, property_id: &str) -> Option<f64>;

    /// Employee productivity index in [0, 1], if known.
    fn employee_productivity(&self, property_id: &str) -> Option<f64>;

    /// Historical occupancy samples for trend classification.
    fn occupancy_history(&self, property_id: &str) -> Vec<f64> {
        let _ = property_id;
        Vec::new()
    }

    /// Historical satisfaction samples for trend classification.
    fn satisfaction_history(&self, property_id: &str) -> Vec<f64> {
        let _ = property_id;
        Vec::new()
    }
}

/// Placeholder KPI source with fixed values.
///
/// These numbers are stubs, not computed metrics; swap in a real source
/// once survey/occupancy feeds exist.
#[derive(Debug, Clone, Default)]
pub struct StubKpiSource;

impl StubKpiSource {
    pub const OCCUPANCY_RATE: f64 = 75.5;
    pub const CUSTOMER_SATISFACTION: f64 = 4.2;
    pub const EMPLOYEE_PRODUCTIVITY: f64 = 0.78;
}

impl KpiSource for StubKpiSource {
    fn occupancy_rate(&self, _property_id: &str) -> Option<f64> {
        Some(Self::OCCUPANCY_RATE)
    }

    fn customer_satisfaction(&self, _property_id: &str) -> Option<f64> {
        Some(Self::CUSTOMER_SATISFACTION)
    }

    fn employee_productivity(&self, _property_id: &str) -> Option<f64> {
        Some(Self::EMPLOYEE_PRODUCTIVITY)
    }
}

/// Aggregates KPIs, trends, and insight strings for dashboards.
pub struct BusinessIntelligenceAggregator<P, K = StubKpiSource> {
    provider: P,
    kpi_source: K,
    cache: SharedCache,
    fetch_timeout: StdDuration,
}

impl<P: HistoryProvider, K: KpiSource> BusinessIntelligenceAggregator<P, K> {
    pub fn new(provider: P, kpi_source: K, cache: SharedCache, config: &Config) -> Self {
        Self {
            provider,
            kpi_source,
            cache,
            fetch_timeout: StdDuration::from_secs(config.provider.timeout_secs),
        }
    }

    /// Build the full BI report for a property over the trailing
    /// `period_days` days. Never fails: degraded inputs produce neutral
    /// KPI values and a logged warning.
    pub async fn generate_business_intelligence_metrics(
        &self,
        property_id: &str,
        period_days: usize,
    ) -> BusinessIntelligence {
        let orders = self.fetch_orders_degraded(property_id, period_days).await;
        let rooms = match tokio::time::timeout(
            self.fetch_timeout,
            self.provider.fetch_room_inventory(property_id),
        )
        .await
        {
            Ok(Ok(rooms)) => rooms,
            Ok(Err(e)) => {
                tracing::warn!(property_id, error = %e, "Room inventory fetch failed");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(property_id, "Room inventory fetch timed out");
                Vec::new()
            }
        };

        let room_orders: Vec<&Order> = orders
            .iter()
            .filter(|o| o.service_type == ServiceType::Rooms)
            .collect();
        let room_revenue: f64 = room_orders.iter().map(|o| o.total).sum();

        // ADR: average room order value; RevPAR: room revenue spread over
        // every available room-night in the window
        let adr = if room_orders.is_empty() {
            0.0
        } else {
            room_revenue / room_orders.len() as f64
        };
        let revpar = if rooms.is_empty() || period_days == 0 {
            0.0
        } else {
            room_revenue / (rooms.len() * period_days) as f64
        };

        let occupancy_rate = self.kpi_source.occupancy_rate(property_id).unwrap_or_else(|| {
            tracing::warn!(property_id, "No occupancy source, defaulting to 0");
            0.0
        });
        let customer_satisfaction = self
            .kpi_source
            .customer_satisfaction(property_id)
            .unwrap_or_else(|| {
                tracing::warn!(property_id, "No satisfaction source, defaulting to 0");
                0.0
            });
        let employee_productivity = self
            .kpi_source
            .employee_productivity(property_id)
            .unwrap_or_else(|| {
                tracing::warn!(property_id, "No productivity source, defaulting to 0");
                0.0
            });

        let kpis = KpiSet {
            occupancy_rate,
            adr,
            revpar,
            customer_satisfaction,
            employee_productivity,
        };

        let daily_revenue = daily_revenue(&orders, period_days);
        let trends = TrendReport {
            revenue: classify_trend(&daily_revenue),
            occupancy: classify_trend(&self.kpi_source.occupancy_history(property_id)),
            satisfaction: classify_trend(&self.kpi_source.satisfaction_history(property_id)),
        };

        let insights = insights(&kpis, &trends);
        let recommendations = recommendations(&kpis, &trends);

        tracing::info!(
            property_id,
            period_days,
            adr,
            revpar,
            occupancy = occupancy_rate,
            "Generated business intelligence report"
        );

        BusinessIntelligence {
            property_id: property_id.to_string(),
            period_days,
            kpis,
            trends,
            insights,
            recommendations,
        }
    }

    /// Operational efficiency over the trailing 30 days.
    ///
    /// Degrades to the neutral 0.5 score when order history or inventory
    /// is unavailable.
    pub async fn analyze_operational_efficiency(&self, property_id: &str) -> OperationalEfficiency {
        let orders = self.fetch_orders_degraded(property_id, 30).await;
        let rooms = match tokio::time::timeout(
            self.fetch_timeout,
            self.provider.fetch_room_inventory(property_id),
        )
        .await
        {
            Ok(Ok(rooms)) => rooms,
            _ => Vec::new(),
        };

        if orders.is_empty() || rooms.is_empty() {
            tracing::warn!(
                property_id,
                "Insufficient data for efficiency analysis, using neutral score"
            );
            return OperationalEfficiency {
                property_id: property_id.to_string(),
                efficiency_score: NEUTRAL_EFFICIENCY,
                notes: vec!["insufficient_data".to_string()],
            };
        }

        let avg_daily_orders = orders.len() as f64 / 30.0;
        let efficiency_score = (avg_daily_orders / rooms.len() as f64).clamp(0.0, 1.0);

        let mut notes = Vec::new();
        if efficiency_score > 0.9 {
            notes.push("operating_near_capacity".to_string());
        } else if efficiency_score < 0.3 {
            notes.push("significant_idle_capacity".to_string());
        }

        OperationalEfficiency {
            property_id: property_id.to_string(),
            efficiency_score,
            notes,
        }
    }

    /// Pearson correlation between two metric series with a plain label.
    pub fn analyze_correlation(&self, x: &[f64], y: &[f64]) -> CorrelationReport {
        let coefficient = stats::correlation(x, y);
        let strength = match coefficient.abs() {
            c if c >= 0.7 => "strong",
            c if c >= 0.4 => "moderate",
            c if c > 0.1 => "weak",
            _ => "none",
        };
        CorrelationReport {
            coefficient,
            strength,
        }
    }

    async fn fetch_orders_degraded(&self, property_id: &str, period_days: usize) -> Vec<Order> {
        let now = Utc::now();
        let filter = OrderFilter {
            start: Some(now - Duration::days(period_days as i64)),
            end: Some(now),
            service_type: None,
        };
        match tokio::time::timeout(
            self.fetch_timeout,
            self.provider.fetch_orders(property_id, &filter),
        )
        .await
        {
            Ok(Ok(orders)) => orders,
            Ok(Err(e)) => {
                tracing::warn!(property_id, error = %e, "Order history fetch failed");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(property_id, "Order history fetch timed out");
                Vec::new()
            }
        }
    }
}

impl<P: HistoryProvider, K: KpiSource> Analytics for BusinessIntelligenceAggregator<P, K> {
    fn analytics_type(&self) -> &'static str {
        "business_intelligence"
    }

    fn health_status(&self) -> HealthStatus {
        HealthStatus {
            analytics_type: self.analytics_type(),
            healthy: true,
            cache_entries: self.cache.len(),
        }
    }
}

/// Total revenue per trailing day, oldest first.
fn daily_revenue(orders: &[Order], period_days: usize) -> Vec<f64> {
    if orders.is_empty() || period_days == 0 {
        return Vec::new();
    }
    let now = Utc::now();
    let mut revenue = vec![0.0; period_days];
    for order in orders {
        let age_days = now.signed_duration_since(order.created_at).num_days();
        if (0..period_days as i64).contains(&age_days) {
            // Index 0 is the oldest day in the window
            revenue[period_days - 1 - age_days as usize] += order.total;
        }
    }
    revenue
}

/// Classify a metric's direction from its regression slope sign, with a
/// small band around zero treated as stable.
fn classify_trend(values: &[f64]) -> TrendDirection {
    if values.len() < 2 {
        return TrendDirection::Stable;
    }
    let x: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
    let fit = stats::linear_regression(&x, values);
    let mean = stats::mean(values).abs();
    let threshold = if mean == 0.0 { f64::EPSILON } else { mean * STABLE_BAND };

    if fit.slope > threshold {
        TrendDirection::Increasing
    } else if fit.slope < -threshold {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    }
}

fn insights(kpis: &KpiSet, trends: &TrendReport) -> Vec<String> {
    let mut out = Vec::new();
    if kpis.occupancy_rate > 80.0 {
        out.push("Strong demand: occupancy above 80%".to_string());
    }
    if trends.revenue == TrendDirection::Increasing {
        out.push("Revenue is trending upward".to_string());
    }
    if kpis.customer_satisfaction > 0.0 && kpis.customer_satisfaction < 3.5 {
        out.push("Customer satisfaction is below target".to_string());
    }
    if kpis.revpar > 0.0 && kpis.adr > 0.0 && kpis.revpar < kpis.adr * 0.5 {
        out.push("RevPAR lags ADR: room-nights are going unsold".to_string());
    }
    out
}

fn recommendations(kpis: &KpiSet, trends: &TrendReport) -> Vec<String> {
    let mut out = Vec::new();
    if kpis.occupancy_rate < 70.0 {
        out.push("Consider dynamic pricing to lift occupancy".to_string());
    }
    if trends.revenue == TrendDirection::Decreasing {
        out.push("Review marketing mix: revenue is declining".to_string());
    }
    if trends.satisfaction == TrendDirection::Decreasing {
        out.push("Schedule a service quality review".to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::InMemoryHistoryProvider;
    use crate::types::Room;
    use approx::assert_relative_eq;

    fn provider_with_history(
        days: i64,
        orders_per_day: usize,
        total: f64,
        rooms: usize,
    ) -> InMemoryHistoryProvider {
        let mut provider = InMemoryHistoryProvider::new();
        let now = Utc::now();
        for d in 1..=days {
            for c in 0..orders_per_day {
                provider.orders.push(Order {
                    id: format!("o-{d}-{c}"),
                    property_id: "prop-1".to_string(),
                    customer_id: format!("cust-{c}"),
                    service_type: ServiceType::Rooms,
                    total,
                    created_at: now - Duration::days(d) + Duration::hours(1),
                });
            }
        }
        for i in 0..rooms {
            provider.rooms.push(Room {
                id: format!("room-{i}"),
                rate: 150.0,
            });
        }
        provider
    }

    fn aggregator(
        provider: InMemoryHistoryProvider,
    ) -> BusinessIntelligenceAggregator<InMemoryHistoryProvider, StubKpiSource> {
        let config = Config::default();
        let cache = crate::cache::shared_from_config(&config.cache);
        BusinessIntelligenceAggregator::new(provider, StubKpiSource, cache, &config)
    }

    #[tokio::test]
    async fn test_report_is_always_complete() {
        // No data at all: every field still present, KPIs at stub/neutral
        let bi = aggregator(InMemoryHistoryProvider::new())
            .generate_business_intelligence_metrics("prop-1", 30)
            .await;

        assert_eq!(bi.property_id, "prop-1");
        assert_relative_eq!(bi.kpis.adr, 0.0);
        assert_relative_eq!(bi.kpis.revpar, 0.0);
        assert_relative_eq!(bi.kpis.occupancy_rate, StubKpiSource::OCCUPANCY_RATE);
        assert_eq!(bi.trends.revenue, TrendDirection::Stable);
    }

    #[tokio::test]
    async fn test_adr_and_revpar_from_orders() {
        // 14 days, 2 room orders/day at 120 each, 10 rooms
        let bi = aggregator(provider_with_history(14, 2, 120.0, 10))
            .generate_business_intelligence_metrics("prop-1", 30)
            .await;

        assert_relative_eq!(bi.kpis.adr, 120.0);
        // 28 orders * 120 over 10 rooms * 30 days
        assert_relative_eq!(bi.kpis.revpar, 28.0 * 120.0 / 300.0);
    }

    #[tokio::test]
    async fn test_occupancy_below_70_recommends_dynamic_pricing() {
        struct LowOccupancy;
        impl KpiSource for LowOccupancy {
            fn occupancy_rate(&self, _p: &str) -> Option<f64> {
                Some(55.0)
            }
            fn customer_satisfaction(&self, _p: &str) -> Option<f64> {
                Some(4.0)
            }
            fn employee_productivity(&self, _p: &str) -> Option<f64> {
                Some(0.7)
            }
        }

        let config = Config::default();
        let cache = crate::cache::shared_from_config(&config.cache);
        let aggregator = BusinessIntelligenceAggregator::new(
            InMemoryHistoryProvider::new(),
            LowOccupancy,
            cache,
            &config,
        );

        let bi = aggregator
            .generate_business_intelligence_metrics("prop-1", 30)
            .await;
        assert!(bi
            .recommendations
            .iter()
            .any(|r| r.contains("dynamic pricing")));
        assert!(bi.insights.iter().all(|i| !i.contains("Strong demand")));
    }

    #[tokio::test]
    async fn test_high_occupancy_yields_strong_demand_insight() {
        struct HighOccupancy;
        impl KpiSource for HighOccupancy {
            fn occupancy_rate(&self, _p: &str) -> Option<f64> {
                Some(88.0)
            }
            fn customer_satisfaction(&self, _p: &str) -> Option<f64> {
                Some(4.5)
            }
            fn employee_productivity(&self, _p: &str) -> Option<f64> {
                Some(0.8)
            }
        }

        let config = Config::default();
        let cache = crate::cache::shared_from_config(&config.cache);
        let aggregator = BusinessIntelligenceAggregator::new(
            InMemoryHistoryProvider::new(),
            HighOccupancy,
            cache,
            &config,
        );

        let bi = aggregator
            .generate_business_intelligence_metrics("prop-1", 30)
            .await;
        assert!(bi.insights.iter().any(|i| i.contains("Strong demand")));
    }

    #[tokio::test]
    async fn test_missing_kpi_source_degrades_to_zero() {
        struct NoKpis;
        impl KpiSource for NoKpis {
            fn occupancy_rate(&self, _p: &str) -> Option<f64> {
                None
            }
            fn customer_satisfaction(&self, _p: &str) -> Option<f64> {
                None
            }
            fn employee_productivity(&self, _p: &str) -> Option<f64> {
                None
            }
        }

        let config = Config::default();
        let cache = crate::cache::shared_from_config(&config.cache);
        let aggregator = BusinessIntelligenceAggregator::new(
            InMemoryHistoryProvider::new(),
            NoKpis,
            cache,
            &config,
        );

        let bi = aggregator
            .generate_business_intelligence_metrics("prop-1", 30)
            .await;
        assert_relative_eq!(bi.kpis.occupancy_rate, 0.0);
        assert_relative_eq!(bi.kpis.customer_satisfaction, 0.0);
        assert_relative_eq!(bi.kpis.employee_productivity, 0.0);
    }

    #[tokio::test]
    async fn test_efficiency_neutral_on_missing_data() {
        let report = aggregator(InMemoryHistoryProvider::new())
            .analyze_operational_efficiency("prop-1")
            .await;
        assert_relative_eq!(report.efficiency_score, NEUTRAL_EFFICIENCY);
        assert!(report.notes.contains(&"insufficient_data".to_string()));
    }

    #[tokio::test]
    async fn test_efficiency_from_orders_and_rooms() {
        // 20 days of 6 orders/day over 10 rooms: 120 orders / 30 days / 10 rooms = 0.4
        let report = aggregator(provider_with_history(20, 6, 100.0, 10))
            .analyze_operational_efficiency("prop-1")
            .await;
        assert_relative_eq!(report.efficiency_score, 0.4, epsilon = 1e-10);
        assert!(report.notes.is_empty());
    }

    #[test]
    fn test_classify_trend() {
        let rising: Vec<f64> = (0..20).map(|i| 100.0 + 5.0 * i as f64).collect();
        let falling: Vec<f64> = (0..20).map(|i| 200.0 - 5.0 * i as f64).collect();
        let flat = vec![100.0; 20];

        assert_eq!(classify_trend(&rising), TrendDirection::Increasing);
        assert_eq!(classify_trend(&falling), TrendDirection::Decreasing);
        assert_eq!(classify_trend(&flat), TrendDirection::Stable);
        assert_eq!(classify_trend(&[]), TrendDirection::Stable);
    }

    #[test]
    fn test_analyze_correlation_labels() {
        let agg = aggregator(InMemoryHistoryProvider::new());

        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let strong = agg.analyze_correlation(&x, &[2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(strong.strength, "strong");
        assert_relative_eq!(strong.coefficient, 1.0, epsilon = 1e-10);

        let none = agg.analyze_correlation(&x, &[]);
        assert_eq!(none.strength, "none");
        assert_relative_eq!(none.coefficient, 0.0);
    }
}
