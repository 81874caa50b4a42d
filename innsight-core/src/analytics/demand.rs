//! Demand forecasting with domain context.
//!
//! Wraps the forecasting engine with seasonality/trend factors and
//! calendar-heuristic external multipliers to produce a
//! [`DemandForecast`] per property and service line.

use crate::cache::SharedCache;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::forecast::ForecastingEngine;
use crate::providers::{HistoryProvider, OrderFilter};
use crate::stats;
use crate::types::{DemandForecast, ForecastMethod, Observation, Order, ServiceType};
use crate::analytics::{Analytics, HealthStatus};
use chrono::{DateTime, Datelike, Duration, Utc};
use std::collections::HashMap;
use std::time::Duration as StdDuration;

/// How far back order history is pulled for a forecast.
const HISTORY_LOOKBACK_DAYS: i64 = 90;

/// Forecasts future demand for one property/service line.
pub struct DemandForecastingService<P> {
    provider: P,
    engine: ForecastingEngine,
    cache: SharedCache,
    fetch_timeout: StdDuration,
}

impl<P: HistoryProvider> DemandForecastingService<P> {
    pub fn new(provider: P, cache: SharedCache, config: &Config) -> Self {
        Self {
            provider,
            engine: ForecastingEngine::new(&config.forecasting),
            cache,
            fetch_timeout: StdDuration::from_secs(config.provider.timeout_secs),
        }
    }

    /// Forecast demand over `period_days` future days.
    ///
    /// `predicted_demand` is the first (next-period) forecast point; the
    /// full curve is available in the returned `horizon`. Upstream fetch
    /// failures degrade to an empty series, which surfaces as
    /// [`Error::InsufficientData`] rather than a crash.
    pub async fn forecast_demand(
        &self,
        property_id: &str,
        service_type: ServiceType,
        period_days: usize,
        method: ForecastMethod,
    ) -> Result<DemandForecast> {
        let cache_key = format!(
            "{property_id}:{}:{period_days}:{}",
            service_type.as_str(),
            method.as_str()
        );
        if let Some(cached) = self.cache.get(&cache_key) {
            if let Ok(forecast) = serde_json::from_value::<DemandForecast>(cached) {
                tracing::debug!(key = %cache_key, "Demand forecast served from cache");
                return Ok(forecast);
            }
        }

        let now = Utc::now();
        let orders = self.fetch_orders_degraded(property_id, service_type, now).await;
        let series = bucket_daily(&orders);

        let values: Vec<f64> = series.iter().map(|obs| obs.value).collect();
        let seasonality_factor = stats::detect_seasonality(&values).unwrap_or(1);
        let trend_factor = trend_percent(&values);

        let horizon = self.engine.forecast(&series, period_days, method)?;
        let first = &horizon[0];

        let external_factors = external_factors(service_type, now);
        let multiplier: f64 = external_factors.values().product();

        let forecast = DemandForecast {
            property_id: property_id.to_string(),
            service_type,
            forecast_period: period_days,
            predicted_demand: first.predicted_value * multiplier,
            confidence_interval: crate::types::ConfidenceInterval {
                lower: first.confidence_interval.lower * multiplier,
                upper: first.confidence_interval.upper * multiplier,
            },
            seasonality_factor,
            trend_factor,
            external_factors,
            horizon,
        };

        tracing::info!(
            property_id,
            service = service_type.as_str(),
            period_days,
            method = method.as_str(),
            predicted_demand = forecast.predicted_demand,
            seasonality = seasonality_factor,
            "Computed demand forecast"
        );

        if let Ok(value) = serde_json::to_value(&forecast) {
            self.cache.insert(&cache_key, value);
        }
        Ok(forecast)
    }

    /// Fetch order history, degrading to an empty set on error or timeout.
    ///
    /// The cause is logged rather than discarded; the empty series then
    /// fails the validation gate downstream.
    async fn fetch_orders_degraded(
        &self,
        property_id: &str,
        service_type: ServiceType,
        now: DateTime<Utc>,
    ) -> Vec<Order> {
        let filter = OrderFilter {
            start: Some(now - Duration::days(HISTORY_LOOKBACK_DAYS)),
            end: Some(now),
            service_type: Some(service_type),
        };

        let fetch = self.provider.fetch_orders(property_id, &filter);
        match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(Ok(orders)) => orders,
            Ok(Err(e)) => {
                tracing::warn!(
                    property_id,
                    error = %e,
                    "Order history fetch failed, degrading to empty series"
                );
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    property_id,
                    timeout_secs = self.fetch_timeout.as_secs(),
                    "Order history fetch timed out, degrading to empty series"
                );
                Vec::new()
            }
        }
    }
}

impl<P: HistoryProvider> Analytics for DemandForecastingService<P> {
    fn analytics_type(&self) -> &'static str {
        "demand_forecasting"
    }

    fn health_status(&self) -> HealthStatus {
        HealthStatus {
            analytics_type: self.analytics_type(),
            healthy: true,
            cache_entries: self.cache.len(),
        }
    }
}

/// Aggregate orders into one observation per calendar day (order count),
/// filling gaps between the first and last active day with zeros.
fn bucket_daily(orders: &[Order]) -> Vec<Observation> {
    if orders.is_empty() {
        return Vec::new();
    }

    let mut per_day: HashMap<i64, f64> = HashMap::new();
    for order in orders {
        let day = order.created_at.date_naive().num_days_from_ce() as i64;
        *per_day.entry(day).or_insert(0.0) += 1.0;
    }

    let first = *per_day.keys().min().expect("non-empty map");
    let last = *per_day.keys().max().expect("non-empty map");

    (first..=last)
        .map(|day| {
            let offset = day - first;
            let timestamp = orders
                .iter()
                .map(|o| o.created_at)
                .min()
                .expect("non-empty orders")
                + Duration::days(offset);
            Observation::new(timestamp, per_day.get(&day).copied().unwrap_or(0.0))
        })
        .collect()
}

/// Regression slope expressed as % of the mean value per period.
fn trend_percent(values: &[f64]) -> f64 {
    let mean = stats::mean(values);
    if mean == 0.0 {
        return 0.0;
    }
    let x: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
    let fit = stats::linear_regression(&x, values);
    fit.slope / mean * 100.0
}

/// Calendar-heuristic multipliers.
///
/// Placeholder for real weather/holiday/event/economic feeds: summer
/// lifts restaurant demand, winter lifts spa demand, December carries a
/// holiday premium.
fn external_factors(service_type: ServiceType, now: DateTime<Utc>) -> HashMap<String, f64> {
    let month = now.month();
    let mut factors = HashMap::new();

    let weather = match (service_type, month) {
        (ServiceType::Restaurant, 6..=8) => 1.15,
        (ServiceType::Spa, 12 | 1 | 2) => 1.10,
        _ => 1.0,
    };
    let holiday = match month {
        12 => 1.20,
        7 => 1.10,
        _ => 1.0,
    };

    factors.insert("weather".to_string(), weather);
    factors.insert("holiday".to_string(), holiday);
    factors.insert("event".to_string(), 1.0);
    factors.insert("economic".to_string(), 1.0);
    factors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::InMemoryHistoryProvider;
    use chrono::TimeZone;

    struct FailingProvider;

    impl HistoryProvider for FailingProvider {
        async fn fetch_orders(
            &self,
            _property_id: &str,
            _filter: &OrderFilter,
        ) -> Result<Vec<Order>> {
            Err(Error::Upstream("orders store unreachable".to_string()))
        }

        async fn fetch_room_inventory(&self, _p: &str) -> Result<Vec<crate::types::Room>> {
            Err(Error::Upstream("orders store unreachable".to_string()))
        }

        async fn fetch_tables(&self, _p: &str) -> Result<Vec<crate::types::DiningTable>> {
            Err(Error::Upstream("orders store unreachable".to_string()))
        }
    }

    struct SlowProvider;

    impl HistoryProvider for SlowProvider {
        async fn fetch_orders(
            &self,
            _property_id: &str,
            _filter: &OrderFilter,
        ) -> Result<Vec<Order>> {
            tokio::time::sleep(StdDuration::from_secs(3600)).await;
            Ok(Vec::new())
        }

        async fn fetch_room_inventory(&self, _p: &str) -> Result<Vec<crate::types::Room>> {
            Ok(Vec::new())
        }

        async fn fetch_tables(&self, _p: &str) -> Result<Vec<crate::types::DiningTable>> {
            Ok(Vec::new())
        }
    }

    /// `count` orders per day for each of the trailing `days` days.
    fn provider_with_daily_orders(days: i64, per_day: &[usize]) -> InMemoryHistoryProvider {
        let mut provider = InMemoryHistoryProvider::new();
        let now = Utc::now();
        for d in 0..days {
            let count = per_day[(d as usize) % per_day.len()];
            for c in 0..count {
                provider.orders.push(Order {
                    id: format!("o-{d}-{c}"),
                    property_id: "prop-1".to_string(),
                    customer_id: format!("cust-{c}"),
                    service_type: ServiceType::Rooms,
                    total: 120.0,
                    created_at: now - Duration::days(days - d) + Duration::hours(12),
                });
            }
        }
        provider
    }

    fn test_config() -> Config {
        Config::default()
    }

    #[tokio::test]
    async fn test_forecast_demand_happy_path() {
        let provider = provider_with_daily_orders(14, &[3, 4, 3, 5, 4, 6, 5]);
        let cache = crate::cache::shared_from_config(&test_config().cache);
        let service = DemandForecastingService::new(provider, cache, &test_config());

        let forecast = service
            .forecast_demand("prop-1", ServiceType::Rooms, 7, ForecastMethod::SeasonalNaive)
            .await
            .unwrap();

        assert_eq!(forecast.forecast_period, 7);
        assert_eq!(forecast.horizon.len(), 7);
        assert!(forecast.predicted_demand > 0.0);
        assert!(forecast.confidence_interval.lower >= 0.0);
        assert!(forecast.confidence_interval.upper >= forecast.confidence_interval.lower);
        assert!(forecast.seasonality_factor >= 1);
        assert!(forecast.external_factors.contains_key("weather"));
        assert!(forecast.external_factors.contains_key("holiday"));
    }

    #[tokio::test]
    async fn test_too_little_history_is_insufficient_data() {
        let provider = provider_with_daily_orders(5, &[2]);
        let cache = crate::cache::shared_from_config(&test_config().cache);
        let service = DemandForecastingService::new(provider, cache, &test_config());

        let result = service
            .forecast_demand("prop-1", ServiceType::Rooms, 7, ForecastMethod::LinearRegression)
            .await;
        assert!(matches!(result, Err(Error::InsufficientData { .. })));
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_insufficient_data() {
        let cache = crate::cache::shared_from_config(&test_config().cache);
        let service = DemandForecastingService::new(FailingProvider, cache, &test_config());

        let result = service
            .forecast_demand("prop-1", ServiceType::Rooms, 7, ForecastMethod::SeasonalNaive)
            .await;
        assert!(matches!(
            result,
            Err(Error::InsufficientData { needed: 10, got: 0 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_timeout_degrades_to_insufficient_data() {
        let mut config = test_config();
        config.provider.timeout_secs = 1;
        let cache = crate::cache::shared_from_config(&config.cache);
        let service = DemandForecastingService::new(SlowProvider, cache, &config);

        let result = service
            .forecast_demand("prop-1", ServiceType::Rooms, 7, ForecastMethod::SeasonalNaive)
            .await;
        assert!(matches!(result, Err(Error::InsufficientData { .. })));
    }

    #[tokio::test]
    async fn test_second_call_hits_cache() {
        let provider = provider_with_daily_orders(14, &[3, 4, 5]);
        let cache = crate::cache::shared_from_config(&test_config().cache);
        let service = DemandForecastingService::new(provider, cache, &test_config());

        let first = service
            .forecast_demand("prop-1", ServiceType::Rooms, 7, ForecastMethod::SeasonalNaive)
            .await
            .unwrap();
        assert_eq!(service.health_status().cache_entries, 1);

        let second = service
            .forecast_demand("prop-1", ServiceType::Rooms, 7, ForecastMethod::SeasonalNaive)
            .await
            .unwrap();
        assert_eq!(first.predicted_demand, second.predicted_demand);
        assert_eq!(service.health_status().cache_entries, 1);
    }

    #[tokio::test]
    async fn test_health_status() {
        let cache = crate::cache::shared_from_config(&test_config().cache);
        let service =
            DemandForecastingService::new(InMemoryHistoryProvider::new(), cache, &test_config());

        let status = service.health_status();
        assert_eq!(status.analytics_type, "demand_forecasting");
        assert!(status.healthy);
        assert_eq!(status.cache_entries, 0);
    }

    #[test]
    fn test_bucket_daily_fills_gaps_with_zero() {
        let base = Utc.with_ymd_and_hms(2025, 4, 1, 10, 0, 0).unwrap();
        let mk = |d: i64, id: &str| Order {
            id: id.to_string(),
            property_id: "prop-1".to_string(),
            customer_id: "c".to_string(),
            service_type: ServiceType::Rooms,
            total: 50.0,
            created_at: base + Duration::days(d),
        };
        let orders = vec![mk(0, "a"), mk(0, "b"), mk(3, "c")];

        let series = bucket_daily(&orders);
        let values: Vec<f64> = series.iter().map(|o| o.value).collect();
        assert_eq!(values, vec![2.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_trend_percent_of_flat_series_is_zero() {
        assert_eq!(trend_percent(&[5.0; 10]), 0.0);
        assert_eq!(trend_percent(&[]), 0.0);
    }

    #[test]
    fn test_external_factors_summer_restaurant_boost() {
        let july = Utc.with_ymd_and_hms(2025, 7, 15, 0, 0, 0).unwrap();
        let factors = external_factors(ServiceType::Restaurant, july);
        assert_eq!(factors["weather"], 1.15);
        assert_eq!(factors["holiday"], 1.10);

        let march = Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap();
        let neutral = external_factors(ServiceType::Rooms, march);
        assert!(neutral.values().all(|&v| v == 1.0));
    }
}
