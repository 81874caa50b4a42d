//! Capacity planning from demand forecasts.
//!
//! Converts a forecasted demand number into a recommended capacity with
//! a service-specific safety buffer, the implied utilization of current
//! inventory, and bottleneck diagnostics.

use crate::analytics::{Analytics, HealthStatus};
use crate::cache::SharedCache;
use crate::config::Config;
use crate::providers::HistoryProvider;
use crate::types::{CapacityPlan, ServiceType};
use std::time::Duration as StdDuration;

/// Utilization above this is flagged as an overload.
const OVERLOAD_THRESHOLD: f64 = 90.0;
/// Utilization below this is flagged as underutilization.
const UNDERUTILIZATION_THRESHOLD: f64 = 60.0;

/// Safety buffer applied to forecasted demand per service line.
fn buffer_factor(service_type: ServiceType) -> f64 {
    match service_type {
        ServiceType::Rooms => 1.10,
        ServiceType::Restaurant => 1.20,
        ServiceType::Spa => 1.15,
        ServiceType::Other => 1.10,
    }
}

/// Recommends capacity and diagnoses bottlenecks for one property.
pub struct CapacityPlanner<P> {
    provider: P,
    cache: SharedCache,
    fetch_timeout: StdDuration,
}

impl<P: HistoryProvider> CapacityPlanner<P> {
    pub fn new(provider: P, cache: SharedCache, config: &Config) -> Self {
        Self {
            provider,
            cache,
            fetch_timeout: StdDuration::from_secs(config.provider.timeout_secs),
        }
    }

    /// Convert `forecasted_demand` into a capacity recommendation.
    ///
    /// Inventory fetch failures degrade to zero current capacity with a
    /// `no_capacity_configured` flag instead of failing the caller.
    pub async fn calculate_optimal_capacity(
        &self,
        property_id: &str,
        service_type: ServiceType,
        forecasted_demand: f64,
    ) -> CapacityPlan {
        let demand = forecasted_demand.max(0.0);
        let recommended_capacity = (demand * buffer_factor(service_type)).ceil() as u64;

        let (current_capacity, mut bottlenecks) =
            self.current_capacity(property_id, service_type).await;

        let utilization_rate = if current_capacity == 0 {
            bottlenecks.push("no_capacity_configured".to_string());
            100.0
        } else {
            (demand / current_capacity as f64 * 100.0).min(100.0)
        };

        if utilization_rate > OVERLOAD_THRESHOLD {
            bottlenecks.push("capacity_overload".to_string());
        } else if utilization_rate < UNDERUTILIZATION_THRESHOLD {
            bottlenecks.push("underutilization".to_string());
        }

        tracing::info!(
            property_id,
            service = service_type.as_str(),
            demand,
            recommended_capacity,
            utilization_rate,
            "Computed capacity plan"
        );

        CapacityPlan {
            property_id: property_id.to_string(),
            service_type,
            recommended_capacity,
            utilization_rate,
            bottlenecks,
        }
    }

    /// Current capacity units for a service line, with service-specific
    /// diagnostics collected along the way.
    async fn current_capacity(
        &self,
        property_id: &str,
        service_type: ServiceType,
    ) -> (u64, Vec<String>) {
        let mut bottlenecks = Vec::new();

        match service_type {
            ServiceType::Restaurant => {
                let fetch = self.provider.fetch_tables(property_id);
                match tokio::time::timeout(self.fetch_timeout, fetch).await {
                    Ok(Ok(tables)) => {
                        if tables.is_empty() {
                            bottlenecks.push("no_tables_configured".to_string());
                            return (0, bottlenecks);
                        }
                        let seats: u64 = tables.iter().map(|t| t.seats as u64).sum();
                        let avg_seats = seats as f64 / tables.len() as f64;
                        if avg_seats < 2.0 {
                            bottlenecks.push("tables_below_minimum_capacity".to_string());
                        }
                        (seats, bottlenecks)
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(property_id, error = %e, "Table inventory fetch failed");
                        (0, bottlenecks)
                    }
                    Err(_) => {
                        tracing::warn!(property_id, "Table inventory fetch timed out");
                        (0, bottlenecks)
                    }
                }
            }
            _ => {
                let fetch = self.provider.fetch_room_inventory(property_id);
                match tokio::time::timeout(self.fetch_timeout, fetch).await {
                    Ok(Ok(rooms)) => (rooms.len() as u64, bottlenecks),
                    Ok(Err(e)) => {
                        tracing::warn!(property_id, error = %e, "Room inventory fetch failed");
                        (0, bottlenecks)
                    }
                    Err(_) => {
                        tracing::warn!(property_id, "Room inventory fetch timed out");
                        (0, bottlenecks)
                    }
                }
            }
        }
    }
}

impl<P: HistoryProvider> Analytics for CapacityPlanner<P> {
    fn analytics_type(&self) -> &'static str {
        "capacity_planning"
    }

    fn health_status(&self) -> HealthStatus {
        HealthStatus {
            analytics_type: self.analytics_type(),
            healthy: true,
            cache_entries: self.cache.len(),
        }
    }
}
