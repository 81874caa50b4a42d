//! External history collaborators.
//!
//! The engine never talks to a persistence layer directly. Everything it
//! knows about bookings, rooms, and tables arrives through the
//! [`HistoryProvider`] trait, injected at construction time so the
//! dependency is visible and mockable in tests. Implementations may be
//! backed by any store; the only contract is the record shapes in
//! [`crate::types`].

use crate::error::Result;
use crate::types::{DiningTable, Order, Room, ServiceType};
use chrono::{DateTime, Utc};

/// Filter for order history fetches.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Inclusive lower bound on `created_at`
    pub start: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`
    pub end: Option<DateTime<Utc>>,
    /// Restrict to one service line
    pub service_type: Option<ServiceType>,
}

impl OrderFilter {
    /// True iff the order passes every set bound.
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(start) = self.start {
            if order.created_at < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if order.created_at >= end {
                return false;
            }
        }
        if let Some(service) = self.service_type {
            if order.service_type != service {
                return false;
            }
        }
        true
    }
}

/// Read-only access to the bookings/orders store.
///
/// Fetches are the engine's only suspension points; callers wrap them in
/// a timeout and degrade to an empty result set on failure.
#[allow(async_fn_in_trait)]
pub trait HistoryProvider: Send + Sync {
    /// Orders for a property, newest-agnostic (callers sort as needed).
    async fn fetch_orders(&self, property_id: &str, filter: &OrderFilter) -> Result<Vec<Order>>;

    /// Current room inventory for a property.
    async fn fetch_room_inventory(&self, property_id: &str) -> Result<Vec<Room>>;

    /// Current restaurant tables for a property.
    async fn fetch_tables(&self, property_id: &str) -> Result<Vec<DiningTable>>;
}

/// Reference provider over in-memory fixtures.
///
/// Used by the test suite and as a template for real implementations.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistoryProvider {
    pub orders: Vec<Order>,
    pub rooms: Vec<Room>,
    pub tables: Vec<DiningTable>,
}

impl InMemoryHistoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryProvider for InMemoryHistoryProvider {
    async fn fetch_orders(&self, property_id: &str, filter: &OrderFilter) -> Result<Vec<Order>> {
        Ok(self
            .orders
            .iter()
            .filter(|o| o.property_id == property_id && filter.matches(o))
            .cloned()
            .collect())
    }

    async fn fetch_room_inventory(&self, _property_id: &str) -> Result<Vec<Room>> {
        Ok(self.rooms.clone())
    }

    async fn fetch_tables(&self, _property_id: &str) -> Result<Vec<DiningTable>> {
        Ok(self.tables.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn order(id: &str, days: i64, service: ServiceType) -> Order {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        Order {
            id: id.to_string(),
            property_id: "prop-1".to_string(),
            customer_id: "cust-1".to_string(),
            service_type: service,
            total: 100.0,
            created_at: base + Duration::days(days),
        }
    }

    #[test]
    fn test_filter_bounds_and_service() {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let filter = OrderFilter {
            start: Some(base + Duration::days(1)),
            end: Some(base + Duration::days(3)),
            service_type: Some(ServiceType::Rooms),
        };

        assert!(!filter.matches(&order("too-early", 0, ServiceType::Rooms)));
        assert!(filter.matches(&order("in-window", 1, ServiceType::Rooms)));
        assert!(!filter.matches(&order("at-end", 3, ServiceType::Rooms)));
        assert!(!filter.matches(&order("wrong-service", 1, ServiceType::Spa)));
    }

    #[tokio::test]
    async fn test_in_memory_provider_filters_by_property() {
        let mut provider = InMemoryHistoryProvider::new();
        provider.orders.push(order("o1", 0, ServiceType::Rooms));
        let mut other = order("o2", 0, ServiceType::Rooms);
        other.property_id = "prop-2".to_string();
        provider.orders.push(other);

        let fetched = provider
            .fetch_orders("prop-1", &OrderFilter::default())
            .await
            .unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].id, "o1");
    }
}
