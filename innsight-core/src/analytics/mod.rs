//! Analytics services built on the forecasting engine.
//!
//! Three sibling services share the statistical toolkit, validator, and
//! forecast cache by composition rather than inheritance:
//! - [`demand`]: demand forecasting and its domain context
//! - [`customer`]: RFM lifetime value, segmentation, cohorts
//! - [`bi`]: KPI aggregation, trends, insights
//!
//! plus [`capacity`] which turns a demand forecast into a staffing/room
//! recommendation. Each service is constructed explicitly with its
//! provider and shared cache; there are no process-wide singletons and
//! no lazy initialization.

pub mod bi;
pub mod capacity;
pub mod cohort;
pub mod customer;
pub mod demand;

pub use bi::{BusinessIntelligenceAggregator, KpiSource, StubKpiSource};
pub use capacity::CapacityPlanner;
pub use cohort::CohortAnalyzer;
pub use customer::CustomerValueEngine;
pub use demand::DemandForecastingService;

/// Liveness/health snapshot reported by every analytics service.
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub analytics_type: &'static str,
    pub healthy: bool,
    /// Entries currently held in the shared forecast cache
    pub cache_entries: usize,
}

/// Common surface over the sibling analytics services.
pub trait Analytics {
    /// Stable identifier for this service, used in logs and dashboards.
    fn analytics_type(&self) -> &'static str;

    /// Current health snapshot.
    fn health_status(&self) -> HealthStatus;
}
