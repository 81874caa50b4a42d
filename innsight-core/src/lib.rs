//! # innsight-core
//!
//! Core library for innsight - a hospitality analytics and forecasting
//! engine.
//!
//! This library provides:
//! - Time-series validation and a statistical toolkit
//! - A four-strategy forecasting engine with confidence intervals
//! - Analytics services: demand forecasting, capacity planning,
//!   customer lifetime value, cohort retention, and BI aggregation
//! - A shared TTL cache, configuration management, and logging
//!   infrastructure
//!
//! ## Architecture
//!
//! Services are composed, not inherited: each analytics service owns a
//! [`providers::HistoryProvider`] for upstream data and shares one
//! [`cache::SharedCache`] with its siblings. Provider fetches are the
//! only suspension points; everything downstream is pure computation.
//!
//! ## Example
//!
//! ```rust,no_run
//! use innsight_core::analytics::DemandForecastingService;
//! use innsight_core::providers::InMemoryHistoryProvider;
//! use innsight_core::{cache, Config, ForecastMethod, ServiceType};
//!
//! # async fn run() -> innsight_core::Result<()> {
//! let config = Config::load()?;
//! let shared = cache::shared_from_config(&config.cache);
//! let service =
//!     DemandForecastingService::new(InMemoryHistoryProvider::new(), shared, &config);
//!
//! let forecast = service
//!     .forecast_demand("prop-1", ServiceType::Rooms, 14, ForecastMethod::LinearRegression)
//!     .await?;
//! println!("next-period demand: {:.1}", forecast.predicted_demand);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use forecast::ForecastingEngine;
pub use types::*;
pub use validate::TimeSeriesValidator;

// Public modules
pub mod analytics;
pub mod cache;
pub mod config;
pub mod error;
pub mod forecast;
pub mod logging;
pub mod providers;
pub mod stats;
pub mod types;
pub mod validate;
