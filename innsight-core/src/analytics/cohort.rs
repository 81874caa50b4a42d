//! Cohort retention analysis.
//!
//! Customers are grouped by the bucket containing their first purchase
//! (acquisition period) and tracked over a fixed 12-period horizon.
//! Retention for elapsed period `i` is the fraction of cohort members
//! with at least one purchase in `[first + i*len, first + (i+1)*len)`,
//! measured relative to each member's own first purchase.

use crate::analytics::{Analytics, HealthStatus};
use crate::cache::SharedCache;
use crate::config::Config;
use crate::providers::{HistoryProvider, OrderFilter};
use crate::types::{CohortAnalysis, CohortPeriod, Order, RetentionSummary, RETENTION_HORIZON};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use std::time::Duration as StdDuration;

impl CohortPeriod {
    /// Elapsed-period length used for the retention windows.
    fn length(&self) -> Duration {
        match self {
            CohortPeriod::Daily => Duration::days(1),
            CohortPeriod::Weekly => Duration::days(7),
            CohortPeriod::Monthly => Duration::days(30),
        }
    }

    /// Label of the bucket containing `date`.
    fn label(&self, date: NaiveDate) -> String {
        match self {
            CohortPeriod::Daily => date.format("%Y-%m-%d").to_string(),
            CohortPeriod::Weekly => {
                let start = date - Duration::days(date.weekday().num_days_from_sunday() as i64);
                start.format("%Y-%m-%d").to_string()
            }
            CohortPeriod::Monthly => date.format("%Y-%m").to_string(),
        }
    }
}

/// Groups customers by acquisition period and measures retention.
pub struct CohortAnalyzer<P> {
    provider: P,
    cache: SharedCache,
    fetch_timeout: StdDuration,
}

impl<P: HistoryProvider> CohortAnalyzer<P> {
    pub fn new(provider: P, cache: SharedCache, config: &Config) -> Self {
        Self {
            provider,
            cache,
            fetch_timeout: StdDuration::from_secs(config.provider.timeout_secs),
        }
    }

    /// Retention and revenue per acquisition cohort, sorted by label.
    ///
    /// Cohorts with no members are omitted from the result. Upstream
    /// fetch failures degrade to an empty order set and therefore an
    /// empty result, with the cause logged.
    pub async fn analyze_cohorts(
        &self,
        property_id: &str,
        period: CohortPeriod,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Vec<CohortAnalysis> {
        let filter = OrderFilter {
            start,
            end,
            service_type: None,
        };

        let fetch = self.provider.fetch_orders(property_id, &filter);
        let orders = match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(Ok(orders)) => orders,
            Ok(Err(e)) => {
                tracing::warn!(property_id, error = %e, "Cohort order fetch failed");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(property_id, "Cohort order fetch timed out");
                Vec::new()
            }
        };

        build_cohorts(&orders, period)
    }

    /// Average retention curve across all cohorts.
    pub async fn analyze_retention(
        &self,
        property_id: &str,
        period: CohortPeriod,
    ) -> RetentionSummary {
        let cohorts = self.analyze_cohorts(property_id, period, None, None).await;

        let mut average_retention = vec![0.0; RETENTION_HORIZON];
        if !cohorts.is_empty() {
            for cohort in &cohorts {
                for (i, rate) in cohort.retention_rates.iter().enumerate() {
                    average_retention[i] += rate;
                }
            }
            for rate in &mut average_retention {
                *rate /= cohorts.len() as f64;
            }
        }

        // Headline number: mean next-period retention
        let overall_retention = average_retention.get(1).copied().unwrap_or(0.0);

        RetentionSummary {
            average_retention,
            cohort_count: cohorts.len(),
            overall_retention,
        }
    }
}

impl<P: HistoryProvider> Analytics for CohortAnalyzer<P> {
    fn analytics_type(&self) -> &'static str {
        "cohort_analysis"
    }

    fn health_status(&self) -> HealthStatus {
        HealthStatus {
            analytics_type: self.analytics_type(),
            healthy: true,
            cache_entries: self.cache.len(),
        }
    }
}

struct CustomerOrders {
    first_purchase: DateTime<Utc>,
    orders: Vec<(DateTime<Utc>, f64)>,
}

fn build_cohorts(orders: &[Order], period: CohortPeriod) -> Vec<CohortAnalysis> {
    // Collapse orders per customer, tracking each first purchase
    let mut customers: HashMap<String, CustomerOrders> = HashMap::new();
    for order in orders {
        let entry = customers
            .entry(order.customer_id.clone())
            .or_insert_with(|| CustomerOrders {
                first_purchase: order.created_at,
                orders: Vec::new(),
            });
        entry.first_purchase = entry.first_purchase.min(order.created_at);
        entry.orders.push((order.created_at, order.total));
    }

    // Group customers into cohorts by first-purchase bucket
    let mut cohorts: HashMap<String, Vec<&CustomerOrders>> = HashMap::new();
    for customer in customers.values() {
        let label = period.label(customer.first_purchase.date_naive());
        cohorts.entry(label).or_default().push(customer);
    }

    let period_length = period.length();
    let mut analyses: Vec<CohortAnalysis> = cohorts
        .into_iter()
        .map(|(label, members)| {
            let size = members.len();
            let mut retained = vec![0usize; RETENTION_HORIZON];
            let mut revenue = vec![0.0; RETENTION_HORIZON];
            let mut total_revenue = 0.0;

            for member in &members {
                let mut active = [false; RETENTION_HORIZON];
                for &(at, amount) in &member.orders {
                    total_revenue += amount;
                    let elapsed = at.signed_duration_since(member.first_purchase);
                    let index = elapsed.num_seconds() / period_length.num_seconds();
                    if (0..RETENTION_HORIZON as i64).contains(&index) {
                        active[index as usize] = true;
                        revenue[index as usize] += amount;
                    }
                }
                for (i, was_active) in active.iter().enumerate() {
                    if *was_active {
                        retained[i] += 1;
                    }
                }
            }

            CohortAnalysis {
                cohort_period: label,
                cohort_size: size,
                retention_rates: retained
                    .iter()
                    .map(|&count| count as f64 / size as f64)
                    .collect(),
                revenue_per_cohort: revenue,
                lifetime_value: total_revenue / size as f64,
            }
        })
        .collect();

    analyses.sort_by(|a, b| a.cohort_period.cmp(&b.cohort_period));
    analyses
}
