//! Customer lifetime value and segmentation.
//!
//! RFM (recency/frequency/monetary) features plus an engagement count
//! feed a heuristic LTV prediction. The formula blends monthly spend
//! rate with multiplicative engagement and frequency bonuses; it is not
//! a fitted model and is open to recalibration.

use crate::analytics::{Analytics, HealthStatus};
use crate::cache::SharedCache;
use crate::types::{
    CustomerHistory, CustomerLifetimeValue, CustomerSegment, LtvFactors,
};
use chrono::{DateTime, Utc};

/// Recency sentinel for customers with no purchases: very stale.
const NO_PURCHASE_RECENCY: f64 = 999.0;

/// Computes per-customer lifetime value and derives segments.
pub struct CustomerValueEngine {
    cache: SharedCache,
}

impl CustomerValueEngine {
    pub fn new(cache: SharedCache) -> Self {
        Self { cache }
    }

    /// Predict lifetime value from a customer's history.
    pub fn calculate_customer_lifetime_value(
        &self,
        customer_id: &str,
        history: &CustomerHistory,
    ) -> CustomerLifetimeValue {
        self.lifetime_value_as_of(customer_id, history, Utc::now())
    }

    /// Same as [`Self::calculate_customer_lifetime_value`] with an explicit
    /// reference instant, for deterministic computation.
    pub fn lifetime_value_as_of(
        &self,
        customer_id: &str,
        history: &CustomerHistory,
        as_of: DateTime<Utc>,
    ) -> CustomerLifetimeValue {
        let factors = compute_factors(history, as_of);
        let predicted_ltv = predict_ltv(&factors);
        let confidence_score = confidence_score(&factors);
        let recommendations = recommendations(&factors, predicted_ltv);

        tracing::debug!(
            customer_id,
            predicted_ltv,
            confidence_score,
            recency = factors.recency,
            frequency = factors.frequency,
            "Computed customer lifetime value"
        );

        CustomerLifetimeValue {
            customer_id: customer_id.to_string(),
            predicted_ltv,
            confidence_score,
            factors,
            recommendations,
        }
    }

    /// Partition customers into LTV-sorted buckets.
    ///
    /// Segments are recomputed wholesale each invocation; empty buckets
    /// are omitted.
    pub fn segment_customers(&self, customers: &[CustomerLifetimeValue]) -> Vec<CustomerSegment> {
        if customers.is_empty() {
            return Vec::new();
        }

        let mut sorted: Vec<&CustomerLifetimeValue> = customers.iter().collect();
        sorted.sort_by(|a, b| b.predicted_ltv.total_cmp(&a.predicted_ltv));

        let n = sorted.len();
        // Ceiling boundaries fill buckets from the top: fewer than four
        // customers occupy the leading segments, premium first
        let quartile = |q: usize| -> &[&CustomerLifetimeValue] {
            let start = (n * q).div_ceil(4);
            let end = (n * (q + 1)).div_ceil(4);
            &sorted[start..end]
        };

        let specs = [
            (
                "premium",
                "Premium",
                "Top-quartile lifetime value",
                "Offer concierge-level perks and early access",
            ),
            (
                "growth",
                "Growth",
                "Above-median lifetime value with room to grow",
                "Target with upsell and cross-service bundles",
            ),
            (
                "standard",
                "Standard",
                "Typical lifetime value",
                "Keep engaged with seasonal promotions",
            ),
            (
                "at_risk",
                "At Risk",
                "Bottom-quartile lifetime value",
                "Run win-back and re-engagement campaigns",
            ),
        ];

        specs
            .iter()
            .enumerate()
            .filter_map(|(q, (id, name, characteristic, recommendation))| {
                let bucket = quartile(q);
                if bucket.is_empty() {
                    return None;
                }
                let total: f64 = bucket.iter().map(|c| c.predicted_ltv).sum();
                Some(CustomerSegment {
                    segment_id: id.to_string(),
                    segment_name: name.to_string(),
                    customer_count: bucket.len(),
                    average_ltv: total / bucket.len() as f64,
                    characteristics: vec![characteristic.to_string()],
                    recommendations: vec![recommendation.to_string()],
                })
            })
            .collect()
    }
}

impl Analytics for CustomerValueEngine {
    fn analytics_type(&self) -> &'static str {
        "customer_value"
    }

    fn health_status(&self) -> HealthStatus {
        HealthStatus {
            analytics_type: self.analytics_type(),
            healthy: true,
            cache_entries: self.cache.len(),
        }
    }
}

fn compute_factors(history: &CustomerHistory, as_of: DateTime<Utc>) -> LtvFactors {
    let recency = history
        .purchases
        .iter()
        .map(|p| p.occurred_at)
        .max()
        .map(|latest| {
            let days = as_of.signed_duration_since(latest).num_days();
            days.max(0) as f64
        })
        .unwrap_or(NO_PURCHASE_RECENCY);

    LtvFactors {
        recency,
        frequency: history.purchases.len() as f64,
        monetary: history.purchases.iter().map(|p| p.amount).sum(),
        engagement: history.interactions.len() as f64,
    }
}

/// Heuristic LTV: monthly spend rate times engagement and frequency
/// multipliers, floored at zero.
fn predict_ltv(factors: &LtvFactors) -> f64 {
    let monthly_rate = factors.frequency / (factors.recency / 30.0).max(1.0);
    let engagement_bonus = 1.0 + factors.engagement / 100.0;
    let frequency_bonus = (factors.frequency / 10.0).min(2.0);

    (factors.monetary * monthly_rate * engagement_bonus * frequency_bonus).max(0.0)
}

/// Base confidence plus fixed bonuses for purchase volume and freshness,
/// capped at 1.0.
fn confidence_score(factors: &LtvFactors) -> f64 {
    let mut score: f64 = 0.5;

    if factors.frequency >= 10.0 {
        score += 0.2;
    } else if factors.frequency >= 5.0 {
        score += 0.1;
    } else if factors.frequency >= 2.0 {
        score += 0.05;
    }

    if factors.recency < 30.0 {
        score += 0.1;
    }
    if factors.frequency >= 5.0 {
        score += 0.1;
    }

    score.min(1.0)
}

fn recommendations(factors: &LtvFactors, predicted_ltv: f64) -> Vec<String> {
    let mut recs = Vec::new();

    if factors.recency > 90.0 {
        recs.push("Launch a re-engagement campaign".to_string());
    }
    if predicted_ltv > 1000.0 {
        recs.push("Prioritize retention outreach for this customer".to_string());
    }
    if factors.frequency >= 10.0 {
        recs.push("Invite to the loyalty program's top tier".to_string());
    }
    if factors.engagement == 0.0 && factors.frequency > 0.0 {
        recs.push("Encourage app and review engagement".to_string());
    }

    recs
}
