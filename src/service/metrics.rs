//! Derived-metric computations over raw time-series results.
//!
//! Pure functions so the fallback behaviour for empty inputs can be tested
//! without a store.

use serde::Serialize;

use crate::store::decode::TsSample;

/// Aggregation bucket for the churn-rate leave-event count.
pub const CHURN_BUCKET_MS: i64 = 6_048_000_000;

/// Aggregation bucket for the analytics chart series.
pub const ANALYTICS_BUCKET_MS: i64 = 36_000_000;

/// Member-count delta between now and the start of the 28-day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemberTotals {
    pub current: i64,
    pub past: i64,
    /// Timestamp (ms) of the past sample, or "now" when there is no data.
    pub diff: i64,
}

/// Either sample missing means the series has no usable data yet; both counts
/// zero out rather than erroring.
pub fn member_totals(
    current: Option<&TsSample>,
    past: Option<&TsSample>,
    now_ms: i64,
) -> MemberTotals {
    match (current, past) {
        (Some(current), Some(past)) => MemberTotals {
            current: current.value as i64,
            past: past.value as i64,
            diff: past.ts_ms,
        },
        _ => MemberTotals {
            current: 0,
            past: 0,
            diff: now_ms,
        },
    }
}

/// Churn rate as a 2-decimal percentage string.
///
/// `lost / (current - past) * 100`, with absent samples falling back to
/// lost=0, past=1, current=0. A non-positive denominator yields `"0.00"`
/// rather than NaN or infinity.
pub fn churn_rate(lost: Option<f64>, past: Option<f64>, current: Option<f64>) -> String {
    let lost = lost.unwrap_or(0.0);
    let past = past.unwrap_or(1.0);
    let current = current.unwrap_or(0.0);

    let joined = current - past;
    if joined <= 0.0 {
        return "0.00".to_string();
    }

    format!("{:.2}", lost / joined * 100.0)
}
