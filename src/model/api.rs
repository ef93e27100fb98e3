use serde::{Deserialize, Serialize};

/// Structured error body returned by every failing data endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiError {
    pub status: String,
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

/// Standard `{data: ...}` envelope for listing and series endpoints.
#[derive(Debug, Serialize)]
pub struct DataBody<T> {
    pub data: T,
}

/// Response body for the churn-rate endpoint; the rate is a 2-decimal
/// percentage rendered as a string.
#[derive(Debug, Serialize)]
pub struct ChurnRateBody {
    pub rate: String,
}

/// Response body for the best join-method metric.
#[derive(Debug, Serialize)]
pub struct BestMetricBody {
    pub metric: String,
    pub hits: i64,
}

/// Sentinel payload for the most-recent-metric endpoint when a guild has no
/// member documents yet. A valid "no data" state, not a failure.
#[derive(Debug, Serialize)]
pub struct RecentJoinFallback {
    pub join_type: &'static str,
    pub ts: i64,
}
