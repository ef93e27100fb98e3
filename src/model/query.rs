//! Validation of untrusted query-string parameters into typed requests.
//!
//! The contract is deliberately asymmetric: sort field, sort order, and limit
//! reject with a 400 on anything malformed, while offset and the date bounds
//! fall back to documented defaults. Negative offsets and limits clamp to
//! zero.

use crate::error::AppError;

/// Milliseconds in the default 28-day lookback window.
pub const FOUR_WEEKS_MS: i64 = 2_419_200_000;

/// Sortable member-document fields. Anything outside this allow-list is
/// rejected, not defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Ts,
    DisplayName,
    CreatedAt,
    JoinedAt,
    Id,
    JoinType,
    Username,
    CodeUsed,
}

impl SortField {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.to_lowercase().as_str() {
            "ts" => Ok(Self::Ts),
            "display_name" => Ok(Self::DisplayName),
            "created_at" => Ok(Self::CreatedAt),
            "joined_at" => Ok(Self::JoinedAt),
            "id" => Ok(Self::Id),
            "join_type" => Ok(Self::JoinType),
            "username" => Ok(Self::Username),
            "code_used" => Ok(Self::CodeUsed),
            _ => Err(AppError::BadRequest("invalid sortby".to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ts => "ts",
            Self::DisplayName => "display_name",
            Self::CreatedAt => "created_at",
            Self::JoinedAt => "joined_at",
            Self::Id => "id",
            Self::JoinType => "join_type",
            Self::Username => "username",
            Self::CodeUsed => "code_used",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Case-normalizes to uppercase before matching; anything other than
    /// `ASC` or `DESC` is rejected.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.to_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            _ => Err(AppError::BadRequest("invalid sortorder".to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Validated parameters for the paginated members listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberListQuery {
    pub sort: SortField,
    pub order: SortOrder,
    pub offset: u64,
    pub limit: u64,
}

impl MemberListQuery {
    pub const DEFAULT_LIMIT: u64 = 20;
    pub const MAX_LIMIT: u64 = 100;

    pub fn from_params(
        sort: Option<&str>,
        order: Option<&str>,
        offset: Option<&str>,
        per: Option<&str>,
    ) -> Result<Self, AppError> {
        let sort = SortField::parse(sort.unwrap_or("ts"))?;
        let order = SortOrder::parse(order.unwrap_or("DESC"))?;
        let offset = parse_offset(offset);

        let limit = match per {
            None => Self::DEFAULT_LIMIT,
            Some(raw) => {
                let per = raw
                    .parse::<i64>()
                    .map_err(|_| AppError::BadRequest("invalid per".to_string()))?;
                if per > Self::MAX_LIMIT as i64 {
                    return Err(AppError::BadRequest(format!(
                        "per must be a number no greater than {}",
                        Self::MAX_LIMIT
                    )));
                }
                per.max(0) as u64
            }
        };

        Ok(Self {
            sort,
            order,
            offset,
            limit,
        })
    }
}

/// Offsets are lenient, unlike limits: non-numeric values are treated as 0.
fn parse_offset(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.parse::<i64>().ok()).unwrap_or(0).max(0) as u64
}

/// Limit for the recent-users endpoint: missing defaults to 5, anything
/// non-numeric or above 10 is rejected.
pub fn parse_recent_limit(raw: Option<&str>) -> Result<u64, AppError> {
    const DEFAULT: u64 = 5;
    const MAX: i64 = 10;

    let Some(raw) = raw else {
        return Ok(DEFAULT);
    };

    match raw.parse::<i64>() {
        Ok(limit) if limit <= MAX => Ok(limit.max(0) as u64),
        _ => Err(AppError::BadRequest(
            "limit must be a number less than 10".to_string(),
        )),
    }
}

/// Date range for the churn-rate window, in Unix milliseconds.
///
/// A missing or unparseable `start` defaults to 28 days before now; a missing
/// or unparseable `end` defaults to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChurnWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl ChurnWindow {
    pub fn from_params(start: Option<&str>, end: Option<&str>, now_ms: i64) -> Self {
        Self {
            start_ms: start
                .and_then(|s| s.parse::<i64>().ok())
                .unwrap_or(now_ms - FOUR_WEEKS_MS),
            end_ms: end.and_then(|s| s.parse::<i64>().ok()).unwrap_or(now_ms),
        }
    }
}
