//! Guild-scoped data endpoints: listings, chart series, and statistics.
//!
//! Every handler runs the guild existence guard before anything else, so an
//! untracked guild answers 404 without issuing further store queries. Listing
//! endpoints propagate store failures; only the churn-rate computation
//! degrades to a sentinel (inside the service); preserve that asymmetry.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    error::AppError,
    middleware::session::AuthSession,
    model::{
        api::{BestMetricBody, ChurnRateBody, DataBody, RecentJoinFallback},
        query::{parse_recent_limit, ChurnWindow, MemberListQuery},
    },
    service::guild::GuildQueryService,
    state::AppState,
};

#[derive(Deserialize)]
pub struct MemberListParams {
    pub offset: Option<String>,
    pub per: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

#[derive(Deserialize)]
pub struct RecentParams {
    pub limit: Option<String>,
}

#[derive(Deserialize)]
pub struct ChurnParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// GET /guilds/{guild}/users - Paginated, sortable member listing
pub async fn list_users(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    session: Session,
    Query(params): Query<MemberListParams>,
) -> Result<Response, AppError> {
    let service = GuildQueryService::new(state.store.as_ref());
    service.ensure_guild(&guild).await?;

    AuthSession::new(&session).require_user().await?;

    let query = MemberListQuery::from_params(
        params.sort.as_deref(),
        params.order.as_deref(),
        params.offset.as_deref(),
        params.per.as_deref(),
    )?;

    let members = service.list_members(&guild, &query).await?;
    Ok(Json(DataBody { data: members }).into_response())
}

/// GET /guilds/{guild}/recent-users - Most recent joins, newest first
pub async fn recent_users(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    Query(params): Query<RecentParams>,
) -> Result<Response, AppError> {
    let service = GuildQueryService::new(state.store.as_ref());
    service.ensure_guild(&guild).await?;

    let limit = parse_recent_limit(params.limit.as_deref())?;

    let members = service.recent_members(&guild, limit).await?;
    Ok(Json(DataBody { data: members }).into_response())
}

/// GET /guilds/{guild}/roles - All role documents for the guild
pub async fn list_roles(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    session: Session,
) -> Result<Response, AppError> {
    if AuthSession::new(&session).user().await?.is_none() {
        return Err(AppError::Unauthorized("not logged in".to_string()));
    }

    let service = GuildQueryService::new(state.store.as_ref());
    service.ensure_guild(&guild).await?;

    let roles = service.list_roles(&guild).await?;
    Ok(Json(DataBody { data: roles }).into_response())
}

/// GET /guilds/{guild}/analytics - Member-count series for the chart
pub async fn analytics(
    State(state): State<AppState>,
    Path(guild): Path<String>,
) -> Result<Response, AppError> {
    let service = GuildQueryService::new(state.store.as_ref());
    service.ensure_guild(&guild).await?;

    let series = service.analytics_series(&guild).await?;
    Ok(Json(DataBody { data: series }).into_response())
}

/// GET /guilds/{guild}/stats/total-members - Current vs 28-day-old count
pub async fn total_members(
    State(state): State<AppState>,
    Path(guild): Path<String>,
) -> Result<Response, AppError> {
    let service = GuildQueryService::new(state.store.as_ref());
    service.ensure_guild(&guild).await?;

    let totals = service
        .member_totals(&guild, chrono::Utc::now().timestamp_millis())
        .await?;
    Ok(Json(totals).into_response())
}

/// GET /guilds/{guild}/stats/churn-rate - Leave rate over the window
pub async fn churn_rate(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    Query(params): Query<ChurnParams>,
) -> Result<Response, AppError> {
    let service = GuildQueryService::new(state.store.as_ref());
    service.ensure_guild(&guild).await?;

    let window = ChurnWindow::from_params(
        params.start.as_deref(),
        params.end.as_deref(),
        chrono::Utc::now().timestamp_millis(),
    );

    let rate = service.churn_rate(&guild, &window).await;
    Ok(Json(ChurnRateBody { rate }).into_response())
}

/// GET /guilds/{guild}/stats/best-metric - Most common join method
pub async fn best_metric(
    State(state): State<AppState>,
    Path(guild): Path<String>,
) -> Result<Response, AppError> {
    let service = GuildQueryService::new(state.store.as_ref());
    service.ensure_guild(&guild).await?;

    let (metric, hits) = service
        .best_join_metric(&guild)
        .await?
        .unwrap_or_else(|| ("N/A".to_string(), 0));

    Ok(Json(BestMetricBody { metric, hits }).into_response())
}

/// GET /guilds/{guild}/stats/most-recent-metric - Latest join document
pub async fn most_recent_metric(
    State(state): State<AppState>,
    Path(guild): Path<String>,
) -> Result<Response, AppError> {
    let service = GuildQueryService::new(state.store.as_ref());
    service.ensure_guild(&guild).await?;

    match service.most_recent_join(&guild).await? {
        Some(member) => Ok(Json(DataBody { data: member }).into_response()),
        // No members yet: a valid state, answered with sentinels.
        None => Ok(Json(DataBody {
            data: RecentJoinFallback {
                join_type: "N/A",
                ts: chrono::Utc::now().timestamp(),
            },
        })
        .into_response()),
    }
}
