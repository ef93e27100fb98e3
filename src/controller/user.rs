//! Current-user endpoints backed by the login-time cache.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tower_sessions::Session;

use crate::{
    error::AppError, middleware::session::AuthSession, service::user::UserCacheService,
    state::AppState,
};

/// GET /user - The caller's cached provider profile
///
/// An anonymous caller (or one whose cache entry has expired) gets
/// `{user: null}` with a 200; that is a valid state, not an error.
pub async fn get_user(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let Some(token) = logged_in_token(&session).await? else {
        return Ok(Json(json!({ "user": null })).into_response());
    };

    let cache = UserCacheService::new(state.store.as_ref());
    match cache.cached_record(&token).await? {
        Some(record) => Ok(Json(record.user).into_response()),
        None => Ok(Json(json!({ "user": null })).into_response()),
    }
}

/// GET /user/guilds - The caller's guilds with tracking annotations
///
/// Each guild carries `bot_exists` (the store has a record for it) and
/// `manage_server` (the caller holds the Manage Server permission bit).
pub async fn get_user_guilds(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let Some(token) = logged_in_token(&session).await? else {
        return Ok(Json(json!({ "guilds": [] })).into_response());
    };

    let cache = UserCacheService::new(state.store.as_ref());
    let guilds = cache.annotated_guilds(&token).await?;

    Ok(Json(json!({ "guilds": guilds })).into_response())
}

async fn logged_in_token(session: &Session) -> Result<Option<String>, AppError> {
    let user = AuthSession::new(session).user().await?;
    Ok(user.filter(|u| u.is_logged_in).and_then(|u| u.access_token))
}
