//! Login, OAuth callback, and logout handlers.
//!
//! Every failure in the flow resolves to a redirect rather than an error
//! status: a broken callback sends the browser back to the login entry point,
//! never a 500. No retries; authorization codes are single-use.

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use oauth2::TokenResponse;
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    error::AppError,
    middleware::session::AuthSession,
    model::user::{CachedUserRecord, UserIdentity},
    service::{oauth::DiscordAuthService, user::UserCacheService},
    state::AppState,
};

const DASHBOARD_PATH: &str = "/dashboard";
const LOGIN_PATH: &str = "/auth/login";

#[derive(Deserialize)]
pub struct LoginParams {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct CallbackParams {
    /// Authorization code from the identity provider. Absent when the flow
    /// was aborted or the callback was reached directly.
    pub code: Option<String>,
}

/// GET /auth/login - Entry point of the login flow
///
/// Already-authenticated callers are sent on to `next` (default the
/// dashboard); everyone else is redirected to the identity provider's
/// authorize endpoint.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<LoginParams>,
) -> Result<Redirect, AppError> {
    let auth_session = AuthSession::new(&session);

    if auth_session.user().await?.is_some_and(|u| u.is_logged_in) {
        let next = params.next.unwrap_or_else(|| DASHBOARD_PATH.to_string());
        return Ok(Redirect::temporary(&strip_code_param(&next)));
    }

    let auth_service = DiscordAuthService::new(state.http_client.clone(), state.oauth_client.clone());

    Ok(Redirect::temporary(auth_service.login_url().as_str()))
}

/// GET /auth/callback - Code exchange and session creation
///
/// Redirects to the dashboard on success (with the transient `code`
/// parameter gone) or back to the login entry point on any flow failure.
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect, AppError> {
    let Some(code) = params.code else {
        return Ok(Redirect::temporary(LOGIN_PATH));
    };

    match complete_login(&state, &session, code).await {
        Ok(()) => Ok(Redirect::temporary(DASHBOARD_PATH)),
        Err(err) => {
            tracing::warn!("auth callback failed: {err}");
            Ok(Redirect::temporary(LOGIN_PATH))
        }
    }
}

/// GET /auth/logout - Clears the session user and invalidates the session
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    AuthSession::new(&session).logout().await?;
    Ok(Redirect::temporary("/"))
}

/// Removes any transient `code` parameter from a redirect target, so a `next`
/// captured mid-callback never replays the single-use authorization code.
fn strip_code_param(target: &str) -> String {
    let Some((path, query)) = target.split_once('?') else {
        return target.to_string();
    };

    let kept: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| key != "code")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        return path.to_string();
    }

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    format!("{path}?{}", serializer.finish())
}

async fn complete_login(
    state: &AppState,
    session: &Session,
    code: String,
) -> Result<(), AppError> {
    let auth_service = DiscordAuthService::new(state.http_client.clone(), state.oauth_client.clone());

    let token = auth_service.exchange_code(code).await?;
    let access_token = token.access_token().secret().clone();

    let profile = auth_service.fetch_profile(&access_token).await?;
    let guilds = auth_service.fetch_guilds(&access_token).await?;

    let identity = UserIdentity {
        is_logged_in: true,
        avatar_url: profile.avatar_url(),
        access_token: Some(access_token.clone()),
    };
    let record = CachedUserRecord {
        user: profile,
        guilds,
    };

    UserCacheService::new(state.store.as_ref())
        .cache_login(&access_token, &record)
        .await?;
    AuthSession::new(session).set_user(&identity).await?;

    Ok(())
}
