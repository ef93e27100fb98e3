use axum::response::{IntoResponse, Redirect, Response};
use thiserror::Error;

/// Failures of the OAuth login flow.
///
/// Every variant resolves to a redirect back to the login entry point rather
/// than an error status: authorization codes are single-use, so the only
/// recovery is to restart the flow from the top.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The identity provider rejected the authorization code exchange.
    #[error("Failed to exchange authorization code: {0}")]
    CodeExchange(String),

    /// The token was granted with a scope other than the one requested.
    ///
    /// Pre-existing grants with a different scope ordering or content must
    /// fail closed, so the granted scope string is compared verbatim.
    #[error("Token granted scope '{granted}', expected '{expected}'")]
    ScopeMismatch {
        granted: String,
        expected: &'static str,
    },

    /// A profile or guild-membership request to the identity provider failed.
    #[error("Identity provider request failed: {0}")]
    Provider(#[from] reqwest::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::warn!("auth flow failure: {}", self);
        Redirect::temporary("/auth/login").into_response()
    }
}
