//! Type-safe session management wrapper.
//!
//! Wraps the tower-sessions `Session` behind a small typed interface so
//! handlers never touch raw session keys. The session carries at most one
//! value, the `UserIdentity` built at callback time; a session without it is
//! simply "not logged in", never an error state.

use tower_sessions::Session;

use crate::{error::AppError, model::user::UserIdentity};

const SESSION_AUTH_USER: &str = "auth:user";

pub struct AuthSession<'a> {
    session: &'a Session,
}

impl<'a> AuthSession<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Reads the identity from the session without mutating anything.
    pub async fn user(&self) -> Result<Option<UserIdentity>, AppError> {
        Ok(self.session.get::<UserIdentity>(SESSION_AUTH_USER).await?)
    }

    /// Returns the logged-in identity or a 401-mapped error.
    pub async fn require_user(&self) -> Result<UserIdentity, AppError> {
        self.user()
            .await?
            .filter(|user| user.is_logged_in)
            .ok_or_else(|| AppError::Unauthorized("unauthorized".to_string()))
    }

    /// Stores the identity built during the OAuth callback.
    pub async fn set_user(&self, user: &UserIdentity) -> Result<(), AppError> {
        self.session.insert(SESSION_AUTH_USER, user).await?;
        Ok(())
    }

    /// Clears the user field and invalidates the persisted session.
    pub async fn logout(&self) -> Result<(), AppError> {
        self.session
            .remove::<UserIdentity>(SESSION_AUTH_USER)
            .await?;
        self.session.flush().await?;
        Ok(())
    }
}
