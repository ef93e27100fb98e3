//! OAuth2 login with Discord.

use oauth2::{
    basic::BasicTokenType, AuthorizationCode, CsrfToken, EmptyExtraTokenFields, Scope,
    StandardTokenResponse, TokenResponse,
};
use url::Url;

use crate::{
    config::DISCORD_API_BASE,
    error::auth::AuthError,
    model::{guild::UserGuild, user::DiscordProfile},
    state::OAuth2Client,
};

/// Exact scope string the token response must carry. Grants with any other
/// ordering or content fail closed.
pub const REQUIRED_SCOPE: &str = "identify guilds";

pub(crate) type TokenReply = StandardTokenResponse<EmptyExtraTokenFields, BasicTokenType>;

pub struct DiscordAuthService {
    http_client: reqwest::Client,
    oauth_client: OAuth2Client,
}

impl DiscordAuthService {
    pub fn new(http_client: reqwest::Client, oauth_client: OAuth2Client) -> Self {
        Self {
            http_client,
            oauth_client,
        }
    }

    /// Authorize URL requesting `identify guilds` with `prompt=none`, so a
    /// user who already consented is not shown a consent screen again.
    pub fn login_url(&self) -> Url {
        let (authorize_url, _csrf_state) = self
            .oauth_client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("identify".to_string()))
            .add_scope(Scope::new("guilds".to_string()))
            .add_extra_param("prompt", "none")
            .url();

        authorize_url
    }

    /// Exchanges the callback code for an access token and verifies the
    /// granted scope verbatim. No retries: authorization codes are single-use.
    pub async fn exchange_code(&self, authorization_code: String) -> Result<TokenReply, AuthError> {
        let token = self
            .oauth_client
            .exchange_code(AuthorizationCode::new(authorization_code))
            .request_async(&self.http_client)
            .await
            .map_err(|e| AuthError::CodeExchange(e.to_string()))?;

        let granted = granted_scope(&token);
        if granted != REQUIRED_SCOPE {
            return Err(AuthError::ScopeMismatch {
                granted,
                expected: REQUIRED_SCOPE,
            });
        }

        Ok(token)
    }

    /// Retrieves the authenticated user's profile.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<DiscordProfile, AuthError> {
        let profile = self
            .http_client
            .get(format!("{DISCORD_API_BASE}/users/@me"))
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?
            .error_for_status()?
            .json::<DiscordProfile>()
            .await?;

        Ok(profile)
    }

    /// Retrieves the authenticated user's guild memberships.
    pub async fn fetch_guilds(&self, access_token: &str) -> Result<Vec<UserGuild>, AuthError> {
        let guilds = self
            .http_client
            .get(format!("{DISCORD_API_BASE}/users/@me/guilds"))
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<UserGuild>>()
            .await?;

        Ok(guilds)
    }
}

/// The token's granted scopes joined back into the provider's space-separated
/// form, for verbatim comparison against [`REQUIRED_SCOPE`].
fn granted_scope(token: &TokenReply) -> String {
    token
        .scopes()
        .map(|scopes| {
            scopes
                .iter()
                .map(|scope| scope.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}
