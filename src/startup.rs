use oauth2::{basic::BasicClient, AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl};
use tower_sessions::{
    cookie::Key, service::PrivateCookie, Expiry, MemoryStore, SessionManagerLayer,
};

use crate::{
    config::Config,
    error::{config::ConfigError, AppError},
    state::OAuth2Client,
    store::RedisStore,
};

/// Connects to the Redis deployment holding the bot's analytics data.
pub async fn connect_to_store(config: &Config) -> Result<RedisStore, AppError> {
    Ok(RedisStore::connect(&config.redis_url).await?)
}

/// Builds the session layer: in-memory session store with a private
/// (encrypted) cookie, expiring after 7 days of inactivity.
pub fn session_layer(
    config: &Config,
) -> Result<SessionManagerLayer<MemoryStore, PrivateCookie>, AppError> {
    let key = Key::try_from(config.session_secret.as_bytes())
        .map_err(|_| ConfigError::InvalidSessionSecret)?;

    Ok(SessionManagerLayer::new(MemoryStore::default())
        .with_private(key)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(7))))
}

/// HTTP client for identity-provider calls. Redirects are disabled to
/// prevent SSRF via provider-controlled responses.
pub fn setup_reqwest_client() -> Result<reqwest::Client, AppError> {
    Ok(reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?)
}

/// OAuth2 client for the Discord authentication flow. The redirect URI must
/// match the one sent at authorize time exactly or the provider rejects the
/// code exchange.
pub fn setup_oauth_client(config: &Config) -> Result<OAuth2Client, AppError> {
    let client = BasicClient::new(ClientId::new(config.discord_client_id.clone()))
        .set_client_secret(ClientSecret::new(config.discord_client_secret.clone()))
        .set_auth_uri(AuthUrl::new(config.discord_auth_url.clone()).map_err(ConfigError::from)?)
        .set_token_uri(TokenUrl::new(config.discord_token_url.clone()).map_err(ConfigError::from)?)
        .set_redirect_uri(
            RedirectUrl::new(format!("{}/auth/callback", config.app_url))
                .map_err(ConfigError::from)?,
        );

    Ok(client)
}
