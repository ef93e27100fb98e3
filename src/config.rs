use crate::error::{config::ConfigError, AppError};

const DISCORD_AUTH_URL: &str = "https://discord.com/api/oauth2/authorize";
const DISCORD_TOKEN_URL: &str = "https://discord.com/api/oauth2/token";

/// Base URL for authenticated Discord REST calls (profile, guild membership).
pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

const DEFAULT_PORT: u16 = 3000;

pub struct Config {
    pub redis_url: String,

    pub discord_client_id: String,
    pub discord_client_secret: String,

    /// Public base URL of this deployment, used to build the OAuth redirect URI.
    pub app_url: String,

    /// Secret for the private session cookie. Must be at least 64 bytes.
    pub session_secret: String,

    pub port: u16,

    pub discord_auth_url: String,
    pub discord_token_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            redis_url: std::env::var("REDIS_URL")
                .map_err(|_| ConfigError::MissingEnvVar("REDIS_URL".to_string()))?,
            discord_client_id: std::env::var("DISCORD_CLIENT_ID")
                .map_err(|_| ConfigError::MissingEnvVar("DISCORD_CLIENT_ID".to_string()))?,
            discord_client_secret: std::env::var("DISCORD_CLIENT_SECRET")
                .map_err(|_| ConfigError::MissingEnvVar("DISCORD_CLIENT_SECRET".to_string()))?,
            app_url: std::env::var("APP_URL")
                .map_err(|_| ConfigError::MissingEnvVar("APP_URL".to_string()))?,
            session_secret: std::env::var("SESSION_SECRET")
                .map_err(|_| ConfigError::MissingEnvVar("SESSION_SECRET".to_string()))?,
            port: std::env::var("PORT")
                .ok()
                .and_then(|raw| raw.parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT),
            discord_auth_url: DISCORD_AUTH_URL.to_string(),
            discord_token_url: DISCORD_TOKEN_URL.to_string(),
        })
    }
}
