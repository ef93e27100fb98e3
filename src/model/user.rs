use serde::{Deserialize, Serialize};

use crate::model::guild::UserGuild;

/// Identity carried in the encrypted session cookie.
///
/// Derived once at callback time from the identity provider's token and
/// profile responses. The access token doubles as the lookup key into the
/// store's cached user record. Invariant: `access_token` is present whenever
/// `is_logged_in` is true.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserIdentity {
    pub is_logged_in: bool,
    pub access_token: Option<String>,
    pub avatar_url: Option<String>,
}

/// The authenticated user's Discord profile as fetched during callback.
///
/// Known fields are typed; everything else the provider sends is preserved in
/// `extra` so the cached record round-trips losslessly through the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscordProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DiscordProfile {
    /// CDN URL for the user's avatar, when they have one set.
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar.as_ref().map(|hash| {
            format!(
                "https://cdn.discordapp.com/avatars/{}/{}.webp",
                self.id, hash
            )
        })
    }
}

/// Profile and guild memberships cached under `user:<accessToken>`.
///
/// Written once per successful login with a 7-day TTL; read on every request
/// that needs guild membership. Logout does not evict it (stateless logout);
/// the record ages out on its TTL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedUserRecord {
    pub user: DiscordProfile,
    pub guilds: Vec<UserGuild>,
}
