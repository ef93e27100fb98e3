//! Cached-profile reads and guild annotation for the logged-in user.

use crate::{
    error::store::StoreError,
    model::{guild::UserGuild, user::CachedUserRecord},
    store::{DataStore, USER_CACHE_TTL_SECS},
};

pub struct UserCacheService<'a> {
    store: &'a dyn DataStore,
}

impl<'a> UserCacheService<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    fn cache_key(access_token: &str) -> String {
        format!("user:{access_token}")
    }

    /// Writes the profile-and-guilds record fetched at callback time, keyed
    /// by the access token with a 7-day expiry.
    pub async fn cache_login(
        &self,
        access_token: &str,
        record: &CachedUserRecord,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        self.store
            .json_set_with_ttl(&Self::cache_key(access_token), &json, USER_CACHE_TTL_SECS)
            .await
    }

    /// The cached record, or `None` once the entry has expired.
    pub async fn cached_record(
        &self,
        access_token: &str,
    ) -> Result<Option<CachedUserRecord>, StoreError> {
        let Some(raw) = self.store.json_get(&Self::cache_key(access_token)).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// The caller's guilds with `bot_exists` and `manage_server` recomputed.
    ///
    /// Existence checks are batched into a single atomic pipeline, one
    /// round trip for the whole guild list.
    pub async fn annotated_guilds(&self, access_token: &str) -> Result<Vec<UserGuild>, StoreError> {
        let Some(record) = self.cached_record(access_token).await? else {
            return Ok(Vec::new());
        };

        let mut guilds = record.guilds;
        if guilds.is_empty() {
            return Ok(guilds);
        }

        let ids: Vec<String> = guilds.iter().map(|g| g.id.clone()).collect();
        let flags = self.store.guilds_exist(&ids).await?;

        for (guild, bot_exists) in guilds.iter_mut().zip(flags) {
            guild.bot_exists = bot_exists;
            guild.manage_server = guild.can_manage_server();
        }

        Ok(guilds)
    }
}
