//! Capability interface over the external time-series/search store.
//!
//! Guild membership data lives in a Redis deployment with the search,
//! time-series, and JSON modules loaded; this service only ever reads it
//! (apart from the login-time user cache write). All access goes through the
//! narrow `DataStore` trait so handlers never touch a connection directly and
//! tests can substitute a mock.

pub mod decode;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use crate::error::store::StoreError;
use decode::{SearchReply, TsSample};

/// Search index over member documents, keyed by guild.
pub const MEMBER_INDEX: &str = ":models.Member:index";

/// Search index over role documents.
pub const ROLE_INDEX: &str = ":models.Role:index";

/// TTL for the `user:<accessToken>` cache entry.
pub const USER_CACHE_TTL_SECS: i64 = 60 * 60 * 24 * 7;

/// One bound of a time-series range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Earliest,
    Latest,
    At(i64),
}

impl RangeBound {
    fn to_arg(self) -> String {
        match self {
            Self::Earliest => "-".to_string(),
            Self::Latest => "+".to_string(),
            Self::At(ms) => ms.to_string(),
        }
    }
}

/// Read (and narrow cache-write) operations the dashboard needs from the store.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// `EXISTS guild:<id>`, the mandatory guard before any guild-scoped query.
    async fn guild_exists(&self, guild_id: &str) -> Result<bool, StoreError>;

    /// Batched existence checks, one per guild, in a single atomic pipeline.
    async fn guilds_exist(&self, guild_ids: &[String]) -> Result<Vec<bool>, StoreError>;

    /// Full-text search scoped to a guild, optionally ordered and paginated.
    async fn search_index(
        &self,
        index: &'static str,
        guild_id: &str,
        sort_by: &str,
        order: Option<&str>,
        page: Option<(u64, u64)>,
    ) -> Result<SearchReply, StoreError>;

    /// Most recent sample of a series, `None` when the series is empty.
    async fn ts_get(&self, key: &str) -> Result<Option<TsSample>, StoreError>;

    /// First sample at or after `from_ms`.
    async fn ts_first_since(&self, key: &str, from_ms: i64) -> Result<Option<TsSample>, StoreError>;

    /// Range query with server-side aggregation into fixed buckets.
    async fn ts_aggregate(
        &self,
        key: &str,
        from: RangeBound,
        to: RangeBound,
        aggregation: &'static str,
        bucket_ms: i64,
    ) -> Result<Vec<TsSample>, StoreError>;

    /// Top group of a grouped-count aggregation, `None` when no documents match.
    async fn top_group_count(
        &self,
        index: &'static str,
        guild_id: &str,
        group_field: &str,
    ) -> Result<Option<(String, i64)>, StoreError>;

    /// Raw JSON document lookup, `None` when the key is absent or expired.
    async fn json_get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a JSON document and applies a TTL in one atomic pipeline.
    async fn json_set_with_ttl(
        &self,
        key: &str,
        json: &str,
        ttl_secs: i64,
    ) -> Result<(), StoreError>;
}

/// `DataStore` backed by a managed Redis connection.
///
/// `ConnectionManager` multiplexes and reconnects internally, so clones are
/// cheap and the store handle can live in the shared application state.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    fn guild_key(guild_id: &str) -> String {
        format!("guild:{guild_id}")
    }

    /// Numeric-range filter matching exactly one guild id.
    fn guild_filter(guild_id: &str) -> String {
        format!("@guild:[{guild_id} {guild_id}]")
    }
}

#[async_trait]
impl DataStore for RedisStore {
    async fn guild_exists(&self, guild_id: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let exists: i64 = redis::cmd("EXISTS")
            .arg(Self::guild_key(guild_id))
            .query_async(&mut conn)
            .await?;
        Ok(exists == 1)
    }

    async fn guilds_exist(&self, guild_ids: &[String]) -> Result<Vec<bool>, StoreError> {
        if guild_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic();
        for guild_id in guild_ids {
            pipe.cmd("EXISTS").arg(Self::guild_key(guild_id));
        }

        let flags: Vec<i64> = pipe.query_async(&mut conn).await?;
        Ok(flags.into_iter().map(|flag| flag == 1).collect())
    }

    async fn search_index(
        &self,
        index: &'static str,
        guild_id: &str,
        sort_by: &str,
        order: Option<&str>,
        page: Option<(u64, u64)>,
    ) -> Result<SearchReply, StoreError> {
        let mut conn = self.conn.clone();

        let mut cmd = redis::cmd("FT.SEARCH");
        cmd.arg(index)
            .arg(Self::guild_filter(guild_id))
            .arg("SORTBY")
            .arg(sort_by);
        if let Some(order) = order {
            cmd.arg(order);
        }
        if let Some((offset, limit)) = page {
            cmd.arg("LIMIT").arg(offset).arg(limit);
        }

        let value: redis::Value = cmd.query_async(&mut conn).await?;
        SearchReply::decode(value)
    }

    async fn ts_get(&self, key: &str) -> Result<Option<TsSample>, StoreError> {
        let mut conn = self.conn.clone();
        let value: redis::Value = redis::cmd("TS.GET").arg(key).query_async(&mut conn).await?;
        decode::decode_sample(value)
    }

    async fn ts_first_since(&self, key: &str, from_ms: i64) -> Result<Option<TsSample>, StoreError> {
        let mut conn = self.conn.clone();
        let value: redis::Value = redis::cmd("TS.RANGE")
            .arg(key)
            .arg(from_ms)
            .arg("+")
            .arg("COUNT")
            .arg(1)
            .query_async(&mut conn)
            .await?;
        Ok(decode::decode_range(value)?.into_iter().next())
    }

    async fn ts_aggregate(
        &self,
        key: &str,
        from: RangeBound,
        to: RangeBound,
        aggregation: &'static str,
        bucket_ms: i64,
    ) -> Result<Vec<TsSample>, StoreError> {
        let mut conn = self.conn.clone();
        let value: redis::Value = redis::cmd("TS.RANGE")
            .arg(key)
            .arg(from.to_arg())
            .arg(to.to_arg())
            .arg("AGGREGATION")
            .arg(aggregation)
            .arg(bucket_ms)
            .query_async(&mut conn)
            .await?;
        decode::decode_range(value)
    }

    async fn top_group_count(
        &self,
        index: &'static str,
        guild_id: &str,
        group_field: &str,
    ) -> Result<Option<(String, i64)>, StoreError> {
        let mut conn = self.conn.clone();
        let value: redis::Value = redis::cmd("FT.AGGREGATE")
            .arg(index)
            .arg(Self::guild_filter(guild_id))
            .arg("GROUPBY")
            .arg(1)
            .arg(format!("@{group_field}"))
            .arg("REDUCE")
            .arg("count")
            .arg(0)
            .arg("AS")
            .arg("num_visits")
            .arg("SORTBY")
            .arg(2)
            .arg("@num_visits")
            .arg("DESC")
            .arg("LIMIT")
            .arg(0)
            .arg(1)
            .query_async(&mut conn)
            .await?;
        decode::decode_top_group(value)
    }

    async fn json_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("JSON.GET").arg(key).query_async(&mut conn).await?;
        Ok(raw)
    }

    async fn json_set_with_ttl(
        &self,
        key: &str,
        json: &str,
        ttl_secs: i64,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .cmd("JSON.SET")
            .arg(key)
            .arg("$")
            .arg(json)
            .ignore()
            .cmd("EXPIRE")
            .arg(key)
            .arg(ttl_secs)
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }
}
