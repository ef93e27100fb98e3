use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A member document as written by the bot's ingestion pipeline.
///
/// Owned and persisted entirely by the external store; this service only
/// reads, filters, sorts, and paginates. `ts` is a Unix-seconds timestamp and
/// the canonical sort key for recency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberRecord {
    pub id: u64,
    pub display_name: String,
    pub username: String,
    pub avatar: String,
    pub created_at: NaiveDate,
    pub joined_at: NaiveDate,
    pub join_type: String,
    pub ts: i64,
    #[serde(default)]
    pub code_used: Option<String>,
    #[serde(default)]
    pub inviter: Option<u64>,
    pub guild: u64,
}

/// A role document from the store's role index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuildRole {
    pub id: u64,
    pub guild_id: u64,
    pub name: String,
    pub color: i64,
    pub position: i64,
    pub permissions: u64,
    pub hoist: bool,
    pub managed: bool,
    pub mentionable: bool,
}
