//! Guild-scoped read operations: listing, roles, analytics, statistics.
//!
//! Every operation assumes the caller has run [`GuildQueryService::ensure_guild`]
//! first; the handlers enforce that ordering.

use crate::{
    error::{store::StoreError, AppError},
    model::{
        member::{GuildRole, MemberRecord},
        query::{ChurnWindow, MemberListQuery, FOUR_WEEKS_MS},
    },
    service::metrics::{self, MemberTotals, ANALYTICS_BUCKET_MS, CHURN_BUCKET_MS},
    store::{DataStore, RangeBound, MEMBER_INDEX, ROLE_INDEX},
};

pub struct GuildQueryService<'a> {
    store: &'a dyn DataStore,
}

impl<'a> GuildQueryService<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    fn members_series(guild_id: &str) -> String {
        format!("guild:{guild_id}:members")
    }

    fn leave_series(guild_id: &str) -> String {
        format!("guild:{guild_id}:sources.leave")
    }

    /// Mandatory guard before any guild-scoped query: 404 when the guild has
    /// no record in the store, with no further query issued.
    pub async fn ensure_guild(&self, guild_id: &str) -> Result<(), AppError> {
        if !self.store.guild_exists(guild_id).await? {
            return Err(AppError::NotFound("guild not found".to_string()));
        }
        Ok(())
    }

    pub async fn list_members(
        &self,
        guild_id: &str,
        query: &MemberListQuery,
    ) -> Result<Vec<MemberRecord>, AppError> {
        let reply = self
            .store
            .search_index(
                MEMBER_INDEX,
                guild_id,
                query.sort.as_str(),
                Some(query.order.as_str()),
                Some((query.offset, query.limit)),
            )
            .await?;

        Ok(reply.documents()?)
    }

    /// Most recently joined members, newest first.
    pub async fn recent_members(
        &self,
        guild_id: &str,
        limit: u64,
    ) -> Result<Vec<MemberRecord>, AppError> {
        let reply = self
            .store
            .search_index(MEMBER_INDEX, guild_id, "ts", Some("DESC"), Some((0, limit)))
            .await?;

        Ok(reply.documents()?)
    }

    pub async fn list_roles(&self, guild_id: &str) -> Result<Vec<GuildRole>, AppError> {
        let reply = self
            .store
            .search_index(ROLE_INDEX, guild_id, "ts", None, None)
            .await?;

        Ok(reply.documents()?)
    }

    /// Full-range average of the member-count series, bucketed for charting.
    pub async fn analytics_series(&self, guild_id: &str) -> Result<Vec<(i64, f64)>, AppError> {
        let samples = self
            .store
            .ts_aggregate(
                &Self::members_series(guild_id),
                RangeBound::Earliest,
                RangeBound::Latest,
                "avg",
                ANALYTICS_BUCKET_MS,
            )
            .await?;

        Ok(samples.into_iter().map(|s| (s.ts_ms, s.value)).collect())
    }

    pub async fn member_totals(
        &self,
        guild_id: &str,
        now_ms: i64,
    ) -> Result<MemberTotals, AppError> {
        let series = Self::members_series(guild_id);
        let current = self.store.ts_get(&series).await?;
        let past = self
            .store
            .ts_first_since(&series, now_ms - FOUR_WEEKS_MS)
            .await?;

        Ok(metrics::member_totals(
            current.as_ref(),
            past.as_ref(),
            now_ms,
        ))
    }

    /// Churn rate for the window; a store failure inside this computation
    /// degrades to a 0% rate so one metric outage does not fail the request.
    /// This is the only place in the service that absorbs store errors.
    pub async fn churn_rate(&self, guild_id: &str, window: &ChurnWindow) -> String {
        match self.churn_inputs(guild_id, window).await {
            Ok((lost, past, current)) => metrics::churn_rate(lost, past, current),
            Err(err) => {
                tracing::error!("churn-rate store failure for guild {guild_id}: {err}");
                "0.00".to_string()
            }
        }
    }

    async fn churn_inputs(
        &self,
        guild_id: &str,
        window: &ChurnWindow,
    ) -> Result<(Option<f64>, Option<f64>, Option<f64>), StoreError> {
        let lost = self
            .store
            .ts_aggregate(
                &Self::leave_series(guild_id),
                RangeBound::At(window.start_ms),
                RangeBound::At(window.end_ms),
                "count",
                CHURN_BUCKET_MS,
            )
            .await?;
        let past = self
            .store
            .ts_first_since(&Self::members_series(guild_id), window.start_ms)
            .await?;
        let current = self.store.ts_get(&Self::members_series(guild_id)).await?;

        Ok((
            lost.first().map(|s| s.value),
            past.map(|s| s.value),
            current.map(|s| s.value),
        ))
    }

    /// Most common join method, or `None` for a guild with no member
    /// documents yet.
    pub async fn best_join_metric(&self, guild_id: &str) -> Result<Option<(String, i64)>, AppError> {
        Ok(self
            .store
            .top_group_count(MEMBER_INDEX, guild_id, "join_type")
            .await?)
    }

    /// The single most recent member document, `None` when the guild has no
    /// members yet.
    pub async fn most_recent_join(&self, guild_id: &str) -> Result<Option<MemberRecord>, AppError> {
        let reply = self
            .store
            .search_index(MEMBER_INDEX, guild_id, "ts", Some("DESC"), Some((0, 1)))
            .await?;

        Ok(reply.documents()?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::model::query::{SortField, SortOrder};
    use crate::store::decode::{SearchReply, TsSample};

    /// Canned store that records every command it receives.
    #[derive(Default)]
    struct MockStore {
        guild_present: bool,
        search: Option<SearchReply>,
        current: Option<TsSample>,
        first_since: Option<TsSample>,
        aggregated: Vec<TsSample>,
        top_group: Option<(String, i64)>,
        fail_time_series: bool,
        calls: Mutex<Vec<String>>,
    }

    impl MockStore {
        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn ts_failure() -> StoreError {
            StoreError::decode("TS.RANGE", "connection reset")
        }
    }

    #[async_trait]
    impl DataStore for MockStore {
        async fn guild_exists(&self, guild_id: &str) -> Result<bool, StoreError> {
            self.record(format!("EXISTS guild:{guild_id}"));
            Ok(self.guild_present)
        }

        async fn guilds_exist(&self, guild_ids: &[String]) -> Result<Vec<bool>, StoreError> {
            self.record(format!("EXISTS x{}", guild_ids.len()));
            Ok(guild_ids.iter().map(|_| self.guild_present).collect())
        }

        async fn search_index(
            &self,
            index: &'static str,
            guild_id: &str,
            sort_by: &str,
            order: Option<&str>,
            page: Option<(u64, u64)>,
        ) -> Result<SearchReply, StoreError> {
            self.record(format!(
                "FT.SEARCH {index} {guild_id} {sort_by} {order:?} {page:?}"
            ));
            Ok(self
                .search
                .clone()
                .unwrap_or_else(|| SearchReply::from_docs(0, Vec::new())))
        }

        async fn ts_get(&self, key: &str) -> Result<Option<TsSample>, StoreError> {
            self.record(format!("TS.GET {key}"));
            if self.fail_time_series {
                return Err(Self::ts_failure());
            }
            Ok(self.current)
        }

        async fn ts_first_since(
            &self,
            key: &str,
            from_ms: i64,
        ) -> Result<Option<TsSample>, StoreError> {
            self.record(format!("TS.RANGE {key} {from_ms} + COUNT 1"));
            if self.fail_time_series {
                return Err(Self::ts_failure());
            }
            Ok(self.first_since)
        }

        async fn ts_aggregate(
            &self,
            key: &str,
            _from: RangeBound,
            _to: RangeBound,
            aggregation: &'static str,
            bucket_ms: i64,
        ) -> Result<Vec<TsSample>, StoreError> {
            self.record(format!("TS.RANGE {key} AGGREGATION {aggregation} {bucket_ms}"));
            if self.fail_time_series {
                return Err(Self::ts_failure());
            }
            Ok(self.aggregated.clone())
        }

        async fn top_group_count(
            &self,
            index: &'static str,
            guild_id: &str,
            group_field: &str,
        ) -> Result<Option<(String, i64)>, StoreError> {
            self.record(format!("FT.AGGREGATE {index} {guild_id} {group_field}"));
            Ok(self.top_group.clone())
        }

        async fn json_get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.record(format!("JSON.GET {key}"));
            Ok(None)
        }

        async fn json_set_with_ttl(
            &self,
            key: &str,
            _json: &str,
            ttl_secs: i64,
        ) -> Result<(), StoreError> {
            self.record(format!("JSON.SET {key} EXPIRE {ttl_secs}"));
            Ok(())
        }
    }

    fn member_reply() -> SearchReply {
        let json = r#"{
            "display_name": "Nelly",
            "username": "nelly",
            "avatar": "aa",
            "created_at": "2020-03-01",
            "id": 1,
            "guild": 99,
            "joined_at": "2023-06-15",
            "join_type": "invite",
            "ts": 1686825600
        }"#;
        SearchReply::from_docs(
            1,
            vec![vec![
                "ts".to_string(),
                "1686825600".to_string(),
                "$".to_string(),
                json.to_string(),
            ]],
        )
    }

    #[tokio::test]
    async fn missing_guild_is_not_found_and_issues_no_further_query() {
        let store = MockStore::default();
        let service = GuildQueryService::new(&store);

        let result = service.ensure_guild("641782804849491979").await;
        match result {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "guild not found"),
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert_eq!(store.calls(), vec!["EXISTS guild:641782804849491979"]);
    }

    #[tokio::test]
    async fn list_members_passes_validated_sort_and_pagination() {
        let store = MockStore {
            guild_present: true,
            search: Some(member_reply()),
            ..Default::default()
        };
        let service = GuildQueryService::new(&store);

        let query = MemberListQuery {
            sort: SortField::JoinedAt,
            order: SortOrder::Asc,
            offset: 40,
            limit: 20,
        };
        let members = service.list_members("99", &query).await.unwrap();

        assert_eq!(members.len(), 1);
        assert_eq!(
            store.calls(),
            vec![format!(
                "FT.SEARCH {MEMBER_INDEX} 99 joined_at Some(\"ASC\") Some((40, 20))"
            )]
        );
    }

    #[tokio::test]
    async fn empty_search_yields_empty_list() {
        let store = MockStore {
            guild_present: true,
            ..Default::default()
        };
        let service = GuildQueryService::new(&store);

        let members = service.recent_members("99", 5).await.unwrap();
        assert!(members.is_empty());

        let roles = service.list_roles("99").await.unwrap();
        assert!(roles.is_empty());
    }

    #[tokio::test]
    async fn best_metric_is_none_for_guild_without_members() {
        let store = MockStore {
            guild_present: true,
            ..Default::default()
        };
        let service = GuildQueryService::new(&store);

        assert_eq!(service.best_join_metric("99").await.unwrap(), None);
    }

    #[tokio::test]
    async fn best_metric_returns_top_group() {
        let store = MockStore {
            guild_present: true,
            top_group: Some(("invite".to_string(), 42)),
            ..Default::default()
        };
        let service = GuildQueryService::new(&store);

        assert_eq!(
            service.best_join_metric("99").await.unwrap(),
            Some(("invite".to_string(), 42))
        );
    }

    #[tokio::test]
    async fn most_recent_join_is_none_on_empty_guild() {
        let store = MockStore {
            guild_present: true,
            ..Default::default()
        };
        let service = GuildQueryService::new(&store);

        assert_eq!(service.most_recent_join("99").await.unwrap(), None);
    }

    #[tokio::test]
    async fn member_totals_zero_out_without_samples() {
        let store = MockStore {
            guild_present: true,
            ..Default::default()
        };
        let service = GuildQueryService::new(&store);

        let now = 1_700_000_000_000;
        let totals = service.member_totals("99", now).await.unwrap();
        assert_eq!(totals.current, 0);
        assert_eq!(totals.past, 0);
        assert_eq!(totals.diff, now);
    }

    #[tokio::test]
    async fn churn_rate_computes_from_three_series_calls() {
        let store = MockStore {
            guild_present: true,
            aggregated: vec![TsSample {
                ts_ms: 1,
                value: 5.0,
            }],
            first_since: Some(TsSample {
                ts_ms: 1,
                value: 100.0,
            }),
            current: Some(TsSample {
                ts_ms: 2,
                value: 150.0,
            }),
            ..Default::default()
        };
        let service = GuildQueryService::new(&store);

        let window = ChurnWindow {
            start_ms: 0,
            end_ms: 10,
        };
        assert_eq!(service.churn_rate("99", &window).await, "10.00");
        assert_eq!(store.calls().len(), 3);
    }

    #[tokio::test]
    async fn churn_rate_degrades_to_zero_on_store_failure() {
        let store = MockStore {
            guild_present: true,
            fail_time_series: true,
            ..Default::default()
        };
        let service = GuildQueryService::new(&store);

        let window = ChurnWindow {
            start_ms: 0,
            end_ms: 10,
        };
        assert_eq!(service.churn_rate("99", &window).await, "0.00");
    }

    #[tokio::test]
    async fn member_totals_propagates_store_failure() {
        // Listing/stats asymmetry: only churn-rate absorbs store errors.
        let store = MockStore {
            guild_present: true,
            fail_time_series: true,
            ..Default::default()
        };
        let service = GuildQueryService::new(&store);

        assert!(service.member_totals("99", 0).await.is_err());
    }
}
