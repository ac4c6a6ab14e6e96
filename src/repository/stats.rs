//! Dashboard aggregation queries

use crate::domain::{SearchSource, SearchStatus};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn count_searches(&self, owner: Option<i64>) -> Result<i64>;
    async fn count_leads(&self, owner: Option<i64>) -> Result<i64>;
    async fn count_users(&self) -> Result<i64>;
    async fn searches_by_status(&self, owner: Option<i64>) -> Result<Vec<(SearchStatus, i64)>>;
    async fn leads_by_source(&self, owner: Option<i64>) -> Result<Vec<(SearchSource, i64)>>;
    async fn count_searches_since(
        &self,
        owner: Option<i64>,
        since: DateTime<Utc>,
    ) -> Result<i64>;
    async fn count_leads_since(&self, owner: Option<i64>, since: DateTime<Utc>) -> Result<i64>;
    async fn searches_by_month(
        &self,
        owner: Option<i64>,
        since: DateTime<Utc>,
    ) -> Result<Vec<(DateTime<Utc>, i64)>>;
}

pub struct StatsRepositoryImpl {
    pool: PgPool,
}

impl StatsRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsRepository for StatsRepositoryImpl {
    async fn count_searches(&self, owner: Option<i64>) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM search_queries WHERE ($1::bigint IS NULL OR user_id = $1)",
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn count_leads(&self, owner: Option<i64>) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM leads l
            INNER JOIN search_queries sq ON sq.id = l.search_query_id
            WHERE ($1::bigint IS NULL OR sq.user_id = $1)
            "#,
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn count_users(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0)
    }

    async fn searches_by_status(&self, owner: Option<i64>) -> Result<Vec<(SearchStatus, i64)>> {
        let rows = sqlx::query_as::<_, (SearchStatus, i64)>(
            r#"
            SELECT status, COUNT(*)
            FROM search_queries
            WHERE ($1::bigint IS NULL OR user_id = $1)
            GROUP BY status
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn leads_by_source(&self, owner: Option<i64>) -> Result<Vec<(SearchSource, i64)>> {
        let rows = sqlx::query_as::<_, (SearchSource, i64)>(
            r#"
            SELECT sq.source, COUNT(l.id)
            FROM leads l
            INNER JOIN search_queries sq ON sq.id = l.search_query_id
            WHERE ($1::bigint IS NULL OR sq.user_id = $1)
            GROUP BY sq.source
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count_searches_since(
        &self,
        owner: Option<i64>,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM search_queries
            WHERE ($1::bigint IS NULL OR user_id = $1) AND created_at >= $2
            "#,
        )
        .bind(owner)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn count_leads_since(&self, owner: Option<i64>, since: DateTime<Utc>) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM leads l
            INNER JOIN search_queries sq ON sq.id = l.search_query_id
            WHERE ($1::bigint IS NULL OR sq.user_id = $1) AND sq.created_at >= $2
            "#,
        )
        .bind(owner)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn searches_by_month(
        &self,
        owner: Option<i64>,
        since: DateTime<Utc>,
    ) -> Result<Vec<(DateTime<Utc>, i64)>> {
        let rows = sqlx::query_as::<_, (DateTime<Utc>, i64)>(
            r#"
            SELECT date_trunc('month', created_at) AS month, COUNT(*)
            FROM search_queries
            WHERE ($1::bigint IS NULL OR user_id = $1) AND created_at >= $2
            GROUP BY month
            ORDER BY month
            "#,
        )
        .bind(owner)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
