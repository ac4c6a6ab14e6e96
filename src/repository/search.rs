//! Search query repository

use crate::domain::{NewSearchQuery, SearchQuery, SearchQuerySummary, SearchStatus};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::PgPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchQueryRepository: Send + Sync {
    async fn create(&self, user_id: i64, input: &NewSearchQuery) -> Result<SearchQuery>;
    async fn find_by_id(&self, id: i64) -> Result<Option<SearchQuery>>;
    /// Newest first; `owner` of `None` lists every user's queries
    async fn list(&self, owner: Option<i64>) -> Result<Vec<SearchQuerySummary>>;
    /// Atomic `running` transition. Returns false when the query is already
    /// running (re-entrancy guard) — the row is left untouched in that case.
    async fn try_mark_running(&self, id: i64) -> Result<bool>;
    async fn mark_completed(&self, id: i64) -> Result<()>;
    async fn mark_failed(&self, id: i64) -> Result<()>;
}

pub struct SearchQueryRepositoryImpl {
    pool: PgPool,
}

impl SearchQueryRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SearchQueryRepository for SearchQueryRepositoryImpl {
    async fn create(&self, user_id: i64, input: &NewSearchQuery) -> Result<SearchQuery> {
        let query = sqlx::query_as::<_, SearchQuery>(
            r#"
            INSERT INTO search_queries (user_id, query, location, source, zoom, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, query, location, source, zoom, status, created_at, completed_at
            "#,
        )
        .bind(user_id)
        .bind(&input.query)
        .bind(&input.location)
        .bind(input.source)
        .bind(input.zoom)
        .bind(SearchStatus::Pending)
        .fetch_one(&self.pool)
        .await?;

        Ok(query)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<SearchQuery>> {
        let query = sqlx::query_as::<_, SearchQuery>(
            r#"
            SELECT id, user_id, query, location, source, zoom, status, created_at, completed_at
            FROM search_queries
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(query)
    }

    async fn list(&self, owner: Option<i64>) -> Result<Vec<SearchQuerySummary>> {
        let summaries = sqlx::query_as::<_, SearchQuerySummary>(
            r#"
            SELECT sq.id, sq.user_id, sq.query, sq.location, sq.source, sq.zoom, sq.status,
                   sq.created_at, sq.completed_at,
                   COUNT(l.id) AS leads_count
            FROM search_queries sq
            LEFT JOIN leads l ON l.search_query_id = sq.id
            WHERE ($1::bigint IS NULL OR sq.user_id = $1)
            GROUP BY sq.id
            ORDER BY sq.created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(summaries)
    }

    async fn try_mark_running(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE search_queries SET status = $2 WHERE id = $1 AND status <> $2",
        )
        .bind(id)
        .bind(SearchStatus::Running)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_completed(&self, id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE search_queries SET status = $2, completed_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(SearchStatus::Completed)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_failed(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE search_queries SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(SearchStatus::Failed)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
