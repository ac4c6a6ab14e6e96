//! Lead repository

use crate::domain::{Lead, LeadFilter, LeadRecord, LeadWithOwner};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::PgPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn insert_many(&self, search_query_id: i64, records: &[LeadRecord]) -> Result<u64>;
    async fn find_with_owner(&self, id: i64) -> Result<Option<LeadWithOwner>>;
    async fn find_by_query(&self, search_query_id: i64) -> Result<Vec<Lead>>;
    /// Paged listing; `owner` of `None` spans every user
    async fn list(
        &self,
        filter: &LeadFilter,
        owner: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Lead>>;
    async fn count(&self, filter: &LeadFilter, owner: Option<i64>) -> Result<i64>;
    /// Unpaged listing for CSV export, oldest first
    async fn export(&self, filter: &LeadFilter, owner: Option<i64>) -> Result<Vec<Lead>>;
}

pub struct LeadRepositoryImpl {
    pool: PgPool,
}

impl LeadRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadRepository for LeadRepositoryImpl {
    async fn insert_many(&self, search_query_id: i64, records: &[LeadRecord]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO leads (search_query_id, title, address, phone_number, website_url,
                                   tags, source_url)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(search_query_id)
            .bind(&record.title)
            .bind(&record.address)
            .bind(&record.phone_number)
            .bind(&record.website_url)
            .bind(&record.tags)
            .bind(&record.source_url)
            .execute(&mut *tx)
            .await?;
            inserted += 1;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn find_with_owner(&self, id: i64) -> Result<Option<LeadWithOwner>> {
        let lead = sqlx::query_as::<_, LeadWithOwner>(
            r#"
            SELECT l.id, l.search_query_id, l.title, l.address, l.phone_number, l.website_url,
                   l.tags, l.source_url, l.created_at,
                   sq.user_id AS owner_id
            FROM leads l
            INNER JOIN search_queries sq ON sq.id = l.search_query_id
            WHERE l.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lead)
    }

    async fn find_by_query(&self, search_query_id: i64) -> Result<Vec<Lead>> {
        let leads = sqlx::query_as::<_, Lead>(
            r#"
            SELECT id, search_query_id, title, address, phone_number, website_url,
                   tags, source_url, created_at
            FROM leads
            WHERE search_query_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(search_query_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(leads)
    }

    async fn list(
        &self,
        filter: &LeadFilter,
        owner: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Lead>> {
        let leads = sqlx::query_as::<_, Lead>(
            r#"
            SELECT l.id, l.search_query_id, l.title, l.address, l.phone_number, l.website_url,
                   l.tags, l.source_url, l.created_at
            FROM leads l
            INNER JOIN search_queries sq ON sq.id = l.search_query_id
            WHERE ($1::bigint IS NULL OR sq.user_id = $1)
              AND ($2::bigint IS NULL OR l.search_query_id = $2)
              AND ($3::search_source IS NULL OR sq.source = $3)
            ORDER BY l.created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(owner)
        .bind(filter.search_query_id)
        .bind(filter.source)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(leads)
    }

    async fn count(&self, filter: &LeadFilter, owner: Option<i64>) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM leads l
            INNER JOIN search_queries sq ON sq.id = l.search_query_id
            WHERE ($1::bigint IS NULL OR sq.user_id = $1)
              AND ($2::bigint IS NULL OR l.search_query_id = $2)
              AND ($3::search_source IS NULL OR sq.source = $3)
            "#,
        )
        .bind(owner)
        .bind(filter.search_query_id)
        .bind(filter.source)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn export(&self, filter: &LeadFilter, owner: Option<i64>) -> Result<Vec<Lead>> {
        let leads = sqlx::query_as::<_, Lead>(
            r#"
            SELECT l.id, l.search_query_id, l.title, l.address, l.phone_number, l.website_url,
                   l.tags, l.source_url, l.created_at
            FROM leads l
            INNER JOIN search_queries sq ON sq.id = l.search_query_id
            WHERE ($1::bigint IS NULL OR sq.user_id = $1)
              AND ($2::bigint IS NULL OR l.search_query_id = $2)
              AND ($3::search_source IS NULL OR sq.source = $3)
            ORDER BY l.created_at ASC
            "#,
        )
        .bind(owner)
        .bind(filter.search_query_id)
        .bind(filter.source)
        .fetch_all(&self.pool)
        .await?;

        Ok(leads)
    }
}
