//! Lead domain model

use super::search::SearchSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single extracted result, fully owned by its parent search query
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Lead {
    pub id: i64,
    pub search_query_id: i64,
    pub title: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub website_url: Option<String>,
    /// Free-form tags (Yelp categories)
    pub tags: Option<String>,
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Default for Lead {
    fn default() -> Self {
        Self {
            id: 0,
            search_query_id: 0,
            title: None,
            address: None,
            phone_number: None,
            website_url: None,
            tags: None,
            source_url: None,
            created_at: Utc::now(),
        }
    }
}

/// Lead joined with its owning user id, used for ownership checks
#[derive(Debug, Clone, FromRow)]
pub struct LeadWithOwner {
    #[sqlx(flatten)]
    pub lead: Lead,
    pub owner_id: i64,
}

/// A record returned by the scraper engine, not yet persisted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

/// Listing/export filters. The owner filter is applied separately by the
/// authorization scope, never by the caller directly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadFilter {
    pub search_query_id: Option<i64>,
    pub source: Option<SearchSource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_record_deserializes_partial_payload() {
        let record: LeadRecord =
            serde_json::from_str(r#"{"title": "Cafe Uno", "phone_number": "+34 600 000 000"}"#)
                .unwrap();

        assert_eq!(record.title.as_deref(), Some("Cafe Uno"));
        assert!(record.address.is_none());
        assert!(record.source_url.is_none());
    }

    #[test]
    fn test_lead_filter_defaults_to_unfiltered() {
        let filter = LeadFilter::default();
        assert!(filter.search_query_id.is_none());
        assert!(filter.source.is_none());
    }
}
