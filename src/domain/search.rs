//! Search query domain model and execution state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Lead source scraped by the external engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "search_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SearchSource {
    GoogleMaps,
    Yelp,
}

impl SearchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchSource::GoogleMaps => "google_maps",
            SearchSource::Yelp => "yelp",
        }
    }
}

impl std::fmt::Display for SearchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution lifecycle: pending -> running -> {completed, failed}.
/// `Running` doubles as the re-entrancy guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "search_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl SearchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStatus::Pending => "pending",
            SearchStatus::Running => "running",
            SearchStatus::Completed => "completed",
            SearchStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of scraping work requested by a user. `user_id` is the ownership
/// scoping key for row-level authorization.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SearchQuery {
    pub id: i64,
    pub user_id: i64,
    pub query: String,
    pub location: String,
    pub source: SearchSource,
    /// Map zoom level; meaningful only for google_maps
    pub zoom: Option<f64>,
    pub status: SearchStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            id: 0,
            user_id: 0,
            query: String::new(),
            location: String::new(),
            source: SearchSource::GoogleMaps,
            zoom: Some(12.0),
            status: SearchStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Search query with its lead count (for listings)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SearchQuerySummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub query: SearchQuery,
    pub leads_count: i64,
}

/// Row values for inserting a new search query (zoom already normalized)
#[derive(Debug, Clone)]
pub struct NewSearchQuery {
    pub query: String,
    pub location: String,
    pub source: SearchSource,
    pub zoom: Option<f64>,
}

/// Input for starting a search
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StartSearchInput {
    #[validate(length(min = 1, max = 255))]
    pub query: String,
    #[validate(length(min = 1, max = 255))]
    pub location: String,
    pub source: SearchSource,
    #[validate(range(min = 1.0, max = 21.0))]
    pub zoom: Option<f64>,
}

impl StartSearchInput {
    /// Zoom is only meaningful for google_maps: default it there, strip it
    /// everywhere else.
    pub fn normalized_zoom(&self) -> Option<f64> {
        match self.source {
            SearchSource::GoogleMaps => Some(self.zoom.unwrap_or(12.0)),
            SearchSource::Yelp => None,
        }
    }
}
