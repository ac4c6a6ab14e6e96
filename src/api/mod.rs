//! REST API shared utilities (response envelopes, pagination)

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod lead;
pub mod role;
pub mod search;
pub mod user;

use serde::{Deserialize, Serialize};

/// Maximum allowed per_page value for pagination
pub(crate) const MAX_PER_PAGE: i64 = 100;

/// Success response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse<T> {
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Message response (for delete, etc.)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Pagination query parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page", deserialize_with = "deserialize_page")]
    pub page: i64,
    #[serde(
        default = "default_per_page",
        deserialize_with = "deserialize_per_page",
        alias = "limit"
    )]
    pub per_page: i64,
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

pub(crate) fn default_page() -> i64 {
    1
}

pub(crate) fn default_per_page() -> i64 {
    20
}

/// Reject page values less than 1
pub(crate) fn deserialize_page<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = i64::deserialize(deserializer)?;
    if value < 1 {
        return Err(serde::de::Error::custom(
            "page must be a positive integer (>= 1)",
        ));
    }
    Ok(value)
}

/// Reject per_page values less than 1, clamp to MAX_PER_PAGE
pub(crate) fn deserialize_per_page<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = i64::deserialize(deserializer)?;
    if value < 1 {
        return Err(serde::de::Error::custom(
            "per_page must be a positive integer (>= 1)",
        ));
    }
    Ok(value.min(MAX_PER_PAGE))
}
