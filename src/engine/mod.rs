//! Search execution engine client
//!
//! The scraper runs as a separate service; this crate only invokes it and
//! records the outcome. The trait seam keeps the search lifecycle testable
//! without a live scraper.

use crate::config::EngineConfig;
use crate::domain::{LeadRecord, SearchSource};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Run one scrape and return the extracted records, or fail.
    async fn run(
        &self,
        query: &str,
        location: &str,
        source: SearchSource,
        zoom: Option<f64>,
    ) -> Result<Vec<LeadRecord>>;
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    query: &'a str,
    location: &'a str,
    source: SearchSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    zoom: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    entries: Vec<LeadRecord>,
}

/// HTTP client against the scraper service
#[derive(Clone)]
pub struct HttpSearchEngine {
    http_client: Client,
    base_url: String,
}

impl HttpSearchEngine {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SearchEngine for HttpSearchEngine {
    async fn run(
        &self,
        query: &str,
        location: &str,
        source: SearchSource,
        zoom: Option<f64>,
    ) -> Result<Vec<LeadRecord>> {
        let url = format!("{}/run", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .json(&RunRequest {
                query,
                location,
                source,
                zoom,
            })
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("engine request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Internal(anyhow::anyhow!(
                "engine returned status {status}"
            )));
        }

        let body: RunResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("engine response malformed: {e}")))?;

        Ok(body.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn engine_for(server: &MockServer) -> HttpSearchEngine {
        HttpSearchEngine::new(&EngineConfig {
            base_url: server.uri(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_run_posts_params_and_parses_entries() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/run"))
            .and(body_partial_json(json!({
                "query": "plumbers",
                "location": "Madrid",
                "source": "google_maps",
                "zoom": 12.0,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entries": [
                    {"title": "Fontaneria Uno", "phone_number": "+34 600 000 001"},
                    {"title": "Fontaneria Dos", "address": "Calle Mayor 2"}
                ]
            })))
            .mount(&server)
            .await;

        let engine = engine_for(&server);
        let records = engine
            .run("plumbers", "Madrid", SearchSource::GoogleMaps, Some(12.0))
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title.as_deref(), Some("Fontaneria Uno"));
        assert_eq!(records[1].address.as_deref(), Some("Calle Mayor 2"));
    }

    #[tokio::test]
    async fn test_run_omits_zoom_for_yelp() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/run"))
            .and(body_partial_json(json!({"source": "yelp"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"entries": []})),
            )
            .mount(&server)
            .await;

        let engine = engine_for(&server);
        let records = engine
            .run("plumbers", "Madrid", SearchSource::Yelp, None)
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_run_maps_server_error_to_internal() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/run"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let engine = engine_for(&server);
        let result = engine
            .run("plumbers", "Madrid", SearchSource::GoogleMaps, Some(12.0))
            .await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
