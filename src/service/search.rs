//! Search lifecycle: start, execute, list, detail

use crate::domain::{
    Lead, NewSearchQuery, SearchQuery, SearchQuerySummary, StartSearchInput,
};
use crate::engine::SearchEngine;
use crate::error::{AppError, Result};
use crate::repository::{LeadRepository, SearchQueryRepository};
use std::sync::Arc;
use validator::Validate;

pub struct SearchService<S: SearchQueryRepository, L: LeadRepository, E: SearchEngine> {
    searches: Arc<S>,
    leads: Arc<L>,
    engine: Arc<E>,
}

impl<S: SearchQueryRepository, L: LeadRepository, E: SearchEngine> SearchService<S, L, E> {
    pub fn new(searches: Arc<S>, leads: Arc<L>, engine: Arc<E>) -> Self {
        Self {
            searches,
            leads,
            engine,
        }
    }

    /// Record a pending search owned by the caller.
    pub async fn start(&self, user_id: i64, input: StartSearchInput) -> Result<SearchQuery> {
        input.validate()?;

        let zoom = input.normalized_zoom();
        self.searches
            .create(
                user_id,
                &NewSearchQuery {
                    query: input.query,
                    location: input.location,
                    source: input.source,
                    zoom,
                },
            )
            .await
    }

    pub async fn find(&self, id: i64) -> Result<SearchQuery> {
        self.searches
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Search {} not found", id)))
    }

    /// Run a search through the engine. The atomic `running` transition is
    /// the re-entrancy guard: a second concurrent execute is rejected
    /// without touching the row. Returns the refreshed query and the number
    /// of leads persisted.
    pub async fn execute(&self, id: i64) -> Result<(SearchQuery, u64)> {
        let query = self.find(id).await?;

        if !self.searches.try_mark_running(id).await? {
            return Err(AppError::Conflict(
                "Search is already running".to_string(),
            ));
        }

        let outcome = self.run_and_persist(&query).await;

        match outcome {
            Ok(inserted) => {
                self.searches.mark_completed(id).await?;
                let refreshed = self.find(id).await?;
                Ok((refreshed, inserted))
            }
            Err(e) => {
                tracing::error!(search_id = id, error = %e, "search execution failed");
                self.searches.mark_failed(id).await?;
                Err(e)
            }
        }
    }

    pub async fn list(&self, owner: Option<i64>) -> Result<Vec<SearchQuerySummary>> {
        self.searches.list(owner).await
    }

    pub async fn detail(&self, id: i64) -> Result<(SearchQuery, Vec<Lead>)> {
        let query = self.find(id).await?;
        let leads = self.leads.find_by_query(id).await?;
        Ok((query, leads))
    }

    async fn run_and_persist(&self, query: &SearchQuery) -> Result<u64> {
        let records = self
            .engine
            .run(&query.query, &query.location, query.source, query.zoom)
            .await?;

        self.leads.insert_many(query.id, &records).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LeadRecord, SearchSource, SearchStatus};
    use crate::engine::MockSearchEngine;
    use crate::repository::lead::MockLeadRepository;
    use crate::repository::search::MockSearchQueryRepository;
    use mockall::predicate::*;

    fn pending_query(id: i64, user_id: i64) -> SearchQuery {
        SearchQuery {
            id,
            user_id,
            query: "plumbers".to_string(),
            location: "Madrid".to_string(),
            source: SearchSource::GoogleMaps,
            zoom: Some(12.0),
            status: SearchStatus::Pending,
            ..Default::default()
        }
    }

    fn service(
        searches: MockSearchQueryRepository,
        leads: MockLeadRepository,
        engine: MockSearchEngine,
    ) -> SearchService<MockSearchQueryRepository, MockLeadRepository, MockSearchEngine> {
        SearchService::new(Arc::new(searches), Arc::new(leads), Arc::new(engine))
    }

    #[tokio::test]
    async fn test_start_defaults_zoom_for_google_maps() {
        let mut searches = MockSearchQueryRepository::new();
        searches
            .expect_create()
            .withf(|user_id, input: &NewSearchQuery| {
                *user_id == 7 && input.zoom == Some(12.0)
            })
            .returning(|user_id, _| Ok(pending_query(1, user_id)));

        let input = StartSearchInput {
            query: "plumbers".to_string(),
            location: "Madrid".to_string(),
            source: SearchSource::GoogleMaps,
            zoom: None,
        };

        let query = service(searches, MockLeadRepository::new(), MockSearchEngine::new())
            .start(7, input)
            .await
            .unwrap();
        assert_eq!(query.status, SearchStatus::Pending);
    }

    #[tokio::test]
    async fn test_start_strips_zoom_for_yelp() {
        let mut searches = MockSearchQueryRepository::new();
        searches
            .expect_create()
            .withf(|_, input: &NewSearchQuery| input.zoom.is_none())
            .returning(|user_id, _| Ok(pending_query(1, user_id)));

        let input = StartSearchInput {
            query: "plumbers".to_string(),
            location: "Madrid".to_string(),
            source: SearchSource::Yelp,
            zoom: Some(15.0),
        };

        service(searches, MockLeadRepository::new(), MockSearchEngine::new())
            .start(7, input)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_execute_running_query_rejected_without_transition() {
        let mut searches = MockSearchQueryRepository::new();
        searches.expect_find_by_id().with(eq(1)).returning(|id| {
            Ok(Some(SearchQuery {
                status: SearchStatus::Running,
                ..pending_query(id, 7)
            }))
        });
        searches
            .expect_try_mark_running()
            .with(eq(1))
            .returning(|_| Ok(false));
        // No engine/lead/mark expectations: the guard must short-circuit.

        let result = service(searches, MockLeadRepository::new(), MockSearchEngine::new())
            .execute(1)
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_execute_persists_leads_and_completes() {
        let mut searches = MockSearchQueryRepository::new();
        searches
            .expect_find_by_id()
            .with(eq(1))
            .returning(|id| Ok(Some(pending_query(id, 7))));
        searches
            .expect_try_mark_running()
            .with(eq(1))
            .returning(|_| Ok(true));
        searches
            .expect_mark_completed()
            .with(eq(1))
            .returning(|_| Ok(()));

        let mut leads = MockLeadRepository::new();
        leads
            .expect_insert_many()
            .withf(|id, records| *id == 1 && records.len() == 2)
            .returning(|_, records| Ok(records.len() as u64));

        let mut engine = MockSearchEngine::new();
        engine
            .expect_run()
            .with(eq("plumbers"), eq("Madrid"), eq(SearchSource::GoogleMaps), eq(Some(12.0)))
            .returning(|_, _, _, _| {
                Ok(vec![
                    LeadRecord {
                        title: Some("Fontaneria Uno".to_string()),
                        ..Default::default()
                    },
                    LeadRecord {
                        title: Some("Fontaneria Dos".to_string()),
                        ..Default::default()
                    },
                ])
            });

        let (_, inserted) = service(searches, leads, engine).execute(1).await.unwrap();
        assert_eq!(inserted, 2);
    }

    #[tokio::test]
    async fn test_execute_marks_failed_on_engine_error() {
        let mut searches = MockSearchQueryRepository::new();
        searches
            .expect_find_by_id()
            .with(eq(1))
            .returning(|id| Ok(Some(pending_query(id, 7))));
        searches
            .expect_try_mark_running()
            .with(eq(1))
            .returning(|_| Ok(true));
        searches
            .expect_mark_failed()
            .with(eq(1))
            .returning(|_| Ok(()));

        let mut engine = MockSearchEngine::new();
        engine
            .expect_run()
            .returning(|_, _, _, _| Err(AppError::Internal(anyhow::anyhow!("scraper down"))));

        let result = service(searches, MockLeadRepository::new(), engine)
            .execute(1)
            .await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_execute_missing_query_not_found() {
        let mut searches = MockSearchQueryRepository::new();
        searches
            .expect_find_by_id()
            .with(eq(99))
            .returning(|_| Ok(None));

        let result = service(searches, MockLeadRepository::new(), MockSearchEngine::new())
            .execute(99)
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
