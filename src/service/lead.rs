//! Lead listing, detail and export assembly

use crate::domain::{Lead, LeadFilter, LeadWithOwner};
use crate::error::{AppError, Result};
use crate::repository::LeadRepository;
use crate::service::Paginated;
use std::sync::Arc;

pub struct LeadService<L: LeadRepository> {
    leads: Arc<L>,
}

impl<L: LeadRepository> LeadService<L> {
    pub fn new(leads: Arc<L>) -> Self {
        Self { leads }
    }

    pub async fn list(
        &self,
        filter: &LeadFilter,
        owner: Option<i64>,
        page: i64,
        per_page: i64,
    ) -> Result<Paginated<Lead>> {
        let offset = (page - 1) * per_page;
        let items = self.leads.list(filter, owner, offset, per_page).await?;
        let total = self.leads.count(filter, owner).await?;

        Ok(Paginated::new(items, total, page, per_page))
    }

    /// Lead plus its owning user id; the caller applies the ownership gate.
    pub async fn get(&self, id: i64) -> Result<LeadWithOwner> {
        self.leads
            .find_with_owner(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", id)))
    }

    pub async fn export(&self, filter: &LeadFilter, owner: Option<i64>) -> Result<Vec<Lead>> {
        self.leads.export(filter, owner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::lead::MockLeadRepository;
    use mockall::predicate::*;

    #[tokio::test]
    async fn test_list_passes_owner_scope_through() {
        let mut mock = MockLeadRepository::new();
        mock.expect_list()
            .withf(|_, owner, offset, limit| *owner == Some(7) && *offset == 50 && *limit == 50)
            .returning(|_, _, _, _| Ok(vec![]));
        mock.expect_count()
            .withf(|_, owner| *owner == Some(7))
            .returning(|_, _| Ok(120));

        let page = LeadService::new(Arc::new(mock))
            .list(&LeadFilter::default(), Some(7), 2, 50)
            .await
            .unwrap();

        assert_eq!(page.total, 120);
        assert_eq!(page.pages, 3);
        assert_eq!(page.page, 2);
    }

    #[tokio::test]
    async fn test_get_missing_lead_not_found() {
        let mut mock = MockLeadRepository::new();
        mock.expect_find_with_owner()
            .with(eq(9))
            .returning(|_| Ok(None));

        let result = LeadService::new(Arc::new(mock)).get(9).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_export_is_unpaged() {
        let mut mock = MockLeadRepository::new();
        mock.expect_export()
            .withf(|filter, owner| filter.search_query_id == Some(3) && owner.is_none())
            .returning(|_, _| Ok(vec![Lead::default(), Lead::default()]));

        let leads = LeadService::new(Arc::new(mock))
            .export(
                &LeadFilter {
                    search_query_id: Some(3),
                    source: None,
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(leads.len(), 2);
    }
}
