//! Dashboard aggregates, scoped by the caller's ownership scope

use crate::error::Result;
use crate::repository::StatsRepository;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct MonthCount {
    pub month: DateTime<Utc>,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_searches: i64,
    pub total_leads: i64,
    pub total_users: i64,
    pub searches_by_status: HashMap<String, i64>,
    pub leads_by_source: HashMap<String, i64>,
    pub recent_searches: i64,
    pub recent_leads: i64,
    pub searches_by_month: Vec<MonthCount>,
}

pub struct DashboardService<S: StatsRepository> {
    stats: Arc<S>,
}

impl<S: StatsRepository> DashboardService<S> {
    pub fn new(stats: Arc<S>) -> Self {
        Self { stats }
    }

    /// All numbers honor the owner filter; the user total is only global
    /// for an unscoped (superadmin) caller.
    pub async fn stats(&self, owner: Option<i64>) -> Result<DashboardStats> {
        let now = Utc::now();
        let seven_days_ago = now - Duration::days(7);
        let six_months_ago = now - Duration::days(180);

        let total_searches = self.stats.count_searches(owner).await?;
        let total_leads = self.stats.count_leads(owner).await?;
        let total_users = match owner {
            None => self.stats.count_users().await?,
            Some(_) => 1,
        };

        let searches_by_status = self
            .stats
            .searches_by_status(owner)
            .await?
            .into_iter()
            .map(|(status, count)| (status.as_str().to_string(), count))
            .collect();

        let leads_by_source = self
            .stats
            .leads_by_source(owner)
            .await?
            .into_iter()
            .map(|(source, count)| (source.as_str().to_string(), count))
            .collect();

        let recent_searches = self
            .stats
            .count_searches_since(owner, seven_days_ago)
            .await?;
        let recent_leads = self.stats.count_leads_since(owner, seven_days_ago).await?;

        let searches_by_month = self
            .stats
            .searches_by_month(owner, six_months_ago)
            .await?
            .into_iter()
            .map(|(month, count)| MonthCount { month, count })
            .collect();

        Ok(DashboardStats {
            total_searches,
            total_leads,
            total_users,
            searches_by_status,
            leads_by_source,
            recent_searches,
            recent_leads,
            searches_by_month,
        })
    }
}
