//! Read path over the store

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::health::{CheckResult, DailySummary, Event};
use crate::store::{Store, StoreError};

/// Point-in-time view of the cluster
#[derive(Debug, Clone, Serialize)]
pub struct ClusterStatus {
    /// Percentage of components whose latest check is online
    pub cluster_health: f64,
    pub components: Vec<CheckResult>,
    pub recent_events: Vec<Event>,
    pub summary: StatusSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub total_components: usize,
    pub online_components: usize,
    /// Every component not online, errors included
    pub offline_components: usize,
    /// When this status was assembled
    pub last_check: DateTime<Utc>,
}

pub struct HealthQueryService {
    store: Arc<Store>,
    recent_events_limit: usize,
}

impl HealthQueryService {
    pub fn new(store: Arc<Store>, recent_events_limit: usize) -> Self {
        Self {
            store,
            recent_events_limit,
        }
    }

    pub fn get_cluster_status(&self) -> Result<ClusterStatus, StoreError> {
        let components = self.store.latest_status_per_component()?;
        let recent_events = self
            .store
            .recent_events(chrono::Duration::days(1), self.recent_events_limit)?;

        let total = components.len();
        let online = components.iter().filter(|c| c.is_online()).count();

        Ok(ClusterStatus {
            cluster_health: health_percentage(online, total),
            components,
            recent_events,
            summary: StatusSummary {
                total_components: total,
                online_components: online,
                offline_components: total - online,
                last_check: Utc::now(),
            },
        })
    }

    pub fn get_history(&self, component: Option<&str>, hours: u32) -> Result<Vec<CheckResult>, StoreError> {
        self.store.history_for(component, hours)
    }

    pub fn get_daily_summaries(&self, date: NaiveDate) -> Result<Vec<DailySummary>, StoreError> {
        self.store.summaries_on(date)
    }
}

fn health_percentage(online: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    online as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComponentKind;

    #[test]
    fn test_health_percentage() {
        assert_eq!(health_percentage(0, 0), 0.0);
        assert_eq!(health_percentage(1, 2), 50.0);
        assert_eq!(health_percentage(3, 3), 100.0);
    }

    #[test]
    fn test_empty_store_reports_zero_health() {
        let service = HealthQueryService::new(Arc::new(Store::open_in_memory().unwrap()), 10);
        let status = service.get_cluster_status().unwrap();
        assert_eq!(status.cluster_health, 0.0);
        assert!(status.components.is_empty());
        assert_eq!(status.summary.total_components, 0);
    }

    #[test]
    fn test_status_counts_latest_only() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let now = Utc::now();
        store
            .save_check(
                &CheckResult::offline("pgpool", ComponentKind::Proxy, 3, "refused")
                    .observed_at(now - chrono::Duration::minutes(1)),
            )
            .unwrap();
        store
            .save_check(&CheckResult::error("pg-master", ComponentKind::Database, 3, "boom"))
            .unwrap();

        let status = HealthQueryService::new(store, 10).get_cluster_status().unwrap();
        assert_eq!(status.summary.total_components, 2);
        assert_eq!(status.summary.online_components, 0);
        assert_eq!(status.summary.offline_components, 2);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["components"][0]["status"], "error");
        assert_eq!(json["cluster_health"], 0.0);
    }
}
