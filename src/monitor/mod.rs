//! Cluster monitor
//!
//! This module provides:
//! - The per-component write pipeline and one-shot passes
//! - The periodic scheduler with a bounded, race-free stop
//! - The read-side query service
//!
//! [`ClusterMonitor`] is an owned value; callers that need to share it wrap
//! it in an `Arc`.

mod pipeline;
mod query;
mod scheduler;

pub use pipeline::Pipeline;
pub use query::{ClusterStatus, HealthQueryService, StatusSummary};
pub use scheduler::{Scheduler, SchedulerError};

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::config::MonitorConfig;
use crate::health::{
    CheckResult, Checker, ComponentRegistry, DailySummary, EventDetector, SummaryAggregator,
};
use crate::probe::ProbeConnector;
use crate::store::{PurgeCounts, Store, StoreError};

pub struct ClusterMonitor {
    pipeline: Arc<Pipeline>,
    scheduler: Scheduler,
    queries: HealthQueryService,
    retention_days: u32,
}

impl ClusterMonitor {
    pub fn new(
        config: &MonitorConfig,
        registry: ComponentRegistry,
        connector: Arc<dyn ProbeConnector>,
        store: Arc<Store>,
    ) -> Self {
        let pipeline = Arc::new(Pipeline::new(
            registry,
            Checker::new(connector, config.connect_timeout()),
            EventDetector::new(config.slow_response_ms),
            SummaryAggregator::new(config.average_mode, config.check_interval()),
            store.clone(),
        ));

        Self {
            scheduler: Scheduler::new(pipeline.clone(), config.retention_days, config.stop_timeout()),
            queries: HealthQueryService::new(store, config.recent_events_limit),
            pipeline,
            retention_days: config.retention_days,
        }
    }

    /// Start periodic checking every `interval`
    pub fn start(&self, interval: Duration) -> Result<(), SchedulerError> {
        self.scheduler.start(interval)
    }

    pub async fn stop(&self) {
        self.scheduler.stop().await
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Run one pass now, regardless of the scheduler
    pub async fn run_once(&self) -> Vec<CheckResult> {
        self.pipeline.run_pass().await
    }

    pub fn get_cluster_status(&self) -> Result<ClusterStatus, StoreError> {
        self.queries.get_cluster_status()
    }

    pub fn get_history(&self, component: Option<&str>, hours: u32) -> Result<Vec<CheckResult>, StoreError> {
        self.queries.get_history(component, hours)
    }

    pub fn get_daily_summaries(&self, date: NaiveDate) -> Result<Vec<DailySummary>, StoreError> {
        self.queries.get_daily_summaries(date)
    }

    /// Drop checks and events older than the configured retention
    pub fn purge_expired(&self) -> Result<PurgeCounts, StoreError> {
        self.pipeline.purge_expired(self.retention_days)
    }
}
