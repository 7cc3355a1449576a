//! One pass: check → save → detect → log → aggregate, per component.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::config::ComponentConfig;
use crate::health::{
    CheckResult, Checker, ComponentRegistry, ComponentStatus, EventDetector, SummaryAggregator,
};
use crate::metrics::metrics;
use crate::store::{PurgeCounts, Store, StoreError};

pub struct Pipeline {
    registry: ComponentRegistry,
    checker: Checker,
    detector: EventDetector,
    aggregator: SummaryAggregator,
    store: Arc<Store>,
}

impl Pipeline {
    pub fn new(
        registry: ComponentRegistry,
        checker: Checker,
        detector: EventDetector,
        aggregator: SummaryAggregator,
        store: Arc<Store>,
    ) -> Self {
        Self {
            registry,
            checker,
            detector,
            aggregator,
            store,
        }
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Failed checks are charged `interval` of downtime from now on
    pub fn set_check_interval(&self, interval: Duration) {
        self.aggregator.set_check_interval(interval);
    }

    /// Check every registered component once, in registry order.
    ///
    /// Components run concurrently inside the calling task. A component whose
    /// pipeline panics is logged and left out of the returned list; the others
    /// are unaffected.
    pub async fn run_pass(&self) -> Vec<CheckResult> {
        let runs = self
            .registry
            .iter()
            .map(|component| AssertUnwindSafe(self.run_component(component)).catch_unwind());
        let outcomes = join_all(runs).await;

        let mut results = Vec::with_capacity(outcomes.len());
        for (component, outcome) in self.registry.iter().zip(outcomes) {
            match outcome {
                Ok(result) => results.push(result),
                Err(_) => error!(component = %component.name, "Component pipeline panicked"),
            }
        }

        let count = |status: ComponentStatus| results.iter().filter(|r| r.status == status).count() as i64;
        let online = count(ComponentStatus::Online);
        let offline = count(ComponentStatus::Offline);
        let errored = count(ComponentStatus::Error);
        metrics().record_pass(online, offline, errored);
        debug!(
            components = results.len(),
            online = online,
            offline = offline,
            error = errored,
            "Check pass complete"
        );
        results
    }

    async fn run_component(&self, component: &ComponentConfig) -> CheckResult {
        let result = self.checker.check(component).await;
        if let Err((operation, e)) = self.record(&result) {
            warn!(
                component = %component.name,
                operation = operation,
                error = %e,
                "Store write failed, skipping rest of component pipeline"
            );
            metrics().record_store_error(operation);
        }
        result
    }

    /// Persist a result and everything derived from it. Stops at the first
    /// failing write and names it.
    fn record(&self, result: &CheckResult) -> Result<(), (&'static str, StoreError)> {
        self.store
            .save_check(result)
            .map_err(|e| ("save_check", e))?;

        if let Some(event) = self.detector.evaluate(result) {
            info!(
                component = %event.component_name,
                event_type = event.event_type.as_str(),
                severity = event.severity.as_str(),
                "{}",
                event.message
            );
            self.store.log_event(&event).map_err(|e| ("log_event", e))?;
            metrics().record_event(event.event_type.as_str(), event.severity.as_str());
        }

        let delta = self.aggregator.delta_for(result);
        self.store
            .upsert_summary(&delta, self.aggregator.mode())
            .map_err(|e| ("upsert_summary", e))?;
        Ok(())
    }

    pub fn purge_expired(&self, retention_days: u32) -> Result<PurgeCounts, StoreError> {
        match self.store.purge_older_than(retention_days) {
            Ok(counts) => {
                if counts.deleted_checks > 0 || counts.deleted_events > 0 {
                    info!(
                        retention_days = retention_days,
                        deleted_checks = counts.deleted_checks,
                        deleted_events = counts.deleted_events,
                        "Purged expired history"
                    );
                }
                Ok(counts)
            }
            Err(e) => {
                warn!(retention_days = retention_days, error = %e, "Retention purge failed");
                metrics().record_store_error("purge");
                Err(e)
            }
        }
    }
}
