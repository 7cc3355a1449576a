//! Daily summary aggregation
//!
//! Each check is folded into the `(date, component)` row for the UTC day it
//! was observed on. Downtime is an estimate: every failed check is charged
//! one scheduler interval, regardless of how long the outage really lasted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::state::CheckResult;

/// How `avg_response_time_ms` absorbs a new sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AverageMode {
    /// `(old + new) / 2`, weighting recent samples heavily
    #[default]
    Blended,
    /// True running mean over `total_checks`
    Exact,
}

impl AverageMode {
    /// Fold `sample` into `old_avg`; `total_checks` already counts the sample
    pub fn fold(&self, old_avg: f64, sample: f64, total_checks: u64) -> f64 {
        match self {
            AverageMode::Blended => (old_avg + sample) / 2.0,
            AverageMode::Exact => old_avg + (sample - old_avg) / total_checks.max(1) as f64,
        }
    }
}

/// Rolling per-day statistics for one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub component_name: String,
    pub total_checks: u64,
    pub successful_checks: u64,
    pub failed_checks: u64,
    pub avg_response_time_ms: f64,
    pub max_response_time_ms: u64,
    pub downtime_seconds: u64,
}

impl DailySummary {
    /// Row as it exists before the first observation of the day
    pub fn empty(date: NaiveDate, component_name: impl Into<String>) -> Self {
        Self {
            date,
            component_name: component_name.into(),
            total_checks: 0,
            successful_checks: 0,
            failed_checks: 0,
            avg_response_time_ms: 0.0,
            max_response_time_ms: 0,
            downtime_seconds: 0,
        }
    }

    /// Apply one check's contribution
    pub fn apply(mut self, delta: &SummaryDelta, mode: AverageMode) -> Self {
        self.total_checks += 1;
        if delta.success {
            self.successful_checks += 1;
        } else {
            self.failed_checks += 1;
        }
        let sample = delta.response_time_ms as f64;
        self.avg_response_time_ms = mode.fold(self.avg_response_time_ms, sample, self.total_checks);
        self.max_response_time_ms = self.max_response_time_ms.max(delta.response_time_ms);
        self.downtime_seconds += delta.downtime_seconds;
        self
    }
}

/// One check's contribution to a daily summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryDelta {
    pub date: NaiveDate,
    pub component_name: String,
    pub success: bool,
    pub response_time_ms: u64,
    pub downtime_seconds: u64,
}

/// Builds summary deltas from check results
#[derive(Debug)]
pub struct SummaryAggregator {
    mode: AverageMode,
    downtime_penalty_secs: AtomicU64,
}

impl SummaryAggregator {
    pub fn new(mode: AverageMode, check_interval: Duration) -> Self {
        Self {
            mode,
            downtime_penalty_secs: AtomicU64::new(penalty_secs(check_interval)),
        }
    }

    pub fn mode(&self) -> AverageMode {
        self.mode
    }

    /// Charge failed checks one `interval` of downtime from now on
    pub fn set_check_interval(&self, interval: Duration) {
        self.downtime_penalty_secs
            .store(penalty_secs(interval), Ordering::Relaxed);
    }

    pub fn downtime_penalty_secs(&self) -> u64 {
        self.downtime_penalty_secs.load(Ordering::Relaxed)
    }

    pub fn delta_for(&self, result: &CheckResult) -> SummaryDelta {
        let success = result.is_online();
        SummaryDelta {
            date: result.observed_at.date_naive(),
            component_name: result.component_name.clone(),
            success,
            response_time_ms: result.response_time_ms,
            downtime_seconds: if success { 0 } else { self.downtime_penalty_secs() },
        }
    }
}

/// Whole seconds charged per failed check, rounded up so sub-second
/// intervals still register downtime
fn penalty_secs(interval: Duration) -> u64 {
    let millis = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
    millis.div_ceil(1000)
}
