//! Component health checking
//!
//! This module provides:
//! - Per-kind probing of proxies and database nodes into a `CheckResult`
//! - Primary/replica role detection for database nodes
//! - Threshold-based event detection
//! - Daily summary aggregation

mod checker;
mod database;
mod events;
mod proxy;
mod query;
mod registry;
mod state;
mod summary;

pub use checker::{CheckError, Checker};
pub use events::{Event, EventDetector, EventType, Severity};
pub use registry::ComponentRegistry;
pub use state::{
    CheckResult, ComponentFacts, ComponentStatus, DatabaseFacts, PoolNode, ProxyFacts, Replication,
};
pub use summary::{AverageMode, DailySummary, SummaryAggregator, SummaryDelta};
