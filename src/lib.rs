//! Cluster health monitor for a pgpool proxy and its PostgreSQL primary/replica pair.
//!
//! Probes every configured component on an interval, persists each
//! observation to SQLite, raises events on failures and slow responses and
//! keeps per-day rollups.

pub mod config;
pub mod health;
pub mod metrics;
pub mod monitor;
pub mod probe;
pub mod store;

pub use config::{load_config, ComponentConfig, ComponentKind, Config, ConfigError};
pub use health::{CheckResult, ComponentStatus, ComponentRegistry, Event, EventType, Severity};
pub use monitor::{ClusterMonitor, ClusterStatus, SchedulerError};
pub use probe::{PgConnector, ProbeConnector};
pub use store::{Store, StoreError};
