//! Full-pass behavior through the public monitor API

use std::sync::Arc;

use chrono::Utc;
use clusterwatch::config::MonitorConfig;
use clusterwatch::health::{ComponentStatus, EventType, Severity};
use clusterwatch::store::Store;

use crate::{monitor, monitor_on, online, Behavior};

#[tokio::test(start_paused = true)]
async fn test_half_online_cluster() {
    let (monitor, _) = monitor(
        &MonitorConfig::default(),
        &[("a", online(50)), ("b", Behavior::Unreachable)],
    );

    let results = monitor.run_once().await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].status, ComponentStatus::Online);
    assert!(results[0].response_time_ms >= 50);
    assert_eq!(results[1].status, ComponentStatus::Offline);

    let status = monitor.get_cluster_status().unwrap();
    assert_eq!(status.cluster_health, 50.0);
    assert_eq!(status.summary.online_components, 1);
    assert_eq!(status.summary.offline_components, 1);
    assert_eq!(status.recent_events.len(), 1);
    let event = &status.recent_events[0];
    assert_eq!(event.component_name, "b");
    assert_eq!(event.severity, Severity::Critical);
    assert_eq!(event.event_type, EventType::ComponentDown);
    assert!(!event.resolved);
}

#[tokio::test(start_paused = true)]
async fn test_slow_component_raises_one_warning() {
    let (monitor, store) = monitor(&MonitorConfig::default(), &[("a", online(1500))]);

    let results = monitor.run_once().await;
    assert_eq!(results[0].status, ComponentStatus::Online);
    assert!(results[0].error_message.is_none());

    let events = store.recent_events(chrono::Duration::days(1), 10).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::SlowResponse);
    assert_eq!(events[0].severity, Severity::Warning);
}

#[tokio::test]
async fn test_repeated_failures_are_not_deduplicated() {
    let (monitor, store) = monitor(&MonitorConfig::default(), &[("b", Behavior::Unreachable)]);

    let first = monitor.run_once().await;
    let second = monitor.run_once().await;
    assert_eq!(first[0].status, ComponentStatus::Offline);
    assert_eq!(second[0].status, ComponentStatus::Offline);

    assert_eq!(store.history_for(Some("b"), 1).unwrap().len(), 2);
    let events = store.recent_events(chrono::Duration::days(1), 10).unwrap();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.event_type == EventType::ComponentDown));
}

#[tokio::test]
async fn test_query_failure_is_error_with_warning() {
    let (monitor, store) = monitor(&MonitorConfig::default(), &[("c", Behavior::Broken)]);

    let results = monitor.run_once().await;
    assert_eq!(results[0].status, ComponentStatus::Error);
    assert!(results[0].error_message.is_some());

    let events = store.recent_events(chrono::Duration::days(1), 10).unwrap();
    assert_eq!(events[0].event_type, EventType::ComponentError);
    assert_eq!(events[0].severity, Severity::Warning);
}

#[tokio::test]
async fn test_purge_everything() {
    let mut config = MonitorConfig::default();
    config.retention_days = 0;
    let (monitor, store) = monitor(&config, &[("a", online(0)), ("b", Behavior::Unreachable)]);
    monitor.run_once().await;
    monitor.run_once().await;

    let counts = monitor.purge_expired().unwrap();
    assert_eq!(counts.deleted_checks, 4);
    assert_eq!(counts.deleted_events, 2);
    assert!(store.latest_status_per_component().unwrap().is_empty());
    assert!(!monitor
        .get_daily_summaries(Utc::now().date_naive())
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_health_bounds() {
    let (monitor, _) = monitor(&MonitorConfig::default(), &[("a", online(0)), ("b", online(0))]);
    assert_eq!(monitor.get_cluster_status().unwrap().cluster_health, 0.0);

    monitor.run_once().await;
    assert_eq!(monitor.get_cluster_status().unwrap().cluster_health, 100.0);
}

#[tokio::test]
async fn test_summary_counts_stay_consistent() {
    let (monitor, _) = monitor(&MonitorConfig::default(), &[("a", online(0)), ("b", Behavior::Unreachable)]);
    let mut results = Vec::new();
    for _ in 0..5 {
        results = monitor.run_once().await;
    }

    let summaries = monitor.get_daily_summaries(results[1].observed_at.date_naive()).unwrap();
    assert_eq!(summaries.len(), 2);
    for summary in &summaries {
        assert_eq!(summary.total_checks, 5);
        assert_eq!(summary.successful_checks + summary.failed_checks, summary.total_checks);
    }
    assert_eq!(summaries[1].component_name, "b");
    assert_eq!(summaries[1].downtime_seconds, 5 * 30);
}

#[tokio::test]
async fn test_latest_is_one_row_per_component() {
    let (monitor, store) = monitor(&MonitorConfig::default(), &[("a", online(0)), ("b", Behavior::Unreachable)]);
    for _ in 0..3 {
        monitor.run_once().await;
    }

    let latest = store.latest_status_per_component().unwrap();
    assert_eq!(latest.len(), 2);
    for row in &latest {
        let newest = store
            .history_for(Some(&row.component_name), 1)
            .unwrap()
            .into_iter()
            .map(|r| r.observed_at)
            .max()
            .unwrap();
        assert_eq!(row.observed_at, newest);
    }
}

#[tokio::test]
async fn test_history_for_all_components() {
    let (monitor, _) = monitor(&MonitorConfig::default(), &[("a", online(0)), ("b", Behavior::Unreachable)]);
    monitor.run_once().await;

    assert_eq!(monitor.get_history(None, 24).unwrap().len(), 2);
    assert_eq!(monitor.get_history(Some("a"), 24).unwrap().len(), 1);
    assert!(monitor.get_history(Some("missing"), 24).unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_write_skips_only_that_component() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cluster_status.db");
    let store = Arc::new(Store::open(&path).unwrap());
    let monitor = monitor_on(
        store.clone(),
        &MonitorConfig::default(),
        &[("a", Behavior::Unreachable), ("b", online(0))],
    );

    // Event writes fail from here on; only the unreachable component logs one.
    let other = rusqlite::Connection::open(&path).unwrap();
    other.execute_batch("DROP TABLE cluster_events").unwrap();

    let results = monitor.run_once().await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].status, ComponentStatus::Offline);
    assert_eq!(results[1].status, ComponentStatus::Online);

    let latest = store.latest_status_per_component().unwrap();
    assert_eq!(latest.len(), 2);

    let summaries = monitor.get_daily_summaries(results[1].observed_at.date_naive()).unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].component_name, "b");
    assert_eq!(summaries[0].total_checks, 1);
}
