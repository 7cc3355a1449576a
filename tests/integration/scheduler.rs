//! Start/stop rendezvous of the periodic worker

use std::time::Duration;

use chrono::Utc;
use clusterwatch::config::MonitorConfig;
use clusterwatch::monitor::SchedulerError;

use crate::{monitor, online, Behavior};

#[tokio::test]
async fn test_no_write_after_stop() {
    let (monitor, store) = monitor(
        &MonitorConfig::default(),
        &[("a", online(100)), ("b", Behavior::Unreachable)],
    );

    monitor.start(Duration::from_millis(20)).unwrap();
    monitor.stop().await;
    let stopped_at = Utc::now();
    assert!(!monitor.is_running());

    let written = store.history_for(None, 1).unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let later = store.history_for(None, 1).unwrap();

    assert_eq!(written.len(), later.len());
    assert!(later.iter().all(|r| r.observed_at <= stopped_at));
}

#[tokio::test]
async fn test_stop_waits_for_in_flight_pass() {
    let (monitor, store) = monitor(&MonitorConfig::default(), &[("a", online(200))]);

    monitor.start(Duration::from_secs(60)).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    monitor.stop().await;

    // The pass was mid-probe when stop was called; it finishes and lands.
    assert_eq!(store.history_for(Some("a"), 1).unwrap().len(), 1);
}

#[tokio::test]
async fn test_stop_timeout_aborts_pass() {
    let mut config = MonitorConfig::default();
    config.stop_timeout_ms = 50;
    let (monitor, store) = monitor(&config, &[("a", online(1000))]);

    monitor.start(Duration::from_secs(60)).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    monitor.stop().await;

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(store.history_for(None, 1).unwrap().is_empty());
}

#[tokio::test]
async fn test_start_twice() {
    let (monitor, _) = monitor(&MonitorConfig::default(), &[("a", online(0))]);

    monitor.start(Duration::from_secs(60)).unwrap();
    assert!(monitor.is_running());
    assert_eq!(
        monitor.start(Duration::from_secs(60)),
        Err(SchedulerError::AlreadyRunning)
    );

    monitor.stop().await;
    assert!(!monitor.is_running());
    monitor.start(Duration::from_secs(60)).unwrap();
    monitor.stop().await;
}

#[tokio::test]
async fn test_manual_pass_while_running() {
    let (monitor, store) = monitor(&MonitorConfig::default(), &[("b", Behavior::Unreachable)]);

    monitor.start(Duration::from_millis(10)).unwrap();
    for _ in 0..5 {
        monitor.run_once().await;
    }
    monitor.stop().await;

    let summary = monitor
        .get_daily_summaries(Utc::now().date_naive())
        .unwrap()
        .pop()
        .unwrap();
    let checks = store.history_for(Some("b"), 1).unwrap().len() as u64;
    assert_eq!(summary.total_checks, checks);
    assert_eq!(summary.failed_checks, checks);
}
