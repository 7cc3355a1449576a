//! Periodic worker
//!
//! `start` spawns one task that runs a pass, then sleeps for the interval.
//! The sleep is the only cancellation point: `stop` cancels the token and
//! waits for the in-flight pass, aborting it only once `stop_timeout` expires.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::pipeline::Pipeline;

/// Minimum spacing between retention purges
const PURGE_EVERY: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("scheduler is already running")]
    AlreadyRunning,

    #[error("check interval must be greater than zero")]
    InvalidInterval,
}

struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct Scheduler {
    pipeline: Arc<Pipeline>,
    worker: Mutex<Option<Worker>>,
    retention_days: u32,
    stop_timeout: Duration,
}

impl Scheduler {
    pub fn new(pipeline: Arc<Pipeline>, retention_days: u32, stop_timeout: Duration) -> Self {
        Self {
            pipeline,
            worker: Mutex::new(None),
            retention_days,
            stop_timeout,
        }
    }

    /// Spawn the periodic worker. Must be called inside a tokio runtime.
    pub fn start(&self, interval: Duration) -> Result<(), SchedulerError> {
        if interval.is_zero() {
            return Err(SchedulerError::InvalidInterval);
        }

        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.pipeline.set_check_interval(interval);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_worker(
            self.pipeline.clone(),
            interval,
            self.retention_days,
            cancel.clone(),
        ));
        *worker = Some(Worker { cancel, handle });

        info!(
            interval_ms = interval.as_millis() as u64,
            components = self.pipeline.registry().len(),
            "Scheduler started"
        );
        Ok(())
    }

    /// Stop the worker. Returns once the in-flight pass has finished (or was
    /// aborted at `stop_timeout`); no write happens after this returns.
    pub async fn stop(&self) {
        let worker = self.worker.lock().take();
        let Some(Worker { cancel, mut handle }) = worker else {
            debug!("Scheduler not running");
            return;
        };

        cancel.cancel();
        match tokio::time::timeout(self.stop_timeout, &mut handle).await {
            Ok(Ok(())) => info!("Scheduler stopped"),
            Ok(Err(e)) => error!(error = %e, "Scheduler worker ended abnormally"),
            Err(_) => {
                warn!(
                    timeout_ms = self.stop_timeout.as_millis() as u64,
                    "Pass did not finish in time, aborting worker"
                );
                handle.abort();
                let _ = handle.await;
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            worker.cancel.cancel();
            worker.handle.abort();
        }
    }
}

async fn run_worker(
    pipeline: Arc<Pipeline>,
    interval: Duration,
    retention_days: u32,
    cancel: CancellationToken,
) {
    let mut last_purge: Option<Instant> = None;

    loop {
        if cancel.is_cancelled() {
            break;
        }

        if last_purge.map_or(true, |at| at.elapsed() >= PURGE_EVERY) {
            // Failure is logged inside; retry on the next window.
            let _ = pipeline.purge_expired(retention_days);
            last_purge = Some(Instant::now());
        }

        let results = pipeline.run_pass().await;
        debug!(checked = results.len(), "Periodic pass finished");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    debug!("Scheduler worker exiting");
}
