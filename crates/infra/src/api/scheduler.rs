//! Background credential refresh scheduler
//!
//! Periodically refreshes the session credential through the client's
//! single-flight refresh path, so a background tick and a burst of expired
//! requests never refresh twice.

use std::sync::Arc;
use std::time::Duration;

use dropdoko_domain::constants::DEFAULT_BACKGROUND_REFRESH_SECS;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::client::ApiClient;
use super::refresh::RefreshTrigger;

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the refresh scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between background refreshes
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(DEFAULT_BACKGROUND_REFRESH_SECS) }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Scheduler already running")]
    AlreadyRunning,

    #[error("Scheduler not running")]
    NotRunning,

    #[error("Scheduler task panicked: {0}")]
    TaskPanicked(String),

    #[error("Scheduler task did not stop within {0:?}")]
    StopTimeout(Duration),
}

/// Cancelable periodic refresh task
pub struct RefreshScheduler {
    client: Arc<ApiClient>,
    config: SchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl RefreshScheduler {
    const STOP_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(client: Arc<ApiClient>, config: SchedulerConfig) -> Self {
        Self {
            client,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the scheduler
    ///
    /// Spawns a background task that refreshes the credential every
    /// `config.interval`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AlreadyRunning`] if scheduler is already running
    #[instrument(skip(self), fields(interval = ?self.config.interval))]
    pub async fn start(&mut self) -> Result<(), SchedulerError> {
        if self.is_running().await {
            return Err(SchedulerError::AlreadyRunning);
        }

        // Fresh token so the scheduler can be restarted after a stop
        self.cancellation_token = CancellationToken::new();

        let client = Arc::clone(&self.client);
        let interval = self.config.interval;
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::refresh_loop(client, interval, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        info!("refresh scheduler started");

        Ok(())
    }

    /// Stop the scheduler gracefully
    ///
    /// Cancels the background task and awaits completion.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NotRunning`] if scheduler is not running
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<(), SchedulerError> {
        if !self.is_running().await {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            match tokio::time::timeout(Self::STOP_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Scheduler task panicked: {}", e);
                    return Err(SchedulerError::TaskPanicked(e.to_string()));
                }
                Err(_) => {
                    warn!("Scheduler task did not complete within timeout");
                    return Err(SchedulerError::StopTimeout(Self::STOP_TIMEOUT));
                }
            }
        }

        info!("refresh scheduler stopped");

        Ok(())
    }

    /// Check if scheduler is running
    ///
    /// A scheduler is considered running if it has an active task handle.
    pub async fn is_running(&self) -> bool {
        self.task_handle.lock().await.is_some()
    }

    async fn refresh_loop(client: Arc<ApiClient>, interval: Duration, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("refresh loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    Self::tick(&client).await;
                }
            }
        }
    }

    async fn tick(client: &ApiClient) {
        if !client.session().is_authenticated() {
            debug!("no session credential; skipping background refresh");
            return;
        }

        match client.refresh_now(RefreshTrigger::Background).await {
            Ok(()) => debug!("background refresh completed"),
            Err(err) => warn!(error = %err, "background refresh failed"),
        }
    }
}

/// Ensure scheduler is stopped when dropped
impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        let running = self.task_handle.try_lock().map(|handle| handle.is_some()).unwrap_or(true);
        if running && !self.cancellation_token.is_cancelled() {
            warn!("RefreshScheduler dropped while running; cancelling");
            self.cancellation_token.cancel();
        }
    }
}
