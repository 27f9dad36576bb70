//! AgentStateSweeper - Background service that deletes expired agent state.
//!
//! Runs independently of request handling and permanently removes every
//! record whose expiry has passed, resolved or not.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `sweep_interval` | 300s | Time between sweeps |
//!
//! ## Shutdown
//!
//! [`SweeperHandle::shutdown`] signals the loop and waits for the task to
//! finish, so no sweep runs after it returns. Dropping the handle also stops
//! the loop, without waiting.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use crate::ports::{AgentStateError, AgentStateStore};

/// Configuration for the sweeper.
#[derive(Debug, Clone)]
pub struct AgentStateSweeperConfig {
    pub sweep_interval: Duration,
}

impl Default for AgentStateSweeperConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(300),
        }
    }
}

impl AgentStateSweeperConfig {
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

/// Periodically purges expired records from an agent state store.
pub struct AgentStateSweeper {
    store: Arc<dyn AgentStateStore>,
    config: AgentStateSweeperConfig,
}

impl AgentStateSweeper {
    pub fn new(store: Arc<dyn AgentStateStore>) -> Self {
        Self::with_config(store, AgentStateSweeperConfig::default())
    }

    pub fn with_config(store: Arc<dyn AgentStateStore>, config: AgentStateSweeperConfig) -> Self {
        Self { store, config }
    }

    /// Run the sweep loop until shutdown is signalled or the sender is dropped.
    ///
    /// A failed sweep is logged and the loop keeps going.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.sweep_interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.config.sweep_interval.as_secs_f64(),
            "Agent state sweeper started"
        );

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Agent state sweeper stopped");
                        return;
                    }
                }

                _ = interval.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        tracing::warn!(error = %e, "Agent state sweep failed");
                    }
                }
            }
        }
    }

    /// Run exactly one sweep.
    pub async fn sweep_once(&self) -> Result<usize, AgentStateError> {
        let purged = self.store.purge_expired().await?;
        if purged > 0 {
            tracing::debug!(purged, "Expired agent state purged");
        }
        Ok(purged)
    }

    /// Start the loop on its own task.
    pub fn spawn(self) -> SweeperHandle {
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(async move { self.run(rx).await });
        SweeperHandle { shutdown: tx, task }
    }
}

/// Handle to a running sweeper task.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper and wait for its task to end.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Agent state sweeper task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
