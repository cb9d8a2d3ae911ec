//! Background removal of expired keys
//!
//! Expired keys are already invisible to every transaction; this task only
//! reclaims their memory.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, warn};

use super::MemoryStore;
use crate::error::{RedtapeError, Result};

/// Commands for the expiration manager
#[derive(Debug)]
enum ExpirationCommand {
    /// Run a sweep now instead of waiting for the next tick
    SweepNow,
    Shutdown,
}

/// Periodic sweeper over a [`MemoryStore`]
pub struct ExpirationManager {
    command_sender: mpsc::UnboundedSender<ExpirationCommand>,
    cleanup_handle: Option<tokio::task::JoinHandle<()>>,
}

impl ExpirationManager {
    /// Spawn the sweep task on the current tokio runtime
    pub fn new(store: Arc<MemoryStore>, sweep_interval: Duration) -> Self {
        let (command_sender, command_receiver) = mpsc::unbounded_channel();

        let cleanup_handle = tokio::spawn(Self::cleanup_task(
            store,
            command_receiver,
            sweep_interval,
        ));

        Self {
            command_sender,
            cleanup_handle: Some(cleanup_handle),
        }
    }

    /// Request an immediate sweep
    pub fn sweep_now(&self) -> Result<()> {
        self.command_sender
            .send(ExpirationCommand::SweepNow)
            .map_err(|_| RedtapeError::store("expiration manager is not running"))
    }

    /// Stop the sweep task and wait for it to finish
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.command_sender.send(ExpirationCommand::Shutdown).is_err() {
            warn!("Failed to send shutdown command to expiration manager");
        }

        if let Some(handle) = self.cleanup_handle.take() {
            handle.await.map_err(|e| {
                error!("Expiration manager task failed: {}", e);
                RedtapeError::store(format!("expiration manager task failed: {e}"))
            })?;
        }

        Ok(())
    }

    async fn cleanup_task(
        store: Arc<MemoryStore>,
        mut command_receiver: mpsc::UnboundedReceiver<ExpirationCommand>,
        sweep_interval: Duration,
    ) {
        let mut ticker = interval(sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(?sweep_interval, "expiration sweep started");

        loop {
            tokio::select! {
                command = command_receiver.recv() => match command {
                    Some(ExpirationCommand::SweepNow) => Self::sweep(&store),
                    Some(ExpirationCommand::Shutdown) => break,
                    None => {
                        warn!("Expiration command channel closed unexpectedly");
                        break;
                    }
                },
                _ = ticker.tick() => Self::sweep(&store),
            }
        }

        debug!("expiration sweep stopped");
    }

    fn sweep(store: &MemoryStore) {
        if let Err(e) = store.purge_expired() {
            error!("Failed to purge expired keys: {}", e);
        }
    }
}

impl Drop for ExpirationManager {
    fn drop(&mut self) {
        if self.cleanup_handle.is_some() {
            let _ = self.command_sender.send(ExpirationCommand::Shutdown);
        }
    }
}
