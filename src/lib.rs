//! Redtape - Redis-compatible command parsing and execution core
//!
//! Redtape turns Redis command token streams (SET with its NX/XX/GET/EX/PX/
//! EXAT/PXAT/KEEPTTL options, the EXPIRE family, TTL lookups) into typed
//! commands, runs each one as a single atomic transaction against a keyspace
//! with lazy expiration, and encodes the outcome as a Redis reply.

// Core modules
pub mod config;
pub mod error;
pub mod logging;

// Feature modules
pub mod commands;
pub mod storage;

// Public API exports
pub use config::Config;
pub use error::{RedtapeError, Result};

// Test utilities (only available in test builds)
#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use commands::{Command, CommandRegistry, Outcome, ParsedCommand, Reply};
pub use storage::{ExpirationManager, MemoryStore, Store, StoreExt, StoredValue, Transaction};

use bytes::Bytes;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Redtape instance with its keyspace, command registry and expiration sweep
pub struct Redtape {
    config: Arc<Config>,
    store: Arc<MemoryStore>,
    registry: Arc<CommandRegistry>,
    expiration: Option<ExpirationManager>,
    client_id: Uuid,
}

impl Redtape {
    /// Create a new instance with an empty keyspace
    pub fn new(config: Config) -> Result<Self> {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Create a new instance over an existing keyspace
    pub fn with_store(config: Config, store: Arc<MemoryStore>) -> Result<Self> {
        config.validate()?;

        let registry = CommandRegistry::with_builtin_commands();
        info!(
            "Redtape initialized with {} registered commands",
            registry.command_count()
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            registry: Arc::new(registry),
            expiration: None,
            client_id: Uuid::new_v4(),
        })
    }

    /// Start the background expiration sweep if enabled in the configuration.
    /// Must be called from within a tokio runtime. Returns whether a sweep is running.
    pub fn start_expiration(&mut self) -> bool {
        if self.expiration.is_some() {
            return true;
        }
        if !self.config.storage.expiration_sweep {
            info!("Expiration sweep disabled, relying on lazy expiration");
            return false;
        }

        self.expiration = Some(ExpirationManager::new(
            Arc::clone(&self.store),
            self.config.storage.sweep_interval(),
        ));
        info!(
            "Expiration sweep started every {:?}",
            self.config.storage.sweep_interval()
        );
        true
    }

    /// Execute one command given as a token stream (name first)
    pub fn execute<T: AsRef<[u8]>>(&self, tokens: &[T]) -> Reply {
        let tokens: Vec<Bytes> = tokens
            .iter()
            .map(|token| Bytes::copy_from_slice(token.as_ref()))
            .collect();

        match ParsedCommand::from_tokens(&tokens, self.client_id) {
            Ok(cmd) => self.registry.execute(&cmd, self.store.as_ref()),
            Err(e) => {
                warn!("Rejected empty command: {}", e);
                Reply::Error(e.to_client_error())
            }
        }
    }

    /// Execute one whitespace-separated command line
    pub fn execute_line(&self, line: &str) -> Reply {
        match ParsedCommand::parse(line, self.client_id) {
            Ok(cmd) => self.registry.execute(&cmd, self.store.as_ref()),
            Err(e) => {
                warn!("Rejected empty command: {}", e);
                Reply::Error(e.to_client_error())
            }
        }
    }

    /// Stop the expiration sweep, if running
    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(mut expiration) = self.expiration.take() {
            expiration.shutdown().await?;
            info!("Expiration sweep stopped");
        }
        Ok(())
    }

    /// Whether the background sweep is running
    pub fn is_sweeping(&self) -> bool {
        self.expiration.is_some()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Identifier attached to every command this instance runs
    pub fn client_id(&self) -> Uuid {
        self.client_id
    }
}
