//! Storage layer
//!
//! Commands never touch the keyspace directly. They describe their work as a
//! closure over a [`Transaction`] and hand it to a [`Store`], which runs the
//! whole closure atomically.

pub mod expiration;
pub mod expiry;
pub mod memory;

pub use expiration::ExpirationManager;
pub use expiry::{ETime, Expiry};
pub use memory::{MemoryStore, MemoryTransaction, StoredValue};

use crate::error::{RedtapeError, Result};
use bytes::Bytes;

/// Operations available inside one transaction.
///
/// Expired keys are absent to every method, even before they are physically removed.
pub trait Transaction {
    /// Timestamp fixed at transaction start; every expiry decision uses it
    fn now(&self) -> ETime;

    /// Value and expiration of a live key
    fn get(&mut self, key: &[u8]) -> Result<Option<StoredValue>>;

    fn exists(&mut self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Write a value, keeping the expiration of a live key (a new key has none)
    fn set_value(&mut self, key: &[u8], value: Bytes) -> Result<()>;

    /// Replace the expiration of a live key. Returns false if the key is absent.
    fn set_expiry(&mut self, key: &[u8], expires_at: Option<ETime>) -> Result<bool>;

    /// Remove a key. Returns whether a live key was removed.
    fn delete(&mut self, key: &[u8]) -> Result<bool>;
}

/// A keyspace that executes transactions.
///
/// The object-safe `run_*` methods take the closure by `&mut dyn FnMut`; callers
/// use the typed wrappers in [`StoreExt`]. Failures are returned as-is and never
/// retried.
pub trait Store: Send + Sync {
    /// Run a read-write transaction. Writes become visible only if `op` returns `Ok`.
    fn run_update(&self, op: &mut dyn FnMut(&mut dyn Transaction) -> Result<()>) -> Result<()>;

    /// Run a read-only transaction. Writes fail with a store error.
    fn run_view(&self, op: &mut dyn FnMut(&mut dyn Transaction) -> Result<()>) -> Result<()>;
}

/// Typed closures over [`Store`]
pub trait StoreExt: Store {
    fn update<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<R>,
    {
        run_once(f, |op| self.run_update(op))
    }

    fn view<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<R>,
    {
        run_once(f, |op| self.run_view(op))
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

fn run_once<R, F, Run>(f: F, run: Run) -> Result<R>
where
    F: FnOnce(&mut dyn Transaction) -> Result<R>,
    Run: FnOnce(&mut dyn FnMut(&mut dyn Transaction) -> Result<()>) -> Result<()>,
{
    let mut f = Some(f);
    let mut output = None;
    run(&mut |tx: &mut dyn Transaction| {
        let f = f
            .take()
            .ok_or_else(|| RedtapeError::store("transaction body invoked twice"))?;
        output = Some(f(tx)?);
        Ok(())
    })?;
    output.ok_or_else(|| RedtapeError::store("transaction body never ran"))
}
