//! In-memory storage implementation using DashMap

use super::expiry::{self, ETime};
use super::{Store, StoreExt, Transaction};
use crate::error::{RedtapeError, Result};
use bytes::Bytes;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, trace};

/// Stored value with its expiration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub value: Bytes,
    pub expires_at: Option<ETime>,
}

impl StoredValue {
    /// Create a new stored value without expiration
    pub fn new(value: impl Into<Bytes>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }

    /// Create a new stored value expiring at `expires_at`
    pub fn with_expiry(value: impl Into<Bytes>, expires_at: ETime) -> Self {
        Self {
            value: value.into(),
            expires_at: Some(expires_at),
        }
    }

    pub fn is_live(&self, now: ETime) -> bool {
        expiry::is_live(self.expires_at, now)
    }

    /// Remaining lifetime in milliseconds, `None` if the key never expires
    pub fn ttl_millis(&self, now: ETime) -> Option<i64> {
        self.expires_at.map(|at| at.saturating_sub(now).max(0))
    }
}

/// Concurrent in-memory keyspace.
///
/// Read-write transactions are serialized by a single writer lock, so every
/// check-then-act sequence inside one closure is atomic with respect to other
/// writers. Readers go straight to the map and only ever observe committed
/// values.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: DashMap<Bytes, StoredValue>,
    writer: Mutex<()>,
}

impl MemoryStore {
    /// Create a new memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Set a key-value pair, clearing any previous expiration
    pub fn set<K, V>(&self, key: K, value: V) -> Result<()>
    where
        K: Into<Bytes>,
        V: Into<Bytes>,
    {
        let key = key.into();
        let value = value.into();
        self.update(|tx| {
            tx.set_value(&key, value)?;
            tx.set_expiry(&key, None)?;
            Ok(())
        })
    }

    /// Set a key-value pair expiring at an absolute instant
    pub fn set_with_expiry<K, V>(&self, key: K, value: V, expires_at: ETime) -> Result<()>
    where
        K: Into<Bytes>,
        V: Into<Bytes>,
    {
        let key = key.into();
        let value = value.into();
        self.update(|tx| {
            tx.set_value(&key, value)?;
            tx.set_expiry(&key, Some(expires_at))?;
            Ok(())
        })
    }

    /// Get a live value from the store
    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<StoredValue>> {
        self.view(|tx| tx.get(key.as_ref()))
    }

    /// Check if a live key exists in the store
    pub fn exists(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        self.view(|tx| tx.exists(key.as_ref()))
    }

    /// Physically remove every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let _guard = self.lock_writer()?;
        let now = expiry::now_millis();
        let mut removed = 0;
        self.data.retain(|_, stored| {
            let live = stored.is_live(now);
            if !live {
                removed += 1;
            }
            live
        });
        if removed > 0 {
            debug!(removed, "purged expired keys");
        }
        Ok(removed)
    }

    fn lock_writer(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.writer
            .lock()
            .map_err(|_| RedtapeError::store("writer lock poisoned by a failed transaction"))
    }
}

impl Store for MemoryStore {
    fn run_update(&self, op: &mut dyn FnMut(&mut dyn Transaction) -> Result<()>) -> Result<()> {
        let _guard = self.lock_writer()?;
        let mut tx = MemoryTransaction::new(&self.data, expiry::now_millis(), true);
        op(&mut tx)?;
        let written = tx.commit();
        trace!(written, "transaction committed");
        Ok(())
    }

    fn run_view(&self, op: &mut dyn FnMut(&mut dyn Transaction) -> Result<()>) -> Result<()> {
        let mut tx = MemoryTransaction::new(&self.data, expiry::now_millis(), false);
        op(&mut tx)
    }
}

/// Transaction over a [`MemoryStore`].
///
/// Writes are staged in `pending` and reach the map only on commit; a
/// transaction that is dropped without committing leaves no trace.
pub struct MemoryTransaction<'a> {
    data: &'a DashMap<Bytes, StoredValue>,
    pending: HashMap<Bytes, Option<StoredValue>>,
    now: ETime,
    writable: bool,
}

impl<'a> MemoryTransaction<'a> {
    fn new(data: &'a DashMap<Bytes, StoredValue>, now: ETime, writable: bool) -> Self {
        Self {
            data,
            pending: HashMap::new(),
            now,
            writable,
        }
    }

    /// Latest staged-or-committed state of a key, if it is live
    fn lookup(&self, key: &[u8]) -> Option<StoredValue> {
        let current = match self.pending.get(key) {
            Some(staged) => staged.clone(),
            None => self.data.get(key).map(|entry| entry.value().clone()),
        };
        current.filter(|stored| stored.is_live(self.now))
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(RedtapeError::store("write attempted in a read-only transaction"))
        }
    }

    fn stage(&mut self, key: &[u8], value: Option<StoredValue>) {
        self.pending.insert(Bytes::copy_from_slice(key), value);
    }

    fn commit(self) -> usize {
        let written = self.pending.len();
        for (key, staged) in self.pending {
            match staged {
                Some(stored) => {
                    self.data.insert(key, stored);
                }
                None => {
                    self.data.remove(&key);
                }
            }
        }
        written
    }
}

impl Transaction for MemoryTransaction<'_> {
    fn now(&self) -> ETime {
        self.now
    }

    fn get(&mut self, key: &[u8]) -> Result<Option<StoredValue>> {
        Ok(self.lookup(key))
    }

    fn set_value(&mut self, key: &[u8], value: Bytes) -> Result<()> {
        self.ensure_writable()?;
        let expires_at = self.lookup(key).and_then(|stored| stored.expires_at);
        self.stage(key, Some(StoredValue { value, expires_at }));
        Ok(())
    }

    fn set_expiry(&mut self, key: &[u8], expires_at: Option<ETime>) -> Result<bool> {
        self.ensure_writable()?;
        match self.lookup(key) {
            Some(mut stored) => {
                stored.expires_at = expires_at;
                self.stage(key, Some(stored));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&mut self, key: &[u8]) -> Result<bool> {
        self.ensure_writable()?;
        let existed = self.lookup(key).is_some();
        // Expired entries are removed physically too
        let present = match self.pending.get(key) {
            Some(staged) => staged.is_some(),
            None => self.data.contains_key(key),
        };
        if present {
            self.stage(key, None);
        }
        Ok(existed)
    }
}
