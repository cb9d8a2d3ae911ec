//! Key expiration model
//!
//! Expiration instants ([`ETime`]) are absolute epoch timestamps in milliseconds.
//! A key whose instant is at or before "now" is logically gone, whether or not a
//! sweep has physically removed it yet.

use super::Transaction;
use crate::error::Result;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

/// Absolute expiration instant, milliseconds since the Unix epoch
pub type ETime = i64;

/// Current wall clock as an [`ETime`]
pub fn now_millis() -> ETime {
    Utc::now().timestamp_millis()
}

/// Whether a key with the given expiration is still visible at `now`
pub fn is_live(expires_at: Option<ETime>, now: ETime) -> bool {
    expires_at.map_or(true, |at| at > now)
}

/// Deadline for a relative TTL issued at `now`
pub fn deadline_after(now: ETime, ttl: TimeDelta) -> ETime {
    now.saturating_add(ttl.num_milliseconds())
}

/// How a write treats the key's expiration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    /// Remove any existing expiration
    #[default]
    Clear,
    /// Leave the existing expiration untouched (KEEPTTL)
    Keep,
    /// Expire `ttl` after the write (EX, PX)
    After(TimeDelta),
    /// Expire at an absolute instant (EXAT, PXAT)
    At(DateTime<Utc>),
}

impl Expiry {
    /// The absolute deadline this expiry sets, if any
    pub fn deadline(&self, now: ETime) -> Option<ETime> {
        match self {
            Expiry::Clear | Expiry::Keep => None,
            Expiry::After(ttl) => Some(deadline_after(now, *ttl)),
            Expiry::At(at) => Some(at.timestamp_millis()),
        }
    }
}

/// Apply an absolute deadline to an existing key.
///
/// A deadline at or before the transaction's `now` deletes the key outright
/// instead of leaving an expired entry behind. Returns whether the key existed.
pub fn apply_deadline(tx: &mut dyn Transaction, key: &[u8], deadline: ETime) -> Result<bool> {
    if deadline <= tx.now() {
        let deleted = tx.delete(key)?;
        if deleted {
            debug!(key = %String::from_utf8_lossy(key), "deadline already passed, key deleted");
        }
        return Ok(deleted);
    }
    tx.set_expiry(key, Some(deadline))
}
