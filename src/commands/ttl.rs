//! TTL command implementations (EXPIRE, PEXPIRE, EXPIREAT, PEXPIREAT, PERSIST, TTL, PTTL)

use super::coerce::{self, TimeUnit};
use super::grammar::Grammar;
use super::{Command, Outcome};
use crate::error::Result;
use crate::storage::expiry::{self, ETime};
use crate::storage::{Store, StoreExt};
use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};

const EXPIRE: Grammar = Grammar::fixed("expire", 2);
const PEXPIRE: Grammar = Grammar::fixed("pexpire", 2);
const EXPIREAT: Grammar = Grammar::fixed("expireat", 2);
const PEXPIREAT: Grammar = Grammar::fixed("pexpireat", 2);
const PERSIST: Grammar = Grammar::fixed("persist", 1);
const TTL: Grammar = Grammar::fixed("ttl", 1);
const PTTL: Grammar = Grammar::fixed("pttl", 1);

/// EXPIRE key seconds / PEXPIRE key milliseconds
///
/// Sets a relative timeout on an existing key. A timeout that is zero or
/// negative deletes the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expire {
    key: Bytes,
    ttl: TimeDelta,
    unit: TimeUnit,
}

impl Expire {
    pub fn new(key: impl Into<Bytes>, ttl: TimeDelta, unit: TimeUnit) -> Self {
        Self {
            key: key.into(),
            ttl,
            unit,
        }
    }

    pub fn parse(args: &[Bytes], unit: TimeUnit) -> Result<Self> {
        let grammar = match unit {
            TimeUnit::Seconds => EXPIRE,
            TimeUnit::Milliseconds => PEXPIRE,
        };
        let matches = grammar.parse(args)?;
        let positional = matches.positional();
        let ttl = coerce::ttl(coerce::parse_int(&positional[1])?, unit)?;

        Ok(Self::new(positional[0].clone(), ttl, unit))
    }

    pub fn key(&self) -> &Bytes {
        &self.key
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }
}

impl Command for Expire {
    fn name(&self) -> &'static str {
        match self.unit {
            TimeUnit::Seconds => "EXPIRE",
            TimeUnit::Milliseconds => "PEXPIRE",
        }
    }

    fn execute(&self, store: &dyn Store) -> Result<Outcome> {
        store.update(|tx| {
            let deadline = expiry::deadline_after(tx.now(), self.ttl);
            Ok(Outcome::Applied(expiry::apply_deadline(tx, &self.key, deadline)?))
        })
    }
}

/// EXPIREAT key unix-seconds / PEXPIREAT key unix-milliseconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpireAt {
    key: Bytes,
    at: DateTime<Utc>,
    unit: TimeUnit,
}

impl ExpireAt {
    pub fn new(key: impl Into<Bytes>, at: DateTime<Utc>, unit: TimeUnit) -> Self {
        Self {
            key: key.into(),
            at,
            unit,
        }
    }

    pub fn parse(args: &[Bytes], unit: TimeUnit) -> Result<Self> {
        let grammar = match unit {
            TimeUnit::Seconds => EXPIREAT,
            TimeUnit::Milliseconds => PEXPIREAT,
        };
        let matches = grammar.parse(args)?;
        let positional = matches.positional();
        let at = coerce::instant(coerce::parse_int(&positional[1])?, unit)?;

        Ok(Self::new(positional[0].clone(), at, unit))
    }
}

impl Command for ExpireAt {
    fn name(&self) -> &'static str {
        match self.unit {
            TimeUnit::Seconds => "EXPIREAT",
            TimeUnit::Milliseconds => "PEXPIREAT",
        }
    }

    fn execute(&self, store: &dyn Store) -> Result<Outcome> {
        let deadline: ETime = self.at.timestamp_millis();
        store.update(|tx| Ok(Outcome::Applied(expiry::apply_deadline(tx, &self.key, deadline)?)))
    }
}

/// PERSIST key
///
/// Removes the timeout of a key. Reports whether a timeout was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persist {
    key: Bytes,
}

impl Persist {
    pub fn parse(args: &[Bytes]) -> Result<Self> {
        let matches = PERSIST.parse(args)?;
        Ok(Self {
            key: matches.positional()[0].clone(),
        })
    }
}

impl Command for Persist {
    fn name(&self) -> &'static str {
        "PERSIST"
    }

    fn execute(&self, store: &dyn Store) -> Result<Outcome> {
        store.update(|tx| {
            let had_expiry = matches!(tx.get(&self.key)?, Some(stored) if stored.expires_at.is_some());
            if had_expiry {
                tx.set_expiry(&self.key, None)?;
            }
            Ok(Outcome::Applied(had_expiry))
        })
    }
}

/// TTL key / PTTL key
///
/// Returns -2 for a missing key, -1 for a key without a timeout, otherwise the
/// remaining lifetime (seconds rounded to the nearest, or milliseconds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ttl {
    key: Bytes,
    unit: TimeUnit,
}

impl Ttl {
    pub fn parse(args: &[Bytes], unit: TimeUnit) -> Result<Self> {
        let grammar = match unit {
            TimeUnit::Seconds => TTL,
            TimeUnit::Milliseconds => PTTL,
        };
        let matches = grammar.parse(args)?;
        Ok(Self {
            key: matches.positional()[0].clone(),
            unit,
        })
    }
}

impl Command for Ttl {
    fn name(&self) -> &'static str {
        match self.unit {
            TimeUnit::Seconds => "TTL",
            TimeUnit::Milliseconds => "PTTL",
        }
    }

    fn execute(&self, store: &dyn Store) -> Result<Outcome> {
        store.view(|tx| {
            let now = tx.now();
            let remaining = match tx.get(&self.key)? {
                None => -2,
                Some(stored) => match stored.ttl_millis(now) {
                    None => -1,
                    Some(ms) => match self.unit {
                        TimeUnit::Seconds => (ms + 500) / 1000,
                        TimeUnit::Milliseconds => ms,
                    },
                },
            };
            Ok(Outcome::Count(remaining))
        })
    }
}
