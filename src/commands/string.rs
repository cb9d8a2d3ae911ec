//! String command implementations (SET, GET, DEL, EXISTS)

use super::coerce::{self, TimeUnit};
use super::grammar::{Grammar, OptionSpec};
use super::{Command, Outcome, Reply};
use crate::error::Result;
use crate::storage::expiry::{self, Expiry};
use crate::storage::{Store, StoreExt};
use bytes::Bytes;
use tracing::trace;

const SET_OPTIONS: &[OptionSpec] = &[
    OptionSpec::flag("NX").in_group("condition"),
    OptionSpec::flag("XX").in_group("condition"),
    OptionSpec::flag("GET"),
    OptionSpec::int("EX").in_group("expiry"),
    OptionSpec::int("PX").in_group("expiry"),
    OptionSpec::int("EXAT").in_group("expiry"),
    OptionSpec::int("PXAT").in_group("expiry"),
    OptionSpec::flag("KEEPTTL").in_group("expiry"),
];

/// Existence precondition of a SET
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetCondition {
    #[default]
    Always,
    /// NX
    IfNotExists,
    /// XX
    IfExists,
}

impl SetCondition {
    fn allows(self, exists: bool) -> bool {
        match self {
            SetCondition::Always => true,
            SetCondition::IfNotExists => !exists,
            SetCondition::IfExists => exists,
        }
    }
}

/// SET key value [NX|XX] [GET] [EX seconds|PX millis|EXAT unix-seconds|PXAT unix-millis|KEEPTTL]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Set {
    key: Bytes,
    value: Bytes,
    condition: SetCondition,
    get: bool,
    expiry: Expiry,
}

impl Set {
    pub const GRAMMAR: Grammar = Grammar::fixed("set", 2).with_options(SET_OPTIONS);

    /// An unconditional SET that clears any expiration
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            condition: SetCondition::Always,
            get: false,
            expiry: Expiry::Clear,
        }
    }

    pub fn with_condition(mut self, condition: SetCondition) -> Self {
        self.condition = condition;
        self
    }

    pub fn with_get(mut self) -> Self {
        self.get = true;
        self
    }

    pub fn with_expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn key(&self) -> &Bytes {
        &self.key
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }

    pub fn condition(&self) -> SetCondition {
        self.condition
    }

    pub fn returns_previous(&self) -> bool {
        self.get
    }

    pub fn expiry(&self) -> Expiry {
        self.expiry
    }

    pub fn parse(args: &[Bytes]) -> Result<Self> {
        let matches = Self::GRAMMAR.parse(args)?;

        let condition = match matches.chosen("condition") {
            Some(("NX", _)) => SetCondition::IfNotExists,
            Some(("XX", _)) => SetCondition::IfExists,
            _ => SetCondition::Always,
        };
        let expiry = match matches.chosen("expiry") {
            Some(("EX", Some(n))) => Expiry::After(coerce::ttl(n, TimeUnit::Seconds)?),
            Some(("PX", Some(n))) => Expiry::After(coerce::ttl(n, TimeUnit::Milliseconds)?),
            Some(("EXAT", Some(n))) => Expiry::At(coerce::instant(n, TimeUnit::Seconds)?),
            Some(("PXAT", Some(n))) => Expiry::At(coerce::instant(n, TimeUnit::Milliseconds)?),
            Some(("KEEPTTL", _)) => Expiry::Keep,
            _ => Expiry::Clear,
        };
        let positional = matches.positional();

        Ok(Self {
            key: positional[0].clone(),
            value: positional[1].clone(),
            condition,
            get: matches.flag("GET"),
            expiry,
        })
    }
}

impl Command for Set {
    fn name(&self) -> &'static str {
        "SET"
    }

    fn execute(&self, store: &dyn Store) -> Result<Outcome> {
        store.update(|tx| {
            let previous = tx.get(&self.key)?;
            let proceed = self.condition.allows(previous.is_some());

            if proceed {
                tx.set_value(&self.key, self.value.clone())?;
                match self.expiry.deadline(tx.now()) {
                    Some(deadline) => {
                        expiry::apply_deadline(tx, &self.key, deadline)?;
                    }
                    None if self.expiry == Expiry::Clear => {
                        tx.set_expiry(&self.key, None)?;
                    }
                    None => {}
                }
            } else {
                trace!(condition = ?self.condition, "set condition not met");
            }

            if self.get {
                Ok(Outcome::Value(previous.map(|stored| stored.value)))
            } else {
                Ok(Outcome::Applied(proceed))
            }
        })
    }

    fn encode(&self, outcome: Outcome) -> Reply {
        match outcome {
            Outcome::Applied(true) => Reply::ok(),
            Outcome::Applied(false) => Reply::nil(),
            other => other.into(),
        }
    }
}

/// GET key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Get {
    key: Bytes,
}

impl Get {
    pub const GRAMMAR: Grammar = Grammar::fixed("get", 1);

    pub fn parse(args: &[Bytes]) -> Result<Self> {
        let matches = Self::GRAMMAR.parse(args)?;
        Ok(Self {
            key: matches.positional()[0].clone(),
        })
    }
}

impl Command for Get {
    fn name(&self) -> &'static str {
        "GET"
    }

    fn execute(&self, store: &dyn Store) -> Result<Outcome> {
        store.view(|tx| Ok(Outcome::Value(tx.get(&self.key)?.map(|stored| stored.value))))
    }
}

/// DEL key [key ...]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Del {
    keys: Vec<Bytes>,
}

impl Del {
    pub const GRAMMAR: Grammar = Grammar::variadic("del", 1);

    pub fn parse(args: &[Bytes]) -> Result<Self> {
        Ok(Self {
            keys: Self::GRAMMAR.parse(args)?.into_positional(),
        })
    }
}

impl Command for Del {
    fn name(&self) -> &'static str {
        "DEL"
    }

    fn execute(&self, store: &dyn Store) -> Result<Outcome> {
        store.update(|tx| {
            let mut deleted = 0;
            for key in &self.keys {
                if tx.delete(key)? {
                    deleted += 1;
                }
            }
            Ok(Outcome::Count(deleted))
        })
    }
}

/// EXISTS key [key ...]
///
/// A key named more than once is counted each time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exists {
    keys: Vec<Bytes>,
}

impl Exists {
    pub const GRAMMAR: Grammar = Grammar::variadic("exists", 1);

    pub fn parse(args: &[Bytes]) -> Result<Self> {
        Ok(Self {
            keys: Self::GRAMMAR.parse(args)?.into_positional(),
        })
    }
}

impl Command for Exists {
    fn name(&self) -> &'static str {
        "EXISTS"
    }

    fn execute(&self, store: &dyn Store) -> Result<Outcome> {
        store.view(|tx| {
            let mut count = 0;
            for key in &self.keys {
                if tx.exists(key)? {
                    count += 1;
                }
            }
            Ok(Outcome::Count(count))
        })
    }
}
