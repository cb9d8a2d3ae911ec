//! Command implementations and execution framework
//!
//! Every command is a typed struct built by its `parse` function from a
//! [`Grammar`](grammar::Grammar) and executed as a single store transaction.
//! Execution yields an [`Outcome`]; the command then picks its wire
//! [`Reply`] shape.

pub mod coerce;
pub mod grammar;
pub mod registry;
pub mod string;
pub mod ttl;


pub use registry::{CommandRegistry, ParseFn, ParsedCommand};
pub use string::{Del, Exists, Get, Set, SetCondition};
pub use ttl::{Expire, ExpireAt, Persist, Ttl};

use crate::error::Result;
use crate::storage::Store;
use bytes::Bytes;
use std::fmt;

/// Typed result of executing a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Whether the operation took effect
    Applied(bool),
    Count(i64),
    /// A value, or `None` when the key is absent
    Value(Option<Bytes>),
}

/// Wire-level reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Status(String),
    Bulk(Option<Bytes>),
    Integer(i64),
    Error(String),
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Status("OK".to_string())
    }

    pub fn nil() -> Self {
        Reply::Bulk(None)
    }

    /// Encode as RESP2 bytes
    pub fn to_resp_bytes(&self) -> Vec<u8> {
        match self {
            Reply::Status(status) => format!("+{status}\r\n").into_bytes(),
            Reply::Bulk(None) => b"$-1\r\n".to_vec(),
            Reply::Bulk(Some(value)) => {
                let mut output = format!("${}\r\n", value.len()).into_bytes();
                output.extend_from_slice(value);
                output.extend_from_slice(b"\r\n");
                output
            }
            Reply::Integer(n) => format!(":{n}\r\n").into_bytes(),
            Reply::Error(message) => format!("-{message}\r\n").into_bytes(),
        }
    }
}

/// `redis-cli` style rendering
impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Status(status) => f.write_str(status),
            Reply::Bulk(None) => f.write_str("(nil)"),
            Reply::Bulk(Some(value)) => f.write_str(&String::from_utf8_lossy(value)),
            Reply::Integer(n) => write!(f, "{n}"),
            Reply::Error(message) => write!(f, "(error) {message}"),
        }
    }
}

impl From<Outcome> for Reply {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Applied(applied) => Reply::Integer(i64::from(applied)),
            Outcome::Count(n) => Reply::Integer(n),
            Outcome::Value(value) => Reply::Bulk(value),
        }
    }
}

/// A parsed, ready-to-run command
pub trait Command: fmt::Debug + Send + Sync {
    /// Upper-case command name
    fn name(&self) -> &'static str;

    /// Run the command as one transaction against `store`
    fn execute(&self, store: &dyn Store) -> Result<Outcome>;

    /// Map the outcome to its reply shape
    fn encode(&self, outcome: Outcome) -> Reply {
        outcome.into()
    }
}
