//! Command registry and execution framework

use super::coerce::TimeUnit;
use super::string::{Del, Exists, Get, Set};
use super::ttl::{Expire, ExpireAt, Persist, Ttl};
use super::{Command, Reply};
use crate::error::{RedtapeError, Result};
use crate::storage::Store;
use bytes::Bytes;
use std::collections::HashMap;
use tracing::{debug_span, error, trace, warn};
use uuid::Uuid;

/// Builds a typed command from its arguments (command name excluded)
pub type ParseFn = fn(&[Bytes]) -> Result<Box<dyn Command>>;

/// One invocation: command name plus raw argument tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<Bytes>,
    pub client_id: Uuid,
}

impl ParsedCommand {
    /// Create a new parsed command
    pub fn new(name: impl Into<String>, args: Vec<Bytes>, client_id: Uuid) -> Self {
        Self {
            name: name.into(),
            args,
            client_id,
        }
    }

    /// Parse a command string into a ParsedCommand
    /// Supports Redis-style command parsing: "SET key value"
    pub fn parse(input: &str, client_id: Uuid) -> Result<Self> {
        let mut parts = input.split_whitespace();
        let name = parts.next().ok_or(RedtapeError::SyntaxError)?;
        let args = parts
            .map(|part| Bytes::copy_from_slice(part.as_bytes()))
            .collect();

        Ok(Self::new(name, args, client_id))
    }

    /// Split a token stream into name and arguments
    pub fn from_tokens(tokens: &[Bytes], client_id: Uuid) -> Result<Self> {
        let (name, args) = tokens.split_first().ok_or(RedtapeError::SyntaxError)?;
        Ok(Self::new(
            String::from_utf8_lossy(name).into_owned(),
            args.to_vec(),
            client_id,
        ))
    }

    /// Get the total number of tokens (including command name)
    pub fn total_args(&self) -> usize {
        self.args.len() + 1
    }
}

fn boxed<C: Command + 'static>(command: Result<C>) -> Result<Box<dyn Command>> {
    Ok(Box::new(command?))
}

/// Command registry for lookup and dispatch
pub struct CommandRegistry {
    commands: HashMap<String, ParseFn>,
}

impl CommandRegistry {
    /// Create an empty command registry
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Registry with every built-in command
    pub fn with_builtin_commands() -> Self {
        let mut registry = Self::new();

        registry.register("SET", |args| boxed(Set::parse(args)));
        registry.register("GET", |args| boxed(Get::parse(args)));
        registry.register("DEL", |args| boxed(Del::parse(args)));
        registry.register("EXISTS", |args| boxed(Exists::parse(args)));

        registry.register("EXPIRE", |args| boxed(Expire::parse(args, TimeUnit::Seconds)));
        registry.register("PEXPIRE", |args| {
            boxed(Expire::parse(args, TimeUnit::Milliseconds))
        });
        registry.register("EXPIREAT", |args| {
            boxed(ExpireAt::parse(args, TimeUnit::Seconds))
        });
        registry.register("PEXPIREAT", |args| {
            boxed(ExpireAt::parse(args, TimeUnit::Milliseconds))
        });
        registry.register("PERSIST", |args| boxed(Persist::parse(args)));
        registry.register("TTL", |args| boxed(Ttl::parse(args, TimeUnit::Seconds)));
        registry.register("PTTL", |args| boxed(Ttl::parse(args, TimeUnit::Milliseconds)));

        registry
    }

    /// Register a command parser under a case-insensitive name
    pub fn register(&mut self, name: &str, parse: ParseFn) {
        self.commands.insert(name.to_uppercase(), parse);
    }

    /// Resolve and parse a command without running it
    pub fn parse(&self, cmd: &ParsedCommand) -> Result<Box<dyn Command>> {
        let parse = self
            .commands
            .get(&cmd.name.to_uppercase())
            .ok_or_else(|| RedtapeError::UnknownCommand {
                command: cmd.name.clone(),
            })?;
        parse(&cmd.args)
    }

    /// Parse, execute and encode a command. Every failure becomes an error reply.
    pub fn execute(&self, cmd: &ParsedCommand, store: &dyn Store) -> Reply {
        let span = debug_span!("command", client_id = %cmd.client_id, command = %cmd.name);
        let _enter = span.enter();

        let result = self.parse(cmd).and_then(|command| {
            let outcome = command.execute(store)?;
            Ok(command.encode(outcome))
        });

        match result {
            Ok(reply) => {
                trace!(%reply, "command executed");
                reply
            }
            Err(e) if e.is_client_error() => {
                warn!("Command rejected: {}", e);
                Reply::Error(e.to_client_error())
            }
            Err(e) => {
                error!("Command failed: {}", e);
                Reply::Error(e.to_client_error())
            }
        }
    }

    /// Check if a command exists
    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(&name.to_uppercase())
    }

    /// Get the list of registered command names, sorted
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get the number of registered commands
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_builtin_commands()
    }
}
