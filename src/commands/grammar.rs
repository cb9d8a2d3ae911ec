//! Declarative argument grammar shared by every command.
//!
//! A [`Grammar`] describes a command's shape: how many positional arguments it
//! requires, whether extra positionals are allowed, and which options may follow.
//! [`Grammar::parse`] validates a token list against that shape in a fixed order:
//!
//! 1. too few tokens for the positional prefix is an argument-count error;
//! 2. positionals are taken in order;
//! 3. remaining tokens must each name a known option (case-insensitive). Unknown
//!    tokens, a missing option value, a repeated option, or two options from the
//!    same group are syntax errors;
//! 4. option values are coerced, and coercion errors keep their own kind.
//!
//! Nothing partially parsed escapes: the caller gets either full [`Matches`] or
//! the first error.

use super::coerce;
use crate::error::{RedtapeError, Result};
use bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Presence-only option
    Flag,
    /// Option consuming one following integer token
    Int,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    /// Upper-case option name
    pub name: &'static str,
    pub kind: OptionKind,
    /// Options sharing a group are mutually exclusive
    pub group: Option<&'static str>,
}

impl OptionSpec {
    pub const fn flag(name: &'static str) -> Self {
        Self {
            name,
            kind: OptionKind::Flag,
            group: None,
        }
    }

    pub const fn int(name: &'static str) -> Self {
        Self {
            name,
            kind: OptionKind::Int,
            group: None,
        }
    }

    pub const fn in_group(self, group: &'static str) -> Self {
        Self {
            group: Some(group),
            ..self
        }
    }

    fn matches(&self, token: &[u8]) -> bool {
        self.name.as_bytes().eq_ignore_ascii_case(token)
    }
}

/// Shape of one command's arguments (the command name itself excluded)
#[derive(Debug, Clone, Copy)]
pub struct Grammar {
    /// Lower-case command name used in error messages
    pub command: &'static str,
    /// Required positional arguments
    pub positional: usize,
    /// Accept any number of extra positionals (and no options)
    pub variadic: bool,
    pub options: &'static [OptionSpec],
}

impl Grammar {
    /// A grammar with exactly `positional` arguments and no options
    pub const fn fixed(command: &'static str, positional: usize) -> Self {
        Self {
            command,
            positional,
            variadic: false,
            options: &[],
        }
    }

    /// At least `positional` arguments, all positional
    pub const fn variadic(command: &'static str, positional: usize) -> Self {
        Self {
            command,
            positional,
            variadic: true,
            options: &[],
        }
    }

    pub const fn with_options(self, options: &'static [OptionSpec]) -> Self {
        Self { options, ..self }
    }

    pub fn parse(&self, args: &[Bytes]) -> Result<Matches> {
        if args.len() < self.positional {
            return Err(RedtapeError::InvalidArgNum {
                command: self.command.to_string(),
            });
        }

        let (head, rest) = args.split_at(self.positional);
        let mut positional = head.to_vec();
        if self.variadic {
            positional.extend_from_slice(rest);
            return Ok(Matches {
                positional,
                options: Vec::new(),
            });
        }

        let mut options: Vec<MatchedOption> = Vec::new();
        let mut tokens = rest.iter();
        while let Some(token) = tokens.next() {
            let spec = self
                .options
                .iter()
                .find(|spec| spec.matches(token))
                .ok_or(RedtapeError::SyntaxError)?;

            let conflict = options.iter().any(|seen| {
                seen.spec.name == spec.name
                    || (spec.group.is_some() && seen.spec.group == spec.group)
            });
            if conflict {
                return Err(RedtapeError::SyntaxError);
            }

            let value = match spec.kind {
                OptionKind::Flag => None,
                OptionKind::Int => {
                    let raw = tokens.next().ok_or(RedtapeError::SyntaxError)?;
                    Some(coerce::parse_int(raw)?)
                }
            };
            options.push(MatchedOption { spec: *spec, value });
        }

        Ok(Matches {
            positional,
            options,
        })
    }
}

#[derive(Debug, Clone)]
struct MatchedOption {
    spec: OptionSpec,
    value: Option<i64>,
}

/// Validated arguments produced by [`Grammar::parse`]
#[derive(Debug, Clone)]
pub struct Matches {
    positional: Vec<Bytes>,
    options: Vec<MatchedOption>,
}

impl Matches {
    /// Positional arguments; at least as many as the grammar requires
    pub fn positional(&self) -> &[Bytes] {
        &self.positional
    }

    pub fn into_positional(self) -> Vec<Bytes> {
        self.positional
    }

    /// Whether the named option was given
    pub fn flag(&self, name: &str) -> bool {
        self.options.iter().any(|m| m.spec.name == name)
    }

    /// The option chosen from a group, with its value if it takes one
    pub fn chosen(&self, group: &str) -> Option<(&'static str, Option<i64>)> {
        self.options
            .iter()
            .find(|m| m.spec.group == Some(group))
            .map(|m| (m.spec.name, m.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const OPTIONS: &[OptionSpec] = &[
        OptionSpec::flag("NX").in_group("condition"),
        OptionSpec::flag("XX").in_group("condition"),
        OptionSpec::flag("GET"),
        OptionSpec::int("EX").in_group("expiry"),
        OptionSpec::flag("KEEPTTL").in_group("expiry"),
    ];
    const GRAMMAR: Grammar = Grammar::fixed("demo", 2).with_options(OPTIONS);

    fn tokens(line: &str) -> Vec<Bytes> {
        line.split_whitespace()
            .map(|t| Bytes::copy_from_slice(t.as_bytes()))
            .collect()
    }

    fn kind(line: &str) -> ErrorKind {
        GRAMMAR.parse(&tokens(line)).unwrap_err().kind()
    }

    #[test]
    fn test_positional_and_options() {
        let m = GRAMMAR.parse(&tokens("name alice nx get ex 10")).unwrap();
        assert_eq!(m.positional(), &[Bytes::from("name"), Bytes::from("alice")][..]);
        assert!(m.flag("GET"));
        assert_eq!(m.chosen("condition"), Some(("NX", None)));
        assert_eq!(m.chosen("expiry"), Some(("EX", Some(10))));
    }

    #[test]
    fn test_option_order_is_free() {
        let m = GRAMMAR.parse(&tokens("name alice Ex 10 Nx")).unwrap();
        assert_eq!(m.chosen("condition"), Some(("NX", None)));
        assert_eq!(m.chosen("expiry"), Some(("EX", Some(10))));
    }

    #[test]
    fn test_arity_checked_before_options() {
        assert_eq!(kind(""), ErrorKind::InvalidArgNum);
        assert_eq!(kind("name"), ErrorKind::InvalidArgNum);
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(kind("name alice bogus"), ErrorKind::Syntax);
        assert_eq!(kind("name alice nx xx"), ErrorKind::Syntax);
        assert_eq!(kind("name alice get get"), ErrorKind::Syntax);
        assert_eq!(kind("name alice ex 10 keepttl"), ErrorKind::Syntax);
        assert_eq!(kind("name alice ex"), ErrorKind::Syntax);
    }

    #[test]
    fn test_coercion_error_keeps_its_kind() {
        assert_eq!(kind("name alice ex ten"), ErrorKind::InvalidInt);
    }

    #[test]
    fn test_fixed_grammar_rejects_extra_tokens() {
        let grammar = Grammar::fixed("pexpire", 2);
        let err = grammar.parse(&tokens("name 100 age 100")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn test_variadic_grammar() {
        let grammar = Grammar::variadic("del", 1);
        let m = grammar.parse(&tokens("a b c")).unwrap();
        assert_eq!(m.positional().len(), 3);

        let err = grammar.parse(&[]).unwrap_err();
        assert!(matches!(err, RedtapeError::InvalidArgNum { ref command } if command == "del"));
    }
}
