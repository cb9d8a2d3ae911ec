//! Error types and handling for Redtape
//!
//! This module defines all error types used throughout the crate
//! and provides conversion utilities for client responses.

use thiserror::Error;

/// Main error type for Redtape operations
#[derive(Debug, Error)]
pub enum RedtapeError {
    #[error("unknown command '{command}'")]
    UnknownCommand { command: String },

    #[error("wrong number of arguments for '{command}' command")]
    InvalidArgNum { command: String },

    #[error("syntax error")]
    SyntaxError,

    #[error("value is not an integer or out of range: {value}")]
    NotAnInteger { value: String },

    #[error("store error: {message}")]
    StoreError { message: String },

    #[error("configuration error: {message}")]
    ConfigError {
        message: String,
        field: Option<String>,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, RedtapeError>;

/// Discriminant of [`RedtapeError`], comparable without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownCommand,
    InvalidArgNum,
    Syntax,
    InvalidInt,
    Store,
    Config,
    Io,
}

impl RedtapeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RedtapeError::UnknownCommand { .. } => ErrorKind::UnknownCommand,
            RedtapeError::InvalidArgNum { .. } => ErrorKind::InvalidArgNum,
            RedtapeError::SyntaxError => ErrorKind::Syntax,
            RedtapeError::NotAnInteger { .. } => ErrorKind::InvalidInt,
            RedtapeError::StoreError { .. } => ErrorKind::Store,
            RedtapeError::ConfigError { .. } => ErrorKind::Config,
            RedtapeError::IoError(_) => ErrorKind::Io,
        }
    }

    /// Shorthand for a store failure with the given message
    pub fn store(message: impl Into<String>) -> Self {
        RedtapeError::StoreError {
            message: message.into(),
        }
    }

    /// Convert error to client-facing error message
    pub fn to_client_error(&self) -> String {
        match self {
            RedtapeError::UnknownCommand { command } => {
                format!("ERR unknown command '{command}'")
            }
            RedtapeError::InvalidArgNum { command } => {
                format!("ERR wrong number of arguments for '{command}' command")
            }
            RedtapeError::SyntaxError => "ERR syntax error".to_string(),
            RedtapeError::NotAnInteger { .. } => {
                "ERR value is not an integer or out of range".to_string()
            }
            RedtapeError::StoreError { message } => format!("ERR {message}"),
            RedtapeError::ConfigError { message, .. } => format!("ERR {message}"),
            RedtapeError::IoError(e) => format!("ERR {e}"),
        }
    }

    /// Check if error should be logged as warning vs error
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RedtapeError::UnknownCommand { .. }
                | RedtapeError::InvalidArgNum { .. }
                | RedtapeError::SyntaxError
                | RedtapeError::NotAnInteger { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_messages() {
        let arity = RedtapeError::InvalidArgNum {
            command: "set".to_string(),
        };
        assert_eq!(
            arity.to_client_error(),
            "ERR wrong number of arguments for 'set' command"
        );
        assert_eq!(RedtapeError::SyntaxError.to_client_error(), "ERR syntax error");

        let not_int = RedtapeError::NotAnInteger {
            value: "age".to_string(),
        };
        assert_eq!(
            not_int.to_client_error(),
            "ERR value is not an integer or out of range"
        );
        assert!(not_int.to_string().contains("age"));
    }

    #[test]
    fn test_error_kinds_are_distinct() {
        let arity = RedtapeError::InvalidArgNum {
            command: "pexpire".to_string(),
        };
        assert_eq!(arity.kind(), ErrorKind::InvalidArgNum);
        assert_eq!(RedtapeError::SyntaxError.kind(), ErrorKind::Syntax);
        assert_ne!(arity.kind(), RedtapeError::SyntaxError.kind());
        assert_eq!(RedtapeError::store("conflict").kind(), ErrorKind::Store);
    }

    #[test]
    fn test_client_vs_internal_classification() {
        assert!(RedtapeError::SyntaxError.is_client_error());
        assert!(!RedtapeError::store("lock poisoned").is_client_error());

        let io = RedtapeError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        assert_eq!(io.kind(), ErrorKind::Io);
        assert!(!io.is_client_error());
    }
}
