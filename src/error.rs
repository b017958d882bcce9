//! # Error Types
//!
//! This module defines the error type shared by every part of the solver.
//! Configuration problems (bad schemas, bad options) are reported before any
//! population is seeded. Running out of time is *not* an error: it is a
//! regular outcome of [`solve`](crate::evolution::solve).
//!
//! ## Examples
//!
//! Using the `Result` type:
//!
//! ```rust
//! use magicga::error::{MagicError, Result};
//!
//! fn check_order(order: usize) -> Result<()> {
//!     if order == 0 {
//!         return Err(MagicError::Configuration("order cannot be zero".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_order(3).is_ok());
//! assert!(check_order(0).is_err());
//! ```
//!
//! Using the `ResultExt` trait to add context to errors:
//!
//! ```rust
//! use magicga::error::{Result, ResultExt};
//! use std::fs::File;
//!
//! fn open_corpus(path: &str) -> Result<()> {
//!     File::open(path).context("Failed to open trial corpus")?;
//!     Ok(())
//! }
//! ```
//!
//! Using the `OptionExt` trait to convert `Option` to `Result`:
//!
//! ```rust
//! use magicga::error::{MagicError, OptionExt};
//!
//! fn best_score(scores: &[i64]) -> magicga::error::Result<i64> {
//!     scores.iter().max().cloned().ok_or_else_magic(|| MagicError::EmptyPopulation)
//! }
//! ```

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Represents errors that can occur while configuring or running a solve.
#[derive(Error, Debug)]
pub enum MagicError {
    /// The schema is malformed: wrong length, duplicate or out-of-range fixed values.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Error that occurs when an invalid configuration is provided.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The population engine could not be started.
    #[error("Engine error: {0}")]
    Engine(String),

    /// Error that occurs when an empty population is encountered.
    #[error("Empty population error: Cannot operate on an empty population")]
    EmptyPopulation,

    /// A trial corpus line could not be parsed.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Error that occurs when an I/O operation fails.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A generic error with a custom message.
    #[error("{0}")]
    Other(String),
}

/// A specialized Result type for solver operations.
///
/// This type is a convenience wrapper around `std::result::Result` with the error type
/// fixed to `MagicError`.
pub type Result<T> = std::result::Result<T, MagicError>;

/// Extension trait for Result to add context to errors.
///
/// ## Examples
///
/// ```rust
/// use magicga::error::ResultExt;
/// use std::fs::File;
///
/// fn read_file(path: &str) -> magicga::error::Result<()> {
///     File::open(path).context("Failed to open file")?;
///     Ok(())
/// }
/// ```
pub trait ResultExt<T, E> {
    /// Converts the error to a `MagicError::Other` prefixed with `context`.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| MagicError::Other(format!("{}: {}", context, e)))
    }
}

/// Extension trait for Option to convert to Result with a custom error.
pub trait OptionExt<T> {
    /// Converts an `Option<T>` to a `Result<T, MagicError>` using
    /// a closure to generate the error.
    fn ok_or_else_magic<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> MagicError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_else_magic<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> MagicError,
    {
        self.ok_or_else(err_fn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = MagicError::InvalidSchema("duplicate value 5".to_string());
        assert_eq!(err.to_string(), "Invalid schema: duplicate value 5");

        let err = MagicError::Parse {
            line: 3,
            message: "expected ','".to_string(),
        };
        assert_eq!(err.to_string(), "Parse error on line 3: expected ','");
    }

    #[test]
    fn test_context_wraps_io_error() {
        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        match io.context("Failed to open trials") {
            Err(MagicError::Other(msg)) => assert_eq!(msg, "Failed to open trials: missing"),
            other => panic!("Expected Other error, got {:?}", other),
        }
    }

    #[test]
    fn test_option_ext() {
        let none: Option<u8> = None;
        assert!(matches!(
            none.ok_or_else_magic(|| MagicError::EmptyPopulation),
            Err(MagicError::EmptyPopulation)
        ));
        assert_eq!(Some(4).ok_or_else_magic(|| MagicError::EmptyPopulation).unwrap(), 4);
    }
}
