//! Error types for decoding and encoding.
//!
//! Every failure surfaces synchronously as an [`Error`]; nothing is retried
//! and nothing is logged-and-swallowed.
//!
//! ## Error Categories
//!
//! - **Syntax errors**: input that only the catch-all mismatch rule accepts
//! - **Invalid values**: a lexeme that has the right shape but cannot be
//!   converted (a month of 13, an integer beyond `i64`)
//! - **Table conflicts**: a `[header]` path that runs through a non-table value
//! - **Unsupported types**: values the encoder has no renderer for
//!
//! ## Examples
//!
//! ```rust
//! use serde_tomlet::{decode, Error};
//!
//! let err = decode("key = 01").unwrap_err();
//! assert!(matches!(err, Error::Syntax { line: 1, .. }));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while decoding or encoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Text that no token rule accepts
    #[error("Invalid TOML at line {line}, column {col}: unexpected {lexeme:?}")]
    Syntax {
        line: usize,
        col: usize,
        lexeme: String,
    },

    /// A well-formed lexeme whose value cannot be represented
    #[error("Invalid value {lexeme:?} at line {line}, column {col}: {msg}")]
    InvalidValue {
        line: usize,
        col: usize,
        lexeme: String,
        msg: String,
    },

    /// A table header whose path crosses an existing non-table value
    #[error("Table header [{path}] at line {line}, column {col} conflicts with an existing value")]
    TableConflict {
        path: String,
        line: usize,
        col: usize,
    },

    /// Value with no renderer in this format
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// `None` outside a struct field or map entry
    #[error("Unsupported type: None has no representation outside a table entry")]
    UnsupportedNone,

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a syntax error for an offending lexeme.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tomlet::Error;
    ///
    /// let err = Error::syntax(10, 5, "@@");
    /// assert!(err.to_string().contains("line 10"));
    /// ```
    pub fn syntax(line: usize, col: usize, lexeme: &str) -> Self {
        Error::Syntax {
            line,
            col,
            lexeme: lexeme.to_string(),
        }
    }

    /// Creates an invalid value error for a lexeme that failed conversion.
    pub fn invalid_value(line: usize, col: usize, lexeme: &str, msg: &str) -> Self {
        Error::InvalidValue {
            line,
            col,
            lexeme: lexeme.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates a table conflict error for the header at `line`/`col`.
    pub fn table_conflict(path: &str, line: usize, col: usize) -> Self {
        Error::TableConflict {
            path: path.to_string(),
            line,
            col,
        }
    }

    /// Creates an unsupported type error for values that cannot be encoded.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tomlet::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Line and column of the offending input, when the error has one.
    #[must_use]
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            Error::Syntax { line, col, .. }
            | Error::InvalidValue { line, col, .. }
            | Error::TableConflict { line, col, .. } => Some((*line, *col)),
            _ => None,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_message_carries_position_and_lexeme() {
        let err = Error::syntax(3, 7, "@oops");
        let msg = err.to_string();
        assert!(msg.contains("line 3"));
        assert!(msg.contains("column 7"));
        assert!(msg.contains("@oops"));
        assert_eq!(err.position(), Some((3, 7)));
    }

    #[test]
    fn test_position_absent_for_encode_errors() {
        assert_eq!(Error::unsupported_type("unit").position(), None);
        assert_eq!(Error::io("disk").position(), None);
    }
}
