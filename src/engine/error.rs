// SPDX-License-Identifier: MIT

//! Typed error handling for condmark
//!
//! Loading is the only fallible phase: evaluation and lookup never return
//! errors, unresolvable comparisons simply evaluate to false.

use thiserror::Error;

/// Top-level error type for condmark
#[derive(Debug, Error)]
pub enum MarkError {
    /// Structural errors in a conditions table
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Configuration errors (missing files, bad fact pairs)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested testbed is absent from the inventory
    #[error("Testbed '{name}' not found in inventory")]
    TestbedNotFound { name: String },

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

/// Load-time errors for conditions tables
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    /// Document root is not a mapping of test ids
    #[error("Top level of conditions source must be a mapping of test ids, found {0}")]
    NotAMapping(String),

    /// A key under a test id is not a known disposition
    #[error("Unknown disposition '{key}' for test '{test_id}' (expected skip or xfail)")]
    UnknownDisposition { test_id: String, key: String },

    /// A disposition body has the wrong shape
    #[error("Invalid '{disposition}' entry for test '{test_id}': {message}")]
    InvalidEntry {
        test_id: String,
        disposition: String,
        message: String,
    },

    /// `conditions` is neither a string nor a list of strings
    #[error("Invalid conditions for '{disposition}' of test '{test_id}': {message}")]
    InvalidConditions {
        test_id: String,
        disposition: String,
        message: String,
    },

    /// An expression in a conditions list failed to parse
    #[error("Invalid expression for '{disposition}' of test '{test_id}': {source}")]
    InvalidExpression {
        test_id: String,
        disposition: String,
        #[source]
        source: ExpressionError,
    },

    /// Same test id defined in more than one source
    #[error("Test id '{test_id}' is defined more than once ({first} and {second})")]
    DuplicateTestId {
        test_id: String,
        first: String,
        second: String,
    },

    /// Underlying YAML syntax error
    #[error("YAML syntax error in {origin}: {message}")]
    Syntax { origin: String, message: String },
}

/// Syntax errors in condition expressions
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{message} at position {position} in `{input}`")]
pub struct ExpressionError {
    pub input: String,
    pub position: usize,
    pub message: String,
}

impl ExpressionError {
    pub fn new(input: impl Into<String>, position: usize, message: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            position,
            message: message.into(),
        }
    }
}

impl MarkError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a testbed not found error
    pub fn testbed_not_found(name: impl Into<String>) -> Self {
        Self::TestbedNotFound { name: name.into() }
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<&str> for MarkError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for MarkError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_error_display() {
        let err = ExpressionError::new("a ==", 4, "Expected literal");
        assert_eq!(err.to_string(), "Expected literal at position 4 in `a ==`");
    }

    #[test]
    fn test_parse_error_wraps_into_mark_error() {
        let err: MarkError = ParseError::UnknownDisposition {
            test_id: "foo/test_bar.py".to_string(),
            key: "skipif".to_string(),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.contains("skipif"));
        assert!(msg.contains("foo/test_bar.py"));
    }

    #[test]
    fn test_testbed_not_found() {
        let err = MarkError::testbed_not_found("vms-t0");
        assert!(err.to_string().contains("vms-t0"));
    }
}
