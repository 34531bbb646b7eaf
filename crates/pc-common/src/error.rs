//! Error types for probcalc.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification (client-side validation vs. server-side faults)
//! - Short headlines for human output
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Invalid Distribution
//!   Reason: unknown distribution: cauchy
//! ```
//!
//! # Wire Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 12,
//!   "category": "validation",
//!   "error": "invalid parameter p: must be in (0, 1], got 1.5",
//!   "context": { "parameter": "p" }
//! }
//! ```
//!
//! No error is transient: every variant is a deterministic function of the
//! input, so nothing here is retried.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for probcalc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad caller input (distribution, comparator, parameters, target, body).
    Validation,
    /// Numerical failure while evaluating a valid request.
    Computation,
    /// Configuration file or environment errors.
    Config,
    /// File I/O and serialization errors.
    Io,
    /// HTTP server setup and transport errors.
    Server,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Computation => write!(f, "computation"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
            ErrorCategory::Server => write!(f, "server"),
        }
    }
}

/// Unified error type for probcalc.
#[derive(Error, Debug)]
pub enum Error {
    // Validation errors (10-19)
    #[error("unknown distribution: {name}")]
    InvalidDistribution { name: String },

    #[error("unknown comparator: {value}")]
    InvalidComparator { value: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("target must be integer: {0}")]
    TargetType(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    // Computation errors (30-39)
    #[error("computation error: {0}")]
    Computation(String),

    // Configuration errors (40-49)
    #[error("configuration error: {0}")]
    Config(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Server errors (70-79)
    #[error("server error: {0}")]
    Server(String),
}

impl Error {
    /// Shorthand for an [`Error::InvalidParameter`].
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Validation errors
    /// - 30-39: Computation errors
    /// - 40-49: Configuration errors
    /// - 60-69: I/O errors
    /// - 70-79: Server errors
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidDistribution { .. } => 10,
            Error::InvalidComparator { .. } => 11,
            Error::InvalidParameter { .. } => 12,
            Error::TargetType(_) => 13,
            Error::InvalidRequest(_) => 14,
            Error::Computation(_) => 30,
            Error::Config(_) => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
            Error::Server(_) => 70,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidDistribution { .. }
            | Error::InvalidComparator { .. }
            | Error::InvalidParameter { .. }
            | Error::TargetType(_)
            | Error::InvalidRequest(_) => ErrorCategory::Validation,

            Error::Computation(_) => ErrorCategory::Computation,

            Error::Config(_) => ErrorCategory::Config,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,

            Error::Server(_) => ErrorCategory::Server,
        }
    }

    /// Whether the caller is at fault (maps to a 4xx status).
    pub fn is_client_error(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::InvalidDistribution { .. } => "Invalid Distribution",
            Error::InvalidComparator { .. } => "Invalid Comparator",
            Error::InvalidParameter { .. } => "Invalid Parameter",
            Error::TargetType(_) => "Invalid Target",
            Error::InvalidRequest(_) => "Invalid Request",
            Error::Computation(_) => "Computation Error",
            Error::Config(_) => "Configuration Error",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
            Error::Server(_) => "Server Error",
        }
    }
}

/// Structured error response for JSON output.
///
/// Used as the HTTP error body and by `--format json` on the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    #[serde(rename = "error")]
    pub message: String,

    /// Additional structured context (e.g., parameter name).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::InvalidDistribution { name } => {
                context.insert("distribution".to_string(), serde_json::json!(name));
            }
            Error::InvalidComparator { value } => {
                context.insert("comparator".to_string(), serde_json::json!(value));
            }
            Error::InvalidParameter { name, .. } => {
                context.insert("parameter".to_string(), serde_json::json!(name));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            context,
        }
    }
}

impl StructuredError {
    /// Build an error body that has no [`Error`] behind it (e.g. 404/405 replies).
    pub fn plain(code: u32, category: ErrorCategory, message: impl Into<String>) -> Self {
        StructuredError {
            code,
            category,
            message: message.into(),
            context: HashMap::new(),
        }
    }

    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
pub fn format_error_human(err: &Error) -> String {
    format!("✗ {}\n  Reason: {}", err.headline(), err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_grouped() {
        assert_eq!(Error::InvalidDistribution { name: "x".into() }.code(), 10);
        assert_eq!(Error::InvalidComparator { value: "<".into() }.code(), 11);
        assert_eq!(Error::invalid_parameter("p", "bad").code(), 12);
        assert_eq!(Error::TargetType("x".into()).code(), 13);
        assert_eq!(Error::Computation("nan".into()).code(), 30);
        assert_eq!(Error::Config("bad".into()).code(), 40);
    }

    #[test]
    fn test_client_error_classification() {
        assert!(Error::InvalidDistribution { name: "x".into() }.is_client_error());
        assert!(Error::TargetType("x".into()).is_client_error());
        assert!(Error::InvalidRequest("x".into()).is_client_error());
        assert!(!Error::Computation("x".into()).is_client_error());
        assert!(!Error::Server("x".into()).is_client_error());
        let io = Error::from(std::io::Error::other("boom"));
        assert!(!io.is_client_error());
        assert_eq!(io.category(), ErrorCategory::Io);
    }

    #[test]
    fn test_messages_name_the_offender() {
        let err = Error::InvalidDistribution {
            name: "cauchy".into(),
        };
        assert_eq!(err.to_string(), "unknown distribution: cauchy");

        let err = Error::invalid_parameter("p", "must be in (0, 1], got 1.5");
        assert_eq!(err.to_string(), "invalid parameter p: must be in (0, 1], got 1.5");
    }

    #[test]
    fn test_structured_error_json() {
        let err = Error::invalid_parameter("lam", "must be non-negative");
        let structured = StructuredError::from(&err);
        let value: serde_json::Value = serde_json::from_str(&structured.to_json()).unwrap();

        assert_eq!(value["code"], 12);
        assert_eq!(value["category"], "validation");
        assert_eq!(value["error"], "invalid parameter lam: must be non-negative");
        assert_eq!(value["context"]["parameter"], "lam");
    }

    #[test]
    fn test_structured_error_omits_empty_context() {
        let structured = StructuredError::from(&Error::Computation("overflow".into()));
        let json = structured.to_json();
        assert!(!json.contains("context"));
        assert!(json.contains("\"category\":\"computation\""));
    }

    #[test]
    fn test_plain_with_context() {
        let structured = StructuredError::plain(405, ErrorCategory::Validation, "POST only")
            .with_context("method", "GET");
        assert_eq!(structured.message, "POST only");
        assert_eq!(structured.context["method"], "GET");
    }

    #[test]
    fn test_format_error_human() {
        let text = format_error_human(&Error::InvalidComparator { value: "<".into() });
        assert!(text.starts_with("✗ Invalid Comparator"));
        assert!(text.contains("Reason: unknown comparator: <"));
    }
}
