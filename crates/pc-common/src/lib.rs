//! probcalc common types and errors.
//!
//! This crate provides foundational types shared across pc-core modules:
//! - The error taxonomy and its structured JSON form
//! - Output format selection

pub mod error;
pub mod output;

pub use error::{format_error_human, Error, ErrorCategory, Result, StructuredError};
pub use output::OutputFormat;
