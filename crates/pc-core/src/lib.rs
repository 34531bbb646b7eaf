//! probcalc core library.
//!
//! Provides:
//! - The distribution engine (PMF, moments, truncation, aggregation)
//! - The JSON request layer and HTTP server
//! - Configuration loading and logging setup

pub mod api;
pub mod config;
pub mod engine;
pub mod exit_codes;
pub mod logging;
pub mod output;
pub mod server;

pub use api::{handle_compute, RequestLimits};
pub use engine::{evaluate, Comparator, Distribution, DistributionKind, Evaluation, Query};
