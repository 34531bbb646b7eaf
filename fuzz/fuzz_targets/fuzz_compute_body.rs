//! Fuzz target for `POST /api/compute` bodies.
//!
//! Arbitrary bytes must produce either an evaluation or a structured error,
//! never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pc_common::StructuredError;
use pc_core::api::{handle_compute, RequestLimits};

fuzz_target!(|data: &[u8]| {
    let limits = RequestLimits {
        max_support_points: 10_000,
    };
    match handle_compute(data, &limits) {
        Ok(evaluation) => {
            assert_eq!(evaluation.x.len(), evaluation.p.len());
            assert!((0.0..=1.0).contains(&evaluation.probability));
        }
        Err(err) => {
            let _ = StructuredError::from(&err).to_json();
        }
    }
});
