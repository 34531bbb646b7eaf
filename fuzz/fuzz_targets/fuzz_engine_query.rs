//! Fuzz target for the engine with structured parameters.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pc_core::api::{check_limits, RequestLimits};
use pc_core::engine::{compute_probability, Comparator, Distribution};

#[derive(Debug, Arbitrary)]
enum Family {
    Binomial { n: i64, p: f64 },
    NegativeBinomial { r: i64, p: f64 },
    Geometric { p: f64 },
    Poisson { lam: f64 },
}

#[derive(Debug, Arbitrary)]
struct Input {
    family: Family,
    comparator: u8,
    target: i64,
}

fuzz_target!(|input: Input| {
    let dist = match input.family {
        Family::Binomial { n, p } => Distribution::binomial(n, p),
        Family::NegativeBinomial { r, p } => Distribution::negative_binomial(r, p),
        Family::Geometric { p } => Distribution::geometric(p),
        Family::Poisson { lam } => Distribution::poisson(lam),
    };
    let Ok(dist) = dist else { return };

    let limits = RequestLimits {
        max_support_points: 10_000,
    };
    if check_limits(&dist, &limits).is_err() {
        return;
    }

    let comparator = match input.comparator % 3 {
        0 => Comparator::Exact,
        1 => Comparator::AtMost,
        _ => Comparator::AtLeast,
    };
    if let Ok(p) = compute_probability(&dist, comparator, input.target) {
        assert!((0.0..=1.0).contains(&p), "{} {} {} -> {}", dist, comparator, input.target, p);
    }
});
