//! Binomial distribution: number of successes in `n` independent trials.
//!
//! `P(X = k) = C(n, k) · p^k · (1-p)^(n-k)` for `k = 0, 1, ..., n`.
//!
//! The coefficient is evaluated through log-gamma, so large `n` neither
//! overflows nor loses precision the way a direct factorial would.

use super::stable::{log_binomial, xlog1py, xlogy};

fn valid_p(p: f64) -> bool {
    !p.is_nan() && (0.0..=1.0).contains(&p)
}

/// Log-PMF of `Binomial(n, p)` at `k`.
///
/// Returns `-inf` outside `0..=n` and NaN when `p` is not in `[0, 1]`.
pub fn binomial_log_pmf(n: u64, p: f64, k: i64) -> f64 {
    if !valid_p(p) {
        return f64::NAN;
    }
    if k < 0 || k as u64 > n {
        return f64::NEG_INFINITY;
    }
    let k = k as u64;
    let successes = k as f64;
    let failures = (n - k) as f64;
    log_binomial(n, k) + xlogy(successes, p) + xlog1py(failures, -p)
}

/// PMF of `Binomial(n, p)` at `k`; exactly 0.0 outside the support.
pub fn binomial_pmf(n: u64, p: f64, k: i64) -> f64 {
    binomial_log_pmf(n, p, k).exp().clamp(0.0, 1.0)
}

/// Mean `n·p`.
pub fn binomial_mean(n: u64, p: f64) -> f64 {
    n as f64 * p
}

/// Variance `n·p·(1-p)`.
pub fn binomial_variance(n: u64, p: f64) -> f64 {
    n as f64 * p * (1.0 - p)
}
