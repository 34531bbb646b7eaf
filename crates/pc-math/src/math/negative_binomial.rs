//! Negative binomial distribution in the total-trials form.
//!
//! `X` counts the trials needed to reach the `r`-th success:
//! `P(X = k) = C(k-1, r-1) · p^r · (1-p)^(k-r)` for `k = r, r+1, ...`.

use super::stable::{log_binomial, xlog1py, xlogy};

fn valid_params(r: u64, p: f64) -> bool {
    r >= 1 && !p.is_nan() && p > 0.0 && p <= 1.0
}

/// Log-PMF of the negative binomial at `k` total trials.
///
/// Returns `-inf` for `k < r` and NaN for `r == 0` or `p` outside `(0, 1]`.
pub fn negbin_log_pmf(r: u64, p: f64, k: i64) -> f64 {
    if !valid_params(r, p) {
        return f64::NAN;
    }
    if k < 0 || (k as u64) < r {
        return f64::NEG_INFINITY;
    }
    let k = k as u64;
    let failures = (k - r) as f64;
    log_binomial(k - 1, r - 1) + xlogy(r as f64, p) + xlog1py(failures, -p)
}

/// PMF of the negative binomial at `k` total trials; 0.0 for `k < r`.
pub fn negbin_pmf(r: u64, p: f64, k: i64) -> f64 {
    negbin_log_pmf(r, p, k).exp().clamp(0.0, 1.0)
}

/// Mean `r / p`.
pub fn negbin_mean(r: u64, p: f64) -> f64 {
    r as f64 / p
}

/// Variance `r·(1-p) / p²`.
pub fn negbin_variance(r: u64, p: f64) -> f64 {
    r as f64 * (1.0 - p) / (p * p)
}
