//! Poisson distribution with rate `lambda`.
//!
//! `P(X = k) = e^(-lambda) · lambda^k / k!`, evaluated as
//! `exp(k·ln(lambda) − lambda − lgamma(k+1))` so that neither `k!` nor
//! `lambda^k` is ever formed.

use super::stable::{log_factorial, xlogy};

fn valid_rate(lam: f64) -> bool {
    lam.is_finite() && lam >= 0.0
}

/// Log-PMF of `Poisson(lam)` at `k`.
pub fn poisson_log_pmf(lam: f64, k: i64) -> f64 {
    if !valid_rate(lam) {
        return f64::NAN;
    }
    if k < 0 {
        return f64::NEG_INFINITY;
    }
    xlogy(k as f64, lam) - lam - log_factorial(k as u64)
}

/// PMF of `Poisson(lam)` at `k`; 0.0 for `k < 0`.
pub fn poisson_pmf(lam: f64, k: i64) -> f64 {
    poisson_log_pmf(lam, k).exp().clamp(0.0, 1.0)
}

/// Mean and variance are both `lam`.
pub fn poisson_mean(lam: f64) -> f64 {
    lam
}

pub fn poisson_variance(lam: f64) -> f64 {
    lam
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_count() {
        let pmf = poisson_pmf(3.0, 0);
        assert!((pmf - (-3.0f64).exp()).abs() < 1e-15);
    }

    #[test]
    fn matches_naive_formula_for_small_k() {
        let lam: f64 = 4.5;
        let mut factorial = 1.0;
        for k in 0..15i64 {
            if k > 0 {
                factorial *= k as f64;
            }
            let naive = (-lam).exp() * lam.powi(k as i32) / factorial;
            let stable = poisson_pmf(lam, k);
            assert!(
                (naive - stable).abs() < 1e-13,
                "k={} naive={} stable={}",
                k,
                naive,
                stable
            );
        }
    }

    #[test]
    fn large_k_stays_finite() {
        let pmf = poisson_pmf(1000.0, 1000);
        assert!(pmf.is_finite() && pmf > 0.0);
        // Normal approximation near the mode
        let approx = 1.0 / (2.0 * std::f64::consts::PI * 1000.0).sqrt();
        assert!((pmf - approx).abs() / approx < 1e-3);
    }

    #[test]
    fn zero_rate_is_point_mass() {
        assert_eq!(poisson_pmf(0.0, 0), 1.0);
        assert_eq!(poisson_pmf(0.0, 1), 0.0);
    }

    #[test]
    fn negative_k_and_bad_rate() {
        assert_eq!(poisson_pmf(2.0, -1), 0.0);
        assert!(poisson_pmf(-1.0, 1).is_nan());
        assert!(poisson_pmf(f64::INFINITY, 1).is_nan());
    }
}
