//! Geometric distribution: trials until the first success, `k = 1, 2, ...`.
//!
//! `P(X = k) = (1-p)^(k-1) · p`

use super::stable::xlog1py;

fn valid_p(p: f64) -> bool {
    !p.is_nan() && p > 0.0 && p <= 1.0
}

/// Log-PMF of `Geometric(p)` at `k`.
pub fn geometric_log_pmf(p: f64, k: i64) -> f64 {
    if !valid_p(p) {
        return f64::NAN;
    }
    if k < 1 {
        return f64::NEG_INFINITY;
    }
    xlog1py((k - 1) as f64, -p) + p.ln()
}

/// PMF of `Geometric(p)` at `k`; 0.0 for `k < 1`.
///
/// Evaluated directly: `(1-p)^(k-1)` only underflows towards zero.
pub fn geometric_pmf(p: f64, k: i64) -> f64 {
    if !valid_p(p) {
        return f64::NAN;
    }
    if k < 1 {
        return 0.0;
    }
    (1.0 - p).powf((k - 1) as f64) * p
}

/// Mean `1 / p`.
pub fn geometric_mean(p: f64) -> f64 {
    1.0 / p
}

/// Variance `(1-p) / p²`.
pub fn geometric_variance(p: f64) -> f64 {
    (1.0 - p) / (p * p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_trial_is_p() {
        assert_eq!(geometric_pmf(0.2, 1), 0.2);
    }

    #[test]
    fn decays_geometrically() {
        let p1 = geometric_pmf(0.25, 3);
        let p2 = geometric_pmf(0.25, 4);
        assert!((p2 / p1 - 0.75).abs() < 1e-12);
    }

    #[test]
    fn below_support_is_zero() {
        assert_eq!(geometric_pmf(0.5, 0), 0.0);
        assert_eq!(geometric_pmf(0.5, -3), 0.0);
        assert_eq!(geometric_log_pmf(0.5, 0), f64::NEG_INFINITY);
    }

    #[test]
    fn log_pmf_agrees() {
        for k in 1..50 {
            let direct = geometric_pmf(0.1, k);
            let via_log = geometric_log_pmf(0.1, k).exp();
            assert!((direct - via_log).abs() < 1e-14);
        }
    }

    #[test]
    fn certain_success() {
        assert_eq!(geometric_pmf(1.0, 1), 1.0);
        assert_eq!(geometric_pmf(1.0, 2), 0.0);
    }

    #[test]
    fn invalid_p_is_nan() {
        assert!(geometric_pmf(0.0, 1).is_nan());
        assert!(geometric_pmf(1.01, 1).is_nan());
    }
}
