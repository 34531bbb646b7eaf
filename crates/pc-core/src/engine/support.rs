//! Finite support windows and the PMF evaluated over them.
//!
//! Binomial support is already finite. For the other three families the
//! window ends at `cap = max(floor, ceil(mean + 6·std))`, where `floor` is
//! 10 (geometric, Poisson) or `r + 10` (negative binomial).

use super::distribution::Distribution;
use pc_common::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Standard deviations beyond the mean kept in the window.
pub const TAIL_SIGMAS: f64 = 6.0;

/// Minimum window length past the first support point.
pub const MIN_SUPPORT_SPAN: i64 = 10;

/// Largest outcome included in the truncated support.
pub fn support_cap(dist: &Distribution) -> Result<i64> {
    dist.validate()?;
    let floor = match *dist {
        // Finite support: the whole range, however large n is.
        Distribution::Binomial { n, .. } => return Ok(n as i64),
        Distribution::NegativeBinomial { r, .. } => (r as i64)
            .checked_add(MIN_SUPPORT_SPAN)
            .ok_or_else(|| Error::Computation(format!("support floor overflows for r={}", r)))?,
        Distribution::Geometric { .. } | Distribution::Poisson { .. } => MIN_SUPPORT_SPAN,
    };

    let moments = dist.moments();
    let bound = (moments.mean + TAIL_SIGMAS * moments.std_dev()).ceil();
    // i64::MAX as f64 is 2^63, one past the largest i64.
    if !bound.is_finite() || bound >= i64::MAX as f64 {
        return Err(Error::Computation(format!(
            "support bound for {} is not representable ({})",
            dist, bound
        )));
    }
    Ok(floor.max(bound as i64))
}

/// Number of points in the truncated support.
pub fn support_len(dist: &Distribution) -> Result<u64> {
    let cap = support_cap(dist)?;
    Ok((cap - dist.min_support()) as u64 + 1)
}

impl Distribution {
    /// See [`support_cap`].
    pub fn support_cap(&self) -> Result<i64> {
        support_cap(self)
    }

    /// See [`support_len`].
    pub fn support_len(&self) -> Result<u64> {
        support_len(self)
    }
}

/// Outcomes `xs` paired positionally with their probabilities `ps`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportPmf {
    pub xs: Vec<i64>,
    pub ps: Vec<f64>,
}

impl SupportPmf {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.xs.iter().copied().zip(self.ps.iter().copied())
    }

    /// Sum of all probabilities in the window.
    pub fn total_mass(&self) -> f64 {
        self.ps.iter().sum()
    }

    /// Sum of probabilities for outcomes matching `keep`.
    pub fn mass_where(&self, keep: impl Fn(i64) -> bool) -> f64 {
        self.iter().filter(|(x, _)| keep(*x)).map(|(_, p)| p).sum()
    }

    /// First two moments computed from the window itself.
    pub fn empirical_moments(&self) -> (f64, f64) {
        let mean: f64 = self.iter().map(|(x, p)| x as f64 * p).sum();
        let variance: f64 = self
            .iter()
            .map(|(x, p)| {
                let d = x as f64 - mean;
                d * d * p
            })
            .sum();
        (mean, variance)
    }
}

/// Evaluate the PMF at every point of the truncated support.
pub fn support_and_pmf(dist: &Distribution) -> Result<SupportPmf> {
    let min = dist.min_support();
    let cap = support_cap(dist)?;

    let xs: Vec<i64> = (min..=cap).collect();
    let ps: Vec<f64> = xs.iter().map(|&k| dist.pmf(k)).collect();

    if let Some(pos) = ps.iter().position(|p| !p.is_finite()) {
        return Err(Error::Computation(format!(
            "non-finite probability at x={} for {}",
            xs[pos], dist
        )));
    }

    debug!(distribution = %dist, min, cap, points = xs.len(), "support truncated");
    Ok(SupportPmf { xs, ps })
}
