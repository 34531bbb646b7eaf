//! Comparator aggregation over a truncated support.

use super::distribution::Distribution;
use super::support::{support_and_pmf, SupportPmf};
use pc_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How PMF values are combined into a single probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    /// `P(X = target)`
    #[serde(rename = "exact")]
    Exact,
    /// `P(X <= target)`
    #[serde(rename = "<=")]
    AtMost,
    /// `P(X >= target)`
    #[serde(rename = ">=")]
    AtLeast,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Exact => "exact",
            Comparator::AtMost => "<=",
            Comparator::AtLeast => ">=",
        }
    }

    /// Symbol used in `P(X ? t)` notation.
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Exact => "=",
            Comparator::AtMost => "<=",
            Comparator::AtLeast => ">=",
        }
    }
}

impl FromStr for Comparator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "exact" => Ok(Comparator::Exact),
            "<=" => Ok(Comparator::AtMost),
            ">=" => Ok(Comparator::AtLeast),
            other => Err(Error::InvalidComparator {
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combine an already computed support with a comparator.
///
/// `Exact` evaluates the PMF at `target` directly, so a target past the
/// truncation cap still reports its (tiny) true probability. The tail sums
/// only see the truncated window.
pub fn aggregate(
    dist: &Distribution,
    support: &SupportPmf,
    comparator: Comparator,
    target: i64,
) -> Result<f64> {
    let probability = match comparator {
        Comparator::Exact => dist.pmf(target),
        Comparator::AtMost => support.mass_where(|x| x <= target),
        Comparator::AtLeast => support.mass_where(|x| x >= target),
    };
    finite_probability(dist, comparator, target, probability)
}

fn finite_probability(
    dist: &Distribution,
    comparator: Comparator,
    target: i64,
    probability: f64,
) -> Result<f64> {
    if !probability.is_finite() {
        return Err(Error::Computation(format!(
            "P(X {} {}) is not finite for {}",
            comparator.symbol(),
            target,
            dist
        )));
    }
    Ok(probability.min(1.0))
}

/// `P(X <op> target)` for the given distribution.
pub fn compute_probability(
    dist: &Distribution,
    comparator: Comparator,
    target: i64,
) -> Result<f64> {
    match comparator {
        Comparator::Exact => {
            dist.validate()?;
            finite_probability(dist, comparator, target, dist.pmf(target))
        }
        Comparator::AtMost | Comparator::AtLeast => {
            let support = support_and_pmf(dist)?;
            aggregate(dist, &support, comparator, target)
        }
    }
}
