//! Distribution kinds, parameter sets and the validated [`Distribution`] variant.

use pc_common::{Error, Result};
use pc_math::{
    binomial_mean, binomial_pmf, binomial_variance, geometric_mean, geometric_pmf,
    geometric_variance, negbin_mean, negbin_pmf, negbin_variance, poisson_mean, poisson_pmf,
    poisson_variance,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// The four supported families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    Binomial,
    #[serde(rename = "negbin", alias = "negative_binomial")]
    NegativeBinomial,
    Geometric,
    Poisson,
}

impl DistributionKind {
    pub const ALL: [DistributionKind; 4] = [
        DistributionKind::Binomial,
        DistributionKind::NegativeBinomial,
        DistributionKind::Geometric,
        DistributionKind::Poisson,
    ];

    /// Wire name used in requests and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionKind::Binomial => "binomial",
            DistributionKind::NegativeBinomial => "negbin",
            DistributionKind::Geometric => "geometric",
            DistributionKind::Poisson => "poisson",
        }
    }

    /// Parameter keys this kind requires, in display order.
    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            DistributionKind::Binomial => &["n", "p"],
            DistributionKind::NegativeBinomial => &["r", "p"],
            DistributionKind::Geometric => &["p"],
            DistributionKind::Poisson => &["lam"],
        }
    }
}

impl FromStr for DistributionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "binomial" => Ok(DistributionKind::Binomial),
            "negbin" | "negative_binomial" => Ok(DistributionKind::NegativeBinomial),
            "geometric" => Ok(DistributionKind::Geometric),
            "poisson" => Ok(DistributionKind::Poisson),
            other => Err(Error::InvalidDistribution {
                name: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name → value mapping of distribution parameters.
///
/// Integer parameters (`n`, `r`) are stored as floats and must be integral.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, f64>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    fn require(&self, name: &str) -> Result<f64> {
        self.get(name)
            .ok_or_else(|| Error::invalid_parameter(name, "missing"))
    }

    fn require_integer(&self, name: &str) -> Result<i64> {
        let value = self.require(name)?;
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(Error::invalid_parameter(
                name,
                format!("must be an integer, got {}", value),
            ));
        }
        // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
        if value < i64::MIN as f64 || value >= i64::MAX as f64 {
            return Err(Error::invalid_parameter(
                name,
                format!("out of integer range, got {}", value),
            ));
        }
        Ok(value as i64)
    }
}

/// Closed-form first two moments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub mean: f64,
    pub variance: f64,
}

impl Moments {
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }
}

/// A distribution together with its parameters.
///
/// Build through the constructors (or [`Distribution::from_params`]) so the
/// parameters are checked; [`Distribution::validate`] re-checks values built
/// directly from the variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "distribution", rename_all = "snake_case")]
pub enum Distribution {
    /// Successes in `n` trials with success probability `p ∈ [0, 1]`.
    Binomial { n: u64, p: f64 },
    /// Total trials until the `r`-th success, `p ∈ (0, 1]`.
    #[serde(rename = "negbin", alias = "negative_binomial")]
    NegativeBinomial { r: u64, p: f64 },
    /// Trials until the first success, `p ∈ (0, 1]`.
    Geometric { p: f64 },
    /// Event count at rate `lam ≥ 0`.
    Poisson { lam: f64 },
}

fn check_closed_unit(name: &str, p: f64) -> Result<()> {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return Err(Error::invalid_parameter(
            name,
            format!("must be in [0, 1], got {}", p),
        ));
    }
    Ok(())
}

fn check_half_open_unit(name: &str, p: f64) -> Result<()> {
    if p.is_nan() || p <= 0.0 || p > 1.0 {
        return Err(Error::invalid_parameter(
            name,
            format!("must be in (0, 1], got {}", p),
        ));
    }
    Ok(())
}

fn check_count(name: &str, value: u64) -> Result<()> {
    if value > i64::MAX as u64 {
        return Err(Error::invalid_parameter(
            name,
            format!("out of integer range, got {}", value),
        ));
    }
    Ok(())
}

impl Distribution {
    pub fn binomial(n: i64, p: f64) -> Result<Self> {
        if n < 0 {
            return Err(Error::invalid_parameter(
                "n",
                format!("must be a non-negative integer, got {}", n),
            ));
        }
        let dist = Distribution::Binomial { n: n as u64, p };
        dist.validate()?;
        Ok(dist)
    }

    pub fn negative_binomial(r: i64, p: f64) -> Result<Self> {
        if r < 1 {
            return Err(Error::invalid_parameter(
                "r",
                format!("must be a positive integer, got {}", r),
            ));
        }
        let dist = Distribution::NegativeBinomial { r: r as u64, p };
        dist.validate()?;
        Ok(dist)
    }

    pub fn geometric(p: f64) -> Result<Self> {
        let dist = Distribution::Geometric { p };
        dist.validate()?;
        Ok(dist)
    }

    pub fn poisson(lam: f64) -> Result<Self> {
        let dist = Distribution::Poisson { lam };
        dist.validate()?;
        Ok(dist)
    }

    /// Build from a kind name and a parameter mapping.
    ///
    /// Unknown names fail with [`Error::InvalidDistribution`]; missing,
    /// non-integral or out-of-domain parameters with [`Error::InvalidParameter`].
    /// Keys the kind does not use are ignored.
    pub fn from_params(kind: &str, params: &Params) -> Result<Self> {
        match kind.parse::<DistributionKind>()? {
            DistributionKind::Binomial => {
                Self::binomial(params.require_integer("n")?, params.require("p")?)
            }
            DistributionKind::NegativeBinomial => {
                Self::negative_binomial(params.require_integer("r")?, params.require("p")?)
            }
            DistributionKind::Geometric => Self::geometric(params.require("p")?),
            DistributionKind::Poisson => Self::poisson(params.require("lam")?),
        }
    }

    /// Check every parameter is inside its domain.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Distribution::Binomial { n, p } => {
                check_count("n", n)?;
                check_closed_unit("p", p)
            }
            Distribution::NegativeBinomial { r, p } => {
                if r == 0 {
                    return Err(Error::invalid_parameter(
                        "r",
                        "must be a positive integer, got 0",
                    ));
                }
                check_count("r", r)?;
                check_half_open_unit("p", p)
            }
            Distribution::Geometric { p } => check_half_open_unit("p", p),
            Distribution::Poisson { lam } => {
                if !lam.is_finite() || lam < 0.0 {
                    return Err(Error::invalid_parameter(
                        "lam",
                        format!("must be a non-negative finite number, got {}", lam),
                    ));
                }
                Ok(())
            }
        }
    }

    pub fn kind(&self) -> DistributionKind {
        match self {
            Distribution::Binomial { .. } => DistributionKind::Binomial,
            Distribution::NegativeBinomial { .. } => DistributionKind::NegativeBinomial,
            Distribution::Geometric { .. } => DistributionKind::Geometric,
            Distribution::Poisson { .. } => DistributionKind::Poisson,
        }
    }

    /// Probability of exactly `k`; 0.0 outside the support.
    pub fn pmf(&self, k: i64) -> f64 {
        match *self {
            Distribution::Binomial { n, p } => binomial_pmf(n, p, k),
            Distribution::NegativeBinomial { r, p } => negbin_pmf(r, p, k),
            Distribution::Geometric { p } => geometric_pmf(p, k),
            Distribution::Poisson { lam } => poisson_pmf(lam, k),
        }
    }

    pub fn moments(&self) -> Moments {
        let (mean, variance) = match *self {
            Distribution::Binomial { n, p } => (binomial_mean(n, p), binomial_variance(n, p)),
            Distribution::NegativeBinomial { r, p } => (negbin_mean(r, p), negbin_variance(r, p)),
            Distribution::Geometric { p } => (geometric_mean(p), geometric_variance(p)),
            Distribution::Poisson { lam } => (poisson_mean(lam), poisson_variance(lam)),
        };
        Moments { mean, variance }
    }

    /// Smallest outcome with nonzero probability.
    pub fn min_support(&self) -> i64 {
        match *self {
            Distribution::Binomial { .. } | Distribution::Poisson { .. } => 0,
            Distribution::NegativeBinomial { r, .. } => r as i64,
            Distribution::Geometric { .. } => 1,
        }
    }
}

impl std::fmt::Display for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Distribution::Binomial { n, p } => write!(f, "binomial(n={}, p={})", n, p),
            Distribution::NegativeBinomial { r, p } => write!(f, "negbin(r={}, p={})", r, p),
            Distribution::Geometric { p } => write!(f, "geometric(p={})", p),
            Distribution::Poisson { lam } => write!(f, "poisson(lam={})", lam),
        }
    }
}

/// Closed-form mean and variance.
pub fn stats_for(dist: &Distribution) -> Moments {
    dist.moments()
}
