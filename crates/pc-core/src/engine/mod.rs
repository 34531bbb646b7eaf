//! Distribution Engine.
//!
//! Pure functions over a tagged [`Distribution`] variant:
//! - PMF evaluation at a single outcome
//! - Closed-form mean and variance
//! - Support truncation for the unbounded families
//! - Comparator aggregation (`exact`, `<=`, `>=`)
//!
//! Nothing here does I/O or holds state; every call is independent and safe
//! to run concurrently with any other.

pub mod distribution;
pub mod query;
pub mod support;

pub use distribution::{stats_for, Distribution, DistributionKind, Moments, Params};
pub use query::{aggregate, compute_probability, Comparator};
pub use support::{support_and_pmf, support_cap, support_len, SupportPmf};

use pc_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// A fully validated question for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(flatten)]
    pub distribution: Distribution,
    pub comparator: Comparator,
    pub target: i64,
}

impl Query {
    pub fn new(distribution: Distribution, comparator: Comparator, target: i64) -> Self {
        Self {
            distribution,
            comparator,
            target,
        }
    }
}

/// Everything the engine reports for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Truncated support.
    pub x: Vec<i64>,
    /// PMF at each support point.
    pub p: Vec<f64>,
    pub mean: f64,
    pub variance: f64,
    /// Comparator-aggregated result.
    pub probability: f64,
}

/// Compute support, PMF, moments and the aggregated probability.
pub fn evaluate(query: &Query) -> Result<Evaluation> {
    let dist = &query.distribution;
    let support = support_and_pmf(dist)?;
    let moments = stats_for(dist);
    if !moments.mean.is_finite() || !moments.variance.is_finite() {
        return Err(Error::Computation(format!(
            "moments are not finite for {}",
            dist
        )));
    }
    let probability = aggregate(dist, &support, query.comparator, query.target)?;

    Ok(Evaluation {
        x: support.xs,
        p: support.ps,
        mean: moments.mean,
        variance: moments.variance,
        probability,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_binomial() {
        let dist = Distribution::binomial(10, 0.5).unwrap();
        let out = evaluate(&Query::new(dist, Comparator::AtMost, 5)).unwrap();
        assert_eq!(out.x.len(), 11);
        assert_eq!(out.p.len(), 11);
        assert_eq!(out.mean, 5.0);
        assert_eq!(out.variance, 2.5);
        assert!((out.probability - 0.623_046_875).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_rejects_bad_variant() {
        let query = Query::new(Distribution::Geometric { p: 0.0 }, Comparator::Exact, 1);
        assert!(matches!(
            evaluate(&query).unwrap_err(),
            Error::InvalidParameter { .. }
        ));
    }

    #[test]
    fn test_evaluation_serializes_wire_shape() {
        let dist = Distribution::geometric(0.5).unwrap();
        let out = evaluate(&Query::new(dist, Comparator::Exact, 1)).unwrap();
        let value = serde_json::to_value(&out).unwrap();
        for key in ["x", "p", "mean", "variance", "probability"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["probability"], 0.5);
    }

    #[test]
    fn test_query_serde_flattens_distribution() {
        let query = Query::new(Distribution::poisson(2.0).unwrap(), Comparator::AtLeast, 3);
        let value = serde_json::to_value(query).unwrap();
        assert_eq!(value["distribution"], "poisson");
        assert_eq!(value["lam"], 2.0);
        assert_eq!(value["comparator"], ">=");
        assert_eq!(value["target"], 3);
    }
}
