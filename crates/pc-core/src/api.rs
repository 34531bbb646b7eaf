//! JSON request layer in front of the engine.
//!
//! Turns a request body such as
//! ```json
//! {"distribution": "binomial", "n": 10, "p": 0.5, "comparator": "<=", "target": 5}
//! ```
//! into a validated [`Query`], enforces request limits, and runs the engine.
//!
//! Validation order: body shape, `target`, `distribution`, kind-specific
//! parameters, `comparator`. The first failure wins.

use crate::engine::{self, Comparator, Distribution, DistributionKind, Evaluation, Params, Query};
use pc_common::{Error, Result};
use serde_json::{Map, Value};
use tracing::debug;

/// Default ceiling on the number of support points a request may produce.
pub const DEFAULT_MAX_SUPPORT_POINTS: u64 = 1_000_000;

/// Per-request limits applied before the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    pub max_support_points: u64,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_support_points: DEFAULT_MAX_SUPPORT_POINTS,
        }
    }
}

/// Parse, validate and evaluate one request body.
pub fn handle_compute(body: &[u8], limits: &RequestLimits) -> Result<Evaluation> {
    let query = parse_body(body)?;
    check_limits(&query.distribution, limits)?;
    debug!(
        distribution = %query.distribution,
        comparator = %query.comparator,
        target = query.target,
        "evaluating query"
    );
    engine::evaluate(&query)
}

/// Parse raw bytes as a JSON object and validate it.
pub fn parse_body(body: &[u8]) -> Result<Query> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| Error::InvalidRequest(format!("invalid JSON: {}", e)))?;
    parse_request(&value)
}

/// Validate an already decoded JSON value.
pub fn parse_request(value: &Value) -> Result<Query> {
    let body = value
        .as_object()
        .ok_or_else(|| Error::InvalidRequest("body must be a JSON object".to_string()))?;

    let target = parse_target(body.get("target"))?;

    let kind_name = match body.get("distribution") {
        Some(Value::String(s)) => s.as_str(),
        Some(other) => {
            return Err(Error::InvalidDistribution {
                name: other.to_string(),
            })
        }
        None => {
            return Err(Error::InvalidDistribution {
                name: "<missing>".to_string(),
            })
        }
    };
    let kind: DistributionKind = kind_name.parse()?;
    let params = collect_params(kind, body)?;
    let distribution = Distribution::from_params(kind_name, &params)?;

    let comparator: Comparator = match body.get("comparator") {
        Some(Value::String(s)) => s.parse()?,
        Some(other) => {
            return Err(Error::InvalidComparator {
                value: other.to_string(),
            })
        }
        None => {
            return Err(Error::InvalidComparator {
                value: "<missing>".to_string(),
            })
        }
    };

    Ok(Query::new(distribution, comparator, target))
}

/// Reject distributions whose truncated support exceeds the limit.
pub fn check_limits(dist: &Distribution, limits: &RequestLimits) -> Result<()> {
    let points = engine::support_len(dist)?;
    if points > limits.max_support_points {
        let name = match *dist {
            Distribution::Binomial { .. } => "n",
            Distribution::NegativeBinomial { r, p } => negbin_limit_driver(r, p, limits),
            Distribution::Geometric { .. } => "p",
            Distribution::Poisson { .. } => "lam",
        };
        return Err(Error::invalid_parameter(
            name,
            format!(
                "support of {} points exceeds the limit of {}",
                points, limits.max_support_points
            ),
        ));
    }
    Ok(())
}

/// `r` when the same `p` with a single success would fit the limit.
fn negbin_limit_driver(r: u64, p: f64, limits: &RequestLimits) -> &'static str {
    if r <= 1 {
        return "p";
    }
    let single = Distribution::NegativeBinomial { r: 1, p };
    match engine::support_len(&single) {
        Ok(points) if points <= limits.max_support_points => "r",
        _ => "p",
    }
}

fn parse_target(value: Option<&Value>) -> Result<i64> {
    let value = value.ok_or_else(|| Error::TargetType("missing".to_string()))?;
    integer_value(value).ok_or_else(|| Error::TargetType(format!("got {}", value)))
}

fn collect_params(kind: DistributionKind, body: &Map<String, Value>) -> Result<Params> {
    let mut params = Params::new();
    for &name in kind.parameter_names() {
        let raw = body
            .get(name)
            .filter(|v| !v.is_null())
            .ok_or_else(|| Error::invalid_parameter(name, "missing"))?;
        let number = number_value(raw).ok_or_else(|| {
            Error::invalid_parameter(name, format!("expected a number, got {}", raw))
        })?;
        params.insert(name, number);
    }
    Ok(params)
}

/// Integers, integral floats and integer strings.
fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i);
            }
            let f = n.as_f64()?;
            // i64::MAX as f64 is 2^63, already out of range.
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Some(f as i64)
            } else {
                None
            }
        }
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Numbers and numeric strings.
fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<Query> {
        parse_request(&value)
    }

    #[test]
    fn test_parse_binomial() {
        let query = parse(json!({
            "distribution": "binomial", "n": 10, "p": 0.5, "comparator": "<=", "target": 5
        }))
        .unwrap();
        assert_eq!(query.distribution, Distribution::Binomial { n: 10, p: 0.5 });
        assert_eq!(query.comparator, Comparator::AtMost);
        assert_eq!(query.target, 5);
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let query = parse(json!({
            "distribution": "negbin", "r": "3", "p": "0.25", "comparator": "exact", "target": "4"
        }))
        .unwrap();
        assert_eq!(query.distribution, Distribution::NegativeBinomial { r: 3, p: 0.25 });
        assert_eq!(query.target, 4);
    }

    #[test]
    fn test_integral_float_target() {
        let query = parse(json!({
            "distribution": "poisson", "lam": 2, "comparator": ">=", "target": 3.0
        }))
        .unwrap();
        assert_eq!(query.target, 3);
    }

    #[test]
    fn test_target_errors() {
        for target in [json!(2.5), json!("two"), json!(null), json!([1])] {
            let err = parse(json!({
                "distribution": "poisson", "lam": 2, "comparator": ">=", "target": target
            }))
            .unwrap_err();
            assert!(matches!(err, Error::TargetType(_)), "target {target}: {err:?}");
        }
        let err = parse(json!({"distribution": "poisson", "lam": 2, "comparator": ">="}))
            .unwrap_err();
        assert!(matches!(err, Error::TargetType(_)));
    }

    #[test]
    fn test_target_checked_before_distribution() {
        let err = parse(json!({"distribution": "cauchy", "target": "x"})).unwrap_err();
        assert!(matches!(err, Error::TargetType(_)));
    }

    #[test]
    fn test_unknown_distribution() {
        let err = parse(json!({"distribution": "cauchy", "comparator": "exact", "target": 1}))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDistribution { ref name } if name == "cauchy"));

        let err = parse(json!({"comparator": "exact", "target": 1})).unwrap_err();
        assert!(matches!(err, Error::InvalidDistribution { .. }));

        let err =
            parse(json!({"distribution": 7, "comparator": "exact", "target": 1})).unwrap_err();
        assert!(matches!(err, Error::InvalidDistribution { ref name } if name == "7"));
    }

    #[test]
    fn test_parameter_errors() {
        let err = parse(json!({
            "distribution": "binomial", "p": 0.5, "comparator": "exact", "target": 1
        }))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { ref name, .. } if name == "n"));

        let err = parse(json!({
            "distribution": "geometric", "p": "abc", "comparator": "exact", "target": 1
        }))
        .unwrap_err();
        assert!(err.to_string().contains("expected a number"));

        let err = parse(json!({
            "distribution": "geometric", "p": 1.5, "comparator": "exact", "target": 1
        }))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { ref name, .. } if name == "p"));

        let err = parse(json!({
            "distribution": "poisson", "lam": null, "comparator": "exact", "target": 1
        }))
        .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_comparator_errors() {
        let err = parse(json!({
            "distribution": "geometric", "p": 0.5, "comparator": "<", "target": 1
        }))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidComparator { ref value } if value == "<"));

        let err = parse(json!({"distribution": "geometric", "p": 0.5, "target": 1})).unwrap_err();
        assert!(matches!(err, Error::InvalidComparator { .. }));
    }

    #[test]
    fn test_body_shape() {
        assert!(matches!(parse_body(b"not json").unwrap_err(), Error::InvalidRequest(_)));
        assert!(matches!(parse_body(b"[1, 2]").unwrap_err(), Error::InvalidRequest(_)));
    }

    #[test]
    fn test_limits() {
        let limits = RequestLimits {
            max_support_points: 100,
        };
        let ok = Distribution::binomial(99, 0.5).unwrap();
        assert!(check_limits(&ok, &limits).is_ok());

        let too_big = Distribution::binomial(100, 0.5).unwrap();
        let err = check_limits(&too_big, &limits).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { ref name, .. } if name == "n"));

        let wide = Distribution::geometric(0.001).unwrap();
        assert!(check_limits(&wide, &limits).is_err());
    }

    #[test]
    fn test_check_limits_names_negbin_driver() {
        let limits = RequestLimits {
            max_support_points: 100,
        };
        let many_successes = Distribution::negative_binomial(1000, 0.9).unwrap();
        let err = check_limits(&many_successes, &limits).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { ref name, .. } if name == "r"));

        let rare_success = Distribution::negative_binomial(2, 0.001).unwrap();
        let err = check_limits(&rare_success, &limits).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { ref name, .. } if name == "p"));
    }

    #[test]
    fn test_handle_compute_end_to_end() {
        let body = br#"{"distribution":"binomial","n":10,"p":0.5,"comparator":"<=","target":5}"#;
        let out = handle_compute(body, &RequestLimits::default()).unwrap();
        assert_eq!(out.x, (0..=10).collect::<Vec<_>>());
        assert!((out.probability - 0.623_046_875).abs() < 1e-12);
    }
}
