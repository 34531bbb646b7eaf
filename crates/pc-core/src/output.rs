//! Rendering of evaluations for the CLI.
//!
//! `json` prints the same object the HTTP API returns. `md` and `summary`
//! are for people.

use crate::engine::{Evaluation, Query};
use pc_common::{OutputFormat, Result};
use std::fmt::Write as _;

/// Render one evaluation in the requested format.
pub fn render(query: &Query, evaluation: &Evaluation, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(evaluation)?),
        OutputFormat::Md => Ok(render_markdown(query, evaluation)),
        OutputFormat::Summary => Ok(render_summary(query, evaluation)),
    }
}

/// One line: `binomial(n=10, p=0.5): P(X <= 5) = 0.623047 mean=5 variance=2.5`.
pub fn render_summary(query: &Query, evaluation: &Evaluation) -> String {
    format!(
        "{}: P(X {} {}) = {:.6} mean={} variance={}",
        query.distribution,
        query.comparator.symbol(),
        query.target,
        evaluation.probability,
        evaluation.mean,
        evaluation.variance
    )
}

pub fn render_markdown(query: &Query, evaluation: &Evaluation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## {}", query.distribution);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "- P(X {} {}) = {:.6}",
        query.comparator.symbol(),
        query.target,
        evaluation.probability
    );
    let _ = writeln!(out, "- mean = {}", evaluation.mean);
    let _ = writeln!(out, "- variance = {}", evaluation.variance);
    let _ = writeln!(out, "- support = {} points", evaluation.x.len());
    let _ = writeln!(out);
    let _ = writeln!(out, "| x | P(X = x) |");
    let _ = writeln!(out, "|---:|---:|");
    for (x, p) in evaluation.x.iter().zip(&evaluation.p) {
        let _ = writeln!(out, "| {} | {:.6e} |", x, p);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{evaluate, Comparator, Distribution};

    fn sample() -> (Query, Evaluation) {
        let query = Query::new(
            Distribution::binomial(10, 0.5).unwrap(),
            Comparator::AtMost,
            5,
        );
        let evaluation = evaluate(&query).unwrap();
        (query, evaluation)
    }

    #[test]
    fn test_summary_line() {
        let (query, evaluation) = sample();
        assert_eq!(
            render_summary(&query, &evaluation),
            "binomial(n=10, p=0.5): P(X <= 5) = 0.623047 mean=5 variance=2.5"
        );
    }

    #[test]
    fn test_markdown_has_table_row_per_point() {
        let (query, evaluation) = sample();
        let md = render_markdown(&query, &evaluation);
        assert!(md.starts_with("## binomial(n=10, p=0.5)"));
        assert!(md.contains("| x | P(X = x) |"));
        let rows = md.lines().filter(|l| l.starts_with("| ") && !l.starts_with("| x")).count();
        assert_eq!(rows, 11);
    }

    #[test]
    fn test_json_matches_wire_shape() {
        let (query, evaluation) = sample();
        let text = render(&query, &evaluation, OutputFormat::Json).unwrap();
        let back: Evaluation = serde_json::from_str(&text).unwrap();
        assert_eq!(back.x, evaluation.x);
        assert_eq!(back.mean, 5.0);
    }
}
