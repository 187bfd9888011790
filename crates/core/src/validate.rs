use std::collections::BTreeSet;

use crate::model::result::ComparisonResult;
use crate::model::span::ObservedTrace;
use crate::model::spec::TraceSpecification;

pub const OPTIMIZE_SUGGESTION: &str = "Optimize slow operations identified in performance issues";

/// Compares `trace` against `spec`.
///
/// Operation presence is set-based: duplicate names on either side collapse,
/// and `missing_spans` / `unexpected_spans` come back sorted. Per-span limits
/// are checked against the first observed span with a matching operation name
/// only. A limit of `0` counts as undeclared. `min_duration_ms` and
/// `required_tags` are not evaluated.
///
/// The score counts one check per distinct expected operation plus one for the
/// total-duration ceiling when declared. Per-span overruns and unexpected
/// operations never lower it, so a trace can score `1.0` and still fail to
/// match.
pub fn validate(trace: &ObservedTrace, spec: &TraceSpecification) -> ComparisonResult {
    let trace_ops = trace.operation_names();
    let spec_ops = spec.operation_names();

    let missing_spans = owned_difference(&spec_ops, &trace_ops);
    let unexpected_spans = owned_difference(&trace_ops, &spec_ops);

    let mut performance_issues = Vec::new();

    let ceiling = spec.max_total_duration_ms.filter(|&max| max > 0);
    let mut total_exceeded = false;
    if let Some(max) = ceiling {
        if trace.total_duration_ms > max {
            total_exceeded = true;
            performance_issues.push(format!(
                "Total duration {}ms exceeds maximum {max}ms",
                trace.total_duration_ms
            ));
        }
    }

    for expected in &spec.expected_spans {
        let Some(observed) = trace.first_span_named(&expected.operation_name) else {
            continue;
        };
        if let Some(max) = expected.max_duration_ms.filter(|&max| max > 0)
            && observed.duration_ms > max
        {
            performance_issues.push(format!(
                "Span '{}' duration {}ms exceeds maximum {max}ms",
                observed.operation_name, observed.duration_ms
            ));
        }
    }

    let mut suggestions = Vec::new();
    if !missing_spans.is_empty() {
        suggestions.push(format!(
            "Implement missing operations: {}",
            missing_spans.join(", ")
        ));
    }
    if !performance_issues.is_empty() {
        suggestions.push(OPTIMIZE_SUGGESTION.to_string());
    }
    if !unexpected_spans.is_empty() {
        suggestions.push(format!(
            "Review unexpected operations: {}",
            unexpected_spans.join(", ")
        ));
    }

    let score = score(
        spec_ops.len(),
        missing_spans.len(),
        ceiling.is_some(),
        total_exceeded,
    );

    ComparisonResult {
        matches_specification: missing_spans.is_empty() && performance_issues.is_empty(),
        missing_spans,
        unexpected_spans,
        performance_issues,
        suggestions,
        score,
    }
}

/// Fraction of passed checks; `0.0` when there is nothing to check.
pub fn score(
    expected_ops: usize,
    missing_ops: usize,
    has_ceiling: bool,
    ceiling_exceeded: bool,
) -> f64 {
    let total_checks = expected_ops + usize::from(has_ceiling);
    if total_checks == 0 {
        return 0.0;
    }
    let passed = expected_ops.saturating_sub(missing_ops)
        + usize::from(has_ceiling && !ceiling_exceeded);
    passed as f64 / total_checks as f64
}

fn owned_difference(left: &BTreeSet<&str>, right: &BTreeSet<&str>) -> Vec<String> {
    left.difference(right).map(|s| (*s).to_string()).collect()
}
