use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::span::{ObservedSpan, ObservedTrace};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceSummary {
    pub slowest_span: String,
    pub fastest_span: String,
    pub avg_span_duration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceAnalysis {
    pub trace_id: String,
    pub total_duration_ms: u64,
    pub span_count: usize,
    pub services: Vec<String>,
    pub operations: Vec<String>,
    pub performance_summary: Option<PerformanceSummary>,
}

/// Summarizes a single trace. Ties for slowest/fastest go to the earliest span.
pub fn analyze(trace: &ObservedTrace) -> TraceAnalysis {
    let services = trace
        .spans
        .iter()
        .map(|s| s.service_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    TraceAnalysis {
        trace_id: trace.trace_id.clone(),
        total_duration_ms: trace.total_duration_ms,
        span_count: trace.spans.len(),
        services,
        operations: trace
            .spans
            .iter()
            .map(|s| s.operation_name.clone())
            .collect(),
        performance_summary: summarize(&trace.spans),
    }
}

fn summarize(spans: &[ObservedSpan]) -> Option<PerformanceSummary> {
    let first = spans.first()?;
    let mut slowest = first;
    let mut fastest = first;
    let mut total: u128 = 0;

    for span in spans {
        if span.duration_ms > slowest.duration_ms {
            slowest = span;
        }
        if span.duration_ms < fastest.duration_ms {
            fastest = span;
        }
        total += u128::from(span.duration_ms);
    }

    Some(PerformanceSummary {
        slowest_span: slowest.operation_name.clone(),
        fastest_span: fastest.operation_name.clone(),
        avg_span_duration: total as f64 / spans.len() as f64,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::span::SpanStatus;

    fn span(op: &str, service: &str, duration_ms: u64) -> ObservedSpan {
        ObservedSpan {
            span_id: format!("{op}-{duration_ms}"),
            operation_name: op.to_string(),
            service_name: service.to_string(),
            start_time: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            duration_ms,
            tags: BTreeMap::new(),
            status: SpanStatus::Ok,
        }
    }

    fn trace(spans: Vec<ObservedSpan>) -> ObservedTrace {
        ObservedTrace {
            trace_id: "trace-good-checkout".to_string(),
            service_name: "checkout-service".to_string(),
            start_time: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            total_duration_ms: 1700,
            spans,
        }
    }

    #[test]
    fn analyzes_checkout_trace() {
        let a = analyze(&trace(vec![
            span("checkout.validate_cart", "cart-service", 50),
            span("payment.process", "payment-service", 1200),
            span("inventory.reserve", "inventory-service", 300),
            span("order.create", "order-service", 150),
        ]));

        assert_eq!(a.span_count, 4);
        assert_eq!(a.total_duration_ms, 1700);
        assert_eq!(
            a.services,
            ["cart-service", "inventory-service", "order-service", "payment-service"]
        );
        assert_eq!(a.operations[0], "checkout.validate_cart");
        let perf = a.performance_summary.unwrap();
        assert_eq!(perf.slowest_span, "payment.process");
        assert_eq!(perf.fastest_span, "checkout.validate_cart");
        assert_eq!(perf.avg_span_duration, 425.0);
    }

    #[test]
    fn ties_keep_the_earliest_span() {
        let a = analyze(&trace(vec![
            span("first", "svc", 10),
            span("second", "svc", 10),
        ]));
        let perf = a.performance_summary.unwrap();
        assert_eq!(perf.slowest_span, "first");
        assert_eq!(perf.fastest_span, "first");
    }

    #[test]
    fn empty_trace_has_no_summary() {
        let a = analyze(&trace(Vec::new()));
        assert_eq!(a.span_count, 0);
        assert!(a.services.is_empty());
        assert!(a.performance_summary.is_none());
    }
}
