use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tracespec_core::model::span::{ObservedSpan, ObservedTrace, SpanStatus};
use tracespec_core::model::spec::{ExpectedSpan, TraceSpecification};

pub const CHECKOUT_SPEC: &str = "ecommerce_checkout";
pub const GOOD_TRACE_ID: &str = "trace-good-checkout";
pub const PROBLEM_TRACE_ID: &str = "trace-problem-checkout";

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()
}

pub fn span(
    span_id: &str,
    operation_name: &str,
    service_name: &str,
    offset_ms: i64,
    duration_ms: u64,
    tags: &[(&str, &str)],
) -> ObservedSpan {
    ObservedSpan {
        span_id: span_id.to_string(),
        operation_name: operation_name.to_string(),
        service_name: service_name.to_string(),
        start_time: base_time() + Duration::milliseconds(offset_ms),
        duration_ms,
        tags: tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
        status: SpanStatus::Ok,
    }
}

pub fn trace(trace_id: &str, total_duration_ms: u64, spans: Vec<ObservedSpan>) -> ObservedTrace {
    ObservedTrace {
        trace_id: trace_id.to_string(),
        service_name: "checkout-service".to_string(),
        start_time: base_time(),
        total_duration_ms,
        spans,
    }
}

pub fn checkout_spec() -> TraceSpecification {
    TraceSpecification {
        name: CHECKOUT_SPEC.to_string(),
        description: "Complete e-commerce checkout process".to_string(),
        expected_spans: vec![
            ExpectedSpan::new("checkout.validate_cart", "cart-service").with_max_duration_ms(100),
            ExpectedSpan::new("payment.process", "payment-service").with_max_duration_ms(2000),
            ExpectedSpan::new("inventory.reserve", "inventory-service").with_max_duration_ms(500),
            ExpectedSpan::new("order.create", "order-service").with_max_duration_ms(200),
        ],
        max_total_duration_ms: Some(3000),
    }
}

pub fn good_trace() -> ObservedTrace {
    trace(
        GOOD_TRACE_ID,
        1700,
        vec![
            span(
                "span-1",
                "checkout.validate_cart",
                "cart-service",
                0,
                50,
                &[("user_id", "123"), ("cart_items", "3")],
            ),
            span(
                "span-2",
                "payment.process",
                "payment-service",
                50,
                1200,
                &[("amount", "99.99"), ("method", "credit_card")],
            ),
            span(
                "span-3",
                "inventory.reserve",
                "inventory-service",
                1250,
                300,
                &[("items", "widget-1,widget-2")],
            ),
            span(
                "span-4",
                "order.create",
                "order-service",
                1550,
                150,
                &[("order_id", "ord-456")],
            ),
        ],
    )
}

/// Slow validation and payment, and no inventory reservation.
pub fn problem_trace() -> ObservedTrace {
    let mut payment = span(
        "span-2",
        "payment.process",
        "payment-service",
        200,
        5000,
        &[("amount", "199.99"), ("method", "credit_card")],
    );
    payment.status = SpanStatus::Error;

    trace(
        PROBLEM_TRACE_ID,
        5350,
        vec![
            span(
                "span-1",
                "checkout.validate_cart",
                "cart-service",
                0,
                200,
                &[("user_id", "456")],
            ),
            payment,
            span(
                "span-4",
                "order.create",
                "order-service",
                5200,
                150,
                &[("order_id", "ord-789")],
            ),
        ],
    )
}

/// Writes the checkout fixtures as JSON documents under `dir` and returns the
/// trace and spec file paths.
pub fn write_fixtures(dir: &std::path::Path) -> std::io::Result<(std::path::PathBuf, std::path::PathBuf)> {
    let traces = dir.join("traces.json");
    let spec = dir.join("checkout.json");
    std::fs::write(
        &traces,
        serde_json::to_vec_pretty(&vec![good_trace(), problem_trace()])?,
    )?;
    std::fs::write(&spec, serde_json::to_vec_pretty(&checkout_spec())?)?;
    Ok((traces, spec))
}
