use std::fmt::Write as _;
use std::io::IsTerminal;

use chrono::SecondsFormat;
use owo_colors::OwoColorize;
use tracespec_core::analysis::TraceAnalysis;
use tracespec_core::model::result::ComparisonResult;
use tracespec_core::model::span::{ObservedTrace, SpanStatus};
use tracespec_core::query::{DefineSpecResponse, SpecListItem, StatusResponse, TraceListItem};

pub fn print_comparison_human(v: &ComparisonResult) {
    print!("{}", render_comparison(v, std::io::stdout().is_terminal()));
}

pub fn render_comparison(v: &ComparisonResult, color: bool) -> String {
    let verdict = match (v.matches_specification, color) {
        (true, true) => "yes".green().to_string(),
        (false, true) => "no".red().to_string(),
        (true, false) => "yes".to_string(),
        (false, false) => "no".to_string(),
    };

    let mut out = String::new();
    let _ = writeln!(out, "score={:.2}/1.0 matches={verdict}", v.score);
    if !v.missing_spans.is_empty() {
        let _ = writeln!(out, "missing: {}", v.missing_spans.join(", "));
    }
    if !v.unexpected_spans.is_empty() {
        let _ = writeln!(out, "unexpected: {}", v.unexpected_spans.join(", "));
    }
    for issue in &v.performance_issues {
        let _ = writeln!(out, "issue: {issue}");
    }
    for suggestion in &v.suggestions {
        let _ = writeln!(out, "suggestion: {suggestion}");
    }
    out
}

pub fn print_trace_human(v: &ObservedTrace) {
    let errors = v
        .spans
        .iter()
        .filter(|s| s.status == SpanStatus::Error)
        .count();
    println!(
        "TRACE {} service={} start={} duration={}ms spans={} errors={}",
        v.trace_id,
        v.service_name,
        v.start_time.to_rfc3339_opts(SecondsFormat::Millis, true),
        v.total_duration_ms,
        v.spans.len(),
        errors
    );
    for (i, span) in v.spans.iter().enumerate() {
        println!(
            "  {}. {} ({}) {}ms {}",
            i + 1,
            span.operation_name,
            span.service_name,
            span.duration_ms,
            span.status.as_str()
        );
        if !span.tags.is_empty() {
            let tags = span
                .tags
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("     tags: {tags}");
        }
    }
}

pub fn print_traces_human(v: &[TraceListItem]) {
    for item in v {
        println!(
            "trace={} service={} start={} duration={}ms spans={}",
            item.trace_id,
            item.service_name,
            item.start_time.to_rfc3339_opts(SecondsFormat::Millis, true),
            item.total_duration_ms,
            item.span_count
        );
    }
    println!("-- {} traces --", v.len());
}

pub fn print_specs_human(v: &[SpecListItem]) {
    for spec in v {
        println!(
            "spec={} spans={} | {}",
            spec.name, spec.span_count, spec.description
        );
    }
    println!("-- {} specifications --", v.len());
}

pub fn print_analysis_human(v: &TraceAnalysis) {
    println!(
        "ANALYSIS {} duration={}ms spans={}",
        v.trace_id, v.total_duration_ms, v.span_count
    );
    println!("services: {}", v.services.join(", "));
    println!("operations: {}", v.operations.join(", "));
    if let Some(perf) = &v.performance_summary {
        println!(
            "slowest={} fastest={} avg={:.1}ms",
            perf.slowest_span, perf.fastest_span, perf.avg_span_duration
        );
    }
}

pub fn print_spec_defined_human(v: &DefineSpecResponse) {
    println!("{}", v.message);
}

pub fn print_ingested_human(v: &TraceListItem) {
    println!("stored trace={} spans={}", v.trace_id, v.span_count);
}

pub fn print_status_human(v: &StatusResponse) {
    println!("traces={} specs={}", v.traces_count, v.specs_count);
}
