use tracespec_core::analysis::{TraceAnalysis, analyze};
use tracespec_core::error::{Result, TracespecError};
use tracespec_core::model::result::ComparisonResult;
use tracespec_core::model::span::ObservedTrace;
use tracespec_core::model::spec::TraceSpecification;
use tracespec_core::query::{CompareRequest, SpecListItem, TraceListItem, TraceRequest, TracesRequest};
use tracespec_core::validate;

use crate::Store;

impl Store {
    pub fn get_trace(&self, req: &TraceRequest) -> Result<ObservedTrace> {
        self.traces
            .get(&req.trace_id)
            .ok_or_else(|| TracespecError::TraceNotFound(req.trace_id.clone()))
    }

    pub fn get_spec(&self, name: &str) -> Result<TraceSpecification> {
        self.specs
            .get(name)
            .ok_or_else(|| TracespecError::SpecificationNotFound(name.to_string()))
    }

    pub fn list_traces(&self, req: &TracesRequest) -> Result<Vec<TraceListItem>> {
        Ok(self
            .traces
            .values()
            .iter()
            .filter(|t| {
                req.service_name
                    .as_deref()
                    .is_none_or(|service| t.service_name == service)
            })
            .filter(|t| req.since.is_none_or(|since| t.start_time >= since))
            .map(TraceListItem::from)
            .collect())
    }

    pub fn list_specs(&self) -> Vec<SpecListItem> {
        self.specs
            .values()
            .into_iter()
            .map(|spec| SpecListItem {
                span_count: spec.expected_spans.len(),
                name: spec.name,
                description: spec.description,
            })
            .collect()
    }

    /// Resolves both sides, trace first, then runs the validator.
    pub fn compare(&self, req: &CompareRequest) -> Result<ComparisonResult> {
        let trace = self.get_trace(&TraceRequest {
            trace_id: req.trace_id.clone(),
        })?;
        let spec = self.get_spec(&req.spec_name)?;

        let result = validate(&trace, &spec);
        tracing::debug!(
            trace_id = %trace.trace_id,
            spec = %spec.name,
            score = result.score,
            matches = result.matches_specification,
            "compared trace to specification"
        );
        Ok(result)
    }

    pub fn analyze_trace(&self, req: &TraceRequest) -> Result<TraceAnalysis> {
        self.get_trace(req).map(|trace| analyze(&trace))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn seeded() -> Store {
        let store = Store::in_memory();
        store
            .insert_traces(vec![testkit::good_trace(), testkit::problem_trace()])
            .unwrap();
        store.define_spec(testkit::checkout_spec()).unwrap();
        store
    }

    fn compare(store: &Store, trace_id: &str, spec_name: &str) -> Result<ComparisonResult> {
        store.compare(&CompareRequest {
            trace_id: trace_id.to_string(),
            spec_name: spec_name.to_string(),
        })
    }

    #[test]
    fn compares_stored_checkout_traces() {
        let store = seeded();

        let good = compare(&store, testkit::GOOD_TRACE_ID, testkit::CHECKOUT_SPEC).unwrap();
        assert!(good.matches_specification);
        assert_eq!(good.score, 1.0);

        let problem = compare(&store, testkit::PROBLEM_TRACE_ID, testkit::CHECKOUT_SPEC).unwrap();
        assert!(!problem.matches_specification);
        assert_eq!(problem.missing_spans, ["inventory.reserve"]);
        assert_eq!(problem.performance_issues.len(), 3);
        assert!((problem.score - 0.6).abs() < 1e-12);
    }

    #[test]
    fn compare_reports_trace_before_spec() {
        let store = seeded();

        let err = compare(&store, "trace-nope", "nope").unwrap_err();
        assert_eq!(err.to_string(), "Trace trace-nope not found");

        let err = compare(&store, testkit::GOOD_TRACE_ID, "nope").unwrap_err();
        assert_eq!(err.to_string(), "Specification 'nope' not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn list_traces_filters_by_service_and_since() {
        let store = seeded();
        let mut other = testkit::good_trace();
        other.trace_id = "trace-search".into();
        other.service_name = "search-service".into();
        other.start_time = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        store.insert_trace(other).unwrap();

        let all = store.list_traces(&TracesRequest::default()).unwrap();
        assert_eq!(
            all.iter().map(|t| t.trace_id.as_str()).collect::<Vec<_>>(),
            ["trace-good-checkout", "trace-problem-checkout", "trace-search"]
        );

        let checkout = store
            .list_traces(&TracesRequest {
                service_name: Some("checkout-service".into()),
                since: None,
            })
            .unwrap();
        assert_eq!(checkout.len(), 2);
        assert_eq!(checkout[0].span_count, 4);
        assert_eq!(checkout[1].total_duration_ms, 5350);

        let recent = store
            .list_traces(&TracesRequest {
                service_name: None,
                since: Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap() - Duration::seconds(1)),
            })
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].service_name, "search-service");
    }

    #[test]
    fn list_specs_summarizes() {
        let store = seeded();
        let specs = store.list_specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "ecommerce_checkout");
        assert_eq!(specs[0].description, "Complete e-commerce checkout process");
        assert_eq!(specs[0].span_count, 4);
    }

    #[test]
    fn analyze_unknown_trace_is_not_found() {
        let store = seeded();
        let analysis = store
            .analyze_trace(&TraceRequest {
                trace_id: testkit::PROBLEM_TRACE_ID.into(),
            })
            .unwrap();
        assert_eq!(analysis.span_count, 3);
        assert_eq!(
            analysis.performance_summary.unwrap().slowest_span,
            "payment.process"
        );

        let err = store
            .analyze_trace(&TraceRequest {
                trace_id: "missing".into(),
            })
            .unwrap_err();
        assert!(matches!(err, TracespecError::TraceNotFound(_)));
    }
}
