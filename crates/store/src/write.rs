use tracespec_core::error::Result;
use tracespec_core::model::span::ObservedTrace;
use tracespec_core::model::spec::TraceSpecification;
use tracespec_core::query::DefineSpecResponse;

use crate::Store;

impl Store {
    pub fn insert_trace(&self, trace: ObservedTrace) -> Result<()> {
        trace.check()?;
        let trace_id = trace.trace_id.clone();
        let spans = trace.spans.len();
        if self.traces.insert(trace_id.clone(), trace).is_some() {
            tracing::debug!(%trace_id, "replaced stored trace");
        }
        tracing::debug!(%trace_id, spans, "stored trace");
        Ok(())
    }

    pub fn insert_traces(&self, traces: Vec<ObservedTrace>) -> Result<()> {
        for trace in traces {
            self.insert_trace(trace)?;
        }
        Ok(())
    }

    pub fn define_spec(&self, spec: TraceSpecification) -> Result<DefineSpecResponse> {
        spec.check()?;
        for expected in spec.expected_spans.iter().filter(|s| s.has_inverted_bounds()) {
            tracing::warn!(
                spec = %spec.name,
                operation = %expected.operation_name,
                min_duration_ms = ?expected.min_duration_ms,
                max_duration_ms = ?expected.max_duration_ms,
                "expected span has min duration above max duration"
            );
        }

        let name = spec.name.clone();
        if self.specs.insert(name.clone(), spec).is_some() {
            tracing::debug!(spec = %name, "replaced trace specification");
        }

        Ok(DefineSpecResponse {
            message: format!("Trace specification '{name}' defined successfully"),
            name,
        })
    }
}
