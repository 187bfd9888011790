use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::span::ObservedTrace;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TracesRequest {
    pub service_name: Option<String>,
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceListItem {
    pub trace_id: String,
    pub service_name: String,
    pub start_time: DateTime<Utc>,
    pub total_duration_ms: u64,
    pub span_count: usize,
}

impl From<&ObservedTrace> for TraceListItem {
    fn from(trace: &ObservedTrace) -> Self {
        Self {
            trace_id: trace.trace_id.clone(),
            service_name: trace.service_name.clone(),
            start_time: trace.start_time,
            total_duration_ms: trace.total_duration_ms,
            span_count: trace.spans.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRequest {
    pub trace_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareRequest {
    pub trace_id: String,
    pub spec_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecListItem {
    pub name: String,
    pub description: String,
    pub span_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefineSpecResponse {
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub traces_count: usize,
    pub specs_count: usize,
}
