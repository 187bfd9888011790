use serde::{Deserialize, Serialize};
use tracespec_core::analysis::TraceAnalysis;
use tracespec_core::model::result::ComparisonResult;
use tracespec_core::model::span::ObservedTrace;
use tracespec_core::model::spec::TraceSpecification;
use tracespec_core::query::{
    CompareRequest, DefineSpecResponse, SpecListItem, StatusResponse, TraceListItem, TraceRequest,
    TracesRequest,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ApiRequest {
    Traces(TracesRequest),
    Trace(TraceRequest),
    Analyze(TraceRequest),
    Specs,
    DefineSpec(TraceSpecification),
    IngestTrace(ObservedTrace),
    Compare(CompareRequest),
    Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ApiResponse {
    Traces(Vec<TraceListItem>),
    Trace(ObservedTrace),
    Analysis(TraceAnalysis),
    Specs(Vec<SpecListItem>),
    SpecDefined(DefineSpecResponse),
    TraceIngested(TraceListItem),
    Comparison(ComparisonResult),
    Status(StatusResponse),
    Error(String),
}

impl ApiResponse {
    /// JSON body without the variant wrapper. Comparison results keep their
    /// flat interop shape; errors become `{"error": ...}`.
    pub fn payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::Traces(v) => Ok(serde_json::json!({ "traces": v })),
            Self::Trace(v) => serde_json::to_value(v),
            Self::Analysis(v) => serde_json::to_value(v),
            Self::Specs(v) => Ok(serde_json::json!({ "specifications": v })),
            Self::SpecDefined(v) => serde_json::to_value(v),
            Self::TraceIngested(v) => serde_json::to_value(v),
            Self::Comparison(v) => serde_json::to_value(v),
            Self::Status(v) => serde_json::to_value(v),
            Self::Error(e) => Ok(serde_json::json!({ "error": e })),
        }
    }
}
