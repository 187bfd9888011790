use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TracespecError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpanStatus {
    #[default]
    Ok,
    Error,
}

impl SpanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// One timed operation captured in a trace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservedSpan {
    pub span_id: String,
    pub operation_name: String,
    pub service_name: String,
    pub start_time: DateTime<Utc>,
    pub duration_ms: u64,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub status: SpanStatus,
}

/// A fully materialized trace. `total_duration_ms` is trusted as supplied and
/// is not derived from the spans.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservedTrace {
    pub trace_id: String,
    pub service_name: String,
    pub start_time: DateTime<Utc>,
    pub total_duration_ms: u64,
    #[serde(default)]
    pub spans: Vec<ObservedSpan>,
}

impl ObservedTrace {
    pub fn operation_names(&self) -> BTreeSet<&str> {
        self.spans
            .iter()
            .map(|s| s.operation_name.as_str())
            .collect()
    }

    /// First span in capture order carrying `operation_name`.
    pub fn first_span_named(&self, operation_name: &str) -> Option<&ObservedSpan> {
        self.spans
            .iter()
            .find(|s| s.operation_name == operation_name)
    }

    pub fn check(&self) -> Result<()> {
        if self.trace_id.trim().is_empty() {
            return Err(TracespecError::InvalidArgument(
                "trace_id cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for span in &self.spans {
            if !seen.insert(span.span_id.as_str()) {
                return Err(TracespecError::InvalidArgument(format!(
                    "duplicate span id {} in trace {}",
                    span.span_id, self.trace_id
                )));
            }
        }
        Ok(())
    }
}
