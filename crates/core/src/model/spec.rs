use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TracespecError};

/// An operation a conforming trace must contain.
///
/// `min_duration_ms` and `required_tags` are carried for authors and renderers
/// but are not evaluated by [`crate::validate::validate`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpectedSpan {
    pub operation_name: String,
    pub service_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub required_tags: BTreeMap<String, String>,
}

impl ExpectedSpan {
    pub fn new(operation_name: impl Into<String>, service_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            service_name: service_name.into(),
            min_duration_ms: None,
            max_duration_ms: None,
            required_tags: BTreeMap::new(),
        }
    }

    pub fn with_max_duration_ms(mut self, max: u64) -> Self {
        self.max_duration_ms = Some(max);
        self
    }

    pub fn with_min_duration_ms(mut self, min: u64) -> Self {
        self.min_duration_ms = Some(min);
        self
    }

    pub fn with_required_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.required_tags.insert(key.into(), value.into());
        self
    }

    /// True when both bounds are present and inverted.
    pub fn has_inverted_bounds(&self) -> bool {
        matches!(
            (self.min_duration_ms, self.max_duration_ms),
            (Some(min), Some(max)) if min > max
        )
    }
}

/// Declarative shape of a trace, keyed by `name` in a store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TraceSpecification {
    pub name: String,
    pub description: String,
    pub expected_spans: Vec<ExpectedSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_total_duration_ms: Option<u64>,
}

impl TraceSpecification {
    pub fn operation_names(&self) -> BTreeSet<&str> {
        self.expected_spans
            .iter()
            .map(|s| s.operation_name.as_str())
            .collect()
    }

    pub fn check(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TracespecError::InvalidArgument(
                "specification name cannot be empty".to_string(),
            ));
        }
        if let Some(idx) = self
            .expected_spans
            .iter()
            .position(|s| s.operation_name.trim().is_empty())
        {
            return Err(TracespecError::InvalidArgument(format!(
                "expected span #{idx} in '{}' has an empty operation_name",
                self.name
            )));
        }
        Ok(())
    }
}

/// Body of a specification registered through the tool façade, where name and
/// description travel beside the spec object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecBody {
    #[serde(default)]
    pub expected_spans: Vec<ExpectedSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_total_duration_ms: Option<u64>,
}

impl SpecBody {
    pub fn into_specification(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> TraceSpecification {
        TraceSpecification {
            name: name.into(),
            description: description.into(),
            expected_spans: self.expected_spans,
            max_total_duration_ms: self.max_total_duration_ms,
        }
    }
}
