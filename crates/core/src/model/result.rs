use serde::{Deserialize, Serialize};

/// Verdict of comparing one trace against one specification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonResult {
    pub matches_specification: bool,
    pub missing_spans: Vec<String>,
    pub unexpected_spans: Vec<String>,
    pub performance_issues: Vec<String>,
    pub suggestions: Vec<String>,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shape_is_flat_and_round_trips() {
        let result = ComparisonResult {
            matches_specification: false,
            missing_spans: vec!["inventory.reserve".into()],
            unexpected_spans: vec![],
            performance_issues: vec!["Total duration 5350ms exceeds maximum 3000ms".into()],
            suggestions: vec!["Implement missing operations: inventory.reserve".into()],
            score: 0.6,
        };

        let value = serde_json::to_value(&result).unwrap();
        let keys = value.as_object().unwrap().keys().cloned().collect::<Vec<_>>();
        assert_eq!(
            keys,
            [
                "matches_specification",
                "missing_spans",
                "performance_issues",
                "score",
                "suggestions",
                "unexpected_spans"
            ]
        );
        assert_eq!(value["score"], 0.6);

        let text = serde_json::to_string_pretty(&result).unwrap();
        let back: ComparisonResult = serde_json::from_str(&text).unwrap();
        assert_eq!(back, result);
    }
}
