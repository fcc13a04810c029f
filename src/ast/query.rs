use serde::{Deserialize, Serialize};

use super::{FilterVisualQuery, Operation};

/// Label-style filter extracted from the first pipe segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelFilter {
    pub label: String,
    /// One of `=`, `!=`, `=~`, `!~`
    pub op: String,
    pub value: String,
}

/// The editable root a visual builder works on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualQuery {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<LabelFilter>,
    #[serde(default)]
    pub operations: Vec<Operation>,
    #[serde(default, skip_serializing_if = "FilterVisualQuery::is_empty")]
    pub filters: FilterVisualQuery,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pipes: Vec<String>,
    #[serde(default)]
    pub expr: String,
}

/// Parse output: partial structure plus non-fatal error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    pub query: VisualQuery,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl VisualQuery {
    pub fn from_operations(operations: Vec<Operation>) -> Self {
        VisualQuery {
            operations,
            ..Default::default()
        }
    }
}
