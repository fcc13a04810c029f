use serde::{Deserialize, Serialize};

/// Nested boolean tree built from the text before the first pipe.
///
/// `operators[i]` joins `values[i]` and `values[i + 1]`, so a non-empty tree
/// always holds exactly one operator fewer than it holds values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterVisualQuery {
    #[serde(default)]
    pub values: Vec<FilterValue>,
    #[serde(default)]
    pub operators: Vec<String>,
}

/// A raw filter fragment or a parenthesized sub-expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Leaf(String),
    Group(FilterVisualQuery),
}

impl FilterVisualQuery {
    pub fn new(values: Vec<FilterValue>, operators: Vec<String>) -> Self {
        FilterVisualQuery { values, operators }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Operator-count invariant, checked recursively.
    pub fn is_consistent(&self) -> bool {
        self.operators.len() == self.values.len().saturating_sub(1)
            && self.values.iter().all(|value| match value {
                FilterValue::Group(group) => group.is_consistent(),
                FilterValue::Leaf(_) => true,
            })
    }
}

impl FilterValue {
    pub fn leaf(text: impl Into<String>) -> Self {
        FilterValue::Leaf(text.into())
    }

    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            FilterValue::Leaf(text) => Some(text),
            FilterValue::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&FilterVisualQuery> {
        match self {
            FilterValue::Group(group) => Some(group),
            FilterValue::Leaf(_) => None,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Leaf(value.to_string())
    }
}

impl From<FilterVisualQuery> for FilterValue {
    fn from(value: FilterVisualQuery) -> Self {
        FilterValue::Group(value)
    }
}
