//! Stream selectors: the `{label in ("a", "b")}` body of a `_stream` filter
//! and the stream filter rows of the builder.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ast::Token;
use crate::lexer::split_string;
use crate::quote::{quote_string, unquote_string};

const NEGATED: [&str; 3] = ["not_in", "!~", "!="];

static SELECTOR_OPERATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!=|=\s*~|!~|=| in | not_in ").expect("valid selector regex"));

static ESCAPED_CHAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\(.)").expect("valid regex"));

/// One label with its accepted (or rejected) values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSelector {
    pub label: String,
    pub not_in: bool,
    pub values: Vec<String>,
}

/// Parse the body of a stream selector.
///
/// ```text
/// app="nginx"
/// app in (nginx, "foo.bar")
/// app not_in (nginx)
/// app=~"nginx|foo\.bar"
/// app!~"nginx|foo\.bar"
/// ```
///
/// Unrecognized text yields the text as the label and no values.
pub fn parse_stream_filter_value(text: &str) -> StreamSelector {
    let tokens = split_string(text);
    let Some(last) = tokens.last() else {
        return StreamSelector::default();
    };

    if let Token::Bracket(group) = last {
        let label = tokens
            .first()
            .filter(|t| t.is_value())
            .map(Token::get_value)
            .unwrap_or_default();
        let operator = if tokens.len() == 2 {
            group.prefix.as_str()
        } else {
            tokens.get(1).and_then(Token::text).unwrap_or_default()
        };
        let values = group
            .value
            .iter()
            .filter(|t| t.is_value() && !t.text_is(","))
            .map(Token::get_value)
            .collect();
        return StreamSelector {
            label,
            not_in: NEGATED.contains(&operator),
            values,
        };
    }

    let Some(found) = SELECTOR_OPERATOR.find(text) else {
        return StreamSelector {
            label: text.trim().to_string(),
            ..StreamSelector::default()
        };
    };
    let label = text[..found.start()].trim().to_string();
    let operator: String = found.as_str().split_whitespace().collect();
    let rest = text[found.end()..].trim();

    let values = if operator.contains('~') {
        split_regexp_alternatives(&unquote_string(rest))
    } else {
        split_string(rest)
            .first()
            .filter(|t| t.is_value())
            .map(|t| vec![t.get_value()])
            .unwrap_or_default()
    };

    StreamSelector {
        label,
        not_in: NEGATED.contains(&operator.as_str()),
        values,
    }
}

/// `a|b\|c` -> `["a", "b|c"]`, with every `\x` turned into `x`.
fn split_regexp_alternatives(pattern: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for ch in pattern.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' => {
                current.push(ch);
                escaped = true;
            }
            '|' => values.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    values.push(current);

    values
        .into_iter()
        .filter(|v| !v.is_empty())
        .map(|v| ESCAPED_CHAR.replace_all(&v, "$1").into_owned())
        .collect()
}

/// Render a selector body. One value uses `=`/`!=`, several use
/// `in`/`not_in`.
pub fn build_stream_filter_value(label: &str, values: &[String], not_in: bool) -> String {
    let quoted: Vec<String> = values.iter().map(|v| quote_string(v)).collect();
    let operator = if not_in { "!=" } else { "=" };
    match quoted.as_slice() {
        [] => format!("{}{}", label, operator),
        [single] => format!("{}{}{}", label, operator, single),
        many => {
            let operator = if not_in { "not_in" } else { "in" };
            format!("{} {} ({})", label, operator, many.join(","))
        }
    }
}

impl StreamSelector {
    pub fn to_value(&self) -> String {
        build_stream_filter_value(&self.label, &self.values, self.not_in)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamOperator {
    #[default]
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

/// One row of the stream filter editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFilterState {
    pub label: String,
    #[serde(default)]
    pub operator: StreamOperator,
    #[serde(default)]
    pub values: Vec<String>,
}

impl StreamFilterState {
    pub fn new<I, S>(label: impl Into<String>, operator: StreamOperator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StreamFilterState {
            label: label.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Template variables pass through unquoted.
fn format_stream_value(value: &str) -> String {
    if value.starts_with('$') {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

/// `_stream:{label in ("a", "b")}`, or an empty string for a row with no
/// label or no values.
pub fn stream_filter_to_string(filter: &StreamFilterState) -> String {
    if filter.label.is_empty() || filter.values.is_empty() {
        return String::new();
    }
    let operator = match filter.operator {
        StreamOperator::Equal => "in",
        StreamOperator::NotEqual => "not_in",
    };
    let values: Vec<String> = filter.values.iter().map(|v| format_stream_value(v)).collect();
    format!("_stream:{{{} {} ({})}}", filter.label, operator, values.join(", "))
}

/// Complete rows joined by ` AND `.
pub fn build_stream_extra_filters(filters: &[StreamFilterState]) -> String {
    filters
        .iter()
        .map(stream_filter_to_string)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Filters of the rows before `current`, used to narrow the suggestions
/// offered for that row.
pub fn build_preceding_stream_filters(filters: &[StreamFilterState], current: usize) -> String {
    build_stream_extra_filters(&filters[..current.min(filters.len())])
}

/// Labels used by every row except `exclude`.
pub fn used_label_names(filters: &[StreamFilterState], exclude: usize) -> BTreeSet<String> {
    filters
        .iter()
        .enumerate()
        .filter(|(i, f)| *i != exclude && !f.label.is_empty())
        .map(|(_, f)| f.label.clone())
        .collect()
}
