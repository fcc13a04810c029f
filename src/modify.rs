//! Text-level edits applied to whole query strings: ad-hoc label filters,
//! filter removal, the default `_time` sort and small syntax corrections.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::filter_tree::pipe_positions;

/// Names of the functions that may appear inside a `stats` pipe.
pub const STATS_PIPE_FUNCTIONS: [&str; 20] = [
    "avg",
    "count",
    "count_empty",
    "count_uniq",
    "count_uniq_hash",
    "histogram",
    "json_values",
    "max",
    "median",
    "min",
    "quantile",
    "rate",
    "rate_sum",
    "row_any",
    "row_max",
    "row_min",
    "sum",
    "sum_len",
    "uniq_values",
    "values",
];

static TIME_SORT_PIPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\|\s*(sort|order)\s+by\s*\([^)]*\b_time\b[^)]*\)").expect("valid sort regex")
});

static STATS_PIPE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(r"(?im)\|.*\b({})\b", STATS_PIPE_FUNCTIONS.join("|"));
    Regex::new(&pattern).expect("valid stats regex")
});

static FIELD_IN_ALL: Lazy<Regex> = Lazy::new(|| Regex::new(r":\s*in\(\.\*\)").expect("valid regex"));

static STREAM_IN_ALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"("(?:\\.|[^"\\])*"|[^\s:]+)\s+in\(\.\*\)"#).expect("valid regex")
});

/// How an ad-hoc filter compares its key with the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelOperator {
    /// `key:"value"`
    Contains,
    /// `!key:"value"`
    Not,
    /// `key:="value"`
    Equal,
    /// `key:!="value"`
    NotEqual,
    /// `key:in("a","b")`
    In,
    /// `!key:in("a","b")`
    NotIn,
}

impl LabelOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelOperator::Contains => "AND",
            LabelOperator::Not => "NOT",
            LabelOperator::Equal => "=",
            LabelOperator::NotEqual => "!=",
            LabelOperator::In => "=|",
            LabelOperator::NotIn => "!=|",
        }
    }

    fn is_negated(&self) -> bool {
        matches!(
            self,
            LabelOperator::Not | LabelOperator::NotEqual | LabelOperator::NotIn
        )
    }
}

impl fmt::Display for LabelOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelOperator {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "AND" | "and" | ":" => Ok(LabelOperator::Contains),
            "NOT" | "not" | "!:" => Ok(LabelOperator::Not),
            "=" => Ok(LabelOperator::Equal),
            "!=" => Ok(LabelOperator::NotEqual),
            "=|" => Ok(LabelOperator::In),
            "!=|" => Ok(LabelOperator::NotIn),
            other => Err(crate::Error::UnknownOperation(other.to_string())),
        }
    }
}

/// One filter to add to a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSpec {
    pub key: String,
    pub value: String,
    /// Values for the `in(...)` operators.
    #[serde(default)]
    pub values: Vec<String>,
    pub operator: LabelOperator,
}

impl LabelSpec {
    pub fn new(key: impl Into<String>, value: impl Into<String>, operator: LabelOperator) -> Self {
        LabelSpec {
            key: key.into(),
            value: value.into(),
            values: Vec::new(),
            operator,
        }
    }

    pub fn with_values<I, S>(key: impl Into<String>, values: I, operator: LabelOperator) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LabelSpec {
            key: key.into(),
            value: String::new(),
            values: values.into_iter().map(Into::into).collect(),
            operator,
        }
    }

    /// LogsQL filter for this label.
    pub fn to_filter(&self) -> String {
        let key = self.key.as_str();
        if key == "_stream" || key == "_stream_id" {
            return if self.operator.is_negated() {
                format!("(! {}: {})", key, self.value)
            } else {
                format!("{}:{}", key, self.value)
            };
        }

        let value = double_quote(&self.value);
        match self.operator {
            LabelOperator::Contains => format!("{}:{}", key, value),
            LabelOperator::Not => format!("!{}:{}", key, value),
            LabelOperator::Equal => format!("{}:={}", key, value),
            LabelOperator::NotEqual => format!("{}:!={}", key, value),
            LabelOperator::In => format!("{}:in({})", key, self.quoted_values()),
            LabelOperator::NotIn => format!("!{}:in({})", key, self.quoted_values()),
        }
    }

    fn quoted_values(&self) -> String {
        self.values
            .iter()
            .map(|v| double_quote(v))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn double_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Split `query` at its first top-level pipe. The tail keeps the `|`.
fn split_head(query: &str) -> (&str, &str) {
    match pipe_positions(query).first() {
        Some(&position) => (&query[..position], &query[position..]),
        None => (query, ""),
    }
}

fn join_head(head: &str, tail: &str) -> String {
    match (head.trim().is_empty(), tail.is_empty()) {
        (_, true) => head.trim().to_string(),
        (true, false) => format!("* {}", tail.trim()),
        (false, false) => format!("{} {}", head.trim(), tail.trim()),
    }
}

/// Add `label` to the filters of `query`, before the first pipe.
pub fn add_label_to_query(query: &str, label: &LabelSpec) -> String {
    let (head, tail) = split_head(query);
    let filter = label.to_filter();
    let head = if head.trim().is_empty() {
        filter
    } else {
        format!("{} AND {}", head.trim(), filter)
    };
    join_head(&head, tail)
}

/// Whitespace-separated words of `text`, keeping quoted runs whole.
fn words(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' && open != '`' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        if ch.is_whitespace() {
            if let Some(s) = start.take() {
                out.push(&text[s..i]);
            }
            continue;
        }
        if start.is_none() {
            start = Some(i);
        }
        if matches!(ch, '"' | '\'' | '`') {
            quote = Some(ch);
        }
    }
    if let Some(s) = start {
        out.push(&text[s..]);
    }
    out
}

fn is_boolean_word(word: &str) -> bool {
    ["and", "or", "not"]
        .iter()
        .any(|op| word.eq_ignore_ascii_case(op))
}

/// True when `word` (stripped of grouping parens and negation) filters
/// `key` by `value`, in any of the contains/exact/not-equal forms.
fn matches_filter(word: &str, key: &str, value: &str) -> bool {
    let word = word.trim_start_matches('(').trim_end_matches(')');
    let word = word.trim_start_matches(['!', '-']);
    let Some(rest) = word.strip_prefix(key).and_then(|r| r.strip_prefix(':')) else {
        return false;
    };
    let rest = rest
        .strip_prefix("!=")
        .or_else(|| rest.strip_prefix('='))
        .unwrap_or(rest);
    rest == value || crate::quote::unquote_string(rest) == value
}

pub fn query_has_filter(query: &str, key: &str, value: &str) -> bool {
    let (head, _) = split_head(query);
    words(head).iter().any(|word| matches_filter(word, key, value))
}

/// Remove the first `key:value` filter before the first pipe together with
/// one neighbouring boolean operator. Parentheses glued to the removed
/// filter move to its neighbour.
pub fn remove_label_from_query(query: &str, key: &str, value: &str) -> String {
    let (head, tail) = split_head(query);
    let mut parts: Vec<String> = words(head).into_iter().map(str::to_string).collect();
    let Some(index) = parts.iter().position(|w| matches_filter(w, key, value)) else {
        return query.to_string();
    };

    let word = parts[index].clone();
    let opens = word.len() - word.trim_start_matches('(').len();
    let closes = word.len() - word.trim_end_matches(')').len();
    let kept_opens = "(".repeat(opens.saturating_sub(closes));
    let kept_closes = ")".repeat(closes.saturating_sub(opens));

    let before_is_op = index > 0 && is_boolean_word(&parts[index - 1]);
    let after_is_op = parts.get(index + 1).is_some_and(|w| is_boolean_word(w));

    if !kept_opens.is_empty() {
        // `(filter OP next` keeps the paren on `next`.
        let end = if after_is_op { index + 2 } else { index + 1 };
        parts.drain(index..end.min(parts.len()));
        match parts.get_mut(index) {
            Some(next) => next.insert_str(0, &kept_opens),
            None => parts.push(kept_opens),
        }
    } else if !kept_closes.is_empty() || before_is_op {
        let start = if before_is_op { index - 1 } else { index };
        parts.drain(start..=index);
        match start.checked_sub(1).and_then(|i| parts.get_mut(i)) {
            Some(previous) => previous.push_str(&kept_closes),
            None if !kept_closes.is_empty() => parts.insert(0, kept_closes),
            None => {}
        }
    } else {
        let end = if after_is_op { index + 2 } else { index + 1 };
        parts.drain(index..end.min(parts.len()));
    }

    join_head(&parts.join(" "), tail)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(crate::Error::UnknownOperation(other.to_string())),
        }
    }
}

pub fn has_time_sort_pipe(expr: &str) -> bool {
    TIME_SORT_PIPE.is_match(expr)
}

/// Append `| sort by (_time) <direction>` unless the query already sorts
/// or orders by `_time`.
pub fn add_sort_pipe_to_query(expr: &str, direction: SortDirection) -> String {
    if has_time_sort_pipe(expr) {
        return expr.to_string();
    }
    format!("{} | sort by (_time) {}", expr.trim_end(), direction)
}

/// True when some pipe of `expr` mentions a stats function name.
pub fn is_expr_has_stats_pipe_functions(expr: &str) -> bool {
    STATS_PIPE.is_match(expr)
}

/// Rewrite the "all values" regexp placeholder `in(.*)` to `in(*)`, for
/// both `field:in(.*)` and `label in(.*)`.
pub fn correct_multi_exact_operator_value_all(expr: &str) -> String {
    let expr = FIELD_IN_ALL.replace_all(expr, ":in(*)");
    STREAM_IN_ALL.replace_all(&expr, "$1 in(*)").into_owned()
}
