//! # Filter Trees
//!
//! The part of a query before the first pipe, held as a nested AND/OR tree
//! that a visual builder edits in place.
//!
//! ```text
//! (level:error OR level:warn) AND app:nginx | sort by (_time)
//! ```
//!
//! becomes a tree with one group and one leaf joined by `AND`, plus the raw
//! pipe string `sort by (_time)`. Leaves are kept as the text the user
//! typed. Nodes are addressed by index paths (`[0, 1]` is the second value
//! of the first group), and every edit returns a new tree.

use crate::ast::{FilterValue, FilterVisualQuery, ParseResult, VisualQuery};
use crate::error::FilterTreeError;

/// Groups nested deeper than this are kept as an opaque leaf.
pub const MAX_GROUP_DEPTH: usize = 64;

pub const DEFAULT_FILTER_OPERATOR: &str = "AND";

/// Tree plus the structural problems met while building it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterTreeParse {
    pub tree: FilterVisualQuery,
    pub errors: Vec<FilterTreeError>,
}

/// Build a tree, keeping structural errors.
///
/// Unbalanced parentheses and overly deep nesting are reported but never
/// abort the build: the text involved is kept as a leaf. An empty tree is
/// never reported as an error.
pub fn parse_filter_tree(text: &str) -> FilterTreeParse {
    let mut builder = TreeBuilder { errors: Vec::new() };
    let tree = builder.build(text, 0);
    let errors = if tree.is_empty() { Vec::new() } else { builder.errors };
    FilterTreeParse { tree, errors }
}

pub fn build_filter_tree(text: &str) -> FilterVisualQuery {
    parse_filter_tree(text).tree
}

/// Split `expr` into a filter tree and raw pipe strings.
pub fn build_visual_query_from_string(expr: &str) -> ParseResult {
    let mut parts = split_pipes(expr).into_iter();
    let filter_text = parts.next().unwrap_or_default();
    let parsed = parse_filter_tree(filter_text);
    let pipes: Vec<String> = parts.map(str::to_string).collect();

    let errors = if parsed.tree.is_empty() && pipes.is_empty() {
        Vec::new()
    } else {
        parsed.errors.iter().map(ToString::to_string).collect()
    };

    ParseResult {
        query: VisualQuery {
            filters: parsed.tree,
            pipes,
            expr: expr.to_string(),
            ..VisualQuery::default()
        },
        errors,
    }
}

/// Render a tree back to text, parenthesizing nested groups.
pub fn filter_tree_to_string(tree: &FilterVisualQuery) -> String {
    let mut out = String::new();
    for (i, value) in tree.values.iter().enumerate() {
        if i > 0 {
            let operator = tree
                .operators
                .get(i - 1)
                .map(|op| op.trim())
                .filter(|op| !op.is_empty())
                .unwrap_or(DEFAULT_FILTER_OPERATOR);
            out.push(' ');
            out.push_str(operator);
            out.push(' ');
        }
        match value {
            FilterValue::Leaf(text) => out.push_str(text),
            FilterValue::Group(group) => {
                out.push('(');
                out.push_str(&filter_tree_to_string(group));
                out.push(')');
            }
        }
    }
    out
}

// ============================================================================
// Scanning
// ============================================================================

enum Piece<'a> {
    Text(&'a str),
    Group(&'a str),
}

struct TreeBuilder {
    errors: Vec<FilterTreeError>,
}

impl TreeBuilder {
    fn build(&mut self, text: &str, depth: usize) -> FilterVisualQuery {
        let mut tree = PendingTree::default();
        for piece in self.split_groups(text) {
            match piece {
                Piece::Group(inner) if depth + 1 >= MAX_GROUP_DEPTH => {
                    self.errors.push(FilterTreeError::NestingTooDeep {
                        max: MAX_GROUP_DEPTH,
                    });
                    tree.push_value(FilterValue::leaf(format!("({})", inner)));
                }
                Piece::Group(inner) => {
                    let group = self.build(inner, depth + 1);
                    tree.push_value(FilterValue::Group(group));
                }
                Piece::Text(text) => push_text(&mut tree, text),
            }
        }
        tree.finish()
    }

    /// Split at top-level grouping parentheses. A `(` glued to the text
    /// before it (`seq(`, `field:(`, `!(`) or following `:in` opens a call,
    /// which stays part of the surrounding text.
    fn split_groups<'a>(&mut self, text: &'a str) -> Vec<Piece<'a>> {
        let mut pieces = Vec::new();
        let mut quote: Option<char> = None;
        let mut escaped = false;
        let mut depth = 0usize;
        let mut call = false;
        let mut open_at = 0usize;
        let mut text_start = 0usize;
        let mut previous: Option<char> = None;

        for (i, ch) in text.char_indices() {
            let before = previous;
            previous = Some(ch);

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

            match ch {
                '"' | '\'' | '`' => quote = Some(ch),
                '(' if depth > 0 => depth += 1,
                '(' => {
                    depth = 1;
                    open_at = i;
                    let glued = before.is_some_and(|c| !c.is_whitespace());
                    call = glued || ends_with_in(&text[text_start..i]);
                    if !call {
                        push_text_piece(&mut pieces, &text[text_start..i]);
                    }
                }
                ')' if depth == 0 => {
                    self.errors
                        .push(FilterTreeError::UnbalancedParentheses { position: i });
                    push_text_piece(&mut pieces, &text[text_start..i]);
                    text_start = i + 1;
                }
                ')' => {
                    depth -= 1;
                    if depth == 0 && !call {
                        pieces.push(Piece::Group(&text[open_at + 1..i]));
                        text_start = i + 1;
                    }
                }
                _ => {}
            }
        }

        if depth > 0 {
            self.errors
                .push(FilterTreeError::UnbalancedParentheses { position: open_at });
            if !call {
                text_start = open_at;
            }
        }
        push_text_piece(&mut pieces, &text[text_start..]);
        pieces
    }
}

fn push_text_piece<'a>(pieces: &mut Vec<Piece<'a>>, text: &'a str) {
    if !text.trim().is_empty() {
        pieces.push(Piece::Text(text));
    }
}

fn ends_with_in(text: &str) -> bool {
    let text = text.trim_end().to_ascii_lowercase();
    text.ends_with(":in") || text.ends_with(":not_in")
}

/// Values and operators collected so far. Adjacent values get an implicit
/// `AND`; operators with no value on one side are dropped.
#[derive(Default)]
struct PendingTree {
    values: Vec<FilterValue>,
    operators: Vec<String>,
    pending: Option<String>,
}

impl PendingTree {
    fn push_value(&mut self, value: FilterValue) {
        let operator = self.pending.take();
        if !self.values.is_empty() {
            self.operators
                .push(operator.unwrap_or_else(|| DEFAULT_FILTER_OPERATOR.to_string()));
        }
        self.values.push(value);
    }

    fn push_operator(&mut self, operator: &str) {
        self.pending = Some(operator.to_string());
    }

    fn finish(self) -> FilterVisualQuery {
        FilterVisualQuery::new(self.values, self.operators)
    }
}

fn is_operator(fragment: &str) -> bool {
    fragment.eq_ignore_ascii_case("and") || fragment.eq_ignore_ascii_case("or")
}

fn is_negation(fragment: &str) -> bool {
    fragment.eq_ignore_ascii_case("not") || fragment == "!" || fragment == "-"
}

/// Split plain text into `AND`/`OR` words and `field:value` leaves.
fn push_text(tree: &mut PendingTree, text: &str) {
    let fragments = fragment_spans(text);
    let mut i = 0;
    while i < fragments.len() {
        let (start, mut end) = fragments[i];
        let fragment = &text[start..end];
        if is_operator(fragment) {
            tree.push_operator(fragment);
            i += 1;
            continue;
        }

        i += 1;
        while let Some(&(next_start, next_end)) = fragments.get(i) {
            let current = &text[start..end];
            let next = &text[next_start..next_end];
            let joins = current.ends_with(':')
                || next.starts_with(':')
                || (next.starts_with('(') && ends_with_in(current))
                || (is_negation(current) && !is_operator(next));
            if !joins {
                break;
            }
            end = next_end;
            i += 1;
        }
        tree.push_value(FilterValue::leaf(&text[start..end]));
    }
}

/// Byte spans of the whitespace-separated fragments of `text`, ignoring
/// whitespace inside quotes and parentheses.
fn fragment_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0usize;

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
        if ch.is_whitespace() && depth == 0 {
            if let Some(s) = start.take() {
                spans.push((s, i));
            }
            continue;
        }
        if start.is_none() {
            start = Some(i);
        }
        match ch {
            '"' | '\'' | '`' => quote = Some(ch),
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

/// Split on `|` outside quotes and brackets, trimming each part.
fn split_pipes(expr: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for position in pipe_positions(expr) {
        parts.push(expr[start..position].trim());
        start = position + 1;
    }
    parts.push(expr[start..].trim());
    parts
}

/// Byte offsets of every `|` outside quotes and brackets.
pub(crate) fn pipe_positions(expr: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0usize;

    for (i, ch) in expr.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if let Some(open) = quote {
            if ch == '\\' && open != '`' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' | '\'' | '`' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => positions.push(i),
            _ => {}
        }
    }
    positions
}

// ============================================================================
// Index path edits
// ============================================================================

/// Replace the value at `path` with a leaf. An index equal to the group's
/// length appends; other out-of-range paths leave the tree unchanged.
pub fn update_value_by_index_path(tree: &FilterVisualQuery, path: &[usize], value: &str) -> FilterVisualQuery {
    let mut updated = tree.clone();
    update_value_in(&mut updated, path, value);
    updated
}

fn update_value_in(tree: &mut FilterVisualQuery, path: &[usize], value: &str) {
    let Some((&index, rest)) = path.split_first() else {
        return;
    };
    if rest.is_empty() {
        if index < tree.values.len() {
            tree.values[index] = FilterValue::leaf(value);
        } else if index == tree.values.len() {
            if !tree.values.is_empty() {
                tree.operators.push(DEFAULT_FILTER_OPERATOR.to_string());
            }
            tree.values.push(FilterValue::leaf(value));
        }
        return;
    }

    let Some(node) = tree.values.get_mut(index) else {
        return;
    };
    if let FilterValue::Leaf(_) = node {
        *node = FilterValue::Group(FilterVisualQuery::default());
    }
    if let FilterValue::Group(group) = node {
        update_value_in(group, rest, value);
    }
}

/// Replace the operator at `path`; the last index addresses `operators`.
pub fn update_operator_by_index_path(
    tree: &FilterVisualQuery,
    path: &[usize],
    operator: &str,
) -> FilterVisualQuery {
    let mut updated = tree.clone();
    if let Some((&index, parents)) = path.split_last() {
        if let Some(group) = group_at_mut(&mut updated, parents) {
            if let Some(slot) = group.operators.get_mut(index) {
                *slot = operator.to_string();
            }
        }
    }
    updated
}

/// Remove the value at `path` together with one adjacent operator: the one
/// after it for the first value, otherwise the one before it.
pub fn delete_by_index_path(tree: &FilterVisualQuery, path: &[usize]) -> FilterVisualQuery {
    let mut updated = tree.clone();
    let Some((&index, parents)) = path.split_last() else {
        return updated;
    };
    let Some(group) = group_at_mut(&mut updated, parents) else {
        return updated;
    };
    if index >= group.values.len() {
        return updated;
    }

    group.values.remove(index);
    let operator = index.saturating_sub(1);
    if operator < group.operators.len() {
        group.operators.remove(operator);
    }
    updated
}

/// Append `value` to the group at `path`, joined by `operator`.
pub fn add_value_by_index_path(
    tree: &FilterVisualQuery,
    path: &[usize],
    value: FilterValue,
    operator: &str,
) -> FilterVisualQuery {
    let mut updated = tree.clone();
    if let Some(group) = group_at_mut(&mut updated, path) {
        if !group.values.is_empty() {
            group.operators.push(operator.to_string());
        }
        group.values.push(value);
    }
    updated
}

fn group_at_mut<'a>(tree: &'a mut FilterVisualQuery, path: &[usize]) -> Option<&'a mut FilterVisualQuery> {
    match path.split_first() {
        None => Some(tree),
        Some((&index, rest)) => match tree.values.get_mut(index)? {
            FilterValue::Group(group) => group_at_mut(group, rest),
            FilterValue::Leaf(_) => None,
        },
    }
}
