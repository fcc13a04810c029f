use std::sync::Arc;

use crate::ast::{Category, Operation, OperationId, ParamValue, Token};
use crate::cursor::TokenCursor;
use crate::parser::{check_legacy_multi_exact, parse_legacy_multi_exact};

use super::common::{take_call, take_value};
use super::{OperationDefinition, ParamSpec, Scope, define, get_values_from_brackets};

const WEEKDAYS: [(&str, &str); 7] = [
    ("mon", "Monday"),
    ("tue", "Tuesday"),
    ("wed", "Wednesday"),
    ("thu", "Thursday"),
    ("fri", "Friday"),
    ("sat", "Saturday"),
    ("sun", "Sunday"),
];

pub(super) fn definitions(scope: &Arc<Scope>) -> Vec<OperationDefinition> {
    let df = scope.default_field.as_str();
    let filter = |id, name| define(scope, id, name, Category::Filters);

    vec![
        filter(OperationId::Word, "Word")
            .params(vec![
                ParamSpec::string("Field"),
                ParamSpec::string("Word"),
                ParamSpec::boolean("Case insensitive"),
                ParamSpec::boolean("Prefix"),
            ])
            .defaults(vec![df.into(), "".into(), false.into(), false.into()])
            .renderer(render_word)
            .parser(parse_word),
        filter(OperationId::Time, "Time filter")
            .params(vec![ParamSpec::string("Filter"), ParamSpec::string("Offset").optional()])
            .defaults(vec!["".into(), "".into()])
            .renderer(render_time)
            .parser(parse_time),
        filter(OperationId::DayRange, "Day range")
            .params(vec![
                ParamSpec::string("Field"),
                ParamSpec::string("Start"),
                ParamSpec::string("End"),
                ParamSpec::boolean("Include start"),
                ParamSpec::boolean("Include end"),
                ParamSpec::string("Offset").optional(),
            ])
            .defaults(vec![
                "_time".into(),
                "08:00".into(),
                "18:00".into(),
                false.into(),
                false.into(),
                "".into(),
            ])
            .renderer(render_day_range)
            .parser(parse_day_range),
        filter(OperationId::WeekRange, "Week range")
            .params(vec![
                ParamSpec::string("Field"),
                ParamSpec::string("Start"),
                ParamSpec::string("End"),
                ParamSpec::boolean("Include start"),
                ParamSpec::boolean("Include end"),
                ParamSpec::string("Offset").optional(),
            ])
            .defaults(vec![
                "_time".into(),
                "Mon".into(),
                "Fri".into(),
                false.into(),
                false.into(),
                "".into(),
            ])
            .renderer(render_week_range)
            .parser(parse_week_range),
        filter(OperationId::Stream, "Stream filter")
            .params(vec![ParamSpec::string("Selector").rest()])
            .defaults(vec!["".into()])
            .renderer(render_stream)
            .parser(parse_stream),
        filter(OperationId::StreamId, "Stream ID")
            .params(vec![ParamSpec::string("Stream ID")])
            .defaults(vec!["".into()])
            .renderer(render_stream_id)
            .parser(parse_stream_id),
        filter(OperationId::Regexp, "Regexp")
            .params(vec![
                ParamSpec::string("Field"),
                ParamSpec::string("Regexp"),
                ParamSpec::boolean("Case insensitive"),
            ])
            .defaults(vec![df.into(), "".into(), false.into()])
            .renderer(render_regexp)
            .parser(parse_regexp),
        filter(OperationId::RangeComparison, "Range comparison")
            .params(vec![
                ParamSpec::string("Field"),
                ParamSpec::string("Operator"),
                ParamSpec::string("Value"),
            ])
            .defaults(vec![df.into(), ">".into(), "".into()])
            .renderer(render_range_comparison)
            .parser(parse_range_comparison),
        filter(OperationId::Exact, "Exact")
            .params(vec![
                ParamSpec::string("Field"),
                ParamSpec::string("Value"),
                ParamSpec::boolean("Not equal"),
                ParamSpec::boolean("Prefix"),
            ])
            .defaults(vec![df.into(), "".into(), false.into(), false.into()])
            .renderer(render_exact)
            .parser(parse_exact),
        filter(OperationId::MultiExact, "Multi exact")
            .params(vec![ParamSpec::string("Field"), ParamSpec::string("Values")])
            .defaults(vec![df.into(), "()".into()])
            .renderer(render_multi_exact)
            .parser(parse_multi_exact),
        filter(OperationId::ContainsAll, "Contains all")
            .params(vec![ParamSpec::string("Field"), ParamSpec::string("Values")])
            .defaults(vec![df.into(), "()".into()])
            .renderer(render_contains)
            .parser(parse_contains),
        filter(OperationId::ContainsAny, "Contains any")
            .params(vec![ParamSpec::string("Field"), ParamSpec::string("Values")])
            .defaults(vec![df.into(), "()".into()])
            .renderer(render_contains)
            .parser(parse_contains),
        filter(OperationId::Sequence, "Sequence")
            .params(vec![ParamSpec::string("Field"), ParamSpec::string("Phrase").rest()])
            .defaults(vec![df.into(), "".into()])
            .renderer(render_sequence)
            .parser(parse_sequence),
        filter(OperationId::Range, "Range")
            .params(vec![
                ParamSpec::string("Field"),
                ParamSpec::number("Lower"),
                ParamSpec::number("Upper"),
                ParamSpec::boolean("Include lower"),
                ParamSpec::boolean("Include upper"),
            ])
            .defaults(vec![
                df.into(),
                ParamValue::int(0),
                ParamValue::int(0),
                false.into(),
                false.into(),
            ])
            .renderer(render_range)
            .parser(parse_range),
        filter(OperationId::Ipv4Range, "IPv4 range")
            .params(vec![
                ParamSpec::string("Field"),
                ParamSpec::string("Start or CIDR"),
                ParamSpec::string("End").optional(),
            ])
            .defaults(vec![df.into(), "".into(), "".into()])
            .renderer(render_pair_call)
            .parser(parse_pair_call),
        filter(OperationId::StringRange, "String range")
            .params(vec![
                ParamSpec::string("Field"),
                ParamSpec::string("Start"),
                ParamSpec::string("End"),
            ])
            .defaults(vec![df.into(), "".into(), "".into()])
            .renderer(render_pair_call)
            .parser(parse_pair_call),
        filter(OperationId::LenRange, "Length range")
            .params(vec![
                ParamSpec::string("Field"),
                ParamSpec::number("Min"),
                ParamSpec::number("Max"),
            ])
            .defaults(vec![df.into(), "5".into(), "10".into()])
            .renderer(render_pair_call)
            .parser(parse_pair_call),
        filter(OperationId::ValueType, "Value type")
            .params(vec![ParamSpec::string("Field"), ParamSpec::string("Type")])
            .defaults(vec![df.into(), "".into()])
            .renderer(render_compare)
            .parser(parse_compare),
        filter(OperationId::EqField, "Equal to field")
            .params(vec![ParamSpec::string("Field"), ParamSpec::string("Other field")])
            .defaults(vec![df.into(), "".into()])
            .renderer(render_compare)
            .parser(parse_compare),
        filter(OperationId::LeField, "Less or equal to field")
            .params(vec![ParamSpec::string("Field"), ParamSpec::string("Other field")])
            .defaults(vec![df.into(), "".into()])
            .renderer(render_compare)
            .parser(parse_compare),
        filter(OperationId::LtField, "Less than field")
            .params(vec![ParamSpec::string("Field"), ParamSpec::string("Other field")])
            .defaults(vec![df.into(), "".into()])
            .renderer(render_compare)
            .parser(parse_compare),
        filter(OperationId::Logical, "Logical filter")
            .params(vec![ParamSpec::string("Field"), ParamSpec::string("Query")])
            .defaults(vec![df.into(), "".into()])
            .renderer(render_logical)
            .parser(parse_logical),
        filter(OperationId::Substring, "Substring")
            .params(vec![ParamSpec::string("Field"), ParamSpec::string("Substring")])
            .defaults(vec![df.into(), "".into()])
            .renderer(render_substring)
            .parser(parse_substring),
        filter(OperationId::PatternMatch, "Pattern match")
            .params(vec![ParamSpec::string("Field"), ParamSpec::string("Pattern")])
            .defaults(vec![df.into(), "".into()])
            .renderer(render_pattern_match)
            .parser(parse_pattern_match),
    ]
}

/// Chain a filter onto preceding text. Filters adjacent to other filters are
/// joined by the modeller; reaching here with text means a pipe came first.
pub(super) fn filter_expr(inner: &str, expr: &str) -> String {
    if inner.is_empty() {
        expr.to_string()
    } else {
        format!("{} | filter {}", inner, expr)
    }
}

fn take_offset(s: &Scope, c: &mut TokenCursor<'_>) -> String {
    if c.eat_word("offset") {
        take_value(s, c).unwrap_or_default()
    } else {
        String::new()
    }
}

fn offset_clause(offset: &str) -> String {
    if offset.is_empty() {
        String::new()
    } else {
        format!(" offset {}", offset)
    }
}

fn field_param(s: &Scope, field: Option<&str>) -> ParamValue {
    s.field_or_default(field).into()
}

// ============================================================================
// Word
// ============================================================================

fn render_word(s: &Scope, op: &Operation, inner: &str) -> String {
    let word = op.text(1);
    let mut value = if word.starts_with('$') || word == "*" {
        word
    } else if word.is_empty() {
        "\"\"".to_string()
    } else {
        s.quote(&word)
    };
    if op.flag(3) {
        value.push('*');
    }
    if op.flag(2) {
        value = format!("i({})", value);
    }
    filter_expr(inner, &format!("{}{}", s.field_prefix(&op.text(0)), value))
}

fn parse_word(s: &Scope, c: &mut TokenCursor<'_>, field: Option<&str>) -> Vec<ParamValue> {
    let mut word = String::new();
    let mut case_insensitive = false;
    let mut prefix = false;
    let mut bare = false;

    if let Some(token) = c.advance() {
        match token {
            Token::Colon { value } => word = value.clone(),
            Token::Quote { .. } => word = s.value(token),
            Token::Space { value } => {
                word = value.clone();
                bare = true;
            }
            Token::Bracket(group) if group.prefix == "i" => {
                case_insensitive = true;
                if let Some(first) = group.value.iter().find(|t| t.is_value()) {
                    word = s.value(first);
                    bare = first.is_space();
                }
                prefix = group.value.get(1).is_some_and(|t| t.is_word("*"));
            }
            Token::Bracket(group) if group.prefix.is_empty() => {
                if let Some(first) = group.value.iter().find(|t| t.is_value()) {
                    word = s.value(first);
                }
                prefix = group.value.get(1).is_some_and(|t| t.is_word("*"));
            }
            _ => {}
        }
    }
    if c.eat_word("*") {
        prefix = true;
    }
    if bare && !prefix && word.len() > 1 && word.ends_with('*') && !word.starts_with('*') {
        word.pop();
        prefix = true;
    }

    vec![
        field_param(s, field),
        word.into(),
        case_insensitive.into(),
        prefix.into(),
    ]
}

// ============================================================================
// Time filters
// ============================================================================

fn render_time(_: &Scope, op: &Operation, inner: &str) -> String {
    let expr = format!("_time:{}{}", op.text(0), offset_clause(&op.text(1)));
    filter_expr(inner, &expr)
}

fn parse_time(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let mut value = String::new();
    match c.peek() {
        Some(Token::Bracket(group)) => {
            value = group.source_text();
            c.advance();
        }
        Some(Token::Colon { .. }) => {
            let mut parts = Vec::new();
            while let Some(Token::Colon { value: part }) = c.peek() {
                parts.push(part.clone());
                c.advance();
            }
            if let Some(last) = take_value(s, c) {
                parts.push(last);
            }
            value = parts.join(":");
        }
        Some(token) if token.is_value() => {
            value = s.value(token);
            c.advance();
        }
        _ => {}
    }
    if (value == ">" || value == "<") && c.eat_word("=") {
        value.push('=');
    }
    if matches!(value.as_str(), ">" | "<" | ">=" | "<=") {
        if let Some(rest) = take_value(s, c) {
            value.push_str(&rest);
        }
    }
    let offset = take_offset(s, c);
    vec![value.into(), offset.into()]
}

fn render_day_range(s: &Scope, op: &Operation, inner: &str) -> String {
    render_time_range(s, op, inner, "day_range")
}

fn render_week_range(s: &Scope, op: &Operation, inner: &str) -> String {
    render_time_range(s, op, inner, "week_range")
}

fn render_time_range(s: &Scope, op: &Operation, inner: &str, name: &str) -> String {
    let field = op.text(0);
    let field = if field.is_empty() { "_time".to_string() } else { s.quote(&field) };
    let expr = format!(
        "{}:{}{}{}, {}{}{}",
        field,
        name,
        if op.flag(3) { "[" } else { "(" },
        op.text(1),
        op.text(2),
        if op.flag(4) { "]" } else { ")" },
        offset_clause(&op.text(5)),
    );
    filter_expr(inner, &expr)
}

fn parse_day_range(s: &Scope, c: &mut TokenCursor<'_>, field: Option<&str>) -> Vec<ParamValue> {
    parse_time_range(s, c, field, false)
}

fn parse_week_range(s: &Scope, c: &mut TokenCursor<'_>, field: Option<&str>) -> Vec<ParamValue> {
    parse_time_range(s, c, field, true)
}

fn parse_time_range(
    s: &Scope,
    c: &mut TokenCursor<'_>,
    field: Option<&str>,
    weekdays: bool,
) -> Vec<ParamValue> {
    let field = field.filter(|f| !f.is_empty()).unwrap_or("_time");
    let mut start = String::new();
    let mut end = String::new();
    let mut include_start = false;
    let mut include_end = false;

    if c.peek().is_some_and(Token::is_space) {
        c.advance();
    }
    if let Some(group) = c.peek_bracket() {
        c.advance();
        include_start = group.opens_with('[');
        include_end = group.closes_with(']');
        let parts: Vec<&str> = group.inner().split(',').map(str::trim).collect();
        if let [first, second] = parts.as_slice() {
            start = first.to_string();
            end = second.to_string();
        }
    }
    if weekdays {
        start = expand_weekday(&start);
        end = expand_weekday(&end);
    }
    let offset = take_offset(s, c);

    vec![
        field.into(),
        start.into(),
        end.into(),
        include_start.into(),
        include_end.into(),
        offset.into(),
    ]
}

fn expand_weekday(day: &str) -> String {
    WEEKDAYS
        .iter()
        .find(|(short, _)| short.eq_ignore_ascii_case(day))
        .map(|(_, full)| full.to_string())
        .unwrap_or_else(|| day.to_string())
}

// ============================================================================
// Streams
// ============================================================================

fn render_stream(_: &Scope, op: &Operation, inner: &str) -> String {
    let selectors: Vec<String> = op.params.iter().map(ParamValue::to_text).collect();
    filter_expr(inner, &format!("{{{}}}", selectors.join(", ")))
}

fn parse_stream(_: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let Some(group) = c.peek_bracket() else {
        return vec!["".into()];
    };
    c.advance();
    let selectors = split_top_level_commas(group.inner());
    if selectors.iter().all(|s| s.is_empty()) {
        return vec!["".into()];
    }
    selectors.into_iter().map(ParamValue::from).collect()
}

/// Split on commas outside quotes and brackets, trimming each part.
pub(super) fn split_top_level_commas(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0usize;

    for ch in text.chars() {
        if let Some(open) = quote {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => {
                quote = Some(ch);
                current.push(ch);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    parts.push(current.trim().to_string());
    parts
}

fn render_stream_id(_: &Scope, op: &Operation, inner: &str) -> String {
    filter_expr(inner, &format!("_stream_id:{}", op.text(0)))
}

fn parse_stream_id(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let value = match c.peek() {
        Some(Token::Bracket(group)) => {
            c.advance();
            group.source_text()
        }
        _ => take_value(s, c).unwrap_or_default(),
    };
    vec![value.into()]
}

// ============================================================================
// Regexp, comparison and exact match
// ============================================================================

fn render_regexp(s: &Scope, op: &Operation, inner: &str) -> String {
    let pattern = if op.flag(2) {
        format!("(?i){}", op.text(1))
    } else {
        op.text(1)
    };
    let expr = format!("{}~{}", s.field_prefix(&op.text(0)), s.quote_with(&pattern, true));
    filter_expr(inner, &expr)
}

fn parse_regexp(s: &Scope, c: &mut TokenCursor<'_>, field: Option<&str>) -> Vec<ParamValue> {
    let mut pattern = String::new();
    if c.eat_word("~") {
        pattern = take_value(s, c).unwrap_or_default();
    } else if let Some(rest) = c.peek().and_then(Token::space_value).and_then(|v| v.strip_prefix('~')) {
        pattern = s.unquote(rest);
        c.advance();
    }

    let case_insensitive = pattern.starts_with("(?i)");
    if case_insensitive {
        pattern.drain(..4);
    }
    vec![field_param(s, field), pattern.into(), case_insensitive.into()]
}

fn render_range_comparison(s: &Scope, op: &Operation, inner: &str) -> String {
    let field = op.text(0);
    let field = if field.is_empty() { s.default_field.clone() } else { field };
    let expr = format!("{}:{}{}", s.quote(&field), op.text(1), op.text(2));
    filter_expr(inner, &expr)
}

fn parse_range_comparison(s: &Scope, c: &mut TokenCursor<'_>, field: Option<&str>) -> Vec<ParamValue> {
    let mut operator = "=".to_string();
    let mut value = String::new();

    if let Some(text) = c.peek().and_then(Token::space_value) {
        let split = if text.starts_with(">=") || text.starts_with("<=") {
            Some(2)
        } else if text.starts_with(['>', '<', '=']) {
            Some(1)
        } else {
            None
        };
        if let Some(split) = split {
            c.advance();
            operator = text[..split].to_string();
            value = text[split..].to_string();
            if value.is_empty() {
                if (operator == ">" || operator == "<") && c.eat_word("=") {
                    operator.push('=');
                }
                value = take_value(s, c).unwrap_or_default();
            }
        }
    }
    vec![field_param(s, field), operator.into(), value.into()]
}

fn render_exact(s: &Scope, op: &Operation, inner: &str) -> String {
    let value = op.text(1);
    let mut rendered = if value.starts_with('$') {
        value
    } else if value.is_empty() {
        "\"\"".to_string()
    } else {
        s.quote(&value)
    };
    if op.flag(3) {
        rendered.push('*');
    }
    let expr = format!(
        "{}{}{}",
        s.field_prefix(&op.text(0)),
        if op.flag(2) { "!=" } else { "=" },
        rendered
    );
    filter_expr(inner, &expr)
}

fn parse_exact(s: &Scope, c: &mut TokenCursor<'_>, field: Option<&str>) -> Vec<ParamValue> {
    let not_equal = c.eat_word("!");
    c.eat_word("=");

    let mut value = String::new();
    let mut prefix = false;
    match c.peek() {
        Some(token @ Token::Quote { .. }) => {
            c.advance();
            value = s.value(token);
            prefix = c.eat_word("*");
        }
        Some(Token::Space { value: text }) => {
            c.advance();
            match text.strip_suffix('*') {
                Some(stripped) if !stripped.is_empty() => {
                    value = stripped.to_string();
                    prefix = true;
                }
                _ => value = text.clone(),
            }
        }
        _ => {}
    }
    vec![
        field_param(s, field),
        value.into(),
        not_equal.into(),
        prefix.into(),
    ]
}

// ============================================================================
// Function-call filters
// ============================================================================

fn render_multi_exact(s: &Scope, op: &Operation, inner: &str) -> String {
    let expr = format!("{}in{}", s.field_prefix(&op.text(0)), op.text(1));
    filter_expr(inner, &expr)
}

/// `in(a, b)`, or the older `(="a" OR ="b")` form rewritten to it.
fn parse_multi_exact(s: &Scope, c: &mut TokenCursor<'_>, field: Option<&str>) -> Vec<ParamValue> {
    let values = match take_call(c) {
        Some(group) if group.prefix.is_empty() && check_legacy_multi_exact(&group.value) => {
            let values: Vec<String> = parse_legacy_multi_exact(&group.value)
                .iter()
                .map(|v| s.quote_or_empty(v))
                .collect();
            format!("({})", values.join(", "))
        }
        Some(group) => group.raw_value.clone(),
        None => "()".to_string(),
    };
    vec![field_param(s, field), values.into()]
}

fn render_contains(s: &Scope, op: &Operation, inner: &str) -> String {
    let expr = format!("{}{}{}", s.field_prefix(&op.text(0)), op.id, op.text(1));
    filter_expr(inner, &expr)
}

fn parse_contains(s: &Scope, c: &mut TokenCursor<'_>, field: Option<&str>) -> Vec<ParamValue> {
    let values = take_call(c)
        .map(|group| group.raw_value.clone())
        .unwrap_or_else(|| "()".to_string());
    vec![field_param(s, field), values.into()]
}

fn render_sequence(s: &Scope, op: &Operation, inner: &str) -> String {
    let phrases: Vec<String> = op
        .params
        .iter()
        .skip(1)
        .map(|p| s.quote_or_empty(&p.to_text()))
        .collect();
    let expr = format!("{}seq({})", s.field_prefix(&op.text(0)), phrases.join(", "));
    filter_expr(inner, &expr)
}

fn parse_sequence(s: &Scope, c: &mut TokenCursor<'_>, field: Option<&str>) -> Vec<ParamValue> {
    let mut params = vec![field_param(s, field)];
    if let Some(group) = take_call(c) {
        params.extend(
            get_values_from_brackets(&group.value, s)
                .into_iter()
                .map(ParamValue::from),
        );
    }
    if params.len() == 1 {
        params.push("".into());
    }
    params
}

fn render_range(s: &Scope, op: &Operation, inner: &str) -> String {
    let expr = format!(
        "{}range{}{}, {}{}",
        s.field_prefix(&op.text(0)),
        if op.flag(3) { "[" } else { "(" },
        op.text(1),
        op.text(2),
        if op.flag(4) { "]" } else { ")" },
    );
    filter_expr(inner, &expr)
}

fn parse_range(s: &Scope, c: &mut TokenCursor<'_>, field: Option<&str>) -> Vec<ParamValue> {
    let mut params = vec![
        field_param(s, field),
        ParamValue::int(0),
        ParamValue::int(0),
        false.into(),
        false.into(),
    ];
    if let Some(group) = take_call(c) {
        let values = get_values_from_brackets(&group.value, s);
        if let [lower, upper] = values.as_slice() {
            params[1] = lower.as_str().into();
            params[2] = upper.as_str().into();
        }
        params[3] = group.opens_with('[').into();
        params[4] = group.closes_with(']').into();
    }
    params
}

/// `ipv4_range`, `string_range` and `len_range`: one or two arguments.
fn render_pair_call(s: &Scope, op: &Operation, inner: &str) -> String {
    let quote_args = op.id == OperationId::StringRange;
    let arg = |i: usize| {
        let text = op.text(i);
        if quote_args { s.quote_or_empty(&text) } else { text }
    };
    let args = if op.id == OperationId::Ipv4Range && op.text(2).is_empty() {
        arg(1)
    } else {
        format!("{}, {}", arg(1), arg(2))
    };
    let expr = format!("{}{}({})", s.field_prefix(&op.text(0)), op.id, args);
    filter_expr(inner, &expr)
}

fn parse_pair_call(s: &Scope, c: &mut TokenCursor<'_>, field: Option<&str>) -> Vec<ParamValue> {
    let mut params = vec![field_param(s, field), "".into(), "".into()];
    if let Some(group) = take_call(c) {
        for (i, value) in get_values_from_brackets(&group.value, s).into_iter().take(2).enumerate() {
            params[i + 1] = value.into();
        }
    }
    params
}

/// `value_type`, `eq_field`, `le_field` and `lt_field`.
fn render_compare(s: &Scope, op: &Operation, inner: &str) -> String {
    let arg = if op.id == OperationId::ValueType {
        op.text(1)
    } else {
        s.quote(&op.text(1))
    };
    let expr = format!("{}{}({})", s.field_prefix(&op.text(0)), op.id, arg);
    filter_expr(inner, &expr)
}

fn parse_compare(s: &Scope, c: &mut TokenCursor<'_>, field: Option<&str>) -> Vec<ParamValue> {
    let value = take_call(c)
        .and_then(|group| get_values_from_brackets(&group.value, s).into_iter().next())
        .unwrap_or_default();
    vec![field_param(s, field), value.into()]
}

fn render_logical(s: &Scope, op: &Operation, inner: &str) -> String {
    let expr = format!("{}({})", s.field_prefix(&op.text(0)), op.text(1));
    filter_expr(inner, &expr)
}

fn parse_logical(s: &Scope, c: &mut TokenCursor<'_>, field: Option<&str>) -> Vec<ParamValue> {
    let query = c
        .peek_bracket()
        .map(|group| group.inner().to_string())
        .unwrap_or_default();
    if c.peek().is_some_and(Token::is_bracket) {
        c.advance();
    }
    vec![field_param(s, field), query.into()]
}

// ============================================================================
// Substring and pattern match
// ============================================================================

fn render_substring(s: &Scope, op: &Operation, inner: &str) -> String {
    let expr = format!("{}*{}*", s.field_prefix(&op.text(0)), s.quote(&op.text(1)));
    filter_expr(inner, &expr)
}

/// True when the cursor sits on `*text*` or `* "text" *` with non-empty
/// text. `***` and `* "" *` stay word filters.
pub(crate) fn is_substring_start(c: &TokenCursor<'_>) -> bool {
    match c.peek().and_then(Token::space_value) {
        Some("*") => {
            c.peek_nth(1)
                .is_some_and(|t| t.is_quote() && !t.get_value().is_empty())
                && c.peek_nth(2).is_some_and(|t| t.is_word("*"))
        }
        Some(text) => {
            text.len() > 2
                && text.starts_with('*')
                && text.ends_with('*')
                && !text.trim_matches('*').is_empty()
        }
        None => false,
    }
}

fn parse_substring(s: &Scope, c: &mut TokenCursor<'_>, field: Option<&str>) -> Vec<ParamValue> {
    let mut text = String::new();
    if let Some(word) = c.peek().and_then(Token::space_value) {
        if word == "*" {
            c.advance();
            text = take_value(s, c).unwrap_or_default();
            c.eat_word("*");
        } else {
            text = word.trim_matches('*').to_string();
            c.advance();
        }
    }
    vec![field_param(s, field), text.into()]
}

fn render_pattern_match(s: &Scope, op: &Operation, inner: &str) -> String {
    let expr = format!(
        "{}pattern_match({})",
        s.field_prefix(&op.text(0)),
        s.quote_with(&op.text(1), true)
    );
    filter_expr(inner, &expr)
}

fn parse_pattern_match(s: &Scope, c: &mut TokenCursor<'_>, field: Option<&str>) -> Vec<ParamValue> {
    parse_compare(s, c, field)
}
