use std::sync::Arc;

use crate::ast::{Category, Operation, OperationId, ParamValue, Token};
use crate::cursor::TokenCursor;
use crate::lexer::build_split_string;

use super::common::{take_call, take_group, take_keyword_group, take_value};
use super::{
    OperationDefinition, ParamSpec, Scope, condition_clause, define, get_condition_from_string,
    get_field_list, number_or, parse_int, parse_number, pipe_expr,
};

pub(super) fn definitions(scope: &Arc<Scope>) -> Vec<OperationDefinition> {
    let df = scope.default_field.as_str();
    let pipe = |id, name| define(scope, id, name, Category::Pipes);

    vec![
        pipe(OperationId::BlockStats, "Block stats").renderer(render_keyword),
        pipe(OperationId::BlocksCount, "Blocks count").renderer(render_keyword),
        pipe(OperationId::CollapseNums, "Collapse nums")
            .params(vec![
                ParamSpec::string("Field"),
                ParamSpec::boolean("Prettify"),
                ParamSpec::string("Condition").optional(),
            ])
            .defaults(vec![df.into(), false.into(), "".into()])
            .renderer(render_collapse_nums)
            .parser(parse_collapse_nums),
        pipe(OperationId::Copy, "Copy")
            .params(vec![ParamSpec::string("Field mapping").rest()])
            .defaults(vec!["\"\" as \"\"".into()])
            .renderer(render_field_map)
            .parser(parse_field_map_list),
        pipe(OperationId::Decolorize, "Decolorize")
            .params(vec![ParamSpec::string("Field")])
            .defaults(vec![df.into()])
            .renderer(render_decolorize)
            .parser(parse_decolorize),
        pipe(OperationId::Delete, "Delete")
            .params(vec![ParamSpec::string("Fields")])
            .defaults(vec!["".into()])
            .renderer(render_field_selection)
            .parser(parse_prefix_field_list),
        pipe(OperationId::DropEmptyFields, "Drop empty fields").renderer(render_keyword),
        pipe(OperationId::Extract, "Extract")
            .params(extract_params())
            .defaults(vec![df.into(), "".into(), false.into(), false.into(), "".into()])
            .renderer(render_extract)
            .parser(parse_extract),
        pipe(OperationId::ExtractRegexp, "Extract regexp")
            .params(extract_params())
            .defaults(vec![df.into(), "".into(), false.into(), false.into(), "".into()])
            .renderer(render_extract)
            .parser(parse_extract),
        pipe(OperationId::Facets, "Facets")
            .params(vec![
                ParamSpec::number("Limit"),
                ParamSpec::number("Max values per field"),
                ParamSpec::number("Max value length"),
                ParamSpec::boolean("Keep const fields"),
            ])
            .defaults(vec![
                ParamValue::int(0),
                ParamValue::int(0),
                ParamValue::int(0),
                false.into(),
            ])
            .renderer(render_facets)
            .parser(parse_facets),
        pipe(OperationId::FieldNames, "Field names").renderer(render_keyword),
        pipe(OperationId::FieldValues, "Field values")
            .params(vec![ParamSpec::string("Field"), ParamSpec::number("Limit")])
            .defaults(vec![df.into(), ParamValue::int(0)])
            .renderer(render_field_values)
            .parser(parse_field_values),
        pipe(OperationId::Fields, "Fields")
            .params(vec![ParamSpec::string("Fields")])
            .defaults(vec!["".into()])
            .renderer(render_field_selection)
            .parser(parse_prefix_field_list),
        pipe(OperationId::First, "First")
            .params(first_last_params())
            .defaults(vec![ParamValue::int(3), "".into(), false.into(), "".into()])
            .renderer(render_first_last)
            .parser(parse_first_last),
        pipe(OperationId::Format, "Format")
            .params(vec![
                ParamSpec::string("Format"),
                ParamSpec::string("Result field"),
                ParamSpec::string("Condition").optional(),
            ])
            .defaults(vec!["".into(), df.into(), "".into()])
            .renderer(render_format)
            .parser(parse_format),
        pipe(OperationId::Join, "Join")
            .params(vec![
                ParamSpec::string("Fields"),
                ParamSpec::string("Subquery"),
                ParamSpec::string("Prefix").optional(),
                ParamSpec::boolean("Inner"),
            ])
            .defaults(vec!["".into(), "".into(), "".into(), false.into()])
            .renderer(render_join)
            .parser(parse_join),
        pipe(OperationId::JsonArrayLen, "JSON array length")
            .params(len_params())
            .defaults(vec!["".into(), "".into()])
            .renderer(render_len)
            .parser(parse_len),
        pipe(OperationId::Hash, "Hash")
            .params(len_params())
            .defaults(vec!["".into(), "".into()])
            .renderer(render_len)
            .parser(parse_len),
        pipe(OperationId::Last, "Last")
            .params(first_last_params())
            .defaults(vec![ParamValue::int(0), "".into(), false.into(), "".into()])
            .renderer(render_first_last)
            .parser(parse_first_last),
        pipe(OperationId::Len, "Length")
            .params(len_params())
            .defaults(vec!["".into(), "".into()])
            .renderer(render_len)
            .parser(parse_len),
        pipe(OperationId::Limit, "Limit")
            .params(vec![ParamSpec::number("Limit")])
            .defaults(vec![ParamValue::int(10)])
            .renderer(render_single_number)
            .parser(parse_limit),
        pipe(OperationId::Math, "Math")
            .params(vec![ParamSpec::string("Expression").rest()])
            .defaults(vec!["".into()])
            .renderer(render_math)
            .parser(parse_math),
        pipe(OperationId::Offset, "Offset")
            .params(vec![ParamSpec::number("Offset")])
            .defaults(vec![ParamValue::int(0)])
            .renderer(render_single_number)
            .parser(parse_offset),
        pipe(OperationId::PackJson, "Pack JSON")
            .params(pack_params())
            .defaults(vec!["".into(), df.into()])
            .renderer(render_pack)
            .parser(parse_pack),
        pipe(OperationId::PackLogfmt, "Pack logfmt")
            .params(pack_params())
            .defaults(vec!["".into(), df.into()])
            .renderer(render_pack)
            .parser(parse_pack),
        pipe(OperationId::Rename, "Rename")
            .params(vec![ParamSpec::string("Field mapping").rest()])
            .defaults(vec!["".into()])
            .renderer(render_field_map)
            .parser(parse_field_map_list),
        pipe(OperationId::Replace, "Replace")
            .params(replace_params())
            .defaults(replace_defaults(df))
            .renderer(render_replace)
            .parser(parse_replace),
        pipe(OperationId::ReplaceRegexp, "Replace regexp")
            .params(replace_params())
            .defaults(replace_defaults(df))
            .renderer(render_replace)
            .parser(parse_replace),
        pipe(OperationId::Sample, "Sample")
            .params(vec![ParamSpec::number("Sample")])
            .defaults(vec![ParamValue::int(1)])
            .renderer(render_single_number)
            .parser(parse_sample),
        pipe(OperationId::Sort, "Sort")
            .params(vec![
                ParamSpec::string("Fields"),
                ParamSpec::boolean("Desc"),
                ParamSpec::number("Limit"),
                ParamSpec::number("Offset"),
                ParamSpec::string("Partition by").optional(),
            ])
            .defaults(vec![
                "".into(),
                false.into(),
                ParamValue::int(0),
                ParamValue::int(0),
                "".into(),
            ])
            .renderer(render_sort)
            .parser(parse_sort),
        pipe(OperationId::Stats, "Stats")
            .params(vec![ParamSpec::string("By"), ParamSpec::string("Functions")])
            .defaults(vec!["".into(), "".into()])
            .renderer(render_stats)
            .parser(parse_stats),
        pipe(OperationId::StreamContext, "Stream context")
            .params(vec![
                ParamSpec::number("Before"),
                ParamSpec::number("After"),
                ParamSpec::string("Time window"),
            ])
            .defaults(vec![ParamValue::int(0), ParamValue::int(0), "1h".into()])
            .renderer(render_stream_context)
            .parser(parse_stream_context),
        pipe(OperationId::TimeAdd, "Time add")
            .params(vec![ParamSpec::string("Duration"), ParamSpec::string("Field").optional()])
            .defaults(vec!["1h".into(), "".into()])
            .renderer(render_time_add)
            .parser(parse_time_add),
        pipe(OperationId::Top, "Top")
            .params(vec![
                ParamSpec::number("Limit"),
                ParamSpec::string("Fields"),
                ParamSpec::string("Hits field").optional(),
                ParamSpec::boolean("Rank"),
                ParamSpec::string("Rank field"),
                ParamSpec::string("Partition by").optional(),
            ])
            .defaults(vec![
                ParamValue::int(10),
                "".into(),
                "".into(),
                false.into(),
                "rank".into(),
                "".into(),
            ])
            .renderer(render_top)
            .parser(parse_top),
        pipe(OperationId::Union, "Union")
            .params(vec![ParamSpec::string("Subquery")])
            .defaults(vec!["".into()])
            .renderer(render_union)
            .parser(parse_union),
        pipe(OperationId::Uniq, "Uniq")
            .params(vec![
                ParamSpec::string("Fields"),
                ParamSpec::boolean("With hits"),
                ParamSpec::number("Limit"),
            ])
            .defaults(vec!["".into(), false.into(), ParamValue::int(0)])
            .renderer(render_uniq)
            .parser(parse_uniq),
        pipe(OperationId::UnpackJson, "Unpack JSON")
            .params(unpack_params(false))
            .defaults(vec![df.into(), "".into(), "".into(), false.into(), false.into(), "".into()])
            .renderer(render_unpack)
            .parser(parse_unpack),
        pipe(OperationId::UnpackLogfmt, "Unpack logfmt")
            .params(unpack_params(false))
            .defaults(vec![df.into(), "".into(), "".into(), false.into(), false.into(), "".into()])
            .renderer(render_unpack)
            .parser(parse_unpack),
        pipe(OperationId::UnpackSyslog, "Unpack syslog")
            .params(unpack_params(true))
            .defaults(vec![df.into(), "".into(), "".into(), false.into(), "".into(), "".into()])
            .renderer(render_unpack)
            .parser(parse_unpack_syslog),
        pipe(OperationId::UnpackWords, "Unpack words")
            .params(vec![
                ParamSpec::string("From field"),
                ParamSpec::string("Result field").optional(),
                ParamSpec::boolean("Drop duplicates"),
            ])
            .defaults(vec![df.into(), "".into(), false.into()])
            .renderer(render_unpack_words)
            .parser(parse_unpack_words),
        pipe(OperationId::Unroll, "Unroll")
            .params(vec![ParamSpec::string("Fields"), ParamSpec::string("Condition").optional()])
            .defaults(vec!["".into(), "".into()])
            .renderer(render_unroll)
            .parser(parse_unroll),
    ]
}

fn extract_params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::string("From field"),
        ParamSpec::string("Pattern"),
        ParamSpec::boolean("Keep original fields"),
        ParamSpec::boolean("Skip empty results"),
        ParamSpec::string("Condition").optional(),
    ]
}

fn first_last_params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::number("Limit"),
        ParamSpec::string("Fields"),
        ParamSpec::boolean("Desc"),
        ParamSpec::string("Partition by").optional(),
    ]
}

fn len_params() -> Vec<ParamSpec> {
    vec![ParamSpec::string("Field"), ParamSpec::string("Result field")]
}

fn pack_params() -> Vec<ParamSpec> {
    vec![ParamSpec::string("Fields").optional(), ParamSpec::string("Result field")]
}

fn replace_params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::string("Field"),
        ParamSpec::string("Old"),
        ParamSpec::string("New"),
        ParamSpec::number("Limit"),
        ParamSpec::string("Condition").optional(),
    ]
}

fn replace_defaults(df: &str) -> Vec<ParamValue> {
    vec![df.into(), "".into(), "".into(), ParamValue::int(0), "".into()]
}

fn unpack_params(syslog: bool) -> Vec<ParamSpec> {
    let mut params = vec![
        ParamSpec::string("From field"),
        ParamSpec::string("Fields").optional(),
        ParamSpec::string("Result prefix").optional(),
        ParamSpec::boolean("Keep original fields"),
    ];
    if syslog {
        params.push(ParamSpec::string("Condition").optional());
        params.push(ParamSpec::string("Offset").optional());
    } else {
        params.push(ParamSpec::boolean("Skip empty results"));
        params.push(ParamSpec::string("Condition").optional());
    }
    params
}

fn positive(op: &Operation, index: usize) -> Option<String> {
    op.param(index)
        .filter(|p| p.as_decimal().is_sign_positive() && !p.as_decimal().is_zero())
        .map(ParamValue::to_text)
}

fn non_empty(text: String) -> Option<String> {
    Some(text).filter(|t| !t.is_empty())
}

/// Join tokens as source text without a space before commas.
fn compact_source(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        let text = build_split_string(std::slice::from_ref(token));
        if text.is_empty() {
            continue;
        }
        if !out.is_empty() && text != "," {
            out.push(' ');
        }
        out.push_str(&text);
    }
    out
}

fn render_keyword(_: &Scope, op: &Operation, inner: &str) -> String {
    pipe_expr(inner, op.id.as_str())
}

// ============================================================================
// Field selection and mapping
// ============================================================================

fn render_field_selection(_: &Scope, op: &Operation, inner: &str) -> String {
    let expr = format!("{} {}", op.id, op.text(0));
    pipe_expr(inner, expr.trim_end())
}

/// `a, "b c", prefix*` with original quoting kept.
fn parse_prefix_field_list(_: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let mut fields = Vec::new();
    while let Some(token) = c.peek() {
        match token {
            Token::Space { value } if value != "," => {
                fields.push(value.clone());
                c.advance();
            }
            Token::Quote { value } => {
                let mut field = value.clone();
                c.advance();
                if c.eat_word("*") {
                    field.push('*');
                }
                fields.push(field);
            }
            _ => break,
        }
        if !c.eat_text(",") {
            break;
        }
    }
    vec![fields.join(", ").into()]
}

fn render_field_map(_: &Scope, op: &Operation, inner: &str) -> String {
    let mappings: Vec<String> = op
        .params
        .iter()
        .map(ParamValue::to_text)
        .filter(|m| !m.is_empty())
        .collect();
    if mappings.is_empty() && op.id == OperationId::Rename {
        return inner.to_string();
    }
    pipe_expr(inner, &format!("{} {}", op.id, mappings.join(", ")))
}

/// `src as dst, src2 dst2`: each entry is stored as `src as dst`.
fn parse_field_map_list(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let mut mappings: Vec<ParamValue> = Vec::new();
    while let Some(token) = c.peek() {
        if token.text_is(",") {
            c.advance();
            if c.is_empty() {
                mappings.push("".into());
            }
            continue;
        }
        let Some(from) = take_value(s, c) else {
            break;
        };
        c.eat_word("as");
        let to = take_value(s, c).unwrap_or_default();
        mappings.push(format!("{} as {}", s.quote_or_empty(&from), s.quote_or_empty(&to)).into());
        if !c.peek_text_is(",") {
            break;
        }
    }
    if mappings.is_empty() {
        mappings.push("".into());
    }
    mappings
}

fn render_decolorize(s: &Scope, op: &Operation, inner: &str) -> String {
    let field = op.text(0);
    if s.is_default_field(&field) {
        pipe_expr(inner, "decolorize")
    } else {
        pipe_expr(inner, &format!("decolorize {}", s.quote(&field)))
    }
}

fn parse_decolorize(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let field = take_value(s, c).unwrap_or_else(|| s.default_field.clone());
    vec![field.into()]
}

// ============================================================================
// Extraction and formatting
// ============================================================================

fn render_extract(s: &Scope, op: &Operation, inner: &str) -> String {
    let mut expr = format!(
        "{}{} {}",
        op.id,
        condition_clause(&op.text(4)),
        s.quote_with(&op.text(1), true)
    );
    let field = op.text(0);
    if !s.is_default_field(&field) {
        expr.push_str(&format!(" from {}", s.quote(&field)));
    }
    if op.flag(2) {
        expr.push_str(" keep_original_fields");
    }
    if op.flag(3) {
        expr.push_str(" skip_empty_results");
    }
    pipe_expr(inner, &expr)
}

fn parse_extract(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let condition = get_condition_from_string(c);
    let mut params = vec![
        s.default_field.clone().into(),
        "".into(),
        false.into(),
        false.into(),
        condition.into(),
    ];
    let Some(pattern) = c.peek().filter(|t| t.is_quote()) else {
        return params;
    };
    params[1] = s.value(pattern).into();
    c.advance();

    if c.eat_word("from") {
        if let Some(field) = take_value(s, c) {
            params[0] = field.into();
        }
    }
    for _ in 0..2 {
        if c.eat_word("keep_original_fields") {
            params[2] = true.into();
        } else if c.eat_word("skip_empty_results") {
            params[3] = true.into();
        }
    }
    params
}

fn render_format(s: &Scope, op: &Operation, inner: &str) -> String {
    let condition = op.text(2);
    let mut expr = String::from("format ");
    if !condition.is_empty() {
        expr.push_str(&format!("if ({}) ", condition));
    }
    expr.push_str(&s.quote_with(&op.text(0), true));
    let field = op.text(1);
    if !s.is_default_field(&field) {
        expr.push_str(&format!(" as {}", s.quote(&field)));
    }
    pipe_expr(inner, &expr)
}

fn parse_format(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let condition = get_condition_from_string(c);
    let mut format = String::new();
    let mut field = s.default_field.clone();
    if let Some(token) = c.peek().filter(|t| t.is_quote()) {
        format = s.value(token);
        c.advance();
        if c.eat_word("as") {
            field = take_value(s, c).unwrap_or(field);
        }
    }
    vec![format.into(), field.into(), condition.into()]
}

fn render_collapse_nums(s: &Scope, op: &Operation, inner: &str) -> String {
    let mut expr = format!("collapse_nums{}", condition_clause(&op.text(2)));
    let field = op.text(0);
    if !s.is_default_field(&field) {
        expr.push_str(&format!(" at {}", s.quote(&field)));
    }
    if op.flag(1) {
        expr.push_str(" prettify");
    }
    pipe_expr(inner, &expr)
}

fn parse_collapse_nums(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let condition = get_condition_from_string(c);
    let mut field = s.default_field.clone();
    let mut prettify = false;
    for _ in 0..2 {
        if c.eat_word("at") {
            field = take_value(s, c).unwrap_or(field);
        } else if c.eat_word("prettify") {
            prettify = true;
        }
    }
    vec![field.into(), prettify.into(), condition.into()]
}

// ============================================================================
// Aggregating pipes
// ============================================================================

fn render_facets(_: &Scope, op: &Operation, inner: &str) -> String {
    let mut expr = String::from("facets");
    if let Some(limit) = positive(op, 0) {
        expr.push_str(&format!(" {}", limit));
    }
    if let Some(max) = positive(op, 1) {
        expr.push_str(&format!(" max_values_per_field {}", max));
    }
    if let Some(max) = positive(op, 2) {
        expr.push_str(&format!(" max_value_len {}", max));
    }
    if op.flag(3) {
        expr.push_str(" keep_const_fields");
    }
    pipe_expr(inner, &expr)
}

fn parse_facets(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let mut params = vec![
        ParamValue::int(0),
        ParamValue::int(0),
        ParamValue::int(0),
        false.into(),
    ];
    if let Some(limit) = parse_number(c.peek(), s) {
        params[0] = limit.into();
        c.advance();
    }
    for _ in 0..3 {
        if c.eat_word("max_values_per_field") {
            params[1] = number_or(c.peek(), s, 0);
            c.advance();
        } else if c.eat_word("max_value_len") {
            params[2] = number_or(c.peek(), s, 50);
            c.advance();
        } else if c.eat_word("keep_const_fields") {
            params[3] = true.into();
        }
    }
    params
}

fn render_field_values(s: &Scope, op: &Operation, inner: &str) -> String {
    let mut expr = format!("field_values {}", s.quote(&op.text(0)));
    if let Some(limit) = positive(op, 1) {
        expr.push_str(&format!(" limit {}", limit));
    }
    pipe_expr(inner, &expr)
}

fn parse_field_values(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let field = take_value(s, c).unwrap_or_else(|| s.default_field.clone());
    let mut limit = ParamValue::int(0);
    if c.eat_word("limit") {
        limit = number_or(c.peek(), s, 0);
        c.advance();
    }
    vec![field.into(), limit]
}

fn render_first_last(_: &Scope, op: &Operation, inner: &str) -> String {
    let mut expr = op.id.to_string();
    if let Some(limit) = positive(op, 0) {
        expr.push_str(&format!(" {}", limit));
    }
    expr.push_str(&format!(" by ({})", op.text(1)));
    if op.flag(2) {
        expr.push_str(" desc");
    }
    if let Some(partition) = non_empty(op.text(3)) {
        expr.push_str(&format!(" partition by ({})", partition));
    }
    pipe_expr(inner, &expr)
}

fn parse_first_last(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let mut params = vec![ParamValue::int(0), "".into(), false.into(), "".into()];
    if let Some(limit) = parse_number(c.peek(), s) {
        params[0] = limit.into();
        c.advance();
    }
    let group = take_keyword_group(c, "by").or_else(|| take_group(c));
    if let Some(group) = group {
        params[1] = group.inner().trim().into();
    }
    if c.eat_word("desc") {
        params[2] = true.into();
    }
    if c.eat_word("partition") {
        if let Some(group) = take_keyword_group(c, "by") {
            params[3] = group.inner().trim().into();
        }
    }
    params
}

fn render_sort(_: &Scope, op: &Operation, inner: &str) -> String {
    let mut expr = format!("sort by ({})", op.text(0));
    if op.flag(1) {
        expr.push_str(" desc");
    }
    if let Some(partition) = non_empty(op.text(4)) {
        expr.push_str(&format!(" partition by ({})", partition));
    }
    if let Some(limit) = positive(op, 2) {
        expr.push_str(&format!(" limit {}", limit));
    }
    if let Some(offset) = positive(op, 3) {
        expr.push_str(&format!(" offset {}", offset));
    }
    pipe_expr(inner, &expr)
}

fn parse_sort(_: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let mut params = vec![
        "".into(),
        false.into(),
        ParamValue::int(0),
        ParamValue::int(0),
        "".into(),
    ];
    let group = take_keyword_group(c, "by").or_else(|| take_group(c));
    let Some(group) = group else {
        return params;
    };
    params[0] = group.inner().trim().into();

    loop {
        if c.eat_word("partition") {
            if let Some(group) = take_keyword_group(c, "by") {
                params[4] = build_split_string(&group.value).into();
            }
        } else if c.eat_word("limit") {
            let limit = c.advance().and_then(Token::text).and_then(parse_int);
            params[2] = ParamValue::int(limit.unwrap_or(0));
        } else if c.eat_word("offset") {
            let offset = c.advance().and_then(Token::text).and_then(parse_int);
            params[3] = ParamValue::int(offset.unwrap_or(0));
        } else if c.eat_word("desc") {
            params[1] = true.into();
        } else if c.eat_word("asc") {
            params[1] = false.into();
        } else {
            break;
        }
    }
    params
}

fn render_stats(_: &Scope, op: &Operation, inner: &str) -> String {
    let mut expr = String::from("stats");
    if let Some(by) = non_empty(op.text(0)) {
        expr.push_str(&format!(" by ({})", by));
    }
    if let Some(functions) = non_empty(op.text(1)) {
        expr.push(' ');
        expr.push_str(&functions);
    }
    pipe_expr(inner, &expr)
}

/// Keeps the function list as text; it is parsed further by a stats-only
/// modeller when edited.
fn parse_stats(_: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let by = take_keyword_group(c, "by")
        .or_else(|| take_group(c))
        .map(|group| group.inner().trim().to_string())
        .unwrap_or_default();
    let functions = compact_source(c.remaining());
    c.advance_by(c.remaining_len());
    vec![by.into(), functions.into()]
}

fn render_top(s: &Scope, op: &Operation, inner: &str) -> String {
    let mut expr = String::from("top ");
    let limit = op.int(0);
    if limit != 10 && limit > 0 {
        expr.push_str(&format!("{} ", op.text(0)));
    }
    expr.push_str(&format!("by ({})", op.text(1)));
    if let Some(partition) = non_empty(op.text(5)) {
        expr.push_str(&format!(" partition by ({})", partition));
    }
    if let Some(hits) = non_empty(op.text(2)) {
        expr.push_str(&format!(" hits as {}", s.quote(&hits)));
    }
    if op.flag(3) {
        expr.push_str(" rank");
        let rank = op.text(4);
        if !rank.is_empty() && rank != "rank" {
            expr.push_str(&format!(" as {}", s.quote(&rank)));
        }
    }
    pipe_expr(inner, &expr)
}

fn parse_top(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let mut params = vec![
        ParamValue::int(10),
        "".into(),
        "".into(),
        false.into(),
        "rank".into(),
        "".into(),
    ];
    if let Some(limit) = parse_number(c.peek(), s) {
        params[0] = limit.into();
        c.advance();
    }
    let fields = match take_keyword_group(c, "by").or_else(|| take_group(c)) {
        Some(group) => group.inner().trim().to_string(),
        None => {
            c.eat_word("by");
            get_field_list(c)
        }
    };
    params[1] = fields.into();

    loop {
        if c.eat_word("partition") {
            if let Some(group) = take_keyword_group(c, "by") {
                params[5] = group.inner().trim().into();
            }
        } else if c.eat_word("hits") {
            c.eat_word("as");
            params[2] = take_value(s, c).unwrap_or_default().into();
        } else if c.peek_is_word("rank") || c.peek_is_word("with") {
            c.eat_word("with");
            c.eat_word("rank");
            params[3] = true.into();
            if c.eat_word("as") {
                params[4] = take_value(s, c).unwrap_or_else(|| "rank".into()).into();
            }
        } else {
            break;
        }
    }
    params
}

fn render_uniq(_: &Scope, op: &Operation, inner: &str) -> String {
    let mut expr = format!("uniq by ({})", op.text(0));
    if op.flag(1) {
        expr.push_str(" with hits");
    }
    if let Some(limit) = positive(op, 2) {
        expr.push_str(&format!(" limit {}", limit));
    }
    pipe_expr(inner, &expr)
}

fn parse_uniq(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let fields = match take_keyword_group(c, "by").or_else(|| take_group(c)) {
        Some(group) => group.inner().trim().to_string(),
        None => {
            c.eat_word("by");
            get_field_list(c)
        }
    };
    let mut params = vec![fields.into(), false.into(), ParamValue::int(0)];
    for _ in 0..2 {
        if c.eat_word("with") {
            if c.eat_word("hits") {
                params[1] = true.into();
            }
        } else if c.eat_word("hits") {
            params[1] = true.into();
        } else if c.eat_word("limit") {
            params[2] = number_or(c.peek(), s, 0);
            c.advance();
        }
    }
    params
}

fn render_stream_context(_: &Scope, op: &Operation, inner: &str) -> String {
    let mut expr = String::from("stream_context");
    if let Some(before) = positive(op, 0) {
        expr.push_str(&format!(" before {}", before));
    }
    if let Some(after) = positive(op, 1) {
        expr.push_str(&format!(" after {}", after));
    }
    let window = op.text(2);
    if !window.is_empty() && window != "1h" {
        expr.push_str(&format!(" time_window {}", window));
    }
    pipe_expr(inner, &expr)
}

fn parse_stream_context(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let mut params = vec![ParamValue::int(0), ParamValue::int(0), "1h".into()];
    for _ in 0..3 {
        if c.remaining_len() < 2 {
            break;
        }
        if c.eat_word("before") {
            params[0] = number_or(c.peek(), s, 0);
            c.advance();
        } else if c.eat_word("after") {
            params[1] = number_or(c.peek(), s, 0);
            c.advance();
        } else if c.eat_word("time_window") {
            params[2] = take_value(s, c).unwrap_or_else(|| "1h".into()).into();
        }
    }
    params
}

// ============================================================================
// Computed fields
// ============================================================================

fn render_len(s: &Scope, op: &Operation, inner: &str) -> String {
    let mut expr = format!("{}({})", op.id, s.quote(&op.text(0)));
    if let Some(result) = non_empty(op.text(1)) {
        expr.push_str(&format!(" as {}", s.quote(&result)));
    }
    pipe_expr(inner, &expr)
}

/// The keyword is not consumed by the driver; it is the call prefix here.
fn parse_len(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let mut field = String::new();
    let mut result = String::new();
    if let Some(group) = take_call(c) {
        field = group
            .value
            .iter()
            .find(|t| t.is_value())
            .map(|t| s.value(t))
            .unwrap_or_default();
        if c.eat_word("as") {
            result = take_value(s, c).unwrap_or_default();
        }
    }
    vec![field.into(), result.into()]
}

fn render_math(_: &Scope, op: &Operation, inner: &str) -> String {
    let expressions: Vec<String> = op.params.iter().map(ParamValue::to_text).collect();
    pipe_expr(inner, &format!("math {}", expressions.join(", ")))
}

/// `expr as field, expr2 as field2`: each entry is stored as `expr as field`.
fn parse_math(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let mut entries: Vec<ParamValue> = Vec::new();
    let mut parts: Vec<String> = Vec::new();
    let mut finished = false;

    while let Some(token) = c.peek() {
        if !finished {
            match token {
                Token::Space { value } if value == "as" => {
                    c.advance();
                    finished = true;
                }
                Token::Space { value } if value == "," => finished = true,
                Token::Space { value } | Token::Quote { value } => {
                    parts.push(value.clone());
                    c.advance();
                }
                Token::Bracket(group) => {
                    parts.push(group.source_text());
                    c.advance();
                }
                _ => break,
            }
            continue;
        }

        let field = take_value(s, c).unwrap_or_default();
        entries.push(format!("{} as {}", parts.join(" "), s.quote_or_empty(&field)).into());
        parts.clear();
        finished = false;
        if !c.eat_text(",") {
            break;
        }
        if c.is_empty() {
            entries.push("".into());
        }
    }
    if finished || !parts.is_empty() {
        entries.push(format!("{} as \"\"", parts.join(" ")).into());
    }
    if entries.is_empty() {
        entries.push("".into());
    }
    entries
}

fn render_pack(s: &Scope, op: &Operation, inner: &str) -> String {
    let mut expr = op.id.to_string();
    if let Some(fields) = non_empty(op.text(0)) {
        expr.push_str(&format!(" fields ({})", fields));
    }
    let result = op.text(1);
    if !s.is_default_field(&result) {
        expr.push_str(&format!(" as {}", s.quote(&result)));
    }
    pipe_expr(inner, &expr)
}

fn parse_pack(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let mut fields = String::new();
    let mut result = s.default_field.clone();
    for _ in 0..2 {
        if let Some(group) = take_keyword_group(c, "fields") {
            fields = group.inner().trim().to_string();
        } else if c.eat_word("as") {
            result = take_value(s, c).unwrap_or(result);
        }
    }
    vec![fields.into(), result.into()]
}

fn render_replace(s: &Scope, op: &Operation, inner: &str) -> String {
    let mut expr = format!(
        "{}{} ({}, {})",
        op.id,
        condition_clause(&op.text(4)),
        s.quote_with(&op.text(1), false),
        s.quote_with(&op.text(2), false),
    );
    let field = op.text(0);
    if !s.is_default_field(&field) {
        expr.push_str(&format!(" at {}", s.quote(&field)));
    }
    if let Some(limit) = positive(op, 3) {
        expr.push_str(&format!(" limit {}", limit));
    }
    pipe_expr(inner, &expr)
}

fn parse_replace(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let condition = get_condition_from_string(c);
    let mut params = replace_defaults(&s.default_field);
    params[4] = condition.into();

    let Some(group) = take_group(c) else {
        return params;
    };
    let mut parts = group.value.split(|t| t.text_is(","));
    let mut part_value = || {
        parts
            .next()
            .and_then(|part| part.iter().find(|t| t.is_value()))
            .map(|t| s.value(t))
            .unwrap_or_default()
    };
    params[1] = part_value().into();
    params[2] = part_value().into();

    for _ in 0..2 {
        if c.eat_word("at") {
            if let Some(field) = take_value(s, c) {
                params[0] = field.into();
            }
        } else if c.eat_word("limit") {
            let limit = c.advance().and_then(Token::text).and_then(parse_int);
            params[3] = ParamValue::int(limit.unwrap_or(0));
        }
    }
    params
}

fn render_time_add(s: &Scope, op: &Operation, inner: &str) -> String {
    let mut expr = format!("time_add {}", op.text(0));
    if let Some(field) = non_empty(op.text(1)) {
        expr.push_str(&format!(" at {}", s.quote(&field)));
    }
    pipe_expr(inner, &expr)
}

fn parse_time_add(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let mut duration = String::from("1h");
    if c.eat_word("-") {
        duration = format!("-{}", take_value(s, c).unwrap_or_default());
    } else if let Some(value) = take_value(s, c) {
        duration = value;
    }
    let mut field = String::new();
    if c.eat_word("at") {
        field = take_value(s, c).unwrap_or_default();
    }
    vec![duration.into(), field.into()]
}

// ============================================================================
// Limits and subqueries
// ============================================================================

fn render_single_number(_: &Scope, op: &Operation, inner: &str) -> String {
    pipe_expr(inner, &format!("{} {}", op.id, op.text(0)))
}

fn parse_counted(s: &Scope, c: &mut TokenCursor<'_>, default: i64) -> Vec<ParamValue> {
    let value = number_or(c.peek(), s, default);
    if c.peek().is_some_and(Token::is_value) {
        c.advance();
    }
    vec![value]
}

fn parse_limit(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    parse_counted(s, c, 10)
}

fn parse_offset(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    parse_counted(s, c, 0)
}

fn parse_sample(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    parse_counted(s, c, 1)
}

fn render_join(s: &Scope, op: &Operation, inner: &str) -> String {
    let mut expr = format!("join by ({}) ({})", op.text(0), op.text(1));
    if op.flag(3) {
        expr.push_str(" inner");
    }
    if let Some(prefix) = non_empty(op.text(2)) {
        expr.push_str(&format!(" prefix {}", s.quote(&prefix)));
    }
    pipe_expr(inner, &expr)
}

fn parse_join(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let mut params = vec!["".into(), "".into(), "".into(), false.into()];
    if let Some(group) = take_keyword_group(c, "by").or_else(|| take_group(c)) {
        params[0] = group.inner().trim().into();
    }
    if let Some(group) = take_group(c) {
        params[1] = group.inner().trim().into();
    }
    for _ in 0..2 {
        if c.eat_word("inner") {
            params[3] = true.into();
        } else if c.eat_word("prefix") {
            params[2] = take_value(s, c).unwrap_or_default().into();
        }
    }
    params
}

fn render_union(_: &Scope, op: &Operation, inner: &str) -> String {
    pipe_expr(inner, &format!("union ({})", op.text(0)))
}

fn parse_union(_: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let query = take_group(c)
        .map(|group| group.inner().trim().to_string())
        .unwrap_or_default();
    vec![query.into()]
}

// ============================================================================
// Unpacking
// ============================================================================

/// Positions of the optional trailing parameters, which differ between the
/// syslog pipe and the json/logfmt pipes.
struct UnpackLayout {
    skip_empty: Option<usize>,
    condition: usize,
    offset: Option<usize>,
}

fn unpack_layout(id: OperationId) -> UnpackLayout {
    if id == OperationId::UnpackSyslog {
        UnpackLayout {
            skip_empty: None,
            condition: 4,
            offset: Some(5),
        }
    } else {
        UnpackLayout {
            skip_empty: Some(4),
            condition: 5,
            offset: None,
        }
    }
}

fn render_unpack(s: &Scope, op: &Operation, inner: &str) -> String {
    let layout = unpack_layout(op.id);
    let mut expr = format!("{}{}", op.id, condition_clause(&op.text(layout.condition)));
    let field = op.text(0);
    if !s.is_default_field(&field) {
        expr.push_str(&format!(" from {}", s.quote(&field)));
    }
    if let Some(fields) = non_empty(op.text(1)) {
        expr.push_str(&format!(" fields ({})", fields));
    }
    if let Some(prefix) = non_empty(op.text(2)) {
        expr.push_str(&format!(" result_prefix {}", s.quote_with(&prefix, true)));
    }
    if op.flag(3) {
        expr.push_str(" keep_original_fields");
    }
    if layout.skip_empty.is_some_and(|i| op.flag(i)) {
        expr.push_str(" skip_empty_results");
    }
    if let Some(offset) = layout.offset.and_then(|i| non_empty(op.text(i))) {
        expr.push_str(&format!(" offset {}", offset));
    }
    pipe_expr(inner, &expr)
}

/// Shared by `unpack_json`, `unpack_logfmt` and `unpack_syslog`; the
/// driver tells them apart only by the parameter layout.
fn parse_unpack_with(s: &Scope, c: &mut TokenCursor<'_>, layout: UnpackLayout) -> Vec<ParamValue> {
    let mut params: Vec<ParamValue> = vec![
        s.default_field.clone().into(),
        "".into(),
        "".into(),
        false.into(),
        "".into(),
        "".into(),
    ];
    if let Some(skip) = layout.skip_empty {
        params[skip] = false.into();
    }
    params[layout.condition] = get_condition_from_string(c).into();

    loop {
        if c.eat_word("from") {
            if let Some(field) = take_value(s, c) {
                params[0] = field.into();
            }
        } else if let Some(group) = take_keyword_group(c, "fields") {
            params[1] = group.inner().trim().into();
        } else if c.eat_word("result_prefix") {
            params[2] = take_value(s, c).unwrap_or_default().into();
        } else if c.eat_word("keep_original_fields") {
            params[3] = true.into();
        } else if let Some(skip) = layout.skip_empty.filter(|_| c.peek_is_word("skip_empty_results")) {
            c.advance();
            params[skip] = true.into();
        } else if let Some(offset) = layout.offset.filter(|_| c.peek_is_word("offset")) {
            c.advance();
            params[offset] = take_value(s, c).unwrap_or_default().into();
        } else {
            break;
        }
    }
    params
}

fn parse_unpack(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    parse_unpack_with(s, c, unpack_layout(OperationId::UnpackJson))
}

fn parse_unpack_syslog(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    parse_unpack_with(s, c, unpack_layout(OperationId::UnpackSyslog))
}

fn render_unpack_words(s: &Scope, op: &Operation, inner: &str) -> String {
    let mut expr = format!("unpack_words from {}", s.quote(&op.text(0)));
    if let Some(result) = non_empty(op.text(1)) {
        expr.push_str(&format!(" as {}", s.quote(&result)));
    }
    if op.flag(2) {
        expr.push_str(" drop_duplicates");
    }
    pipe_expr(inner, &expr)
}

fn parse_unpack_words(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let mut params = vec![s.default_field.clone().into(), "".into(), false.into()];
    loop {
        if c.eat_word("from") {
            params[0] = take_value(s, c).unwrap_or_else(|| s.default_field.clone()).into();
        } else if c.eat_word("as") {
            params[1] = take_value(s, c).unwrap_or_default().into();
        } else if c.eat_word("drop_duplicates") {
            params[2] = true.into();
        } else {
            break;
        }
    }
    params
}

fn render_unroll(_: &Scope, op: &Operation, inner: &str) -> String {
    let expr = format!("unroll{} by ({})", condition_clause(&op.text(1)), op.text(0));
    pipe_expr(inner, &expr)
}

fn parse_unroll(_: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let condition = get_condition_from_string(c);
    let fields = match take_keyword_group(c, "by").or_else(|| take_group(c)) {
        Some(group) => group.inner().trim().to_string(),
        None => {
            c.eat_word("by");
            get_field_list(c)
        }
    };
    vec![fields.into(), condition.into()]
}
