use std::sync::Arc;

use crate::ast::{Category, Operation, OperationId, ParamValue, Token};
use crate::cursor::TokenCursor;

use super::{OperationDefinition, ParamSpec, Scope, define, number_or, parse_number};

/// `AND`, `OR` and `NOT`. They carry no parameters; placement is decided
/// when the query is rendered.
pub(super) fn operator_definitions(scope: &Arc<Scope>) -> Vec<OperationDefinition> {
    [
        (OperationId::And, "AND"),
        (OperationId::Or, "OR"),
        (OperationId::Not, "NOT"),
    ]
    .into_iter()
    .map(|(id, name)| define(scope, id, name, Category::Operators).renderer(render_operator))
    .collect()
}

pub(super) fn definitions(scope: &Arc<Scope>) -> Vec<OperationDefinition> {
    let df = scope.default_field.as_str();
    vec![
        define(scope, OperationId::Options, "Options", Category::Special)
            .params(vec![
                ParamSpec::number("Concurrency"),
                ParamSpec::boolean("Ignore global time filter"),
            ])
            .defaults(vec![ParamValue::int(0), false.into()])
            .renderer(render_options)
            .parser(parse_options),
        define(
            scope,
            OperationId::ContainsAnyFromVariable,
            "Contains any from variable",
            Category::Special,
        )
        .params(vec![ParamSpec::string("Field"), ParamSpec::string("Variable")])
        .defaults(vec![df.into(), "".into()])
        .renderer(render_variable)
        .parser(parse_variable),
        define(scope, OperationId::Comment, "Comment", Category::Special)
            .params(vec![ParamSpec::string("Comment")])
            .defaults(vec!["".into()])
            .renderer(render_comment)
            .parser(parse_comment),
    ]
}

fn join_space(inner: &str, expr: &str) -> String {
    if inner.is_empty() {
        expr.to_string()
    } else {
        format!("{} {}", inner, expr)
    }
}

fn render_operator(_: &Scope, op: &Operation, inner: &str) -> String {
    join_space(inner, &op.id.as_str().to_uppercase())
}

fn render_options(_: &Scope, op: &Operation, inner: &str) -> String {
    let mut settings = Vec::new();
    if op.int(0) > 0 {
        settings.push(format!("concurrency={}", op.text(0)));
    }
    if op.flag(1) {
        settings.push("ignore_global_time_filter=true".to_string());
    }
    join_space(inner, &format!("options({})", settings.join(", ")))
}

/// `options(concurrency=2, ignore_global_time_filter=true)`
fn parse_options(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let mut params = vec![ParamValue::int(0), false.into()];
    let Some(group) = c.peek_bracket().filter(|g| g.prefix == "options") else {
        return params;
    };
    c.advance();

    for setting in group.value.split(|t| t.text_is(",")) {
        let [key, eq, value, ..] = setting else {
            continue;
        };
        if !eq.text_is("=") {
            continue;
        }
        if key.is_word("concurrency") && parse_number(Some(value), s).is_some() {
            params[0] = number_or(Some(value), s, 0);
        } else if key.is_word("ignore_global_time_filter") {
            params[1] = value.is_word("true").into();
        }
    }
    params
}

fn render_variable(s: &Scope, op: &Operation, inner: &str) -> String {
    let expr = format!("{}({})", s.field_prefix(&op.text(0)), op.text(1));
    join_space(inner, &expr)
}

/// `($var)` or `field:($var)`; the field prefix was read by the driver.
fn parse_variable(s: &Scope, c: &mut TokenCursor<'_>, field: Option<&str>) -> Vec<ParamValue> {
    let variable = c
        .peek_bracket()
        .map(|group| group.inner().trim().to_string())
        .unwrap_or_default();
    if c.peek().is_some_and(Token::is_bracket) {
        c.advance();
    }
    vec![s.field_or_default(field).into(), variable.into()]
}

fn render_comment(_: &Scope, op: &Operation, inner: &str) -> String {
    join_space(inner, &format!("# {}\n", op.text(0)))
}

fn parse_comment(_: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let text = match c.peek() {
        Some(Token::Comment { value }) => value.clone(),
        _ => return vec!["".into()],
    };
    c.advance();
    vec![text.into()]
}
