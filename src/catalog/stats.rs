use std::sync::Arc;

use crate::ast::{Category, Operation, OperationId, ParamValue, Token};
use crate::cursor::TokenCursor;

use super::common::{take_call, take_value};
use super::{
    OperationDefinition, ParamSpec, Scope, condition_clause, define, get_condition_from_string,
    number_or, parse_int,
};

/// Functions that accept a trailing `limit N`.
const LIMITED: [OperationId; 4] = [
    OperationId::CountEmpty,
    OperationId::CountUniq,
    OperationId::JsonValues,
    OperationId::UniqValues,
];

const PLAIN: [(OperationId, &str); 14] = [
    (OperationId::Avg, "Average"),
    (OperationId::Count, "Count"),
    (OperationId::CountUniqHash, "Count unique hash"),
    (OperationId::Histogram, "Histogram"),
    (OperationId::Max, "Max"),
    (OperationId::Median, "Median"),
    (OperationId::Min, "Min"),
    (OperationId::RateSum, "Rate sum"),
    (OperationId::RowAny, "Row any"),
    (OperationId::RowMax, "Row max"),
    (OperationId::RowMin, "Row min"),
    (OperationId::Sum, "Sum"),
    (OperationId::SumLen, "Sum length"),
    (OperationId::Values, "Values"),
];

pub(super) fn definitions(scope: &Arc<Scope>) -> Vec<OperationDefinition> {
    let stat = |id, name| define(scope, id, name, Category::Stats);
    let mut defs: Vec<OperationDefinition> = PLAIN
        .iter()
        .map(|&(id, name)| {
            stat(id, name)
                .params(vec![
                    ParamSpec::string("Fields").optional(),
                    ParamSpec::string("Result field").optional(),
                    ParamSpec::string("Condition").optional(),
                ])
                .defaults(vec!["".into(), "".into(), "".into()])
                .renderer(render_function)
                .parser(parse_function)
        })
        .collect();

    let limited_names = ["Count empty", "Count unique", "JSON values", "Unique values"];
    for (id, name) in LIMITED.into_iter().zip(limited_names) {
        defs.push(
            stat(id, name)
                .params(vec![
                    ParamSpec::string("Fields").optional(),
                    ParamSpec::number("Limit"),
                    ParamSpec::string("Result field").optional(),
                    ParamSpec::string("Condition").optional(),
                ])
                .defaults(vec!["".into(), ParamValue::int(0), "".into(), "".into()])
                .renderer(render_function)
                .parser(parse_function),
        );
    }

    defs.push(
        stat(OperationId::Quantile, "Quantile")
            .params(vec![
                ParamSpec::number("Percentile"),
                ParamSpec::string("Fields").optional(),
                ParamSpec::string("Result field").optional(),
                ParamSpec::string("Condition").optional(),
            ])
            .defaults(vec![ParamValue::int(5), "".into(), "".into(), "".into()])
            .renderer(render_quantile)
            .parser(parse_quantile),
    );
    defs.push(
        stat(OperationId::Rate, "Rate")
            .params(vec![
                ParamSpec::string("Result field").optional(),
                ParamSpec::string("Condition").optional(),
            ])
            .defaults(vec!["".into(), "".into()])
            .renderer(render_rate)
            .parser(parse_rate),
    );
    defs
}

/// Several stats functions in one `stats` pipe are separated by commas.
fn join_function(inner: &str, expr: &str) -> String {
    if inner.is_empty() {
        expr.to_string()
    } else {
        format!("{}, {}", inner, expr)
    }
}

fn result_clause(s: &Scope, result: &str) -> String {
    if result.is_empty() {
        String::new()
    } else {
        format!(" as {}", s.quote(result))
    }
}

fn render_function(s: &Scope, op: &Operation, inner: &str) -> String {
    let limited = LIMITED.contains(&op.id);
    let (result, condition) = if limited { (2, 3) } else { (1, 2) };

    let mut expr = format!("{}({})", op.id, op.text(0));
    if limited && op.int(1) > 0 {
        expr.push_str(&format!(" limit {}", op.text(1)));
    }
    expr.push_str(&condition_clause(&op.text(condition)));
    expr.push_str(&result_clause(s, &op.text(result)));
    join_function(inner, &expr)
}

/// Trailing `if (...)` and `[as] result` shared by every function.
fn parse_tail(s: &Scope, c: &mut TokenCursor<'_>) -> (String, String) {
    let condition = get_condition_from_string(c);
    c.eat_word("as");
    let result = take_value(s, c).unwrap_or_default();
    (result, condition)
}

/// The function name is the call prefix; the driver leaves it in place.
fn parse_function(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let limited = c
        .peek()
        .and_then(|t| match t {
            Token::Bracket(group) => Some(group.prefix.as_str()),
            other => other.space_value(),
        })
        .is_some_and(|name| LIMITED.iter().any(|id| id.as_str() == name.to_lowercase()));

    let fields = take_call(c)
        .map(|group| group.inner().trim().to_string())
        .unwrap_or_default();

    let mut limit = ParamValue::int(0);
    if limited && c.eat_word("limit") {
        limit = number_or(c.peek(), s, 0);
        c.advance();
    }
    let (result, condition) = parse_tail(s, c);

    if limited {
        vec![fields.into(), limit, result.into(), condition.into()]
    } else {
        vec![fields.into(), result.into(), condition.into()]
    }
}

fn render_quantile(s: &Scope, op: &Operation, inner: &str) -> String {
    let fields = op.text(1);
    let mut expr = if fields.is_empty() {
        format!("quantile(0.{})", op.int(0))
    } else {
        format!("quantile(0.{}, {})", op.int(0), fields)
    };
    expr.push_str(&condition_clause(&op.text(3)));
    expr.push_str(&result_clause(s, &op.text(2)));
    join_function(inner, &expr)
}

fn parse_quantile(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    let mut percentile = 5;
    let mut fields = String::new();
    if let Some(group) = take_call(c) {
        let inner = group.inner().trim();
        let (head, rest) = inner.split_once(',').unwrap_or((inner, ""));
        percentile = head
            .trim()
            .strip_prefix("0.")
            .and_then(parse_int)
            .unwrap_or(percentile);
        fields = rest.trim().to_string();
    }
    let (result, condition) = parse_tail(s, c);
    vec![
        ParamValue::int(percentile),
        fields.into(),
        result.into(),
        condition.into(),
    ]
}

fn render_rate(s: &Scope, op: &Operation, inner: &str) -> String {
    let mut expr = String::from("rate()");
    expr.push_str(&condition_clause(&op.text(1)));
    expr.push_str(&result_clause(s, &op.text(0)));
    join_function(inner, &expr)
}

fn parse_rate(s: &Scope, c: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    take_call(c);
    let (result, condition) = parse_tail(s, c);
    vec![result.into(), condition.into()]
}
