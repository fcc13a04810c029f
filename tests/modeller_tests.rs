// tests/modeller_tests.rs

use logsql_builder::ast::{Category, LabelFilter, Operation, OperationId, ParamValue, VisualQuery};
use logsql_builder::catalog::Scope;
use logsql_builder::modeller::{QueryModeller, build_visual_query_to_string, render};
use logsql_builder::parser::{Parser, parse_expression, parse_stats_functions};

fn op(id: OperationId, params: Vec<ParamValue>) -> Operation {
    Operation::new(id, params)
}

fn word(field: &str, value: &str) -> Operation {
    op(
        OperationId::Word,
        vec![field.into(), value.into(), false.into(), false.into()],
    )
}

fn label(name: &str, operator: &str, value: &str) -> LabelFilter {
    LabelFilter {
        label: name.into(),
        op: operator.into(),
        value: value.into(),
    }
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn test_render_filters() {
    let test_cases = vec![
        (word("_msg", "error"), "error"),
        (word("level", "error"), "level:error"),
        (word("_msg", "hello world"), "`hello world`"),
        (word("_msg", "*"), "*"),
        (word("_msg", "$var"), "$var"),
        (word("_msg", ""), "\"\""),
        (
            op(
                OperationId::Word,
                vec!["_msg".into(), "err".into(), true.into(), true.into()],
            ),
            "i(err*)",
        ),
        (
            op(
                OperationId::Exact,
                vec!["level".into(), "error".into(), false.into(), false.into()],
            ),
            "level:=error",
        ),
        (
            op(
                OperationId::Exact,
                vec!["level".into(), "error".into(), true.into(), false.into()],
            ),
            "level:!=error",
        ),
        (
            op(
                OperationId::Regexp,
                vec!["level".into(), "err.*".into(), false.into()],
            ),
            "level:~`err.*`",
        ),
        (
            op(
                OperationId::Regexp,
                vec!["level".into(), "err".into(), true.into()],
            ),
            "level:~`(?i)err`",
        ),
        (
            op(
                OperationId::RangeComparison,
                vec!["status".into(), ">".into(), "400".into()],
            ),
            "status:>400",
        ),
        (
            op(OperationId::Stream, vec!["app=\"nginx\"".into()]),
            "{app=\"nginx\"}",
        ),
        (
            op(OperationId::Logical, vec!["_msg".into(), "error or warn".into()]),
            "(error or warn)",
        ),
        (
            op(OperationId::MultiExact, vec!["level".into(), "(a, b)".into()]),
            "level:in(a, b)",
        ),
        (
            op(OperationId::Time, vec!["5m".into(), "".into()]),
            "_time:5m",
        ),
    ];

    for (operation, expected) in test_cases {
        assert_eq!(
            render(&[operation.clone()]),
            expected,
            "Failed for operation: {:?}",
            operation
        );
    }
}

#[test]
fn test_custom_default_field_is_implied() {
    let modeller = QueryModeller::with_default_field("message");
    assert_eq!(modeller.render_operations("", &[word("message", "error")]), "error");
    assert_eq!(modeller.render_operations("", &[word("_msg", "error")]), "_msg:error");
}

// ============================================================================
// Joining
// ============================================================================

#[test]
fn test_render_operators() {
    let test_cases = vec![
        (
            vec![
                word("_msg", "error"),
                Operation::marker(OperationId::And),
                Operation::marker(OperationId::Not),
                word("_msg", "warn"),
            ],
            "error AND NOT warn",
        ),
        (
            vec![Operation::marker(OperationId::Not), word("level", "error")],
            "NOT level:error",
        ),
        (
            vec![word("a", "1"), word("b", "2")],
            "a:1 b:2",
        ),
    ];

    for (operations, expected) in test_cases {
        assert_eq!(render(&operations), expected, "Failed for operations: {:?}", operations);
    }
}

#[test]
fn test_render_pipes() {
    let sort = op(
        OperationId::Sort,
        vec![
            "_time".into(),
            true.into(),
            ParamValue::int(0),
            ParamValue::int(0),
            "".into(),
        ],
    );
    let limit = op(OperationId::Limit, vec![ParamValue::int(10)]);

    assert_eq!(
        render(&[word("_msg", "error"), sort.clone(), limit]),
        "error | sort by (_time) desc | limit 10"
    );
    assert_eq!(
        render(&[word("_msg", "*"), sort, word("level", "error")]),
        "* | sort by (_time) desc | filter level:error"
    );
}

#[test]
fn test_disabled_operations_are_skipped() {
    let mut disabled = word("_msg", "warn");
    disabled.disabled = true;
    assert_eq!(render(&[word("_msg", "error"), disabled]), "error");
}

#[test]
fn test_comments_end_their_line() {
    let comment = op(OperationId::Comment, vec!["note".into()]);
    assert_eq!(render(&[word("_msg", "error"), comment.clone()]), "error # note");
    assert_eq!(render(&[comment, word("_msg", "error")]), "# note\nerror");
}

// ============================================================================
// Round Trips
// ============================================================================

#[test]
fn test_parse_then_render() {
    let test_cases = vec![
        "error",
        "level:error",
        "level:=error",
        "level:!=error",
        "level:~`err.*`",
        "status:>=400",
        "error AND NOT warn",
        "NOT level:error",
        "`hello world`",
        "_time:5m",
        "_time:5m offset 1h",
        "_time:day_range[08:00, 18:00)",
        "{app=\"nginx\"}",
        "level:in(error, warn)",
        "(error or warn)",
        "size:range[1, 10]",
        "seq(a, b)",
        "error # note",
        "error | sort by (_time) desc | limit 10",
        "* | stats count() as total | sort by (total) desc",
        "* | stats by (host) count() as total",
    ];

    for input in test_cases {
        let operations = parse_expression(input, "_msg");
        assert_eq!(render(&operations), input, "Failed for input: {}", input);
    }
}

// ============================================================================
// Labels and Whole Queries
// ============================================================================

#[test]
fn test_render_query_with_labels() {
    let query = VisualQuery {
        labels: vec![label("app", "=", "nginx"), label("env", "=", "prod")],
        operations: vec![op(OperationId::Limit, vec![ParamValue::int(5)])],
        ..VisualQuery::default()
    };
    assert_eq!(
        build_visual_query_to_string(&query, None),
        "app:=nginx env:=prod | limit 5"
    );
}

#[test]
fn test_labels_join_following_filters() {
    let modeller = QueryModeller::default();
    let test_cases = vec![
        (vec![word("_msg", "error")], "app:=nginx AND error"),
        (
            vec![Operation::marker(OperationId::Or), word("_msg", "error")],
            "app:=nginx OR error",
        ),
        (vec![], "app:=nginx"),
    ];

    for (operations, expected) in test_cases {
        let query = VisualQuery {
            labels: vec![label("app", "=", "nginx")],
            operations,
            ..VisualQuery::default()
        };
        assert_eq!(modeller.render_query(&query), expected, "Failed for: {}", expected);
    }
}

#[test]
fn test_negated_labels() {
    let modeller = QueryModeller::default();
    let labels = vec![label("app", "!=", "nginx"), label("env", "!~", "te.*")];
    assert_eq!(modeller.render_labels(&labels), "app:!=nginx NOT env:~`te.*`");
}

#[test]
fn test_parsed_labels_render_back() {
    let parser = Parser::new(logsql_builder::ParseOptions {
        parse_labels: true,
        ..Default::default()
    });
    let input = "app:=nginx env:=prod | limit 5";
    let result = parser.parse(input);
    assert_eq!(build_visual_query_to_string(&result.query, None), input);
}

// ============================================================================
// Stats-only Modeller
// ============================================================================

#[test]
fn test_stats_modeller_renders_function_list() {
    let modeller = QueryModeller::stats_only(&Scope::default());
    assert!(modeller.is_stats_only());

    let test_cases = vec![
        "count() as total, sum(bytes)",
        "quantile(0.5, latency) as p50",
        "count_uniq(user) limit 10",
        "count() if (level:error) as errors",
        "rate()",
    ];

    for input in test_cases {
        let operations = parse_stats_functions(input, "_msg");
        assert_eq!(
            modeller.render_operations("", &operations),
            input,
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_stats_modeller_skips_other_categories() {
    let modeller = QueryModeller::stats_only(&Scope::default());
    let operations = vec![
        op(OperationId::Limit, vec![ParamValue::int(5)]),
        op(OperationId::Count, vec!["".into(), "".into(), "".into()]),
    ];
    assert_eq!(modeller.render_operations("", &operations), "count()");
    assert!(modeller.operation_definition(OperationId::Limit).is_none());
    assert_eq!(modeller.operations_for_category(Category::Stats).len(), 20);
    assert!(modeller.operations_for_category(Category::Pipes).is_empty());
}

#[test]
fn test_modeller_categories() {
    let modeller = QueryModeller::new(&Scope::default(), &[Category::Pipes, Category::Filters]);
    assert_eq!(modeller.categories(), &[Category::Filters, Category::Pipes]);
    assert!(!modeller.is_stats_only());
    assert!(modeller.operation_definition(OperationId::Count).is_none());
}
