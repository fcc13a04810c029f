// tests/modify_tests.rs

use std::str::FromStr;

use logsql_builder::modify::{
    LabelOperator, LabelSpec, SortDirection, add_label_to_query, add_sort_pipe_to_query,
    correct_multi_exact_operator_value_all, has_time_sort_pipe, is_expr_has_stats_pipe_functions,
    query_has_filter, remove_label_from_query,
};

// ============================================================================
// Label Filters
// ============================================================================

#[test]
fn test_label_to_filter() {
    let test_cases = vec![
        (LabelSpec::new("baz", "qux", LabelOperator::Contains), "baz:\"qux\""),
        (LabelSpec::new("baz", "qux", LabelOperator::Not), "!baz:\"qux\""),
        (LabelSpec::new("baz", "qux", LabelOperator::Equal), "baz:=\"qux\""),
        (LabelSpec::new("baz", "qux", LabelOperator::NotEqual), "baz:!=\"qux\""),
        (LabelSpec::new("baz", "a\"b", LabelOperator::Equal), "baz:=\"a\\\"b\""),
        (
            LabelSpec::with_values("baz", ["qux", "quux"], LabelOperator::In),
            "baz:in(\"qux\",\"quux\")",
        ),
        (
            LabelSpec::with_values("baz", ["qux", "quux"], LabelOperator::NotIn),
            "!baz:in(\"qux\",\"quux\")",
        ),
        (
            LabelSpec::new("_stream", "{event: \"test\"}", LabelOperator::Equal),
            "_stream:{event: \"test\"}",
        ),
        (
            LabelSpec::new("_stream", "{event: \"test\"}", LabelOperator::NotEqual),
            "(! _stream: {event: \"test\"})",
        ),
        (
            LabelSpec::new("_stream_id", "stream123", LabelOperator::Equal),
            "_stream_id:stream123",
        ),
        (
            LabelSpec::new("_stream_id", "stream123", LabelOperator::Not),
            "(! _stream_id: stream123)",
        ),
    ];

    for (label, expected) in test_cases {
        assert_eq!(label.to_filter(), expected, "Failed for label: {:?}", label);
    }
}

#[test]
fn test_label_operator_names() {
    let test_cases = vec![
        ("AND", LabelOperator::Contains),
        (":", LabelOperator::Contains),
        ("NOT", LabelOperator::Not),
        ("!:", LabelOperator::Not),
        ("=", LabelOperator::Equal),
        ("!=", LabelOperator::NotEqual),
        ("=|", LabelOperator::In),
        ("!=|", LabelOperator::NotIn),
    ];

    for (input, expected) in test_cases {
        assert_eq!(LabelOperator::from_str(input).ok(), Some(expected), "Failed for input: {}", input);
    }
    assert!(LabelOperator::from_str("~").is_err());
    assert_eq!(LabelOperator::NotIn.to_string(), "!=|");
}

#[test]
fn test_add_label_to_query() {
    let test_cases = vec![
        (
            "foo: bar | pipe1 | pipe2",
            LabelSpec::new("baz", "qux", LabelOperator::Equal),
            "foo: bar AND baz:=\"qux\" | pipe1 | pipe2",
        ),
        (
            "foo: bar | pipe1 | pipe2",
            LabelSpec::new("_stream", "{event: \"test\"}", LabelOperator::Equal),
            "foo: bar AND _stream:{event: \"test\"} | pipe1 | pipe2",
        ),
        (
            "foo: bar",
            LabelSpec::with_values("baz", ["qux", "quux"], LabelOperator::In),
            "foo: bar AND baz:in(\"qux\",\"quux\")",
        ),
        (
            "foo: bar",
            LabelSpec::with_values("baz", ["qux", "quux"], LabelOperator::NotIn),
            "foo: bar AND !baz:in(\"qux\",\"quux\")",
        ),
        (
            "",
            LabelSpec::new("baz", "qux", LabelOperator::Equal),
            "baz:=\"qux\"",
        ),
        (
            "\"a | b\" | limit 5",
            LabelSpec::new("baz", "qux", LabelOperator::Contains),
            "\"a | b\" AND baz:\"qux\" | limit 5",
        ),
    ];

    for (query, label, expected) in test_cases {
        assert_eq!(add_label_to_query(query, &label), expected, "Failed for query: {}", query);
    }
}

#[test]
fn test_query_has_filter() {
    let query = "foo:bar AND baz:=\"qux\" AND !level:error | stats by (host:x) count()";
    let test_cases = vec![
        ("baz", "qux", true),
        ("foo", "bar", true),
        ("level", "error", true),
        ("baz", "other", false),
        ("host", "x", false),
    ];

    for (key, value, expected) in test_cases {
        assert_eq!(
            query_has_filter(query, key, value),
            expected,
            "Failed for filter: {}:{}",
            key,
            value
        );
    }
}

#[test]
fn test_remove_label_from_query() {
    let test_cases = vec![
        (
            "foo: bar AND baz:=\"qux\" | pipe1 | pipe2",
            "foo: bar | pipe1 | pipe2",
        ),
        (
            "foo: bar AND (baz:=\"qux\" OR quux:\"corge\")",
            "foo: bar AND (quux:\"corge\")",
        ),
        ("baz:=\"qux\" AND foo:bar", "foo:bar"),
        ("(a:1 OR baz:qux) AND c", "(a:1) AND c"),
        ("baz:=\"qux\" | limit 5", "* | limit 5"),
        ("foo:bar", "foo:bar"),
    ];

    for (query, expected) in test_cases {
        assert_eq!(
            remove_label_from_query(query, "baz", "qux"),
            expected,
            "Failed for query: {}",
            query
        );
    }
}

#[test]
fn test_add_then_remove_label() {
    let label = LabelSpec::new("baz", "qux", LabelOperator::NotEqual);
    let added = add_label_to_query("error | limit 5", &label);
    assert!(query_has_filter(&added, "baz", "qux"));
    assert_eq!(remove_label_from_query(&added, "baz", "qux"), "error | limit 5");
}

// ============================================================================
// Time Sort
// ============================================================================

#[test]
fn test_add_sort_pipe_to_query() {
    let test_cases = vec![
        ("error", SortDirection::Desc, "error | sort by (_time) desc"),
        ("error  ", SortDirection::Asc, "error | sort by (_time) asc"),
        ("error | sort by (level)", SortDirection::Desc, "error | sort by (level) | sort by (_time) desc"),
    ];

    for (query, direction, expected) in test_cases {
        assert_eq!(add_sort_pipe_to_query(query, direction), expected, "Failed for query: {}", query);
    }
}

#[test]
fn test_existing_time_sort_is_kept() {
    let test_cases = vec![
        "error | sort by (_time)",
        "error | SORT BY (_time) asc",
        "error | order by (_time) desc",
        "error |  sort  by  ( _time, level )",
        "error | sort by (level, _time) | limit 5",
    ];

    for query in test_cases {
        assert!(has_time_sort_pipe(query), "Failed for query: {}", query);
        assert_eq!(add_sort_pipe_to_query(query, SortDirection::Desc), query, "Failed for query: {}", query);
    }
}

#[test]
fn test_sort_direction() {
    assert_eq!(SortDirection::default(), SortDirection::Desc);
    assert_eq!(SortDirection::from_str("ASC").ok(), Some(SortDirection::Asc));
    assert_eq!(SortDirection::from_str("descending").ok(), Some(SortDirection::Desc));
    assert!(SortDirection::from_str("sideways").is_err());
}

// ============================================================================
// Query Inspection and Corrections
// ============================================================================

#[test]
fn test_stats_pipe_detection() {
    let test_cases = vec![
        ("* | stats count()", true),
        ("* | stats by (host) sum(bytes)", true),
        ("* | STATS COUNT()", true),
        ("count", false),
        ("* | limit 5", false),
    ];

    for (query, expected) in test_cases {
        assert_eq!(is_expr_has_stats_pipe_functions(query), expected, "Failed for query: {}", query);
    }
}

#[test]
fn test_correct_multi_exact_value_all() {
    let test_cases = vec![
        ("level:in(.*)", "level:in(*)"),
        ("level: in(.*) AND x", "level:in(*) AND x"),
        ("_stream:{app in(.*)}", "_stream:{app in(*)}"),
        ("level:in(a, b)", "level:in(a, b)"),
    ];

    for (query, expected) in test_cases {
        assert_eq!(
            correct_multi_exact_operator_value_all(query),
            expected,
            "Failed for query: {}",
            query
        );
    }
}
