// tests/stream_filter_tests.rs

use logsql_builder::stream_filter::{
    StreamFilterState, StreamOperator, StreamSelector, build_preceding_stream_filters,
    build_stream_extra_filters, build_stream_filter_value, parse_stream_filter_value,
    stream_filter_to_string, used_label_names,
};

fn selector(label: &str, not_in: bool, values: &[&str]) -> StreamSelector {
    StreamSelector {
        label: label.to_string(),
        not_in,
        values: values.iter().map(|v| v.to_string()).collect(),
    }
}

fn row(label: &str, operator: StreamOperator, values: &[&str]) -> StreamFilterState {
    StreamFilterState::new(label, operator, values.iter().copied())
}

// ============================================================================
// Selector Parsing
// ============================================================================

#[test]
fn test_parse_stream_filter_value() {
    let test_cases = vec![
        ("app", selector("app", false, &[])),
        ("", StreamSelector::default()),
        ("app=\"nginx\"", selector("app", false, &["nginx"])),
        ("app!=\"nginx\"", selector("app", true, &["nginx"])),
        ("app = nginx", selector("app", false, &["nginx"])),
        (
            "app in (nginx, foo.bar)",
            selector("app", false, &["nginx", "foo.bar"]),
        ),
        (
            "app in (nginx, \"foo bar\")",
            selector("app", false, &["nginx", "foo bar"]),
        ),
        ("app in(nginx)", selector("app", false, &["nginx"])),
        (
            "app not_in (nginx, apache)",
            selector("app", true, &["nginx", "apache"]),
        ),
        (
            "app=~\"nginx|foo\\.bar\"",
            selector("app", false, &["nginx", "foo.bar"]),
        ),
        (
            "app!~\"nginx|foo\\.bar\"",
            selector("app", true, &["nginx", "foo.bar"]),
        ),
    ];

    for (input, expected) in test_cases {
        assert_eq!(parse_stream_filter_value(input), expected, "Failed for input: {}", input);
    }
}

// ============================================================================
// Selector Rendering
// ============================================================================

#[test]
fn test_build_stream_filter_value() {
    let test_cases = vec![
        (vec![], false, "app="),
        (vec![], true, "app!="),
        (vec!["nginx"], false, "app=nginx"),
        (vec!["nginx"], true, "app!=nginx"),
        (vec!["a b"], false, "app=`a b`"),
        (vec!["a", "b"], false, "app in (a,b)"),
        (vec!["a", "b"], true, "app not_in (a,b)"),
    ];

    for (values, not_in, expected) in test_cases {
        let values: Vec<String> = values.into_iter().map(String::from).collect();
        assert_eq!(
            build_stream_filter_value("app", &values, not_in),
            expected,
            "Failed for values: {:?}",
            values
        );
    }
}

#[test]
fn test_selector_survives_render_and_parse() {
    let test_cases = vec![
        selector("app", false, &["nginx"]),
        selector("app", true, &["nginx"]),
        selector("app", false, &["nginx", "foo bar"]),
        selector("app", true, &["a", "b", "c"]),
    ];

    for expected in test_cases {
        let text = expected.to_value();
        assert_eq!(parse_stream_filter_value(&text), expected, "Failed for text: {}", text);
    }
}

// ============================================================================
// Filter Rows
// ============================================================================

#[test]
fn test_stream_filter_to_string() {
    let test_cases = vec![
        (
            row("app", StreamOperator::Equal, &["nginx", "apache"]),
            "_stream:{app in (\"nginx\", \"apache\")}",
        ),
        (
            row("app", StreamOperator::NotEqual, &["nginx"]),
            "_stream:{app not_in (\"nginx\")}",
        ),
        (
            row("app", StreamOperator::Equal, &["$service"]),
            "_stream:{app in ($service)}",
        ),
        (
            row("app", StreamOperator::Equal, &["say \"hi\""]),
            "_stream:{app in (\"say \\\"hi\\\"\")}",
        ),
        (row("", StreamOperator::Equal, &["nginx"]), ""),
        (row("app", StreamOperator::Equal, &[]), ""),
    ];

    for (filter, expected) in test_cases {
        assert_eq!(stream_filter_to_string(&filter), expected, "Failed for filter: {:?}", filter);
    }
}

#[test]
fn test_extra_filters_skip_incomplete_rows() {
    let filters = vec![
        row("app", StreamOperator::Equal, &["nginx"]),
        row("host", StreamOperator::Equal, &[]),
        row("env", StreamOperator::NotEqual, &["dev"]),
    ];
    assert_eq!(
        build_stream_extra_filters(&filters),
        "_stream:{app in (\"nginx\")} AND _stream:{env not_in (\"dev\")}"
    );
}

#[test]
fn test_preceding_filters() {
    let filters = vec![
        row("app", StreamOperator::Equal, &["nginx"]),
        row("env", StreamOperator::Equal, &["prod"]),
        row("host", StreamOperator::Equal, &["a"]),
    ];

    let test_cases = vec![
        (0, ""),
        (1, "_stream:{app in (\"nginx\")}"),
        (
            2,
            "_stream:{app in (\"nginx\")} AND _stream:{env in (\"prod\")}",
        ),
        (
            10,
            "_stream:{app in (\"nginx\")} AND _stream:{env in (\"prod\")} AND _stream:{host in (\"a\")}",
        ),
    ];

    for (current, expected) in test_cases {
        assert_eq!(
            build_preceding_stream_filters(&filters, current),
            expected,
            "Failed for row: {}",
            current
        );
    }
}

#[test]
fn test_used_label_names() {
    let filters = vec![
        row("app", StreamOperator::Equal, &["nginx"]),
        row("host", StreamOperator::Equal, &[]),
        row("", StreamOperator::Equal, &[]),
    ];

    let used: Vec<String> = used_label_names(&filters, 0).into_iter().collect();
    assert_eq!(used, vec!["host"]);

    let used: Vec<String> = used_label_names(&filters, 5).into_iter().collect();
    assert_eq!(used, vec!["app", "host"]);
}

#[test]
fn test_filter_row_json() {
    let filter: StreamFilterState =
        serde_json::from_str(r#"{"label": "app", "operator": "!=", "values": ["x"]}"#)
            .expect("valid row");
    assert_eq!(filter, row("app", StreamOperator::NotEqual, &["x"]));

    let filter: StreamFilterState = serde_json::from_str(r#"{"label": "app"}"#).expect("valid row");
    assert_eq!(filter.operator, StreamOperator::Equal);
    assert!(filter.values.is_empty());
}
