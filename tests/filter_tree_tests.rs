// tests/filter_tree_tests.rs

use logsql_builder::ast::{FilterValue, FilterVisualQuery};
use logsql_builder::error::FilterTreeError;
use logsql_builder::filter_tree::{
    MAX_GROUP_DEPTH, add_value_by_index_path, build_filter_tree, build_visual_query_from_string,
    delete_by_index_path, filter_tree_to_string, parse_filter_tree, update_operator_by_index_path,
    update_value_by_index_path,
};

fn leaf(text: &str) -> FilterValue {
    FilterValue::leaf(text)
}

fn group(values: Vec<FilterValue>, operators: &[&str]) -> FilterVisualQuery {
    FilterVisualQuery::new(values, operators.iter().map(|op| op.to_string()).collect())
}

/// `(error or warn or info) and (cpu and gpu and hdd and ssd)` on `_msg`.
fn fixture() -> FilterVisualQuery {
    group(
        vec![
            FilterValue::Group(group(
                vec![leaf("_msg:error"), leaf("_msg:warn"), leaf("_msg:info")],
                &["or", "or"],
            )),
            FilterValue::Group(group(
                vec![
                    leaf("_msg:cpu"),
                    leaf("_msg:gpu"),
                    leaf("_msg:hdd"),
                    leaf("_msg:ssd"),
                ],
                &["and", "and", "and"],
            )),
        ],
        &["and"],
    )
}

fn group_at<'a>(tree: &'a FilterVisualQuery, index: usize) -> &'a FilterVisualQuery {
    tree.values[index].as_group().expect("expected a group")
}

// ============================================================================
// Building Trees
// ============================================================================

#[test]
fn test_build_filter_tree() {
    let test_cases = vec![
        (
            "(field1:value1 and field2:value2) or field3:value3",
            group(
                vec![
                    FilterValue::Group(group(
                        vec![leaf("field1:value1"), leaf("field2:value2")],
                        &["and"],
                    )),
                    leaf("field3:value3"),
                ],
                &["or"],
            ),
        ),
        (
            "_msg: \"(3/9) Installing libunistring (1.3-r0)\"",
            group(
                vec![leaf("_msg: \"(3/9) Installing libunistring (1.3-r0)\"")],
                &[],
            ),
        ),
        (
            "\"field:subfield\": \"value\"",
            group(vec![leaf("\"field:subfield\": \"value\"")], &[]),
        ),
        ("*", group(vec![leaf("*")], &[])),
        ("", group(vec![], &[])),
        (
            "level:in (a, b) and x",
            group(vec![leaf("level:in (a, b)"), leaf("x")], &["and"]),
        ),
        (
            "seq(\"a\", \"b\") OR c",
            group(vec![leaf("seq(\"a\", \"b\")"), leaf("c")], &["OR"]),
        ),
    ];

    for (input, expected) in test_cases {
        assert_eq!(build_filter_tree(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_implicit_and() {
    let test_cases = vec![
        ("a b", group(vec![leaf("a"), leaf("b")], &["AND"])),
        (
            "a:1 b:2 or c:3",
            group(vec![leaf("a:1"), leaf("b:2"), leaf("c:3")], &["AND", "or"]),
        ),
    ];

    for (input, expected) in test_cases {
        assert_eq!(build_filter_tree(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_negation_stays_with_value() {
    let test_cases = vec![
        ("not level:error", vec!["not level:error"]),
        ("! x and y", vec!["! x", "y"]),
        ("a AND NOT b", vec!["a", "NOT b"]),
    ];

    for (input, expected) in test_cases {
        let tree = build_filter_tree(input);
        let leaves: Vec<&str> = tree.values.iter().filter_map(FilterValue::as_leaf).collect();
        assert_eq!(leaves, expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_dangling_operators_are_dropped() {
    let test_cases = vec!["and a", "a or", "or a and"];

    for input in test_cases {
        let tree = build_filter_tree(input);
        assert_eq!(tree, group(vec![leaf("a")], &[]), "Failed for input: {}", input);
    }
}

#[test]
fn test_trees_are_consistent() {
    let test_cases = vec![
        "(a or b) and (c or (d and e))",
        "a and or b",
        "x (y z) w",
        "((a))",
    ];

    for input in test_cases {
        assert!(build_filter_tree(input).is_consistent(), "Failed for input: {}", input);
    }
}

// ============================================================================
// Structural Errors
// ============================================================================

#[test]
fn test_unclosed_group_is_kept_as_leaf() {
    let parsed = parse_filter_tree("(a or b");
    assert_eq!(parsed.tree, group(vec![leaf("(a or b")], &[]));
    assert_eq!(
        parsed.errors,
        vec![FilterTreeError::UnbalancedParentheses { position: 0 }]
    );
}

#[test]
fn test_stray_closing_paren_is_reported() {
    let parsed = parse_filter_tree("a) b");
    assert_eq!(
        parsed.errors,
        vec![FilterTreeError::UnbalancedParentheses { position: 1 }]
    );
    assert_eq!(parsed.tree, group(vec![leaf("a"), leaf("b")], &["AND"]));
}

#[test]
fn test_stray_closing_paren_is_dropped_from_leaves() {
    let test_cases = vec![
        ("a)", group(vec![leaf("a")], &[])),
        (")a or b", group(vec![leaf("a"), leaf("b")], &["or"])),
        ("(a or b)) c", group(
            vec![
                FilterValue::Group(group(vec![leaf("a"), leaf("b")], &["or"])),
                leaf("c"),
            ],
            &["AND"],
        )),
    ];

    for (input, expected) in test_cases {
        let parsed = parse_filter_tree(input);
        assert_eq!(parsed.tree, expected, "Failed for input: {}", input);
        assert_eq!(parsed.errors.len(), 1, "Failed for input: {}", input);
    }
}

#[test]
fn test_deep_nesting_is_reported() {
    let depth = MAX_GROUP_DEPTH + 6;
    let input = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
    let parsed = parse_filter_tree(&input);
    assert!(
        parsed
            .errors
            .contains(&FilterTreeError::NestingTooDeep { max: MAX_GROUP_DEPTH })
    );
    assert!(parsed.tree.is_consistent());
}

#[test]
fn test_empty_text_has_no_errors() {
    let parsed = parse_filter_tree("   ");
    assert!(parsed.tree.is_empty());
    assert!(parsed.errors.is_empty());
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_filter_tree_to_string() {
    let test_cases = vec![
        (
            "(field1:value1 and field2:value2) or field3:value3",
            "(field1:value1 and field2:value2) or field3:value3",
        ),
        ("a b", "a AND b"),
        ("  a   or   b  ", "a or b"),
        ("", ""),
    ];

    for (input, expected) in test_cases {
        let tree = build_filter_tree(input);
        assert_eq!(filter_tree_to_string(&tree), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_missing_operator_renders_as_and() {
    let tree = group(vec![leaf("a"), leaf("b")], &[]);
    assert_eq!(filter_tree_to_string(&tree), "a AND b");
}

#[test]
fn test_fixture_renders_nested_groups() {
    assert_eq!(
        filter_tree_to_string(&fixture()),
        "(_msg:error or _msg:warn or _msg:info) and (_msg:cpu and _msg:gpu and _msg:hdd and _msg:ssd)"
    );
}

// ============================================================================
// Whole Queries
// ============================================================================

#[test]
fn test_build_visual_query_from_string() {
    let result = build_visual_query_from_string("level:error | sort by (_time) | limit 5");
    assert_eq!(result.query.filters, group(vec![leaf("level:error")], &[]));
    assert_eq!(result.query.pipes, vec!["sort by (_time)", "limit 5"]);
    assert_eq!(result.query.expr, "level:error | sort by (_time) | limit 5");
    assert!(result.errors.is_empty());
}

#[test]
fn test_pipes_inside_quotes_do_not_split() {
    let result = build_visual_query_from_string("\"a | b\" | limit 1");
    assert_eq!(result.query.filters, group(vec![leaf("\"a | b\"")], &[]));
    assert_eq!(result.query.pipes, vec!["limit 1"]);
}

#[test]
fn test_structural_errors_become_messages() {
    let result = build_visual_query_from_string("(a | b");
    assert!(result.query.pipes.is_empty());
    assert_eq!(result.errors, vec!["unbalanced parentheses at position 0"]);
}

#[test]
fn test_empty_query() {
    let result = build_visual_query_from_string("");
    assert!(result.query.filters.is_empty());
    assert!(result.query.pipes.is_empty());
    assert!(result.errors.is_empty());
}

// ============================================================================
// Index Path Edits
// ============================================================================

#[test]
fn test_update_value_by_index_path() {
    let tree = fixture();

    let updated = update_value_by_index_path(&tree, &[0, 0], "_msg:critical");
    assert_eq!(group_at(&updated, 0).values[0], leaf("_msg:critical"));

    let updated = update_value_by_index_path(&tree, &[1, 3], "_msg:nvme");
    assert_eq!(group_at(&updated, 1).values[3], leaf("_msg:nvme"));

    assert_eq!(tree, fixture(), "the input tree is never modified");
}

#[test]
fn test_update_value_appends_at_end() {
    let updated = update_value_by_index_path(&fixture(), &[2], "_msg:extra");
    assert_eq!(updated.values.len(), 3);
    assert_eq!(updated.operators, vec!["and", "AND"]);
    assert!(updated.is_consistent());
}

#[test]
fn test_update_value_out_of_range_is_ignored() {
    let test_cases: Vec<Vec<usize>> = vec![vec![5], vec![0, 7], vec![]];

    for path in test_cases {
        let updated = update_value_by_index_path(&fixture(), &path, "x");
        assert_eq!(updated, fixture(), "Failed for path: {:?}", path);
    }
}

#[test]
fn test_update_operator_by_index_path() {
    let tree = fixture();

    let updated = update_operator_by_index_path(&tree, &[0, 0], "and");
    assert_eq!(group_at(&updated, 0).operators, vec!["and", "or"]);

    let updated = update_operator_by_index_path(&tree, &[1, 1], "or");
    assert_eq!(group_at(&updated, 1).operators, vec!["and", "or", "and"]);

    let updated = update_operator_by_index_path(&tree, &[0], "or");
    assert_eq!(updated.operators, vec!["or"]);

    let updated = update_operator_by_index_path(&tree, &[0, 9], "and");
    assert_eq!(updated, tree);
}

#[test]
fn test_delete_by_index_path() {
    let test_cases = vec![
        (vec![0, 0], 0, vec!["_msg:warn", "_msg:info"], vec!["or"]),
        (vec![0, 2], 0, vec!["_msg:error", "_msg:warn"], vec!["or"]),
        (
            vec![1, 3],
            1,
            vec!["_msg:cpu", "_msg:gpu", "_msg:hdd"],
            vec!["and", "and"],
        ),
    ];

    for (path, parent, expected_values, expected_operators) in test_cases {
        let updated = delete_by_index_path(&fixture(), &path);
        let target = group_at(&updated, parent);
        let values: Vec<&str> = target.values.iter().filter_map(FilterValue::as_leaf).collect();
        assert_eq!(values, expected_values, "Failed for path: {:?}", path);
        assert_eq!(target.operators, expected_operators, "Failed for path: {:?}", path);
        assert!(updated.is_consistent(), "Failed for path: {:?}", path);
    }
}

#[test]
fn test_delete_nested_value() {
    let tree = group(
        vec![
            FilterValue::Group(group(
                vec![
                    FilterValue::Group(group(vec![leaf("error"), leaf("warn")], &["or"])),
                    leaf("app:nginx"),
                ],
                &["and"],
            )),
            leaf("host:a"),
        ],
        &["or"],
    );

    let updated = delete_by_index_path(&tree, &[0, 0, 0]);
    let inner = group_at(group_at(&updated, 0), 0);
    assert_eq!(*inner, group(vec![leaf("warn")], &[]));
}

#[test]
fn test_delete_top_level_group() {
    let updated = delete_by_index_path(&fixture(), &[0]);
    assert_eq!(updated.values.len(), 1);
    assert!(updated.operators.is_empty());
}

#[test]
fn test_add_value_by_index_path() {
    let updated = add_value_by_index_path(&fixture(), &[0], leaf("_msg:debug"), "or");
    let target = group_at(&updated, 0);
    assert_eq!(target.values.len(), 4);
    assert_eq!(target.operators, vec!["or", "or", "or"]);

    let updated = add_value_by_index_path(
        &fixture(),
        &[],
        FilterValue::Group(group(vec![leaf("a"), leaf("b")], &["or"])),
        "and",
    );
    assert_eq!(updated.values.len(), 3);
    assert_eq!(updated.operators, vec!["and", "and"]);
    assert!(updated.is_consistent());
}

#[test]
fn test_add_value_to_leaf_is_ignored() {
    let tree = group(vec![leaf("a")], &[]);
    let updated = add_value_by_index_path(&tree, &[0], leaf("b"), "and");
    assert_eq!(updated, tree);
}

#[test]
fn test_add_value_to_empty_tree() {
    let updated = add_value_by_index_path(&FilterVisualQuery::default(), &[], leaf("a"), "and");
    assert_eq!(updated, group(vec![leaf("a")], &[]));
}
