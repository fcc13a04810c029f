// tests/catalog_tests.rs

use std::str::FromStr;
use std::sync::Arc;

use logsql_builder::ast::{Category, Operation, OperationId, ParamValue};
use logsql_builder::catalog::{
    Catalog, DefinitionSummary, Scope, get_condition_from_string, get_field_list,
    get_values_from_brackets, parse_int,
};
use logsql_builder::cursor::TokenCursor;
use logsql_builder::error::Error;
use logsql_builder::lexer::split_string;

fn catalog() -> Arc<Catalog> {
    Catalog::shared(&Scope::default())
}

// ============================================================================
// Lookup
// ============================================================================

#[test]
fn test_every_id_has_a_definition() {
    let catalog = catalog();
    for id in OperationId::ALL {
        assert!(catalog.get(*id).is_some(), "Failed for id: {}", id);
    }
}

#[test]
fn test_category_sizes() {
    let test_cases = vec![
        (Category::Filters, 24),
        (Category::Operators, 3),
        (Category::Stats, 20),
        (Category::Special, 3),
    ];

    let catalog = catalog();
    for (category, expected) in test_cases {
        assert_eq!(
            catalog.by_category(category).count(),
            expected,
            "Failed for category: {:?}",
            category
        );
    }
}

#[test]
fn test_get_by_name() {
    let catalog = catalog();
    let sort = catalog.get_by_name("sort").expect("sort is defined");
    assert_eq!(sort.id, OperationId::Sort);
    assert_eq!(sort.category, Category::Pipes);

    match catalog.get_by_name("nope") {
        Err(Error::UnknownOperation(name)) => assert_eq!(name, "nope"),
        other => panic!("expected UnknownOperation, got {:?}", other.map(|d| d.id)),
    }
}

#[test]
fn test_keyword_lookup() {
    let catalog = catalog();
    let test_cases = vec![
        ("sort", Some(OperationId::Sort)),
        ("SORT", Some(OperationId::Sort)),
        ("unpack_json", Some(OperationId::UnpackJson)),
        ("count", None),
        ("error", None),
    ];

    for (word, expected) in test_cases {
        assert_eq!(catalog.pipe_id(word), expected, "Failed for word: {}", word);
    }
    assert_eq!(catalog.stats_id("count_uniq"), Some(OperationId::CountUniq));
    assert_eq!(catalog.stats_id("sort"), None);
}

#[test]
fn test_catalogs_are_shared_per_scope() {
    let a = Catalog::shared(&Scope::default());
    let b = Catalog::shared(&Scope::default());
    assert!(Arc::ptr_eq(&a, &b));

    let other = Catalog::for_default_field("message");
    assert!(!Arc::ptr_eq(&a, &other));
    assert_eq!(other.scope().default_field, "message");
}

#[test]
fn test_defaults_use_scope_field() {
    let catalog = Catalog::for_default_field("message");
    let word = catalog.get(OperationId::Word).expect("word is defined");
    assert_eq!(word.default_params[0], ParamValue::from("message"));
}

// ============================================================================
// Names
// ============================================================================

#[test]
fn test_category_from_str() {
    let test_cases = vec![
        ("filters", Some(Category::Filters)),
        ("Stats", Some(Category::Stats)),
        ("PIPES", Some(Category::Pipes)),
        ("bogus", None),
    ];

    for (input, expected) in test_cases {
        assert_eq!(Category::from_str(input).ok(), expected, "Failed for input: {}", input);
    }
    assert!(matches!(
        Category::from_str("bogus"),
        Err(Error::UnknownCategory(name)) if name == "bogus"
    ));
}

#[test]
fn test_operation_id_names() {
    for id in OperationId::ALL {
        assert_eq!(OperationId::from_str(id.as_str()).ok(), Some(*id));
        assert_eq!(id.to_string(), id.as_str());
    }
}

// ============================================================================
// Default Operations
// ============================================================================

#[test]
fn test_default_operations_render() {
    let catalog = catalog();
    let test_cases = vec![
        (OperationId::Limit, "limit 10"),
        (OperationId::Offset, "offset 0"),
        (OperationId::FieldNames, "field_names"),
        (OperationId::StreamContext, "stream_context"),
        (OperationId::Count, "count()"),
        (OperationId::Quantile, "quantile(0.5)"),
        (OperationId::And, "AND"),
        (OperationId::Options, "options()"),
    ];

    for (id, expected) in test_cases {
        let def = catalog.get(id).expect("defined");
        assert_eq!(
            def.render(&def.default_operation(), ""),
            expected,
            "Failed for id: {}",
            id
        );
    }
}

#[test]
fn test_split_string_by_params_reports_length() {
    let catalog = catalog();
    let limit = catalog.get(OperationId::Limit).expect("defined");
    let tokens = split_string("5 | x");
    let parsed = limit.split_string_by_params(&tokens, None);
    assert_eq!(parsed.params, vec![ParamValue::int(5)]);
    assert_eq!(parsed.length, 1);
}

#[test]
fn test_top_partition_round_trip() {
    let catalog = catalog();
    let top = catalog.get(OperationId::Top).expect("defined");
    let tokens = split_string("5 by (host) partition by (app)");
    let parsed = top.split_string_by_params(&tokens, None);
    assert_eq!(parsed.length, tokens.len());
    assert_eq!(parsed.params[5], ParamValue::from("app"));

    let op = Operation::new(OperationId::Top, parsed.params);
    assert_eq!(top.render(&op, "*"), "* | top 5 by (host) partition by (app)");
}

#[test]
fn test_substring_and_pattern_match_render() {
    let catalog = catalog();
    let test_cases = vec![
        (OperationId::Substring, "level", "disk full", "level:*`disk full`*"),
        (OperationId::Substring, "_msg", "text", "*text*"),
        (OperationId::PatternMatch, "_msg", "a<N>b", "pattern_match(`a<N>b`)"),
        (OperationId::PatternMatch, "f", "x", "f:pattern_match(`x`)"),
    ];

    for (id, field, value, expected) in test_cases {
        let def = catalog.get(id).expect("defined");
        let op = Operation::new(id, vec![field.into(), value.into()]);
        assert_eq!(def.render(&op, ""), expected, "Failed for value: {}", value);
    }
}

#[test]
fn test_quantile_keeps_two_digit_percentile() {
    let catalog = catalog();
    let quantile = catalog.get(OperationId::Quantile).expect("defined");
    let test_cases = vec![
        ("quantile(0.99, x)", 99, "quantile(0.99, x)"),
        ("quantile(0.5, x)", 5, "quantile(0.5, x)"),
        ("quantile(0.05, x)", 5, "quantile(0.5, x)"),
    ];

    for (input, percentile, expected) in test_cases {
        let tokens = split_string(input);
        let parsed = quantile.split_string_by_params(&tokens, None);
        assert_eq!(parsed.params[0], ParamValue::int(percentile), "Failed for input: {}", input);

        let op = Operation::new(OperationId::Quantile, parsed.params);
        assert_eq!(quantile.render(&op, ""), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_definition_summary_json() {
    let catalog = catalog();
    let sort = catalog.get(OperationId::Sort).expect("defined");
    let json = serde_json::to_value(DefinitionSummary::from(sort)).expect("serializable");
    assert_eq!(json["id"], "sort");
    assert_eq!(json["category"], "pipes");
    assert_eq!(json["params"][0]["name"], "Fields");
    assert_eq!(json["params"][1]["kind"], "boolean");
}

// ============================================================================
// Scope
// ============================================================================

#[test]
fn test_field_prefix() {
    let scope = Scope::default();
    let test_cases = vec![
        ("", ""),
        ("_msg", ""),
        ("level", "level:"),
        ("my field", "`my field`:"),
    ];

    for (field, expected) in test_cases {
        assert_eq!(scope.field_prefix(field), expected, "Failed for field: {}", field);
    }
}

#[test]
fn test_quote_or_empty() {
    let scope = Scope::default();
    assert_eq!(scope.quote_or_empty(""), "\"\"");
    assert_eq!(scope.quote_or_empty("a b"), "`a b`");
    assert_eq!(scope.quote_or_empty("a"), "a");
}

// ============================================================================
// Helpers
// ============================================================================

#[test]
fn test_parse_int() {
    let test_cases = vec![
        ("10", Some(10)),
        ("10s", Some(10)),
        ("-3", Some(-3)),
        ("+7", Some(7)),
        ("x", None),
        ("", None),
    ];

    for (input, expected) in test_cases {
        assert_eq!(parse_int(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_get_condition_from_string() {
    let test_cases = vec![
        ("if (a:b) rest", "a:b", 2),
        ("if(a:b) rest", "a:b", 1),
        ("rest", "", 0),
        ("if rest", "", 0),
    ];

    for (input, expected, consumed) in test_cases {
        let tokens = split_string(input);
        let mut cursor = TokenCursor::new(&tokens);
        assert_eq!(get_condition_from_string(&mut cursor), expected, "Failed for input: {}", input);
        assert_eq!(cursor.position(), consumed, "Failed for input: {}", input);
    }
}

#[test]
fn test_get_values_from_brackets() {
    let tokens = split_string("a, \"b c\", d");
    assert_eq!(
        get_values_from_brackets(&tokens, &Scope::default()),
        vec!["a", "b c", "d"]
    );
}

#[test]
fn test_get_field_list() {
    let tokens = split_string("a, \"b\" c");
    let mut cursor = TokenCursor::new(&tokens);
    assert_eq!(get_field_list(&mut cursor), "a, \"b\"");
    assert!(cursor.peek_is_word("c"));
}
