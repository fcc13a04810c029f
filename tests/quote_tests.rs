// tests/quote_tests.rs

use logsql_builder::ast::Token;
use logsql_builder::quote::{
    EscapeMode, get_value, is_value, must_quote, quote_string, quote_string_with, unquote_string,
    unquote_string_with,
};

// ============================================================================
// Quoting
// ============================================================================

#[test]
fn test_must_quote() {
    let test_cases = vec![
        ("error", false),
        ("_msg", false),
        ("by", true),
        ("sort", true),
        ("COUNT", true),
        ("a b", true),
        ("level:x", true),
        ("a|b", true),
        ("", false),
    ];

    for (input, expected) in test_cases {
        assert_eq!(must_quote(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_quote_string() {
    let test_cases = vec![
        ("error", "error"),
        ("hello world", "`hello world`"),
        ("limit", "`limit`"),
        ("a`b c", "\"a`b c\""),
        ("a`b\"c d", "'a`b\"c d'"),
        ("", ""),
    ];

    for (input, expected) in test_cases {
        assert_eq!(quote_string(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_quote_string_forced() {
    let test_cases = vec![
        ("abc", Some(true), "`abc`"),
        ("abc", Some(false), "abc"),
        ("", Some(false), "``"),
        ("  ", Some(false), "`  `"),
        ("", None, ""),
    ];

    for (input, force, expected) in test_cases {
        assert_eq!(
            quote_string_with(input, force, EscapeMode::All),
            expected,
            "Failed for input: {:?} {:?}",
            input,
            force
        );
    }
}

#[test]
fn test_quote_escapes_backslashes() {
    assert_eq!(quote_string("a`\\b c"), "\"a`\\\\b c\"");
}

// ============================================================================
// Unquoting
// ============================================================================

#[test]
fn test_unquote_string() {
    let test_cases = vec![
        ("`abc`", "abc"),
        ("\"a b\"", "a b"),
        ("\"a\\\"b\"", "a\"b"),
        ("'it\\'s'", "it's"),
        ("\"a\\\\b\"", "a\\b"),
        ("plain", "plain"),
        ("\"unterminated", "\"unterminated"),
        ("\"\"", ""),
    ];

    for (input, expected) in test_cases {
        assert_eq!(unquote_string(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_escape_modes() {
    let input = "\"a\\\"b\\\"c\"";
    assert_eq!(unquote_string_with(input, EscapeMode::All), "a\"b\"c");
    assert_eq!(unquote_string_with(input, EscapeMode::FirstOccurrence), "a\"b\\\"c");
}

#[test]
fn test_quote_then_unquote_keeps_text() {
    let test_cases = vec!["hello world", "a`b c", "a`b\"c d", "x\\y z"];

    for input in test_cases {
        let quoted = quote_string(input);
        assert_eq!(unquote_string(&quoted), input, "Failed for input: {}", input);
    }
}

// ============================================================================
// Token Values
// ============================================================================

#[test]
fn test_token_values() {
    let test_cases = vec![
        (Token::quote("\"a b\""), true, "a b"),
        (Token::space("error"), true, "error"),
        (Token::colon("level"), false, ""),
        (Token::bracket("(x)", "", vec![Token::space("x")]), false, ""),
    ];

    for (token, expected_is_value, expected_value) in test_cases {
        assert_eq!(is_value(&token), expected_is_value, "Failed for token: {:?}", token);
        assert_eq!(
            get_value(&token, EscapeMode::All),
            expected_value,
            "Failed for token: {:?}",
            token
        );
    }
}
