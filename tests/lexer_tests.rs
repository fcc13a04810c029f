// tests/lexer_tests.rs

use logsql_builder::ast::Token;
use logsql_builder::lexer::{
    MAX_NESTING_DEPTH, build_split_string, split_by_operator, split_by_unescaped_char,
    split_by_unescaped_pipe, split_string,
};

// ============================================================================
// Words and Break Characters
// ============================================================================

#[test]
fn test_simple_tokens() {
    let test_cases = vec![
        ("error", vec![Token::space("error")]),
        ("  error  ", vec![Token::space("error")]),
        ("error warn", vec![Token::space("error"), Token::space("warn")]),
        (
            "a,b",
            vec![Token::space("a"), Token::space(","), Token::space("b")],
        ),
        (
            "a | b",
            vec![Token::space("a"), Token::space("|"), Token::space("b")],
        ),
        (
            "!error",
            vec![Token::space("!"), Token::space("error")],
        ),
        ("-error", vec![Token::space("-"), Token::space("error")]),
        ("a-b", vec![Token::space("a-b")]),
        ("", vec![]),
    ];

    for (input, expected) in test_cases {
        assert_eq!(split_string(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_colon_tokens() {
    let test_cases = vec![
        (
            "level:error",
            vec![Token::colon("level"), Token::space("error")],
        ),
        (
            "level:=error",
            vec![Token::colon("level"), Token::space("="), Token::space("error")],
        ),
        (
            "\"my field\":value",
            vec![
                Token::quote("\"my field\""),
                Token::colon(""),
                Token::space("value"),
            ],
        ),
        (
            "_time:12:00",
            vec![Token::colon("_time"), Token::colon("12"), Token::space("00")],
        ),
    ];

    for (input, expected) in test_cases {
        assert_eq!(split_string(input), expected, "Failed for input: {}", input);
    }
}

// ============================================================================
// Quotes and Escapes
// ============================================================================

#[test]
fn test_quote_tokens() {
    let test_cases = vec![
        ("\"a b\"", vec![Token::quote("\"a b\"")]),
        ("'a b'", vec![Token::quote("'a b'")]),
        ("`a \"b\"`", vec![Token::quote("`a \"b\"`")]),
        ("\"a\\\"b\"", vec![Token::quote("\"a\\\"b\"")]),
        ("\"it's\"", vec![Token::quote("\"it's\"")]),
        (
            "x\"y\"",
            vec![Token::space("x"), Token::quote("\"y\"")],
        ),
    ];

    for (input, expected) in test_cases {
        assert_eq!(split_string(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_escaped_space_stays_in_word() {
    assert_eq!(split_string("a\\ b"), vec![Token::space("a\\ b")]);
}

#[test]
fn test_unterminated_quote_is_closed() {
    assert_eq!(split_string("'abc"), vec![Token::quote("'abc'")]);
}

// ============================================================================
// Brackets
// ============================================================================

#[test]
fn test_bracket_tokens() {
    let test_cases = vec![
        (
            "range(1, 5)",
            Token::bracket(
                "(1, 5)",
                "range",
                vec![Token::space("1"), Token::space(","), Token::space("5")],
            ),
        ),
        (
            "{app=\"nginx\"}",
            Token::bracket(
                "{app=\"nginx\"}",
                "",
                vec![Token::space("app"), Token::space("="), Token::quote("\"nginx\"")],
            ),
        ),
        (
            "range[1, 5)",
            Token::bracket(
                "[1, 5)",
                "range",
                vec![Token::space("1"), Token::space(","), Token::space("5")],
            ),
        ),
        ("count()", Token::bracket("()", "count", vec![])),
    ];

    for (input, expected) in test_cases {
        assert_eq!(split_string(input), vec![expected], "Failed for input: {}", input);
    }
}

#[test]
fn test_bracket_after_space_has_no_prefix() {
    let tokens = split_string("by (host)");
    assert_eq!(
        tokens,
        vec![
            Token::space("by"),
            Token::bracket("(host)", "", vec![Token::space("host")]),
        ]
    );
}

#[test]
fn test_closing_bracket_inside_quotes_is_ignored() {
    let tokens = split_string("seq(\")\") x");
    assert_eq!(
        tokens,
        vec![
            Token::bracket("(\")\")", "seq", vec![Token::quote("\")\"")]),
            Token::space("x"),
        ]
    );
}

#[test]
fn test_nested_brackets() {
    let tokens = split_string("(a (b))");
    let Some(Token::Bracket(outer)) = tokens.first() else {
        panic!("expected a bracket, got {:?}", tokens);
    };
    assert_eq!(outer.raw_value, "(a (b))");
    assert_eq!(outer.value.len(), 2);
    assert!(matches!(&outer.value[1], Token::Bracket(inner) if inner.raw_value == "(b)"));
}

#[test]
fn test_unterminated_bracket_is_tokenized() {
    let tokens = split_string("range(1, 5");
    assert_eq!(
        tokens,
        vec![Token::bracket(
            "(1, 5",
            "range",
            vec![Token::space("1"), Token::space(","), Token::space("5")],
        )]
    );
}

#[test]
fn test_deep_nesting_keeps_raw_text() {
    let depth = MAX_NESTING_DEPTH + 10;
    let input = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
    let tokens = split_string(&input);
    assert_eq!(tokens.len(), 1);

    let mut current = &tokens[0];
    let mut levels = 0;
    while let Token::Bracket(group) = current {
        levels += 1;
        match group.value.first() {
            Some(next) => current = next,
            None => break,
        }
    }
    assert!(levels < depth, "nesting should stop before {} levels", depth);
}

// ============================================================================
// Comments
// ============================================================================

#[test]
fn test_comment_tokens() {
    let test_cases = vec![
        (
            "error # note",
            vec![Token::space("error"), Token::comment("note")],
        ),
        (
            "# first\nerror",
            vec![Token::comment("first"), Token::space("error")],
        ),
        ("\"a # b\"", vec![Token::quote("\"a # b\"")]),
    ];

    for (input, expected) in test_cases {
        assert_eq!(split_string(input), expected, "Failed for input: {}", input);
    }
}

// ============================================================================
// Splitting Helpers
// ============================================================================

#[test]
fn test_build_split_string() {
    let test_cases = vec![
        ("level:error", "level: error"),
        ("range(1, 5)", "range(1, 5)"),
        ("a , b", "a , b"),
        ("\"x y\" z", "\"x y\" z"),
        ("error # gone", "error"),
    ];

    for (input, expected) in test_cases {
        let tokens = split_string(input);
        assert_eq!(build_split_string(&tokens), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_split_by_unescaped_pipe() {
    let test_cases = vec![
        ("a | b | c", 3),
        ("a", 1),
        ("a |", 1),
        ("\"a | b\" | c", 2),
        ("f(a | b) | c", 2),
    ];

    for (input, expected) in test_cases {
        let tokens = split_string(input);
        assert_eq!(split_by_unescaped_pipe(&tokens).len(), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_split_by_unescaped_char() {
    let tokens = split_string("a, b, c");
    let segments = split_by_unescaped_char(&tokens, ",");
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[2], &[Token::space("c")][..]);
}

#[test]
fn test_split_by_operator() {
    let tokens = split_string("a AND b or c");
    let segments = split_by_operator(&tokens);
    let texts: Vec<String> = segments.iter().map(|s| build_split_string(s)).collect();
    assert_eq!(texts, vec!["a", "AND", "b", "or", "c"]);
}
