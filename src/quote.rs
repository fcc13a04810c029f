//! Quoting rules shared by the parser and the renderers.

use serde::{Deserialize, Serialize};

use crate::ast::{OperationId, Token};

/// How many backslash/quote occurrences `quote`/`unquote` escape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum EscapeMode {
    /// Escape every occurrence.
    #[default]
    All,
    /// Escape only the first occurrence of each character. Kept for
    /// compatibility with queries produced by older builders.
    FirstOccurrence,
}

const KEYWORDS: &[&str] = &[
    "by",
    "limit",
    "as",
    "from",
    "keep_original_fields",
    "skip_empty_results",
    "if",
    "prettify",
    "max_values_per_field",
    "max_value_len",
    "keep_const_fields",
    "partition",
    "desc",
    "inner",
    "prefix",
    "offset",
    "before",
    "after",
    "time_window",
    "hits",
    "rank",
    "with",
    "result_prefix",
    "fields",
    "drop_duplicates",
    "concurrency",
    "ignore_global_time_filter",
    "i",
    "at",
    "in",
];

const RESERVED_CHARS: &[char] = &[
    ' ', '\'', '"', '`', ':', '=', '#', '>', '<', ',', '(', ')', '[', ']', '{', '}', '+', '-',
    '/', '%', '|', '&', '^', '~', '!', ';', '?', '@', '\\', '*',
];

/// True when `word` collides with an operation id or keyword, or contains
/// a character with meaning in LogsQL.
pub fn must_quote(word: &str) -> bool {
    let word = word.trim().to_lowercase();
    OperationId::ALL.iter().any(|id| id.as_str() == word)
        || KEYWORDS.contains(&word.as_str())
        || word.contains(RESERVED_CHARS)
}

fn replace(s: &str, from: &str, to: &str, mode: EscapeMode) -> String {
    match mode {
        EscapeMode::All => s.replace(from, to),
        EscapeMode::FirstOccurrence => s.replacen(from, to, 1),
    }
}

/// Quote `s` with the default escape mode when it needs quoting.
pub fn quote_string(s: &str) -> String {
    quote_string_with(s, None, EscapeMode::All)
}

/// Quote `s`, choosing the first delimiter it does not already contain
/// (backtick, double quote, single quote).
///
/// `force = Some(true)` always quotes. `force = Some(false)` quotes only
/// when needed but still turns a blank string into a visible quoted one.
pub fn quote_string_with(s: &str, force: Option<bool>, mode: EscapeMode) -> String {
    let blank_must_show = force == Some(false) && s.trim().is_empty();
    if !must_quote(s) && force != Some(true) && !blank_must_show {
        return s.to_string();
    }

    if !s.contains('`') {
        return format!("`{}`", s);
    }
    if !s.contains('"') {
        let escaped = replace(&replace(s, "\\", "\\\\", mode), "\"", "\\\"", mode);
        return format!("\"{}\"", escaped);
    }
    if !s.contains('\'') {
        let escaped = replace(&replace(s, "\\", "\\\\", mode), "'", "\\'", mode);
        return format!("'{}'", escaped);
    }
    format!("`{}`", replace(s, "`", "\\`", mode))
}

pub fn unquote_string(s: &str) -> String {
    unquote_string_with(s, EscapeMode::All)
}

/// Strip matching delimiters and undo the escaping applied by
/// [`quote_string_with`]. Text without delimiters is returned unchanged.
pub fn unquote_string_with(s: &str, mode: EscapeMode) -> String {
    let Some(delimiter) = s.chars().next().filter(|c| matches!(c, '"' | '\'' | '`')) else {
        return s.to_string();
    };
    if !s.ends_with(delimiter) {
        return s.to_string();
    }
    if s.len() < 2 {
        return String::new();
    }

    let inner = &s[1..s.len() - 1];
    match delimiter {
        '`' => replace(inner, "\\`", "`", mode),
        quote => {
            let escaped_quote = format!("\\{}", quote);
            let unescaped = replace(inner, &escaped_quote, &quote.to_string(), mode);
            replace(&unescaped, "\\\\", "\\", mode)
        }
    }
}

pub fn is_value(token: &Token) -> bool {
    token.is_value()
}

/// Parameter value of a token under the given escape mode.
pub fn get_value(token: &Token, mode: EscapeMode) -> String {
    match token {
        Token::Quote { value } => unquote_string_with(value, mode),
        Token::Space { value } => value.clone(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_occurrence_mode() {
        let quoted = quote_string_with("a\\b\\c`\"", None, EscapeMode::FirstOccurrence);
        assert_eq!(quoted, "'a\\\\b\\c`\"'");
        assert_eq!(unquote_string_with(&quoted, EscapeMode::FirstOccurrence), "a\\b\\c`\"");
    }
}
