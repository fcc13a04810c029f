use crate::ast::{BracketGroup, Token};
use crate::cursor::TokenCursor;

use super::Scope;

/// Consume a leading `field:`, `field :` or `"quoted field":` prefix.
pub fn get_field_name(cursor: &mut TokenCursor<'_>, scope: &Scope) -> Option<String> {
    let first = cursor.peek()?;
    let followed_by_bare_colon = cursor
        .peek_nth(1)
        .is_some_and(|t| t.colon_value() == Some(""));

    let name = match first {
        Token::Colon { value } => {
            cursor.advance();
            value.clone()
        }
        Token::Space { value } if followed_by_bare_colon => {
            cursor.advance_by(2);
            value.clone()
        }
        Token::Quote { .. } if followed_by_bare_colon => {
            cursor.advance_by(2);
            scope.value(first)
        }
        _ => return None,
    };
    Some(name.trim().to_string())
}

/// Name of the function call at the head of `tokens`: a bracket prefix
/// (`range(...)`) or a word directly followed by a bare bracket (`range (...)`).
pub fn get_function_name(tokens: &[Token]) -> &str {
    match tokens.first() {
        Some(Token::Bracket(group)) => &group.prefix,
        Some(Token::Space { value })
            if tokens
                .get(1)
                .and_then(Token::as_bracket)
                .is_some_and(|b| b.prefix.is_empty()) =>
        {
            value
        }
        _ => "",
    }
}

/// Consume an `if (cond)` / `if(cond)` clause and return the condition text.
pub fn get_condition_from_string(cursor: &mut TokenCursor<'_>) -> String {
    if cursor.peek_is_word("if") {
        if let Some(group) = cursor.peek_nth(1).and_then(Token::as_bracket) {
            if group.prefix.is_empty() {
                cursor.advance_by(2);
                return group.inner().to_string();
            }
        }
        return String::new();
    }
    if let Some(group) = cursor.peek_bracket() {
        if group.prefix.eq_ignore_ascii_case("if") {
            cursor.advance();
            return group.inner().to_string();
        }
    }
    String::new()
}

/// Values listed inside a bracket, commas dropped and quotes removed.
pub fn get_values_from_brackets(tokens: &[Token], scope: &Scope) -> Vec<String> {
    tokens
        .iter()
        .filter(|t| t.is_quote() || (t.is_space() && !t.text_is(",")))
        .map(|t| scope.value(t))
        .collect()
}

/// Consume an unbracketed `a, b, "c d"` list and return it comma-joined with
/// the original quoting kept.
pub fn get_field_list(cursor: &mut TokenCursor<'_>) -> String {
    let mut fields = Vec::new();
    while let Some(token) = cursor.peek() {
        if !token.is_value() || token.text_is(",") {
            break;
        }
        fields.push(token.text().unwrap_or_default().to_string());
        cursor.advance();
        if !cursor.eat_text(",") {
            break;
        }
    }
    fields.join(", ")
}

/// Next value token, consumed.
pub(crate) fn take_value(scope: &Scope, cursor: &mut TokenCursor<'_>) -> Option<String> {
    let token = cursor.peek().filter(|t| t.is_value() && !t.text_is(","))?;
    cursor.advance();
    Some(scope.value(token))
}

/// Consume an unprefixed bracket group.
pub(crate) fn take_group<'a>(cursor: &mut TokenCursor<'a>) -> Option<&'a BracketGroup> {
    let group = cursor.peek_bracket().filter(|g| g.prefix.is_empty())?;
    cursor.advance();
    Some(group)
}

/// Consume `keyword (...)` or `keyword(...)`.
pub(crate) fn take_keyword_group<'a>(
    cursor: &mut TokenCursor<'a>,
    keyword: &str,
) -> Option<&'a BracketGroup> {
    if let Some(group) = cursor.peek_bracket() {
        if group.prefix.eq_ignore_ascii_case(keyword) {
            cursor.advance();
            return Some(group);
        }
        return None;
    }
    if cursor.peek_is_word(keyword) {
        let group = cursor
            .peek_nth(1)
            .and_then(Token::as_bracket)
            .filter(|g| g.prefix.is_empty())?;
        cursor.advance_by(2);
        return Some(group);
    }
    None
}

/// Consume `name(...)`, `name (...)` or a bare `(...)` call.
pub(crate) fn take_call<'a>(cursor: &mut TokenCursor<'a>) -> Option<&'a BracketGroup> {
    if cursor.peek().is_some_and(Token::is_space) {
        let group = cursor.peek_nth(1).and_then(Token::as_bracket)?;
        cursor.advance_by(2);
        return Some(group);
    }
    let group = cursor.peek_bracket()?;
    cursor.advance();
    Some(group)
}
