use tracing::warn;

use crate::ast::Token;

const OPENING: [char; 3] = ['(', '[', '{'];
const CLOSING: [char; 3] = [')', ']', '}'];
const BREAK_CHARS: [char; 7] = [',', '|', '=', ' ', '\n', '\r', '!'];

/// Bracket interiors nested deeper than this are kept as raw text only.
pub const MAX_NESTING_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteMode {
    None,
    Single,
    Double,
    Backtick,
}

impl QuoteMode {
    fn for_char(ch: char) -> Self {
        match ch {
            '\'' => QuoteMode::Single,
            '"' => QuoteMode::Double,
            '`' => QuoteMode::Backtick,
            _ => QuoteMode::None,
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    depth: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer::nested(input, 0)
    }

    fn nested(input: &str, depth: usize) -> Self {
        Lexer {
            input: input.trim().chars().collect(),
            position: 0,
            depth,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Run the scan to the end of input. Never fails: unterminated quotes,
    /// brackets and comments are flushed as best-effort tokens.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut buffer = String::new();
        let mut quote = QuoteMode::None;
        let mut escaped = false;
        let mut in_comment = false;
        let mut bracket_depth = 0usize;
        let mut bracket_quote: Option<char> = None;
        let mut bracket_escaped = false;

        while let Some(ch) = self.current_char() {
            self.advance();

            if bracket_depth > 0 {
                buffer.push(ch);
                if let Some(open) = bracket_quote {
                    if bracket_escaped {
                        bracket_escaped = false;
                    } else if ch == '\\' {
                        bracket_escaped = true;
                    } else if ch == open {
                        bracket_quote = None;
                    }
                } else if matches!(ch, '"' | '\'' | '`') {
                    bracket_quote = Some(ch);
                } else if CLOSING.contains(&ch) {
                    bracket_depth -= 1;
                    if bracket_depth == 0 {
                        tokens.push(self.bracket_token(&buffer, true));
                        buffer.clear();
                    }
                } else if OPENING.contains(&ch) {
                    bracket_depth += 1;
                }
                continue;
            }

            if escaped {
                buffer.push(ch);
                escaped = false;
                continue;
            }

            if in_comment {
                if ch == '\n' {
                    in_comment = false;
                    let text = buffer.trim();
                    if !text.is_empty() {
                        tokens.push(Token::comment(text));
                    }
                    buffer.clear();
                } else {
                    buffer.push(ch);
                }
                continue;
            }

            if ch == '`' && matches!(quote, QuoteMode::None | QuoteMode::Backtick) {
                self.toggle_quote(ch, &mut quote, &mut buffer, &mut tokens);
                continue;
            }
            if quote == QuoteMode::Backtick {
                buffer.push(ch);
                continue;
            }
            if ch == '\\' {
                buffer.push(ch);
                escaped = true;
                continue;
            }
            if (ch == '\'' || ch == '"')
                && (quote == QuoteMode::None || quote == QuoteMode::for_char(ch))
            {
                self.toggle_quote(ch, &mut quote, &mut buffer, &mut tokens);
                continue;
            }
            if quote != QuoteMode::None {
                buffer.push(ch);
                continue;
            }

            match ch {
                '#' => {
                    flush_space(&mut buffer, &mut tokens);
                    in_comment = true;
                }
                ':' => {
                    tokens.push(Token::colon(buffer.as_str()));
                    buffer.clear();
                }
                c if OPENING.contains(&c) => {
                    bracket_depth = 1;
                    buffer.push(c);
                }
                '-' if buffer.trim().is_empty() => {
                    tokens.push(Token::space("-"));
                    buffer.clear();
                }
                c if BREAK_CHARS.contains(&c) => {
                    flush_space(&mut buffer, &mut tokens);
                    if !c.is_whitespace() {
                        tokens.push(Token::space(c.to_string()));
                    }
                }
                c => buffer.push(c),
            }
        }

        if !buffer.trim().is_empty() {
            if quote != QuoteMode::None {
                let closer = buffer.chars().next().unwrap_or('"');
                buffer.push(closer);
                tokens.push(Token::quote(buffer));
            } else if bracket_depth > 0 {
                tokens.push(self.bracket_token(&buffer, false));
            } else if in_comment {
                tokens.push(Token::comment(buffer.trim()));
            } else {
                tokens.push(Token::space(buffer.trim()));
            }
        }

        tokens
    }

    fn toggle_quote(
        &self,
        ch: char,
        quote: &mut QuoteMode,
        buffer: &mut String,
        tokens: &mut Vec<Token>,
    ) {
        if *quote == QuoteMode::None {
            flush_space(buffer, tokens);
            *quote = QuoteMode::for_char(ch);
            buffer.push(ch);
        } else {
            *quote = QuoteMode::None;
            buffer.push(ch);
            tokens.push(Token::quote(buffer.as_str()));
            buffer.clear();
        }
    }

    /// Split a captured `prefix(...)` run into its parts and tokenize the
    /// interior. `closed` is false for a bracket cut off by end of input.
    fn bracket_token(&self, captured: &str, closed: bool) -> Token {
        let split_at = captured.find(OPENING).unwrap_or(0);
        let (prefix, raw) = captured.split_at(split_at);

        let mut interior = raw.chars();
        interior.next();
        if closed {
            interior.next_back();
        }

        let value = if self.depth + 1 >= MAX_NESTING_DEPTH {
            warn!(depth = self.depth, "bracket nesting too deep, keeping raw text");
            Vec::new()
        } else {
            Lexer::nested(interior.as_str(), self.depth + 1).tokenize()
        };

        Token::bracket(raw, prefix, value)
    }
}

fn flush_space(buffer: &mut String, tokens: &mut Vec<Token>) {
    let text = buffer.trim();
    if !text.is_empty() {
        tokens.push(Token::space(text));
    }
    buffer.clear();
}

/// Tokenize a LogsQL expression.
pub fn split_string(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}

/// Rebuild source-like text from tokens, one space between tokens.
pub fn build_split_string(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter_map(|token| match token {
            Token::Bracket(group) => Some(group.source_text()),
            Token::Quote { value } | Token::Space { value } => Some(value.clone()),
            Token::Colon { value } => Some(format!("{}:", value)),
            Token::Comment { .. } => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Split at every non-bracket token whose text equals `separator`.
/// A trailing empty segment is dropped.
pub fn split_by_unescaped_char<'a>(tokens: &'a [Token], separator: &str) -> Vec<&'a [Token]> {
    let mut segments = Vec::new();
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        if token.text_is(separator) {
            segments.push(&tokens[start..i]);
            start = i + 1;
        }
    }
    if start < tokens.len() {
        segments.push(&tokens[start..]);
    }
    segments
}

pub fn split_by_unescaped_pipe(tokens: &[Token]) -> Vec<&[Token]> {
    split_by_unescaped_char(tokens, "|")
}

/// Isolate bare `and` / `or` / `not` words into their own segments.
pub fn split_by_operator(tokens: &[Token]) -> Vec<&[Token]> {
    let mut segments = Vec::new();
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        let is_operator = token
            .space_value()
            .is_some_and(|v| matches!(v.to_lowercase().as_str(), "and" | "or" | "not"));
        if is_operator {
            segments.push(&tokens[start..i]);
            segments.push(&tokens[i..i + 1]);
            start = i + 1;
        }
    }
    if start < tokens.len() {
        segments.push(&tokens[start..]);
    }
    segments
}

#[test]
fn test_break_characters() {
    let tokens = split_string("a,b|c=d !e");
    let values: Vec<_> = tokens.iter().filter_map(Token::text).collect();
    assert_eq!(values, vec!["a", ",", "b", "|", "c", "=", "d", "!", "e"]);
}

#[test]
fn test_unterminated_quote() {
    let tokens = split_string("field:\"abc");
    assert_eq!(tokens, vec![Token::colon("field"), Token::quote("\"abc\"")]);
}

#[test]
fn test_comment_flushes_buffer() {
    let tokens = split_string("error# note\nwarn");
    assert_eq!(
        tokens,
        vec![Token::space("error"), Token::comment("note"), Token::space("warn")]
    );
}
