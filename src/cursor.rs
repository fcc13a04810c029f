use crate::ast::{BracketGroup, Token};

/// Read position over an immutable token slice.
///
/// Operation parsers consume tokens through this view; the number of tokens
/// an operation used is simply how far the cursor moved.
#[derive(Debug, Clone)]
pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        TokenCursor {
            tokens,
            position: 0,
        }
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    pub fn peek_nth(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.position + offset)
    }

    pub fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    pub fn advance_by(&mut self, count: usize) {
        self.position = (self.position + count).min(self.tokens.len());
    }

    pub fn remaining(&self) -> &'a [Token] {
        &self.tokens[self.position.min(self.tokens.len())..]
    }

    pub fn remaining_len(&self) -> usize {
        self.tokens.len().saturating_sub(self.position)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining_len() == 0
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn peek_bracket(&self) -> Option<&'a BracketGroup> {
        self.peek().and_then(Token::as_bracket)
    }

    /// Next token is a `Space` equal to `word`, ignoring ASCII case.
    /// LogsQL keywords (`by`, `desc`, `limit`, ...) are case-insensitive.
    pub fn peek_is_word(&self, word: &str) -> bool {
        self.peek().is_some_and(|t| t.is_word_ignore_case(word))
    }

    /// Next token is any non-bracket token with text `text`.
    pub fn peek_text_is(&self, text: &str) -> bool {
        self.peek().is_some_and(|t| t.text_is(text))
    }

    /// Consume the next token if it is the `Space` word `word`.
    pub fn eat_word(&mut self, word: &str) -> bool {
        if self.peek_is_word(word) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Consume the next token if it carries the text `text`.
    pub fn eat_text(&mut self, text: &str) -> bool {
        if self.peek_text_is(text) {
            self.position += 1;
            true
        } else {
            false
        }
    }
}

#[test]
fn test_cursor_consumption() {
    let tokens = vec![Token::space("sort"), Token::space("by"), Token::space("desc")];
    let mut cursor = TokenCursor::new(&tokens);
    assert!(!cursor.eat_word("by"));
    assert_eq!(cursor.advance(), Some(&tokens[0]));
    assert!(cursor.eat_word("by"));
    assert_eq!(cursor.remaining(), &tokens[2..]);
    cursor.advance_by(5);
    assert!(cursor.is_empty());
    assert_eq!(cursor.position(), 3);
    assert_eq!(cursor.advance(), None);
}

#[test]
fn test_keywords_ignore_case() {
    let tokens = vec![Token::space("BY"), Token::space("Desc"), Token::space(",")];
    let mut cursor = TokenCursor::new(&tokens);
    assert!(cursor.eat_word("by"));
    assert!(cursor.peek_is_word("desc"));
    assert!(cursor.eat_word("desc"));
    assert!(cursor.eat_text(","));
}
