use serde::{Deserialize, Serialize};

use crate::quote::unquote_string;

/// A single lexical unit produced by the string splitter.
///
/// Whitespace between tokens is not kept; the renderer re-inserts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Token {
    /// Quoted text, delimiters included
    ///
    /// # Examples
    /// ```text
    /// "error"
    /// 'it\'s'
    /// `raw text`
    /// ```
    Quote { value: String },

    /// A bare word or a single break character
    ///
    /// Break characters (`,`, `|`, `=`, `!`) and a leading `-` are emitted
    /// as their own tokens.
    ///
    /// # Examples
    /// ```text
    /// error
    /// ,
    /// -
    /// ```
    Space { value: String },

    /// Text preceding an unquoted `:`
    ///
    /// The colon itself is not stored. A quoted field name produces a
    /// `Quote` followed by an empty `Colon`.
    ///
    /// # Examples
    /// ```text
    /// level:        -> Colon("level")
    /// "my field":   -> Quote, Colon("")
    /// ```
    Colon { value: String },

    /// A balanced `(...)`, `[...]` or `{...}` group
    ///
    /// # Examples
    /// ```text
    /// range(1, 5)
    /// {app="nginx"}
    /// [min, max]
    /// ```
    Bracket(BracketGroup),

    /// Text from an unquoted `#` to the end of the line
    Comment { value: String },
}

/// Captured bracket group together with its bareword prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketGroup {
    /// Raw text including both delimiters
    pub raw_value: String,
    /// Bareword immediately before the opening delimiter (`range` in `range(1,2)`)
    pub prefix: String,
    /// Tokenized interior
    pub value: Vec<Token>,
}

impl BracketGroup {
    /// Interior text with the outer delimiters stripped.
    pub fn inner(&self) -> &str {
        let mut chars = self.raw_value.chars();
        chars.next();
        chars.next_back();
        chars.as_str()
    }

    pub fn opens_with(&self, ch: char) -> bool {
        self.raw_value.starts_with(ch)
    }

    pub fn closes_with(&self, ch: char) -> bool {
        self.raw_value.ends_with(ch)
    }

    /// Prefix followed by the raw group, as it appeared in the source.
    pub fn source_text(&self) -> String {
        format!("{}{}", self.prefix, self.raw_value)
    }
}

impl Token {
    pub fn quote(value: impl Into<String>) -> Self {
        Token::Quote { value: value.into() }
    }

    pub fn space(value: impl Into<String>) -> Self {
        Token::Space { value: value.into() }
    }

    pub fn colon(value: impl Into<String>) -> Self {
        Token::Colon { value: value.into() }
    }

    pub fn comment(value: impl Into<String>) -> Self {
        Token::Comment { value: value.into() }
    }

    pub fn bracket(raw_value: impl Into<String>, prefix: impl Into<String>, value: Vec<Token>) -> Self {
        Token::Bracket(BracketGroup {
            raw_value: raw_value.into(),
            prefix: prefix.into(),
            value,
        })
    }

    /// Raw text of any non-bracket token.
    pub fn text(&self) -> Option<&str> {
        match self {
            Token::Quote { value }
            | Token::Space { value }
            | Token::Colon { value }
            | Token::Comment { value } => Some(value),
            Token::Bracket(_) => None,
        }
    }

    /// True when this is a non-bracket token whose raw text equals `text`.
    pub fn text_is(&self, text: &str) -> bool {
        self.text() == Some(text)
    }

    /// True when this is a `Space` token equal to `word`.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Space { value } if value == word)
    }

    /// Case-insensitive variant of [`Token::is_word`].
    pub fn is_word_ignore_case(&self, word: &str) -> bool {
        matches!(self, Token::Space { value } if value.eq_ignore_ascii_case(word))
    }

    pub fn space_value(&self) -> Option<&str> {
        match self {
            Token::Space { value } => Some(value),
            _ => None,
        }
    }

    pub fn colon_value(&self) -> Option<&str> {
        match self {
            Token::Colon { value } => Some(value),
            _ => None,
        }
    }

    pub fn as_bracket(&self) -> Option<&BracketGroup> {
        match self {
            Token::Bracket(group) => Some(group),
            _ => None,
        }
    }

    pub fn is_quote(&self) -> bool {
        matches!(self, Token::Quote { .. })
    }

    pub fn is_space(&self) -> bool {
        matches!(self, Token::Space { .. })
    }

    pub fn is_colon(&self) -> bool {
        matches!(self, Token::Colon { .. })
    }

    pub fn is_bracket(&self) -> bool {
        matches!(self, Token::Bracket(_))
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Token::Comment { .. })
    }

    /// Quote and space tokens carry a value usable as a parameter.
    pub fn is_value(&self) -> bool {
        matches!(self, Token::Quote { .. } | Token::Space { .. })
    }

    /// Parameter value of the token: quotes are unquoted, spaces are returned
    /// as-is, everything else yields an empty string.
    pub fn get_value(&self) -> String {
        match self {
            Token::Quote { value } => unquote_string(value),
            Token::Space { value } => value.clone(),
            _ => String::new(),
        }
    }
}
