use thiserror::Error;

/// Errors surfaced by the library.
///
/// Parsing itself never fails; these cover lookups by name, JSON decoding
/// and the suggestion collaborator.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown operation id: `{0}`")]
    UnknownOperation(String),
    #[error("unknown operation category: `{0}`")]
    UnknownCategory(String),
    #[error(transparent)]
    FilterTree(#[from] FilterTreeError),
    #[error("suggestion source failed: {0}")]
    Suggestion(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Structural problems found while building a filter tree. These are
/// reported as messages next to the partial tree, never returned as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterTreeError {
    #[error("unbalanced parentheses at position {position}")]
    UnbalancedParentheses { position: usize },
    #[error("filter groups nested deeper than {max} levels")]
    NestingTooDeep { max: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
