pub mod ast;
pub mod catalog;
pub mod cursor;
pub mod error;
pub mod filter_tree;
pub mod lexer;
pub mod modeller;
pub mod modify;
pub mod parser;
pub mod quote;
pub mod stream_filter;
pub mod suggest;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{
    BracketGroup, Category, FilterValue, FilterVisualQuery, LabelFilter, Operation, OperationId,
    ParamValue, ParseResult, Token, VisualQuery,
};
pub use catalog::{Catalog, OperationDefinition, Scope};
pub use cursor::TokenCursor;
pub use error::{Error, FilterTreeError, Result};
pub use filter_tree::{build_filter_tree, build_visual_query_from_string, filter_tree_to_string};
pub use lexer::{Lexer, split_string};
pub use modeller::{QueryModeller, build_visual_query_to_string};
pub use parser::{ParseOptions, Parser, parse_expr_to_visual_query};
pub use quote::{EscapeMode, quote_string, unquote_string};
