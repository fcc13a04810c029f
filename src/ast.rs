//! # LogsQL Visual Query Model
//!
//! Data types shared by both directions of the transducer: the tokens the
//! string splitter produces, the operation list the driver builds, and the
//! filter tree a visual builder edits.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[params]** - Positional operation parameters (string, number, boolean)
//! - **[operation]** - Operation ids, categories and the `Operation` record
//! - **[filter]** - Nested AND/OR filter tree addressed by index paths
//! - **[query]** - The `VisualQuery` root and parse results
//!
//! ## Quick Start
//!
//! ```text
//! level:error AND _time:5m | stats by (host) count() as total | sort by (total) desc
//! ```
//!
//! Parses into the operation list:
//!
//! ```text
//! word(level, error)
//! and
//! time(5m)
//! stats(host, "count() as total")
//! sort(total, desc)
//! ```
//!
//! ## Core Concepts
//!
//! ### Tokens
//!
//! Whitespace is never a token. Quotes keep their delimiters, brackets keep
//! their raw text plus a recursively tokenized interior, and a bareword in
//! front of a bracket is stored as its `prefix`.
//!
//! ### Operations
//!
//! An operation is an id plus positional parameters. The catalog decides
//! what each position means; the JSON form is a plain array:
//!
//! ```text
//! {"id": "sort", "params": ["total", true, 10, 0, ""]}
//! ```
//!
//! ### Filter Trees
//!
//! ```text
//! (a:1 and b:2) or c:3
//! ```
//!
//! becomes `{operators: [or], values: [{operators: [and], values: [a:1, b:2]}, c:3]}`.
pub mod filter;
pub mod operation;
pub mod params;
pub mod query;
pub mod tokens;

pub use filter::{FilterValue, FilterVisualQuery};
pub use operation::{Category, Operation, OperationId};
pub use params::ParamValue;
pub use query::{LabelFilter, ParseResult, VisualQuery};
pub use tokens::{BracketGroup, Token};
