//! Dump the token stream of a query

use super::{CliError, require_query, to_json};
use crate::lexer::split_string;

#[derive(Debug, Clone, Default)]
pub struct TokensOptions {
    pub query: String,
    pub pretty: bool,
}

pub fn execute_tokens(options: &TokensOptions) -> Result<String, CliError> {
    let query = require_query(&options.query)?;
    to_json(&split_string(query), options.pretty)
}
