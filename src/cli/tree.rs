//! Show the filter tree of a query

use super::{CliError, require_query, to_json};
use crate::filter_tree::build_visual_query_from_string;

#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    pub query: String,
    pub pretty: bool,
}

pub fn execute_tree(options: &TreeOptions) -> Result<String, CliError> {
    let query = require_query(&options.query)?;
    to_json(&build_visual_query_from_string(query), options.pretty)
}
