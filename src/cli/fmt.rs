//! Canonical formatting: parse, then render

use super::{CliError, QueryOptions, require_query};
use crate::QueryModeller;

#[derive(Debug, Clone, Default)]
pub struct FmtOptions {
    pub query: QueryOptions,
    /// Print parse errors to stderr
    pub show_errors: bool,
}

pub fn execute_fmt(options: &FmtOptions) -> Result<String, CliError> {
    let query = require_query(&options.query.query)?;
    let parser = options.query.parser();
    let result = parser.parse(query);
    if options.show_errors {
        for error in &result.errors {
            eprintln!("warning: {}", error);
        }
    }

    let modeller = QueryModeller::new(parser.catalog().scope(), &crate::Category::ALL);
    Ok(modeller.render_query(&result.query))
}
