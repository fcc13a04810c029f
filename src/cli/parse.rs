//! Parse a LogsQL query into its visual form

use super::{CliError, require_query, to_json};
use crate::{EscapeMode, ParseOptions, Parser};

/// Options shared by the commands that parse a query
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// The LogsQL query
    pub query: String,
    /// Field implied by bare words
    pub default_field: Option<String>,
    /// Lift leading exact/regexp filters into labels
    pub parse_labels: bool,
    pub escape_mode: EscapeMode,
    /// Pretty-print the output
    pub pretty: bool,
}

impl QueryOptions {
    pub(super) fn parser(&self) -> Parser {
        let defaults = ParseOptions::default();
        Parser::new(ParseOptions {
            default_field: self
                .default_field
                .clone()
                .unwrap_or(defaults.default_field),
            parse_labels: self.parse_labels,
            escape_mode: self.escape_mode,
        })
    }
}

/// Print the visual query and the parse errors as JSON
pub fn execute_parse(options: &QueryOptions) -> Result<String, CliError> {
    let query = require_query(&options.query)?;
    let result = options.parser().parse(query);
    to_json(&result, options.pretty)
}
