//! Render a visual query given as JSON back to LogsQL

use serde::Deserialize;

use super::CliError;
use crate::catalog::Scope;
use crate::{Category, Operation, QueryModeller, VisualQuery};

/// Accepted JSON shapes: a bare operation list or a whole visual query
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RenderInput {
    Operations(Vec<Operation>),
    Query(VisualQuery),
}

impl RenderInput {
    pub fn into_query(self) -> VisualQuery {
        match self {
            RenderInput::Operations(operations) => VisualQuery::from_operations(operations),
            RenderInput::Query(query) => query,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// JSON input string
    pub input: String,
    pub default_field: Option<String>,
}

pub fn execute_render(options: &RenderOptions) -> Result<String, CliError> {
    if options.input.trim().is_empty() {
        return Err(CliError::NoInput);
    }
    let input: RenderInput = serde_json::from_str(&options.input)?;

    let scope = match &options.default_field {
        Some(field) => Scope::new(field.as_str()),
        None => Scope::default(),
    };
    let modeller = QueryModeller::new(&scope, &Category::ALL);
    Ok(modeller.render_query(&input.into_query()))
}
