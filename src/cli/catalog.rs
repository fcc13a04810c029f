//! List the operations the builder knows about

use std::str::FromStr;

use super::{CliError, to_json};
use crate::Category;
use crate::catalog::{Catalog, DefinitionSummary, Scope};

#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    /// Only list this category
    pub category: Option<String>,
    pub default_field: Option<String>,
    pub pretty: bool,
}

pub fn execute_catalog(options: &CatalogOptions) -> Result<String, CliError> {
    let category = options
        .category
        .as_deref()
        .map(Category::from_str)
        .transpose()?;

    let scope = match &options.default_field {
        Some(field) => Scope::new(field.as_str()),
        None => Scope::default(),
    };
    let catalog = Catalog::shared(&scope);
    let summaries: Vec<DefinitionSummary> = catalog
        .definitions()
        .iter()
        .filter(|def| category.is_none_or(|c| def.category == c))
        .map(DefinitionSummary::from)
        .collect();
    to_json(&summaries, options.pretty)
}
