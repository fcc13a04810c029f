use std::sync::Arc;

use tracing::warn;

use crate::ast::{Category, LabelFilter, Operation, OperationId, VisualQuery};
use crate::catalog::{Catalog, OperationDefinition, Scope};

/// Renders operation lists back to LogsQL.
///
/// A modeller only knows the definitions of the categories it was built
/// with. Built with exactly `[Stats]` it renders a bare function list
/// (`count(), sum(bytes)`) for the inside of a `stats` pipe.
pub struct QueryModeller {
    catalog: Arc<Catalog>,
    categories: Vec<Category>,
    only_stats: bool,
}

impl Default for QueryModeller {
    fn default() -> Self {
        QueryModeller::new(&Scope::default(), &Category::ALL)
    }
}

impl QueryModeller {
    pub fn new(scope: &Scope, categories: &[Category]) -> Self {
        let catalog = Catalog::shared(scope);
        let categories: Vec<Category> = Category::ALL
            .iter()
            .copied()
            .filter(|category| {
                categories.contains(category) && catalog.by_category(*category).next().is_some()
            })
            .collect();
        let only_stats = categories == [Category::Stats];

        QueryModeller {
            catalog,
            categories,
            only_stats,
        }
    }

    pub fn with_default_field(default_field: &str) -> Self {
        QueryModeller::new(&Scope::new(default_field), &Category::ALL)
    }

    pub fn stats_only(scope: &Scope) -> Self {
        QueryModeller::new(scope, &[Category::Stats])
    }

    pub fn is_stats_only(&self) -> bool {
        self.only_stats
    }

    pub fn scope(&self) -> &Scope {
        self.catalog.scope()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn operation_definition(&self, id: OperationId) -> Option<&OperationDefinition> {
        self.catalog
            .get(id)
            .filter(|def| self.categories.contains(&def.category))
    }

    pub fn operations_for_category(&self, category: Category) -> Vec<&OperationDefinition> {
        if !self.categories.contains(&category) {
            return Vec::new();
        }
        self.catalog.by_category(category).collect()
    }

    /// Append `operations` to `query_string`.
    pub fn render_operations(&self, query_string: &str, operations: &[Operation]) -> String {
        let mut out = query_string.to_string();
        let mut previous: Option<&OperationDefinition> = None;

        for op in operations.iter().filter(|op| !op.disabled) {
            let Some(def) = self.operation_definition(op.id) else {
                warn!(id = %op.id, "skipping operation unknown to this modeller");
                continue;
            };

            if self.only_stats {
                if !out.is_empty() {
                    out.push_str(", ");
                }
                out.push_str(&def.render(op, ""));
                previous = Some(def);
                continue;
            }

            if def.id == OperationId::Comment {
                out = join_space(&out, &def.render(op, ""));
                continue;
            }

            // only comments have been written when `previous` is unset
            let after_filter = match previous {
                Some(def) => def.is_filter_like(),
                None => !out.is_empty(),
            };
            if def.category == Category::Operators {
                let keyword = def.render(op, "");
                if previous.is_none() || after_filter {
                    out = join_space(&out, &keyword);
                } else {
                    out = format!("{} | {}", out.trim_end_matches(' '), keyword);
                }
            } else if def.is_filter_like() && after_filter {
                out = join_space(&out, &def.render(op, ""));
            } else {
                out = def.render(op, out.trim_end_matches(' '));
            }
            previous = Some(def);
        }
        out.trim().to_string()
    }

    /// Labels render as exact and regexp filters joined by implicit AND.
    /// A `!~` label is a regexp filter preceded by `NOT`.
    pub fn render_labels(&self, labels: &[LabelFilter]) -> String {
        let mut operations = Vec::with_capacity(labels.len());
        for label in labels {
            if label.op == "!~" {
                operations.push(Operation::marker(OperationId::Not));
            }
            operations.push(Operation::from(label));
        }
        self.render_operations("", &operations)
    }

    pub fn render_query(&self, query: &VisualQuery) -> String {
        let labels = self.render_labels(&query.labels);
        let rest = self.render_operations("", &query.operations);
        if labels.is_empty() {
            return rest;
        }
        if rest.is_empty() {
            return labels;
        }

        let first = query
            .operations
            .iter()
            .find(|op| !op.disabled)
            .and_then(|op| self.operation_definition(op.id));
        match first.map(|def| def.category) {
            Some(Category::Filters) => format!("{} AND {}", labels, rest),
            Some(Category::Operators) => format!("{} {}", labels, rest),
            _ => format!("{} | {}", labels, rest),
        }
    }
}

/// A comment already ends its line, so nothing is inserted after it.
fn join_space(left: &str, right: &str) -> String {
    if left.is_empty() || left.ends_with('\n') {
        format!("{}{}", left, right)
    } else {
        format!("{} {}", left.trim_end_matches(' '), right)
    }
}

/// Render `query` with `modeller`, or with a default modeller when none is
/// given.
pub fn build_visual_query_to_string(query: &VisualQuery, modeller: Option<&QueryModeller>) -> String {
    match modeller {
        Some(modeller) => modeller.render_query(query),
        None => QueryModeller::default().render_query(query),
    }
}

/// Render an operation list with the default catalog.
pub fn render(operations: &[Operation]) -> String {
    QueryModeller::default().render_operations("", operations)
}
