//! # Operation Catalog
//!
//! Every filter, boolean operator, pipe stage and stats function the builder
//! understands, each described by one [`OperationDefinition`]: display name,
//! category, parameter schema, default parameters, a renderer and a parser.
//!
//! ## Families
//!
//! - **[filters]** - field predicates (`word`, `exact`, `range`, `_time`, `{stream}`...)
//! - **[pipes]** - pipe stages (`sort`, `stats`, `unpack_json`, `math`...)
//! - **[stats]** - aggregation functions used inside `stats`
//! - **[special]** - boolean connectives, `options(...)`, variables and comments
//!
//! ## Scopes
//!
//! A catalog is built for one [`Scope`]: the implied default field (usually
//! `_msg`) and the escape mode. Sub-builders such as the `if (...)` condition
//! editor use their own scope. Catalogs are immutable and memoized per scope:
//!
//! ```text
//! let catalog = Catalog::shared(&Scope::default());
//! let sort = catalog.get(OperationId::Sort);
//! ```

mod common;
mod filters;
mod pipes;
mod special;
mod stats;

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::ast::{Category, Operation, OperationId, ParamValue, Token};
use crate::cursor::TokenCursor;
use crate::quote::{EscapeMode, get_value, quote_string_with, unquote_string_with};

pub use common::{
    get_condition_from_string, get_field_list, get_field_name, get_function_name,
    get_values_from_brackets,
};
pub(crate) use filters::is_substring_start;

pub const DEFAULT_FIELD: &str = "_msg";

/// Renders one operation, given the text produced so far.
pub type RenderFn = fn(&Scope, &Operation, &str) -> String;

/// Reads one operation's parameters from the cursor. The optional field is
/// the `field:` prefix the driver already consumed.
pub type ParseFn = fn(&Scope, &mut TokenCursor<'_>, Option<&str>) -> Vec<ParamValue>;

/// Per-catalog context: the implied default field and the escape mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    pub default_field: String,
    pub escape: EscapeMode,
}

impl Default for Scope {
    fn default() -> Self {
        Scope::new(DEFAULT_FIELD)
    }
}

impl Scope {
    pub fn new(default_field: impl Into<String>) -> Self {
        Scope {
            default_field: default_field.into(),
            escape: EscapeMode::default(),
        }
    }

    pub fn with_escape(mut self, escape: EscapeMode) -> Self {
        self.escape = escape;
        self
    }

    pub fn quote(&self, s: &str) -> String {
        quote_string_with(s, None, self.escape)
    }

    pub fn quote_with(&self, s: &str, force: bool) -> String {
        quote_string_with(s, Some(force), self.escape)
    }

    /// Quote, rendering an empty string as `""`.
    pub fn quote_or_empty(&self, s: &str) -> String {
        if s.is_empty() {
            "\"\"".to_string()
        } else {
            self.quote(s)
        }
    }

    pub fn unquote(&self, s: &str) -> String {
        unquote_string_with(s, self.escape)
    }

    pub fn value(&self, token: &Token) -> String {
        get_value(token, self.escape)
    }

    pub fn is_default_field(&self, field: &str) -> bool {
        field.is_empty() || field == self.default_field
    }

    /// `field:` prefix, omitted for the default field.
    pub fn field_prefix(&self, field: &str) -> String {
        if self.is_default_field(field) {
            String::new()
        } else {
            format!("{}:", self.quote(field))
        }
    }

    pub fn field_or_default(&self, field: Option<&str>) -> String {
        match field {
            Some(f) if !f.is_empty() => f.to_string(),
            _ => self.default_field.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    /// May repeat across the tail of the parameter list.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub rest: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl ParamSpec {
    pub fn string(name: &'static str) -> Self {
        ParamSpec {
            name,
            kind: ParamKind::String,
            rest: false,
            optional: false,
        }
    }

    pub fn number(name: &'static str) -> Self {
        ParamSpec {
            kind: ParamKind::Number,
            ..ParamSpec::string(name)
        }
    }

    pub fn boolean(name: &'static str) -> Self {
        ParamSpec {
            kind: ParamKind::Boolean,
            ..ParamSpec::string(name)
        }
    }

    pub fn rest(mut self) -> Self {
        self.rest = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Parameters read by a definition and the number of tokens they used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedParams {
    pub params: Vec<ParamValue>,
    pub length: usize,
}

/// Immutable catalog entry.
#[derive(Clone)]
pub struct OperationDefinition {
    pub id: OperationId,
    pub name: &'static str,
    pub category: Category,
    pub params: Vec<ParamSpec>,
    pub default_params: Vec<ParamValue>,
    renderer: RenderFn,
    parser: ParseFn,
    scope: Arc<Scope>,
}

impl std::fmt::Debug for OperationDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("category", &self.category)
            .field("default_params", &self.default_params)
            .finish()
    }
}

fn render_nothing(_: &Scope, _: &Operation, inner: &str) -> String {
    inner.to_string()
}

fn parse_nothing(_: &Scope, _: &mut TokenCursor<'_>, _: Option<&str>) -> Vec<ParamValue> {
    Vec::new()
}

pub(crate) fn define(
    scope: &Arc<Scope>,
    id: OperationId,
    name: &'static str,
    category: Category,
) -> OperationDefinition {
    OperationDefinition {
        id,
        name,
        category,
        params: Vec::new(),
        default_params: Vec::new(),
        renderer: render_nothing,
        parser: parse_nothing,
        scope: Arc::clone(scope),
    }
}

impl OperationDefinition {
    pub(crate) fn params(mut self, params: Vec<ParamSpec>) -> Self {
        self.params = params;
        self
    }

    pub(crate) fn defaults(mut self, defaults: Vec<ParamValue>) -> Self {
        self.default_params = defaults;
        self
    }

    pub(crate) fn renderer(mut self, renderer: RenderFn) -> Self {
        self.renderer = renderer;
        self
    }

    pub(crate) fn parser(mut self, parser: ParseFn) -> Self {
        self.parser = parser;
        self
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Render `operation` onto `inner`, the text built so far.
    pub fn render(&self, operation: &Operation, inner: &str) -> String {
        (self.renderer)(&self.scope, operation, inner)
    }

    /// Read this operation's parameters from the cursor, advancing it past
    /// every token used.
    pub fn parse_params(&self, cursor: &mut TokenCursor<'_>, field: Option<&str>) -> Vec<ParamValue> {
        (self.parser)(&self.scope, cursor, field)
    }

    pub fn split_string_by_params(&self, tokens: &[Token], field: Option<&str>) -> ParsedParams {
        let mut cursor = TokenCursor::new(tokens);
        let params = self.parse_params(&mut cursor, field);
        ParsedParams {
            params,
            length: cursor.position(),
        }
    }

    pub fn default_operation(&self) -> Operation {
        Operation::new(self.id, self.default_params.clone())
    }

    /// Filters and boolean operators join their neighbours with a space.
    pub fn is_filter_like(&self) -> bool {
        matches!(self.category, Category::Filters | Category::Operators)
            || matches!(
                self.id,
                OperationId::ContainsAnyFromVariable | OperationId::Options
            )
    }
}

/// Serializable description of a definition, used by the catalog listing.
#[derive(Debug, Clone, Serialize)]
pub struct DefinitionSummary {
    pub id: OperationId,
    pub name: &'static str,
    pub category: Category,
    pub params: Vec<ParamSpec>,
    pub default_params: Vec<ParamValue>,
}

impl From<&OperationDefinition> for DefinitionSummary {
    fn from(def: &OperationDefinition) -> Self {
        DefinitionSummary {
            id: def.id,
            name: def.name,
            category: def.category,
            params: def.params.clone(),
            default_params: def.default_params.clone(),
        }
    }
}

pub struct Catalog {
    scope: Arc<Scope>,
    definitions: Vec<OperationDefinition>,
    index: HashMap<OperationId, usize>,
}

static CATALOGS: Lazy<Mutex<HashMap<Scope, Arc<Catalog>>>> = Lazy::new(|| Mutex::new(HashMap::new()));

impl Catalog {
    pub fn new(scope: Scope) -> Self {
        let scope = Arc::new(scope);
        let mut definitions = filters::definitions(&scope);
        definitions.extend(special::operator_definitions(&scope));
        definitions.extend(pipes::definitions(&scope));
        definitions.extend(stats::definitions(&scope));
        definitions.extend(special::definitions(&scope));

        let index = definitions
            .iter()
            .enumerate()
            .map(|(i, def)| (def.id, i))
            .collect();

        Catalog {
            scope,
            definitions,
            index,
        }
    }

    /// Memoized catalog for `scope`.
    pub fn shared(scope: &Scope) -> Arc<Catalog> {
        let mut catalogs = CATALOGS.lock();
        Arc::clone(
            catalogs
                .entry(scope.clone())
                .or_insert_with(|| Arc::new(Catalog::new(scope.clone()))),
        )
    }

    pub fn for_default_field(default_field: &str) -> Arc<Catalog> {
        Catalog::shared(&Scope::new(default_field))
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn get(&self, id: OperationId) -> Option<&OperationDefinition> {
        self.index.get(&id).map(|&i| &self.definitions[i])
    }

    pub fn get_by_name(&self, id: &str) -> crate::Result<&OperationDefinition> {
        let id = OperationId::from_str(id)?;
        self.get(id)
            .ok_or_else(|| crate::Error::UnknownOperation(id.to_string()))
    }

    pub fn definitions(&self) -> &[OperationDefinition] {
        &self.definitions
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &OperationDefinition> {
        self.definitions
            .iter()
            .filter(move |def| def.category == category)
    }

    fn id_in_category(&self, word: &str, category: Category) -> Option<OperationId> {
        let word = word.to_lowercase();
        self.by_category(category)
            .find(|def| def.id.as_str() == word)
            .map(|def| def.id)
    }

    /// Pipe stage whose keyword is `word`.
    pub fn pipe_id(&self, word: &str) -> Option<OperationId> {
        self.id_in_category(word, Category::Pipes)
    }

    /// Stats function whose name is `word`.
    pub fn stats_id(&self, word: &str) -> Option<OperationId> {
        self.id_in_category(word, Category::Stats)
    }
}

/// Chain a pipe stage onto the preceding text.
pub fn pipe_expr(inner: &str, expr: &str) -> String {
    if inner.is_empty() {
        expr.to_string()
    } else {
        format!("{} | {}", inner, expr)
    }
}

/// ` if (cond)` clause, empty when there is no condition.
pub fn condition_clause(condition: &str) -> String {
    if condition.is_empty() {
        String::new()
    } else {
        format!(" if ({})", condition)
    }
}

/// Numeric value of a token. Digit separators (`1_000`) are allowed and any
/// unit suffix after the number is ignored.
pub fn parse_number(token: Option<&Token>, scope: &Scope) -> Option<Decimal> {
    let token = token.filter(|t| t.is_value())?;
    let text = scope.value(token).replace('_', "");
    let end = numeric_prefix_len(&text)?;
    Decimal::from_str(&text[..end]).ok()
}

fn numeric_prefix_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'-' | b'+')));
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    if bytes.get(end) == Some(&b'.') && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    Some(end)
}

/// Leading integer of `text` (`"10s"` reads as 10).
pub fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| n * sign)
}

/// Number parameter from a token, or `default` when it does not parse.
pub(crate) fn number_or(token: Option<&Token>, scope: &Scope, default: i64) -> ParamValue {
    parse_number(token, scope)
        .map(ParamValue::Number)
        .unwrap_or_else(|| ParamValue::int(default))
}
