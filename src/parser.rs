use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::ast::{Category, LabelFilter, Operation, OperationId, ParamValue, ParseResult, Token, VisualQuery};
use crate::catalog::{
    Catalog, DEFAULT_FIELD, Scope, get_field_name, get_function_name, is_substring_start,
};
use crate::cursor::TokenCursor;
use crate::lexer::{split_by_operator, split_by_unescaped_pipe, split_string};
use crate::quote::EscapeMode;

pub use crate::catalog::{get_condition_from_string, get_values_from_brackets};

/// Function-call filters recognised by their bracket prefix.
const FILTER_FUNCTIONS: [(&str, OperationId); 14] = [
    ("day_range", OperationId::DayRange),
    ("week_range", OperationId::WeekRange),
    ("contains_all", OperationId::ContainsAll),
    ("contains_any", OperationId::ContainsAny),
    ("seq", OperationId::Sequence),
    ("range", OperationId::Range),
    ("ipv4_range", OperationId::Ipv4Range),
    ("string_range", OperationId::StringRange),
    ("len_range", OperationId::LenRange),
    ("value_type", OperationId::ValueType),
    ("eq_field", OperationId::EqField),
    ("le_field", OperationId::LeField),
    ("lt_field", OperationId::LtField),
    ("pattern_match", OperationId::PatternMatch),
];

/// Driver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Field implied when a filter names none.
    pub default_field: String,
    /// Lift label-style filters before the first pipe into `labels`.
    pub parse_labels: bool,
    pub escape_mode: EscapeMode,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            default_field: DEFAULT_FIELD.to_string(),
            parse_labels: false,
            escape_mode: EscapeMode::default(),
        }
    }
}

impl ParseOptions {
    pub fn scope(&self) -> Scope {
        Scope::new(self.default_field.as_str()).with_escape(self.escape_mode)
    }
}

/// Turns LogsQL text into an ordered operation list.
///
/// Parsing never fails: anything the grammar does not recognise degrades to
/// a word filter, so every token ends up in some operation.
pub struct Parser {
    catalog: Arc<Catalog>,
    options: ParseOptions,
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new(ParseOptions::default())
    }
}

impl Parser {
    pub fn new(options: ParseOptions) -> Self {
        Parser {
            catalog: Catalog::shared(&options.scope()),
            options,
        }
    }

    pub fn with_default_field(default_field: &str) -> Self {
        Parser::new(ParseOptions {
            default_field: default_field.to_string(),
            ..ParseOptions::default()
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn parse(&self, expr: &str) -> ParseResult {
        let tokens = split_string(expr);
        trace!(?tokens, "tokenized expression");

        let mut operations: Vec<Operation> = Vec::new();
        let mut labels = Vec::new();
        let mut before_first_pipe = self.options.parse_labels;
        let mut last_was_operator = false;

        for stage in split_by_unescaped_pipe(&tokens) {
            for segment in split_by_operator(stage) {
                if segment.is_empty() {
                    continue;
                }
                if let Some(id) = segment.first().and_then(operator_id) {
                    operations.push(Operation::marker(id));
                    last_was_operator = true;
                    continue;
                }

                let comments: Vec<&Token> = segment.iter().filter(|t| t.is_comment()).collect();
                let body: Vec<Token> = segment.iter().filter(|t| !t.is_comment()).cloned().collect();
                self.parse_segment(&body, last_was_operator, &mut operations);

                for comment in comments {
                    if let Token::Comment { value } = comment {
                        operations.push(Operation::new(
                            OperationId::Comment,
                            vec![value.as_str().into()],
                        ));
                    }
                }
                last_was_operator = false;
            }

            if before_first_pipe
                && !operations.is_empty()
                && operations.iter().all(op_is_label_filter)
            {
                labels.extend(convert_ops_to_label_filters(&operations));
                operations.clear();
            }
            before_first_pipe = false;
        }

        ParseResult {
            query: VisualQuery {
                labels,
                operations,
                expr: expr.to_string(),
                ..VisualQuery::default()
            },
            errors: Vec::new(),
        }
    }

    /// Parse one operator-free token run, appending to `operations`.
    fn parse_segment(&self, tokens: &[Token], only_filters: bool, operations: &mut Vec<Operation>) {
        let mut cursor = TokenCursor::new(tokens);
        while !cursor.is_empty() {
            let start = cursor.position();
            let parsed = self.parse_operation(&mut cursor, only_filters);
            if parsed.is_empty() {
                break;
            }

            if cursor.position() == start {
                debug!(token = ?cursor.peek(), "operation consumed no tokens, reading it as a word");
                operations.push(self.operation_from_id(OperationId::Word, &mut cursor, None));
                continue;
            }

            let ends_with_stats = parsed
                .last()
                .and_then(|op| self.catalog.get(op.id))
                .is_some_and(|def| def.category == Category::Stats);
            operations.extend(parsed);

            if ends_with_stats {
                while cursor.eat_text(",") {
                    if let Some(op) = self.parse_stats_operation(&mut cursor) {
                        operations.push(op);
                    }
                }
            }
        }
    }

    /// Read the next operation at the cursor. A field followed by `!` yields
    /// a `not` marker in front of the operation; an empty result means
    /// nothing could be read.
    pub fn parse_operation(&self, cursor: &mut TokenCursor<'_>, only_filters: bool) -> Vec<Operation> {
        let field = get_field_name(cursor, self.catalog.scope());
        self.parse_with_field(cursor, field.as_deref(), only_filters)
    }

    fn parse_with_field(
        &self,
        c: &mut TokenCursor<'_>,
        field: Option<&str>,
        only_filters: bool,
    ) -> Vec<Operation> {
        match field {
            Some("_time") => {
                let id = match get_function_name(c.remaining()) {
                    "day_range" => OperationId::DayRange,
                    "week_range" => OperationId::WeekRange,
                    _ => OperationId::Time,
                };
                return vec![self.operation_from_id(id, c, field)];
            }
            Some("_stream") => return vec![self.operation_from_id(OperationId::Stream, c, field)],
            Some("_stream_id") => return vec![self.operation_from_id(OperationId::StreamId, c, field)],
            _ => {}
        }

        let Some(first) = c.peek() else {
            if field.is_some() {
                return vec![self.operation_from_id(OperationId::Word, c, field)];
            }
            return Vec::new();
        };

        if let Some(group) = first.as_bracket().filter(|g| g.prefix.is_empty()) {
            if group.opens_with('(') {
                let is_variable = matches!(
                    group.value.as_slice(),
                    [Token::Space { value }] if value.starts_with('$')
                );
                let id = if is_variable {
                    OperationId::ContainsAnyFromVariable
                } else if check_legacy_multi_exact(&group.value) {
                    OperationId::MultiExact
                } else {
                    OperationId::Logical
                };
                return vec![self.operation_from_id(id, c, field)];
            }
            if group.opens_with('{') {
                return vec![self.operation_from_id(OperationId::Stream, c, field)];
            }
        }

        if field.is_none() && !only_filters && (first.is_space() || first.is_bracket()) {
            if let Some(ops) = self.parse_pipe(c) {
                return ops;
            }
        }

        if first.space_value().is_some_and(|v| v.starts_with('~')) {
            return vec![self.operation_from_id(OperationId::Regexp, c, field)];
        }
        if first.is_word("=") || (first.is_word("!") && c.peek_nth(1).is_some_and(|t| t.is_word("="))) {
            return vec![self.operation_from_id(OperationId::Exact, c, field)];
        }
        if is_substring_start(c) {
            return vec![self.operation_from_id(OperationId::Substring, c, field)];
        }

        if field.is_none() {
            if let Some(ops) = self.parse_infix_in(c) {
                return ops;
            }
        }

        let function = get_function_name(c.remaining()).to_lowercase();
        if !function.is_empty() {
            if let Some(&(_, id)) = FILTER_FUNCTIONS.iter().find(|(name, _)| *name == function) {
                return vec![self.operation_from_id(id, c, field)];
            }
            if function == "in" {
                return vec![self.operation_from_id(OperationId::MultiExact, c, field)];
            }
            if function == "options" && !only_filters {
                return vec![self.operation_from_id(OperationId::Options, c, field)];
            }
        }

        if first.space_value().is_some_and(|v| v.starts_with(['>', '<'])) {
            return vec![self.operation_from_id(OperationId::RangeComparison, c, field)];
        }
        if first.is_word("!") || first.is_word("-") {
            c.advance();
            let mut ops = vec![Operation::marker(OperationId::Not)];
            if field.is_some() {
                ops.extend(self.parse_with_field(c, field, only_filters));
            }
            return ops;
        }

        if let Some(op) = self.parse_stats_operation(c) {
            return vec![op];
        }

        debug!(token = ?first, "no operation matched, reading a word filter");
        vec![self.operation_from_id(OperationId::Word, c, field)]
    }

    /// Pipe keywords, including the `eval`, `filter`, `where` and `keep`
    /// aliases. Matching ignores case.
    fn parse_pipe(&self, c: &mut TokenCursor<'_>) -> Option<Vec<Operation>> {
        let keyword = match c.peek()? {
            Token::Space { value } => value.to_lowercase(),
            Token::Bracket(group) => group.prefix.to_lowercase(),
            _ => return None,
        };

        let id = match keyword.as_str() {
            // the keyword doubles as the call name, so it is left in place
            "json_array_len" | "hash" | "len" => {
                let id = self.catalog.pipe_id(&keyword)?;
                return Some(vec![self.operation_from_id(id, c, None)]);
            }
            "filter" | "where" => {
                return Some(self.after_keyword(c, |c| self.parse_operation(c, true)));
            }
            "eval" => OperationId::Math,
            "keep" => OperationId::Fields,
            _ => self.catalog.pipe_id(&keyword)?,
        };
        Some(vec![self.after_keyword(c, |c| self.operation_from_id(id, c, None))])
    }

    /// Consume a pipe keyword and run `read` on what follows. A keyword that
    /// is the prefix of a bracket (`union(...)`) leaves the bracket behind.
    fn after_keyword<T>(&self, c: &mut TokenCursor<'_>, read: impl FnOnce(&mut TokenCursor<'_>) -> T) -> T {
        let Some(group) = c.peek_bracket().filter(|g| !g.prefix.is_empty()) else {
            c.advance();
            return read(c);
        };

        let mut rewritten = Vec::with_capacity(c.remaining_len());
        rewritten.push(Token::bracket(group.raw_value.as_str(), "", group.value.clone()));
        rewritten.extend_from_slice(&c.remaining()[1..]);

        let mut sub = TokenCursor::new(&rewritten);
        let result = read(&mut sub);
        c.advance_by(sub.position().max(1));
        result
    }

    /// `field in (a, b)` and `field not_in (a, b)` written without a colon.
    fn parse_infix_in(&self, c: &mut TokenCursor<'_>) -> Option<Vec<Operation>> {
        let field = c.peek()?.space_value()?.to_string();
        let keyword = c.peek_nth(1)?.space_value()?.to_lowercase();
        let group = c.peek_nth(2)?.as_bracket()?;
        if !group.prefix.is_empty() || !(keyword == "in" || keyword == "not_in") {
            return None;
        }

        c.advance_by(2);
        let op = self.operation_from_id(OperationId::MultiExact, c, Some(&field));
        if keyword == "not_in" {
            Some(vec![Operation::marker(OperationId::Not), op])
        } else {
            Some(vec![op])
        }
    }

    /// A stats function at the cursor, matched by its bare name or its call
    /// prefix.
    pub fn parse_stats_operation(&self, c: &mut TokenCursor<'_>) -> Option<Operation> {
        let name = match c.peek()? {
            Token::Space { value } => value.as_str(),
            Token::Bracket(group) => group.prefix.as_str(),
            _ => return None,
        };
        if name.is_empty() {
            return None;
        }
        let id = self.catalog.stats_id(name)?;
        Some(self.operation_from_id(id, c, None))
    }

    fn operation_from_id(&self, id: OperationId, c: &mut TokenCursor<'_>, field: Option<&str>) -> Operation {
        match self.catalog.get(id) {
            Some(def) => Operation::new(id, def.parse_params(c, field)),
            None => {
                warn!(%id, "operation missing from catalog");
                Operation::marker(id)
            }
        }
    }
}

fn operator_id(token: &Token) -> Option<OperationId> {
    match token.space_value()?.to_lowercase().as_str() {
        "and" => Some(OperationId::And),
        "or" => Some(OperationId::Or),
        "not" => Some(OperationId::Not),
        _ => None,
    }
}

fn op_is_label_filter(op: &Operation) -> bool {
    match op.id {
        OperationId::Exact => !op.flag(3),
        OperationId::Regexp => !op.flag(2),
        OperationId::And | OperationId::Not => true,
        _ => false,
    }
}

fn convert_ops_to_label_filters(operations: &[Operation]) -> Vec<LabelFilter> {
    let mut filters = Vec::new();
    let mut negate_next = false;
    for op in operations {
        match op.id {
            OperationId::Exact => {
                let negated = op.flag(2);
                filters.push(LabelFilter {
                    label: op.text(0),
                    op: if negated != negate_next { "!=" } else { "=" }.to_string(),
                    value: op.text(1),
                });
                negate_next = false;
            }
            OperationId::Regexp => {
                filters.push(LabelFilter {
                    label: op.text(0),
                    op: if negate_next { "!~" } else { "=~" }.to_string(),
                    value: op.text(1),
                });
                negate_next = false;
            }
            OperationId::Not => negate_next = !negate_next,
            _ => {}
        }
    }
    filters
}

/// `="a" OR ="b"`: pairs of `=` and a value, joined by `or`.
pub fn check_legacy_multi_exact(tokens: &[Token]) -> bool {
    if tokens.len() < 2 {
        return false;
    }
    let mut rest = tokens;
    while rest.len() >= 2 {
        if !rest[0].is_word("=") || rest[1].is_bracket() {
            return false;
        }
        rest = &rest[2..];
        if let Some(next) = rest.first() {
            if !next.is_word_ignore_case("or") {
                return false;
            }
            rest = &rest[1..];
        }
    }
    true
}

/// Values of a `="a" OR ="b"` chain, stopping at the first malformed pair.
pub fn parse_legacy_multi_exact(tokens: &[Token]) -> Vec<String> {
    let mut values = Vec::new();
    let mut rest = tokens;
    while rest.len() >= 2 {
        if !rest[0].is_word("=") || rest[1].is_bracket() {
            break;
        }
        if rest[1].is_value() {
            values.push(rest[1].get_value());
        }
        rest = &rest[2..];
        match rest.first() {
            Some(next) if next.is_word_ignore_case("or") => rest = &rest[1..],
            Some(_) => break,
            None => {}
        }
    }
    values
}

/// Parse `expr` into a visual query using `options`.
pub fn parse_expr_to_visual_query(expr: &str, options: &ParseOptions) -> ParseResult {
    Parser::new(options.clone()).parse(expr)
}

/// Operation list for `text`, with `default_field` as the implied field.
pub fn parse_expression(text: &str, default_field: &str) -> Vec<Operation> {
    Parser::with_default_field(default_field).parse(text).query.operations
}

/// The function list of a `stats` pipe (`count() as total, sum(bytes)`),
/// one operation per function.
pub fn parse_stats_functions(text: &str, default_field: &str) -> Vec<Operation> {
    let parser = Parser::with_default_field(default_field);
    let tokens = split_string(text);
    let mut operations = Vec::new();
    let mut cursor = TokenCursor::new(&tokens);

    while !cursor.is_empty() {
        let start = cursor.position();
        if let Some(op) = parser.parse_stats_operation(&mut cursor) {
            operations.push(op);
        }
        if cursor.position() == start {
            debug!(token = ?cursor.peek(), "skipping token outside a stats function");
            cursor.advance();
        }
        cursor.eat_text(",");
    }
    operations
}

impl From<&LabelFilter> for Operation {
    /// Label filters become exact or regexp filters.
    fn from(label: &LabelFilter) -> Self {
        match label.op.as_str() {
            "=~" | "!~" => Operation::new(
                OperationId::Regexp,
                vec![label.label.as_str().into(), label.value.as_str().into(), false.into()],
            ),
            op => Operation::new(
                OperationId::Exact,
                vec![
                    label.label.as_str().into(),
                    label.value.as_str().into(),
                    ParamValue::Bool(op == "!="),
                    false.into(),
                ],
            ),
        }
    }
}
