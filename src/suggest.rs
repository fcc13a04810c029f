//! # Field Suggestions
//!
//! Field names and values offered by the builder's drop-downs come from an
//! external log store. This module owns the request shape, a bounded cache
//! in front of the store and the query scoping that narrows suggestions to
//! what the operations before the edited one can produce.
//!
//! ```text
//! let provider = SuggestionProvider::new(source);
//! let hits = provider.fetch(&SuggestionRequest::field_values("_msg:*", "level"))?;
//! ```

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ast::{Category, Operation};
use crate::error::{Error, Result};
use crate::modeller::QueryModeller;

pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Scope used when nothing narrows the suggestions.
pub const MATCH_ALL_SCOPE: &str = "_msg:*";

static ISO_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?$")
        .expect("valid date regex")
});

/// One suggested name or value with its number of matching entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldHit {
    pub value: String,
    pub hits: u64,
}

impl FieldHit {
    pub fn new(value: impl Into<String>, hits: u64) -> Self {
        FieldHit {
            value: value.into(),
            hits,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Names,
    Values,
}

/// Millisecond bounds of the searched window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub kind: FieldKind,
    pub query: String,
    pub field: Option<String>,
    pub limit: Option<usize>,
    /// Case-insensitive containment filter applied by the store.
    pub value_prefix: Option<String>,
    pub time_range: Option<TimeRange>,
}

impl SuggestionRequest {
    pub fn field_names(query: impl Into<String>) -> Self {
        SuggestionRequest {
            kind: FieldKind::Names,
            query: query.into(),
            field: None,
            limit: None,
            value_prefix: None,
            time_range: None,
        }
    }

    pub fn field_values(query: impl Into<String>, field: impl Into<String>) -> Self {
        SuggestionRequest {
            kind: FieldKind::Values,
            field: Some(field.into()),
            ..SuggestionRequest::field_names(query)
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_value_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.value_prefix = Some(prefix.into());
        self
    }

    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    /// The query sent to the store: `*` when blank, narrowed by the value
    /// prefix for value requests.
    pub fn effective_query(&self) -> String {
        let base = match self.query.trim() {
            "" => "*",
            query => query,
        };
        let prefix_filter = match (&self.kind, &self.field, &self.value_prefix) {
            (FieldKind::Values, Some(field), Some(prefix)) if !prefix.is_empty() => {
                format!("{}: i(\"{}\")", field, prefix.replace('"', "\\\""))
            }
            _ => return base.to_string(),
        };
        if base == "*" {
            prefix_filter
        } else {
            format!("({}) AND {}", base, prefix_filter)
        }
    }
}

/// The log store, or anything that can answer field name/value lookups.
pub trait FieldSuggestionSource {
    fn fetch(&self, request: &SuggestionRequest) -> Result<Vec<FieldHit>>;
}

impl<F> FieldSuggestionSource for F
where
    F: Fn(&SuggestionRequest) -> Result<Vec<FieldHit>>,
{
    fn fetch(&self, request: &SuggestionRequest) -> Result<Vec<FieldHit>> {
        self(request)
    }
}

/// Least-recently-used map with a fixed capacity.
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    capacity: usize,
    entries: HashMap<K, V>,
    order: VecDeque<K>,
}

impl<K: Hash + Eq + Clone, V: Clone> BoundedCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        BoundedCache {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up `key`, marking it most recently used.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let value = self.entries.get(key)?.clone();
        self.touch(key);
        Some(value)
    }

    /// Insert, evicting the least recently used entry when full.
    pub fn insert(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key.clone(), value).is_some() {
            self.touch(&key);
            return;
        }
        if self.entries.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn touch(&mut self, key: &K) {
        if let Some(index) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(index) {
                self.order.push_back(k);
            }
        }
    }
}

/// Cached, sorted access to a [`FieldSuggestionSource`].
pub struct SuggestionProvider<S> {
    source: S,
    cache: Mutex<BoundedCache<SuggestionRequest, Vec<FieldHit>>>,
}

impl<S: FieldSuggestionSource> SuggestionProvider<S> {
    pub fn new(source: S) -> Self {
        SuggestionProvider::with_capacity(source, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(source: S, capacity: usize) -> Self {
        SuggestionProvider {
            source,
            cache: Mutex::new(BoundedCache::new(capacity)),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Sorted hits for `request`. A value request with no field yields no
    /// hits without asking the source. Failures are not cached.
    pub fn fetch(&self, request: &SuggestionRequest) -> Result<Vec<FieldHit>> {
        if request.kind == FieldKind::Values && request.field.as_deref().is_none_or(str::is_empty) {
            warn!("field value suggestions requested without a field");
            return Ok(Vec::new());
        }

        if let Some(hits) = self.cache.lock().get(request) {
            debug!(query = %request.query, "suggestion cache hit");
            return Ok(hits);
        }

        let hits = match self.source.fetch(request) {
            Ok(hits) => sort_field_hits(hits),
            Err(e) => {
                warn!(error = %e, query = %request.query, "suggestion source failed");
                return Err(e);
            }
        };
        self.cache.lock().insert(request.clone(), hits.clone());
        Ok(hits)
    }

    /// Like [`SuggestionProvider::fetch`], retrying once with an unscoped
    /// query when the scoped one fails.
    pub fn fetch_or_unscoped(&self, request: &SuggestionRequest) -> Result<Vec<FieldHit>> {
        match self.fetch(request) {
            Ok(hits) => Ok(hits),
            Err(_) if !request.query.is_empty() => {
                let unscoped = SuggestionRequest {
                    query: String::new(),
                    ..request.clone()
                };
                self.fetch(&unscoped)
            }
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HitsKind {
    Number,
    Date,
    Text,
}

fn hits_kind(value: &str) -> HitsKind {
    if value.trim().parse::<f64>().is_ok() {
        HitsKind::Number
    } else if ISO_DATE.is_match(value.trim()) {
        HitsKind::Date
    } else {
        HitsKind::Text
    }
}

/// Drop empty values, then sort numerically when every value is a number,
/// chronologically when every value is an ISO date, lexicographically
/// otherwise.
pub fn sort_field_hits(hits: Vec<FieldHit>) -> Vec<FieldHit> {
    let mut hits: Vec<FieldHit> = hits.into_iter().filter(|h| !h.value.is_empty()).collect();
    let Some(first) = hits.first().map(|h| hits_kind(&h.value)) else {
        return hits;
    };
    let kind = if hits.iter().all(|h| hits_kind(&h.value) == first) {
        first
    } else {
        HitsKind::Text
    };

    match kind {
        HitsKind::Number => hits.sort_by(|a, b| {
            let a = a.value.trim().parse::<f64>().unwrap_or(0.0);
            let b = b.value.trim().parse::<f64>().unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }),
        HitsKind::Date | HitsKind::Text => hits.sort_by(|a, b| a.value.cmp(&b.value)),
    }
    hits
}

fn preceding<'a>(operations: &'a [Operation], index: Option<usize>) -> &'a [Operation] {
    let end = index.unwrap_or(operations.len()).min(operations.len());
    &operations[..end]
}

/// Query whose results hold the field names available to the operation at
/// `index` (every operation when `None`).
pub fn field_name_scope(modeller: &QueryModeller, operations: &[Operation], index: Option<usize>) -> String {
    let previous = modeller.render_operations("", preceding(operations, index));
    let previous = previous.trim();
    if previous.is_empty() || previous == "\"\"" {
        return MATCH_ALL_SCOPE.to_string();
    }

    let starts_with_filter = operations
        .first()
        .and_then(|op| modeller.operation_definition(op.id))
        .is_some_and(|def| {
            matches!(
                def.category,
                Category::Filters | Category::Operators | Category::Special
            )
        });
    if starts_with_filter {
        previous.to_string()
    } else {
        format!("{} | {}", MATCH_ALL_SCOPE, previous)
    }
}

/// Query whose results hold the values of a field at `index`, with
/// `suffix` appended as an extra pipe when it is not blank.
pub fn field_value_scope(
    modeller: &QueryModeller,
    operations: &[Operation],
    index: Option<usize>,
    suffix: &str,
) -> String {
    let previous = modeller.render_operations("", preceding(operations, index));
    let mut expr = match previous.trim() {
        "" => MATCH_ALL_SCOPE.to_string(),
        previous => previous.to_string(),
    };
    if !suffix.trim().is_empty() {
        expr.push_str(" | ");
        expr.push_str(suffix.trim());
    }
    expr
}

/// Pipes that list the storage types of `field` as values of `type`.
pub fn value_type_suffix(field: &str) -> String {
    format!("uniq by \"{}\" | block_stats", field.replace('"', "\\\""))
}

/// Wrap a store failure message as a library error.
pub fn source_error(message: impl Into<String>) -> Error {
    Error::Suggestion(message.into())
}
