use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ParamValue;
use crate::error::Error;

macro_rules! operation_ids {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Identifier of every operation known to the catalog.
        ///
        /// The string form is the LogsQL keyword (or a stable internal name
        /// for filters that have no keyword of their own).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum OperationId {
            $(#[serde(rename = $name)] $variant,)+
        }

        impl OperationId {
            pub const ALL: &'static [OperationId] = &[$(OperationId::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(OperationId::$variant => $name,)+
                }
            }
        }
    };
}

operation_ids! {
    // filters
    Word => "word",
    Time => "time",
    DayRange => "day_range",
    WeekRange => "week_range",
    Stream => "stream",
    StreamId => "stream_id",
    Regexp => "regexp",
    RangeComparison => "range_comparison",
    Exact => "exact",
    MultiExact => "multi_exact",
    ContainsAll => "contains_all",
    ContainsAny => "contains_any",
    Sequence => "seq",
    Range => "range",
    Ipv4Range => "ipv4_range",
    StringRange => "string_range",
    LenRange => "len_range",
    ValueType => "value_type",
    EqField => "eq_field",
    LeField => "le_field",
    LtField => "lt_field",
    Logical => "logical",
    Substring => "substring",
    PatternMatch => "pattern_match",
    // operators
    And => "and",
    Or => "or",
    Not => "not",
    // pipes
    BlockStats => "block_stats",
    BlocksCount => "blocks_count",
    CollapseNums => "collapse_nums",
    Copy => "copy",
    Decolorize => "decolorize",
    Delete => "delete",
    DropEmptyFields => "drop_empty_fields",
    Extract => "extract",
    ExtractRegexp => "extract_regexp",
    Facets => "facets",
    FieldNames => "field_names",
    FieldValues => "field_values",
    Fields => "fields",
    First => "first",
    Format => "format",
    Join => "join",
    JsonArrayLen => "json_array_len",
    Hash => "hash",
    Last => "last",
    Len => "len",
    Limit => "limit",
    Math => "math",
    Offset => "offset",
    PackJson => "pack_json",
    PackLogfmt => "pack_logfmt",
    Rename => "rename",
    Replace => "replace",
    ReplaceRegexp => "replace_regexp",
    Sample => "sample",
    Sort => "sort",
    Stats => "stats",
    StreamContext => "stream_context",
    TimeAdd => "time_add",
    Top => "top",
    Union => "union",
    Uniq => "uniq",
    UnpackJson => "unpack_json",
    UnpackLogfmt => "unpack_logfmt",
    UnpackSyslog => "unpack_syslog",
    UnpackWords => "unpack_words",
    Unroll => "unroll",
    // stats functions
    Avg => "avg",
    Count => "count",
    CountEmpty => "count_empty",
    CountUniq => "count_uniq",
    CountUniqHash => "count_uniq_hash",
    Histogram => "histogram",
    JsonValues => "json_values",
    Max => "max",
    Median => "median",
    Min => "min",
    Quantile => "quantile",
    Rate => "rate",
    RateSum => "rate_sum",
    RowAny => "row_any",
    RowMax => "row_max",
    RowMin => "row_min",
    Sum => "sum",
    SumLen => "sum_len",
    UniqValues => "uniq_values",
    Values => "values",
    // special
    Options => "options",
    ContainsAnyFromVariable => "contains_any_from_variable",
    Comment => "comment",
}

impl FromStr for OperationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| Error::UnknownOperation(s.to_string()))
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog grouping. Drives how the modeller joins rendered fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Filters,
    Operators,
    Pipes,
    Stats,
    Special,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Filters,
        Category::Operators,
        Category::Pipes,
        Category::Stats,
        Category::Special,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Filters => "filters",
            Category::Operators => "operators",
            Category::Pipes => "pipes",
            Category::Stats => "stats",
            Category::Special => "special",
        }
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownCategory(s.to_string()))
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One filter, boolean operator or pipe stage with positional parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    #[serde(default)]
    pub params: Vec<ParamValue>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
}

impl Operation {
    pub fn new(id: OperationId, params: Vec<ParamValue>) -> Self {
        Operation {
            id,
            params,
            disabled: false,
        }
    }

    /// Zero-parameter operation, used for the boolean connectives.
    pub fn marker(id: OperationId) -> Self {
        Operation::new(id, Vec::new())
    }

    pub fn param(&self, index: usize) -> Option<&ParamValue> {
        self.params.get(index)
    }

    /// Text of parameter `index`, empty when missing.
    pub fn text(&self, index: usize) -> String {
        self.params.get(index).map(ParamValue::to_text).unwrap_or_default()
    }

    pub fn flag(&self, index: usize) -> bool {
        self.params.get(index).is_some_and(ParamValue::as_bool)
    }

    pub fn int(&self, index: usize) -> i64 {
        self.params.get(index).map(ParamValue::as_i64).unwrap_or(0)
    }
}
