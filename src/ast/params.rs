use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Positional parameter of an [`Operation`](super::Operation).
///
/// Serialized untagged so the JSON form reads `["_msg", "error", false, 10]`.
/// Strings are tried before numbers so a quoted `"10"` stays a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    String(String),
    Number(Decimal),
}

impl ParamValue {
    pub fn int(value: i64) -> Self {
        ParamValue::Number(Decimal::from(value))
    }

    pub fn empty() -> Self {
        ParamValue::String(String::new())
    }

    /// Borrowed string content, or `""` for non-string values.
    pub fn as_str(&self) -> &str {
        match self {
            ParamValue::String(s) => s,
            _ => "",
        }
    }

    /// Text form used by renderers: numbers and booleans are formatted.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Truthiness: `true`, a non-empty string, or a non-zero number.
    pub fn as_bool(&self) -> bool {
        match self {
            ParamValue::Bool(b) => *b,
            ParamValue::String(s) => !s.is_empty() && s != "false",
            ParamValue::Number(n) => !n.is_zero(),
        }
    }

    /// Numeric content. Strings are parsed leniently and fall back to zero.
    pub fn as_decimal(&self) -> Decimal {
        match self {
            ParamValue::Number(n) => *n,
            ParamValue::String(s) => Decimal::from_str(s.trim()).unwrap_or(Decimal::ZERO),
            ParamValue::Bool(_) => Decimal::ZERO,
        }
    }

    pub fn as_i64(&self) -> i64 {
        self.as_decimal().trunc().to_i64().unwrap_or(0)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::String(s) => write!(f, "{}", s),
            ParamValue::Number(n) => write!(f, "{}", n.normalize()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::int(value)
    }
}

impl From<Decimal> for ParamValue {
    fn from(value: Decimal) -> Self {
        ParamValue::Number(value)
    }
}
