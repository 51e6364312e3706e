//! Values carried by the canonical record
//!
//! Providers disagree on the JSON type of many fields (page counts arrive as
//! numbers from one API and strings from another), so the record keeps them
//! loosely typed and every consumer stringifies through [`FieldValue`].

use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;

/// A numeric-ish field: stored as whatever the provider sent
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Numeric {
    Number(Number),
    Text(String),
}

impl Numeric {
    /// Build from an integer count (pages, series index)
    pub fn from_int(value: i64) -> Self {
        Numeric::Number(Number::from(value))
    }

    /// Build from a float; non-finite values fall back to an empty string
    pub fn from_float(value: f64) -> Self {
        Number::from_f64(value)
            .map(Numeric::Number)
            .unwrap_or_else(|| Numeric::Text(String::new()))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Numeric::Text(s) if s.is_empty())
    }
}

impl Default for Numeric {
    fn default() -> Self {
        Numeric::Text(String::new())
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Number(n) => write!(f, "{}", n),
            Numeric::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Numeric {
    fn from(value: &str) -> Self {
        Numeric::Text(value.to_string())
    }
}

impl From<String> for Numeric {
    fn from(value: String) -> Self {
        Numeric::Text(value)
    }
}

/// Value of a provider-specific custom column (e.g. Calibre `#read`)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CustomValue {
    Bool(bool),
    Number(Number),
    Text(String),
    List(Vec<String>),
}

impl fmt::Display for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomValue::Bool(b) => write!(f, "{}", b),
            CustomValue::Number(n) => write!(f, "{}", n),
            CustomValue::Text(s) => f.write_str(s),
            CustomValue::List(items) => f.write_str(&items.join(",")),
        }
    }
}

/// A single record field as seen by templates and header emission
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Number(Number),
    Text(String),
    List(Vec<String>),
    Map(BTreeMap<String, CustomValue>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FieldValue::List(_))
    }

    /// True for an empty scalar string.
    ///
    /// Lists and mappings are never "empty" in this sense: an empty list is
    /// still a defined value and must not be overwritten by an empty override.
    pub fn is_empty_text(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.is_empty())
    }

    /// Loose truthiness used by the header merge rules.
    ///
    /// Empty strings and zero are falsy; every list and mapping is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
            FieldValue::List(_) | FieldValue::Map(_) => true,
        }
    }

    /// Scalar string form: lists are comma-joined without spaces and
    /// mappings are rendered as compact JSON.
    pub fn to_display_string(&self) -> String {
        match self {
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(","),
            FieldValue::Map(map) => serde_json::to_string(map).unwrap_or_default(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

impl From<Numeric> for FieldValue {
    fn from(value: Numeric) -> Self {
        match value {
            Numeric::Number(n) => FieldValue::Number(n),
            Numeric::Text(s) => FieldValue::Text(s),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_display() {
        assert_eq!(Numeric::from_int(412).to_string(), "412");
        assert_eq!(Numeric::from_float(4.5).to_string(), "4.5");
        assert_eq!(Numeric::from("xii").to_string(), "xii");
    }

    #[test]
    fn test_numeric_deserializes_either_shape() {
        let n: Numeric = serde_json::from_str("320").unwrap();
        assert_eq!(n, Numeric::from_int(320));
        let s: Numeric = serde_json::from_str("\"320\"").unwrap();
        assert_eq!(s, Numeric::from("320"));
    }

    #[test]
    fn test_list_display_matches_plain_join() {
        let value = FieldValue::list(["fiction", "drama"]);
        assert_eq!(value.to_display_string(), "fiction,drama");
        assert_eq!(FieldValue::list(Vec::<String>::new()).to_display_string(), "");
    }

    #[test]
    fn test_truthiness() {
        assert!(!FieldValue::text("").is_truthy());
        assert!(FieldValue::text("x").is_truthy());
        assert!(!FieldValue::Number(Number::from(0)).is_truthy());
        assert!(FieldValue::list(Vec::<String>::new()).is_truthy());
    }

    #[test]
    fn test_custom_value_untagged() {
        let v: CustomValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, CustomValue::Bool(true));
        let v: CustomValue = serde_json::from_str("[\"a\",\"b\"]").unwrap();
        assert_eq!(v.to_string(), "a,b");
    }
}
