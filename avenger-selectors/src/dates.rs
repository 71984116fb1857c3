//! Conversion of selection values into the host model's JSON representation.
//!
//! The host stores dates as RFC 3339 UTC strings with millisecond precision
//! (`2024-03-01T12:00:00.000Z`). Any sub-millisecond part of a native date is dropped.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

/// A selection value as produced by a concrete selector, before it is written to the model
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(DateTime<Utc>),
    List(Vec<SelectionValue>),
    Map(IndexMap<String, SelectionValue>),
    /// Already in the host representation, written as is
    Json(Value),
}

impl From<bool> for SelectionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for SelectionValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for SelectionValue {
    fn from(value: f32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for SelectionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SelectionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for SelectionValue {
    fn from(value: DateTime<Tz>) -> Self {
        Self::Date(value.with_timezone(&Utc))
    }
}

impl<T: Into<SelectionValue>> From<Vec<T>> for SelectionValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SelectionValue>, const N: usize> From<[T; N]> for SelectionValue {
    fn from(values: [T; N]) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for SelectionValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// Canonical host representation of a date
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Read a date written by [`convert_dates`]
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?;
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Convert a selection value to JSON, replacing every date (at any depth) with its
/// canonical string form
pub fn convert_dates(value: &SelectionValue) -> Value {
    match value {
        SelectionValue::Null => Value::Null,
        SelectionValue::Bool(b) => Value::Bool(*b),
        // JSON has no NaN or infinity
        SelectionValue::Number(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
        SelectionValue::Text(s) => Value::String(s.clone()),
        SelectionValue::Date(date) => Value::String(format_date(date)),
        SelectionValue::List(values) => Value::Array(values.iter().map(convert_dates).collect()),
        SelectionValue::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), convert_dates(value)))
                .collect::<Map<_, _>>(),
        ),
        SelectionValue::Json(value) => value.clone(),
    }
}
