//! Property codec for the document store's typed property representation.
//!
//! Every property value on the wire is a tagged object like
//! `{"type":"select","select":{"name":"KJV"}}`. The codec flattens these
//! into plain values; it never fails, it only returns nothing for an
//! absent key or a null sub-value.

use serde_json::{Map, Value};

/// A property value flattened out of its wire representation.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    TextList(Vec<String>),
    Number(f64),
    Bool(bool),
    /// Unknown or unsupported kinds keep their raw sub-value.
    Raw(Value),
}

impl PropertyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Falsy in the loose sense the predicate narrowing uses: absent
    /// values are handled by the caller, this covers empty text, empty
    /// lists, false, zero and null.
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::TextList(items) => items.is_empty(),
            Self::Number(n) => *n == 0.0,
            Self::Bool(b) => !b,
            Self::Raw(Value::Null) => true,
            Self::Raw(Value::Array(items)) => items.is_empty(),
            Self::Raw(_) => false,
        }
    }
}

fn plain_text_concat(fragments: Option<&Value>) -> String {
    fragments
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("plain_text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

fn name_of(value: Option<&Value>) -> Option<PropertyValue> {
    value
        .and_then(|v| v.get("name"))
        .and_then(Value::as_str)
        .map(|name| PropertyValue::Text(name.to_string()))
}

/// Extracts the plain value of a property, dispatching on its type tag.
///
/// Returns `None` when the key is absent or the tagged sub-value is null;
/// unknown types fall back to the raw sub-value under the type key.
pub fn extract_property(properties: &Map<String, Value>, key: &str) -> Option<PropertyValue> {
    let value = properties.get(key)?;
    let kind = value.get("type").and_then(Value::as_str)?;

    match kind {
        "select" => name_of(value.get("select")),
        "status" => name_of(value.get("status")),
        "multi_select" => {
            let names = value
                .get("multi_select")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.get("name").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Some(PropertyValue::TextList(names))
        }
        "rich_text" => Some(PropertyValue::Text(plain_text_concat(
            value.get("rich_text"),
        ))),
        "title" => Some(PropertyValue::Text(plain_text_concat(value.get("title")))),
        "number" => value
            .get("number")
            .and_then(Value::as_f64)
            .map(PropertyValue::Number),
        "checkbox" => value
            .get("checkbox")
            .and_then(Value::as_bool)
            .map(PropertyValue::Bool),
        "date" => value
            .get("date")
            .and_then(|d| d.get("start"))
            .and_then(Value::as_str)
            .map(|s| PropertyValue::Text(s.to_string())),
        "url" => value
            .get("url")
            .and_then(Value::as_str)
            .map(|s| PropertyValue::Text(s.to_string())),
        "people" => value.get("people").cloned().map(PropertyValue::Raw),
        "formula" => {
            let formula = value.get("formula")?;
            match formula.get("string").and_then(Value::as_str) {
                Some(s) => Some(PropertyValue::Text(s.to_string())),
                None => Some(PropertyValue::Raw(formula.clone())),
            }
        }
        other => value.get(other).cloned().map(PropertyValue::Raw),
    }
}

/// True when the property is a checkbox on this page. Used to decide
/// whether a force-reload flag can be reset as part of an update.
pub fn is_checkbox(properties: &Map<String, Value>, key: &str) -> bool {
    properties
        .get(key)
        .and_then(|v| v.get("type"))
        .and_then(Value::as_str)
        == Some("checkbox")
}
