//! JSON exchange with the host
//!
//! Text parsing and serialization sit behind [`JsonService`] so the binding
//! layer never depends on a particular JSON implementation.

use crate::value::HostValue;
use serde_json::{Map, Number, Value as JsonValue};

/// External JSON collaborator
pub trait JsonService {
    /// Parse text; an `Err` means the text is not well-formed
    fn parse(&self, text: &str) -> Result<JsonValue, String>;

    /// Serialize a JSON tree to text
    fn stringify(&self, value: &JsonValue) -> String;
}

/// Default service backed by `serde_json`
#[derive(Debug, Default, Clone, Copy)]
pub struct SerdeJson;

impl JsonService for SerdeJson {
    fn parse(&self, text: &str) -> Result<JsonValue, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    fn stringify(&self, value: &JsonValue) -> String {
        value.to_string()
    }
}

/// Convert a host value to a JSON tree
///
/// Values JSON cannot express (undefined, functions, non-finite numbers,
/// native handles) become `null`.
pub fn to_json(value: &HostValue) -> JsonValue {
    match value {
        HostValue::Undefined | HostValue::Null => JsonValue::Null,
        HostValue::Bool(b) => JsonValue::Bool(*b),
        HostValue::Number(n) => number_to_json(*n),
        HostValue::Str(s) => JsonValue::String(s.clone()),
        HostValue::Array(items) => JsonValue::Array(items.iter().map(to_json).collect()),
        HostValue::Object(fields) => {
            let map: Map<String, JsonValue> = fields
                .iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect();
            JsonValue::Object(map)
        }
        HostValue::Function(_) | HostValue::Handle(_) => JsonValue::Null,
    }
}

fn number_to_json(n: f64) -> JsonValue {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        JsonValue::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(JsonValue::Null, JsonValue::Number)
    }
}

/// Convert a JSON tree to a host value
pub fn from_json(value: &JsonValue) -> HostValue {
    match value {
        JsonValue::Null => HostValue::Null,
        JsonValue::Bool(b) => HostValue::Bool(*b),
        JsonValue::Number(n) => HostValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        JsonValue::String(s) => HostValue::Str(s.clone()),
        JsonValue::Array(items) => HostValue::Array(items.iter().map(from_json).collect()),
        JsonValue::Object(map) => {
            HostValue::Object(map.iter().map(|(k, v)| (k.clone(), from_json(v))).collect())
        }
    }
}
