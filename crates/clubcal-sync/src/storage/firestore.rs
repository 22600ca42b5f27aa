//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! The Firestore REST API wraps every value in a single-key object naming
//! its type (`{"stringValue": "x"}`, `{"integerValue": "12"}`, ...). Org
//! config documents are stored as plain JSON maps, so they are converted on
//! the way in and out.

use serde_json::{Map, Number, Value, json};

use crate::error::{SyncError, SyncResult};

/// Encodes a JSON object as a Firestore document body (`{"fields": {...}}`).
pub fn encode_document(fields: &Map<String, Value>) -> Value {
    json!({ "fields": encode_fields(fields) })
}

/// Decodes the `fields` of a Firestore document into a JSON object.
///
/// A document without `fields` (all keys deleted) decodes to `{}`.
pub fn decode_document(document: &Value) -> SyncResult<Value> {
    match document.get("fields") {
        Some(Value::Object(fields)) => decode_fields(fields).map(Value::Object),
        Some(other) => Err(invalid("fields", other)),
        None => Ok(Value::Object(Map::new())),
    }
}

fn encode_fields(fields: &Map<String, Value>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect(),
    )
}

/// Wraps a JSON value in its Firestore type tag.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // 64-bit integers travel as strings.
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            if values.is_empty() {
                json!({ "arrayValue": {} })
            } else {
                json!({ "arrayValue": { "values": values } })
            }
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

fn decode_fields(fields: &Map<String, Value>) -> SyncResult<Map<String, Value>> {
    fields
        .iter()
        .map(|(key, value)| decode_value(value).map(|value| (key.clone(), value)))
        .collect()
}

/// Unwraps a Firestore typed value into plain JSON.
///
/// Timestamps, references and bytes become strings; geo points become
/// `{latitude, longitude}` objects.
pub fn decode_value(value: &Value) -> SyncResult<Value> {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Err(invalid("value", value));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| invalid(kind, inner)),
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(|i| Value::Number(i.into()))
                .map_err(|_| invalid(kind, inner)),
            Value::Number(n) => Ok(Value::Number(n.clone())),
            _ => Err(invalid(kind, inner)),
        },
        "doubleValue" => match inner {
            Value::Number(_) => Ok(inner.clone()),
            Value::String(s) => s
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| invalid(kind, inner)),
            _ => Err(invalid(kind, inner)),
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| invalid(kind, inner)),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => match inner.get("values") {
            Some(Value::Array(values)) => values
                .iter()
                .map(decode_value)
                .collect::<SyncResult<Vec<_>>>()
                .map(Value::Array),
            None => Ok(Value::Array(Vec::new())),
            Some(other) => Err(invalid(kind, other)),
        },
        "mapValue" => match inner.get("fields") {
            Some(Value::Object(fields)) => decode_fields(fields).map(Value::Object),
            None => Ok(Value::Object(Map::new())),
            Some(other) => Err(invalid(kind, other)),
        },
        _ => Err(invalid(kind, inner)),
    }
}

fn invalid(kind: &str, value: &Value) -> SyncError {
    SyncError::storage(format!("unexpected Firestore {}: {}", kind, value))
}
