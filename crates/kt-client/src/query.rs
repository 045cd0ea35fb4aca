//! Query-string encoding for GET requests.
//!
//! kintone expects nested parameters in bracket form, e.g.
//! `app=1&fields[0]=Name&fields[1]=Age`. Keys are emitted in the order they
//! appear in the JSON value.

use serde_json::Value;

/// Serialize a JSON value into a percent-encoded query string.
///
/// Objects contribute `key=value` pairs, arrays contribute `key[i]=value`,
/// nested objects contribute `key[sub]=value`. Scalars at the top level have no
/// key and are skipped.
pub fn serialize_params(value: &Value) -> String {
    let mut pairs = Vec::new();
    match value {
        Value::Object(map) => {
            for (key, item) in map {
                push_pairs(&mut pairs, key.clone(), item);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                push_pairs(&mut pairs, index.to_string(), item);
            }
        }
        _ => {}
    }
    pairs.join("&")
}

fn push_pairs(pairs: &mut Vec<String>, key: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (sub, item) in map {
                push_pairs(pairs, format!("{key}[{sub}]"), item);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                push_pairs(pairs, format!("{key}[{index}]"), item);
            }
        }
        Value::String(s) => pairs.push(encode_pair(&key, s)),
        // numbers, booleans and null use their JSON spelling
        other => pairs.push(encode_pair(&key, &other.to_string())),
    }
}

fn encode_pair(key: &str, value: &str) -> String {
    format!(
        "{}={}",
        urlencoding::encode(key),
        urlencoding::encode(value)
    )
}
