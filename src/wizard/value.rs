//! Aggregate draft value shared by every step of a wizard

use serde_json::{Map, Value};

/// Partially filled-in entity, keyed by field name
pub type DraftValue = Map<String, Value>;

/// Merge a step's submitted keys into the aggregate value.
///
/// Shallow overwrite: a key present in `partial` always replaces the same key
/// in `into`, nested objects included. Keys absent from `partial` are kept.
pub fn merge(into: &mut DraftValue, partial: &DraftValue) {
    for (key, value) in partial {
        into.insert(key.clone(), value.clone());
    }
}

/// Return a copy of `base` with `partial` merged over it
pub fn merged(base: &DraftValue, partial: &DraftValue) -> DraftValue {
    let mut out = base.clone();
    merge(&mut out, partial);
    out
}

/// Whether `key` holds a meaningful value (not null, blank or empty)
pub fn is_filled(value: &DraftValue, key: &str) -> bool {
    match value.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(_) => true,
    }
}

/// Convert an arbitrary JSON value into a draft value.
///
/// Returns `None` when the input is not a JSON object.
pub fn from_json(value: Value) -> Option<DraftValue> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
