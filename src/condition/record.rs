//! Candidate records
//!
//! Evaluation reads one flat key/value mapping per record. Keys are matched
//! exactly; related-record values must be flattened into the mapping first.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// A flat record that conditions are evaluated against
pub trait Record {
    /// Value stored under `key`, if any
    fn value_of(&self, key: &str) -> Option<&Value>;
}

impl<S: BuildHasher> Record for HashMap<String, Value, S> {
    fn value_of(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

impl Record for BTreeMap<String, Value> {
    fn value_of(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

impl Record for Map<String, Value> {
    fn value_of(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

/// A JSON object is a record; any other JSON value has no fields
impl Record for Value {
    fn value_of(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|object| object.get(key))
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn value_of(&self, key: &str) -> Option<&Value> {
        (**self).value_of(key)
    }
}

/// Flatten nested objects into dot-joined keys
///
/// `{"assignee": {"group": "ops"}}` becomes `{"assignee.group": "ops"}`.
/// Arrays and scalars are kept as leaf values.
pub fn flatten_record(value: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    if let Value::Object(object) = value {
        flatten_into(object, None, &mut out);
    }
    out
}

fn flatten_into(object: &Map<String, Value>, prefix: Option<&str>, out: &mut Map<String, Value>) {
    for (key, value) in object {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(inner, Some(&path), out),
            other => {
                out.insert(path, other.clone());
            }
        }
    }
}
