//! Dot-path lookup into JSON documents.

use serde_json::Value;

/// Look up a dot-separated path such as `meta.author.name` or `items.0.id`.
///
/// Numeric segments index into arrays. Missing intermediate segments yield
/// `None`; navigation never fails. An empty path selects the document itself.
pub fn lookup_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(data);
    }

    path.split('.').try_fold(data, lookup_key)
}

/// Look up a single key without splitting on dots.
///
/// Objects are indexed by name, arrays by a numeric key.
pub fn lookup_key<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    match data {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}
