//! Small helpers for pulling fields out of smartctl / lsblk JSON whose
//! schema shifts with the transport behind the device.

use serde_json::Value;

/// A field location: object keys, or array indices written as digits.
pub type FieldPath = &'static [&'static str];

/// Walk `path` from `root`. Numeric segments index into arrays.
pub fn at<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |v, seg| match v {
        Value::Object(map) => map.get(*seg),
        Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Non-empty, trimmed string value.
pub fn str_opt(v: &Value) -> Option<String> {
    v.as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Unsigned integer given either as a JSON number or a numeric string.
pub fn u64_lenient(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Try each path in order and return the first value `extract` accepts.
pub fn first_of<T>(root: &Value, paths: &[FieldPath], extract: impl Fn(&Value) -> Option<T>) -> Option<T> {
    paths.iter().find_map(|p| at(root, p).and_then(&extract))
}

/// Depth-first search for `key` anywhere in the document, returning the
/// first value found in document order.
pub fn find_key<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    match root {
        Value::Object(map) => {
            if let Some(v) = map.get(key) {
                return Some(v);
            }
            map.values().find_map(|v| find_key(v, key))
        }
        Value::Array(items) => items.iter().find_map(|v| find_key(v, key)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn at_walks_objects_and_arrays() {
        let v = json!({ "a": { "b": [ {"c": 1}, {"c": 2} ] } });
        assert_eq!(at(&v, &["a", "b", "1", "c"]), Some(&json!(2)));
        assert_eq!(at(&v, &["a", "x"]), None);
        assert_eq!(at(&v, &["a", "b", "z"]), None);
    }

    #[test]
    fn lenient_integers() {
        assert_eq!(u64_lenient(&json!(42)), Some(42));
        assert_eq!(u64_lenient(&json!(" 42 ")), Some(42));
        assert_eq!(u64_lenient(&json!(-1)), None);
        assert_eq!(u64_lenient(&json!("4T")), None);
        assert_eq!(u64_lenient(&json!(null)), None);
    }

    #[test]
    fn first_of_respects_priority() {
        let v = json!({ "x": "", "y": "second", "z": "third" });
        let got = first_of(&v, &[&["x"], &["y"], &["z"]], str_opt);
        assert_eq!(got.as_deref(), Some("second"));
    }

    #[test]
    fn find_key_searches_nested() {
        let v = json!({
            "ata_smart_data": { "self_test": { "status": { "remaining_percent": 30 } } }
        });
        assert_eq!(find_key(&v, "remaining_percent"), Some(&json!(30)));
        assert_eq!(find_key(&v, "missing"), None);
    }
}
