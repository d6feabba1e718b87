//! Bounded JSON snapshots of notifications for log lines.
//!
//! Snapshots never fail: serialization errors become a placeholder and
//! nesting beyond the depth bound is replaced by a marker string.

use serde::Serialize;
use serde_json::{Map, Value};

/// Default nesting bound for log snapshots.
pub const DEFAULT_MAX_DEPTH: usize = 8;

const TRUNCATED: &str = "[max depth]";

/// Serialize `value` to a compact JSON string, truncated at `max_depth`.
pub fn snapshot<T: Serialize + ?Sized>(value: &T, max_depth: usize) -> String {
    match serde_json::to_value(value) {
        Ok(value) => prune(value, 0, max_depth).to_string(),
        Err(err) => Value::String(format!("[unserializable: {}]", err)).to_string(),
    }
}

fn prune(value: Value, depth: usize, max_depth: usize) -> Value {
    match value {
        Value::Object(map) if depth >= max_depth && !map.is_empty() => {
            Value::String(TRUNCATED.to_string())
        }
        Value::Array(items) if depth >= max_depth && !items.is_empty() => {
            Value::String(TRUNCATED.to_string())
        }
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, prune(value, depth + 1, max_depth)))
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|value| prune(value, depth + 1, max_depth))
                .collect(),
        ),
        scalar => scalar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde_json::json;

    #[test]
    fn test_snapshot_keeps_shallow_values() {
        let value = json!({"kind": "sms", "phone": "+15815551234"});
        let out: Value = serde_json::from_str(&snapshot(&value, DEFAULT_MAX_DEPTH)).unwrap();
        assert_eq!(out, value);
    }

    #[test]
    fn test_snapshot_truncates_deep_nesting() {
        let mut deep = json!("leaf");
        for _ in 0..50 {
            deep = json!({ "next": deep });
        }

        let out: Value = serde_json::from_str(&snapshot(&deep, 3)).unwrap();
        assert_eq!(out["next"]["next"]["next"], TRUNCATED);
    }

    #[test]
    fn test_snapshot_never_fails() {
        struct Broken;

        impl Serialize for Broken {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(S::Error::custom("boom"))
            }
        }

        let out = snapshot(&Broken, DEFAULT_MAX_DEPTH);
        assert!(out.contains("unserializable"));
        assert!(out.contains("boom"));
    }
}
