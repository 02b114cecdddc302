//! Object builtins.

use super::{arg_object, arg_str, BuiltinDefinition, Signature, OBJECT, STRING};
use crate::error::Error;
use crate::value::{Object, Value};

fn keys_eval(args: &[Value]) -> Result<Value, Error> {
    let keys = arg_object(args, 0)
        .map(|object| object.keys().map(|k| Value::from(k.as_str())).collect())
        .unwrap_or_default();
    Ok(Value::Array(keys))
}

fn values_eval(args: &[Value]) -> Result<Value, Error> {
    let values = arg_object(args, 0)
        .map(|object| object.values().cloned().collect())
        .unwrap_or_default();
    Ok(Value::Array(values))
}

/// `[{key, value}, ...]` in insertion order.
fn entries_eval(args: &[Value]) -> Result<Value, Error> {
    let entries = arg_object(args, 0)
        .map(|object| {
            object
                .iter()
                .map(|(k, v)| {
                    let mut entry = Object::with_capacity(2);
                    entry.insert("key".to_string(), Value::from(k.as_str()));
                    entry.insert("value".to_string(), v.clone());
                    Value::Object(entry)
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(Value::Array(entries))
}

/// Shallow merge; later objects win.
fn merge_eval(args: &[Value]) -> Result<Value, Error> {
    let mut merged = Object::new();
    for object in args.iter().filter_map(Value::as_object) {
        for (k, v) in object {
            merged.insert(k.clone(), v.clone());
        }
    }
    Ok(Value::Object(merged))
}

fn has_key_eval(args: &[Value]) -> Result<Value, Error> {
    let key = arg_str(args, 1);
    Ok(Value::Bool(
        arg_object(args, 0).is_some_and(|object| object.contains_key(key)),
    ))
}

pub fn builtins() -> Vec<BuiltinDefinition> {
    vec![
        BuiltinDefinition::plain("keys", Signature::fixed(&[OBJECT]), keys_eval),
        BuiltinDefinition::plain("values", Signature::fixed(&[OBJECT]), values_eval),
        BuiltinDefinition::plain("entries", Signature::fixed(&[OBJECT]), entries_eval),
        BuiltinDefinition::plain(
            "merge",
            Signature::variadic(&[OBJECT, OBJECT], OBJECT).min(2),
            merge_eval,
        ),
        BuiltinDefinition::plain("hasKey", Signature::fixed(&[OBJECT, STRING]), has_key_eval),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(values: serde_json::Value) -> Vec<Value> {
        match Value::from(values) {
            Value::Array(items) => items,
            other => vec![other],
        }
    }

    #[test]
    fn test_keys_values_entries() {
        let input = args(json!([{"b": 1, "a": 2}]));
        assert_eq!(keys_eval(&input).unwrap(), Value::from(json!(["b", "a"])));
        assert_eq!(values_eval(&input).unwrap(), Value::from(json!([1, 2])));
        assert_eq!(
            entries_eval(&input).unwrap(),
            Value::from(json!([{"key": "b", "value": 1}, {"key": "a", "value": 2}]))
        );
    }

    #[test]
    fn test_merge_later_wins() {
        assert_eq!(
            merge_eval(&args(json!([{"a": 1, "b": 1}, {"b": 2}, {"c": 3}]))).unwrap(),
            Value::from(json!({"a": 1, "b": 2, "c": 3}))
        );
    }

    #[test]
    fn test_has_key() {
        assert_eq!(
            has_key_eval(&args(json!([{"a": null}, "a"]))).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(has_key_eval(&args(json!([{}, "a"]))).unwrap(), Value::Bool(false));
    }
}
