//! Array builtins. The higher-order ones accept either a lambda or another
//! builtin and dispatch through [`Function::call`].

use super::{
    arg_array, arg_f64, arg_function, BuiltinDefinition, Signature, ARRAY, FUNCTION, JSON, NUMBER,
};
use crate::context::Context;
use crate::error::Error;
use crate::util::{is_truthy, slice_bounds};
use crate::value::{Function, Value};
use std::cmp::Ordering;

fn call_with(function: &Function, context: &Context, item: &Value) -> Result<Value, Error> {
    function.call(context, vec![item.clone()])
}

fn map_eval(context: &Context, args: &[Value]) -> Result<Value, Error> {
    let function = arg_function(args, 1)?;
    let items = arg_array(args, 0)
        .iter()
        .map(|item| call_with(function, context, item))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Array(items))
}

fn filter_eval(context: &Context, args: &[Value]) -> Result<Value, Error> {
    let function = arg_function(args, 1)?;
    let mut kept = Vec::new();
    for item in arg_array(args, 0) {
        if is_truthy(&call_with(function, context, item)?) {
            kept.push(item.clone());
        }
    }
    Ok(Value::Array(kept))
}

fn reduce_eval(context: &Context, args: &[Value]) -> Result<Value, Error> {
    let function = arg_function(args, 1)?;
    let initial = args.get(2).cloned().unwrap_or(Value::Null);
    arg_array(args, 0).iter().try_fold(initial, |acc, item| {
        function.call(context, vec![acc, item.clone()])
    })
}

/// Index of the first element the predicate accepts.
fn position(context: &Context, args: &[Value]) -> Result<Option<usize>, Error> {
    let function = arg_function(args, 1)?;
    for (i, item) in arg_array(args, 0).iter().enumerate() {
        if is_truthy(&call_with(function, context, item)?) {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

fn some_eval(context: &Context, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(position(context, args)?.is_some()))
}

fn every_eval(context: &Context, args: &[Value]) -> Result<Value, Error> {
    let function = arg_function(args, 1)?;
    for item in arg_array(args, 0) {
        if !is_truthy(&call_with(function, context, item)?) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

fn find_eval(context: &Context, args: &[Value]) -> Result<Value, Error> {
    Ok(position(context, args)?
        .map(|i| arg_array(args, 0)[i].clone())
        .unwrap_or(Value::Null))
}

fn find_index_eval(context: &Context, args: &[Value]) -> Result<Value, Error> {
    Ok(match position(context, args)? {
        Some(i) => Value::from(i),
        None => Value::Number(-1.0),
    })
}

fn slice_eval(args: &[Value]) -> Result<Value, Error> {
    let items = arg_array(args, 0);
    let start = arg_f64(args, 1).trunc() as i64;
    let end = (args.len() > 2).then(|| arg_f64(args, 2).trunc() as i64);
    let (start, end) = slice_bounds(start, end, items.len());
    Ok(Value::Array(items[start..end].to_vec()))
}

fn flatten_eval(args: &[Value]) -> Result<Value, Error> {
    let mut flat = Vec::new();
    for item in arg_array(args, 0) {
        match item {
            Value::Array(inner) => flat.extend(inner.iter().cloned()),
            other => flat.push(other.clone()),
        }
    }
    Ok(Value::Array(flat))
}

/// Numbers sort numerically and strings by code point; any other mix falls
/// back to comparing textual forms.
fn sort_eval(args: &[Value]) -> Result<Value, Error> {
    let mut items = arg_array(args, 0).to_vec();
    if items.iter().all(|v| matches!(v, Value::Number(_)))
        || items.iter().all(|v| matches!(v, Value::String(_)))
    {
        items.sort_by(compare_keys);
    } else {
        items.sort_by_cached_key(|v| v.to_string());
    }
    Ok(Value::Array(items))
}

fn compare_keys(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

/// Stable ascending sort on the key each element maps to. Keys are computed
/// once per element.
fn sort_by_eval(context: &Context, args: &[Value]) -> Result<Value, Error> {
    let function = arg_function(args, 1)?;
    let mut keyed = arg_array(args, 0)
        .iter()
        .map(|item| Ok((call_with(function, context, item)?, item.clone())))
        .collect::<Result<Vec<_>, Error>>()?;
    keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b));
    Ok(Value::Array(keyed.into_iter().map(|(_, item)| item).collect()))
}

fn reverse_eval(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Array(arg_array(args, 0).iter().rev().cloned().collect()))
}

pub fn builtins() -> Vec<BuiltinDefinition> {
    let higher_order = Signature::fixed(&[ARRAY, FUNCTION]);
    vec![
        BuiltinDefinition::with_context("map", higher_order, map_eval),
        BuiltinDefinition::with_context("filter", higher_order, filter_eval),
        BuiltinDefinition::with_context(
            "reduce",
            Signature::fixed(&[ARRAY, FUNCTION, JSON]),
            reduce_eval,
        ),
        BuiltinDefinition::with_context("some", higher_order, some_eval),
        BuiltinDefinition::with_context("every", higher_order, every_eval),
        BuiltinDefinition::with_context("find", higher_order, find_eval),
        BuiltinDefinition::with_context("findIndex", higher_order, find_index_eval),
        BuiltinDefinition::plain(
            "slice",
            Signature::fixed(&[ARRAY, NUMBER, NUMBER]).min(2),
            slice_eval,
        ),
        BuiltinDefinition::plain("flatten", Signature::fixed(&[ARRAY]), flatten_eval),
        BuiltinDefinition::plain("sort", Signature::fixed(&[ARRAY]), sort_eval),
        BuiltinDefinition::with_context("sortBy", higher_order, sort_by_eval),
        BuiltinDefinition::plain("reverse", Signature::fixed(&[ARRAY]), reverse_eval),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::lookup;
    use serde_json::json;

    fn args(values: serde_json::Value) -> Vec<Value> {
        match Value::from(values) {
            Value::Array(items) => items,
            other => vec![other],
        }
    }

    fn builtin(name: &str) -> Value {
        Value::Function(Function::builtin(lookup(name).unwrap()))
    }

    #[test]
    fn test_map_with_builtin_callable() {
        let ctx = Context::builtins();
        let input = vec![Value::from(json!([1.2, 2.7])), builtin("floor")];
        assert_eq!(map_eval(&ctx, &input).unwrap(), Value::from(json!([1, 2])));
    }

    #[test]
    fn test_find_and_find_index_with_no_match() {
        let ctx = Context::builtins();
        let input = vec![Value::from(json!([1, 2])), builtin("str")];
        // Every string from `str` is non-empty, so the first element matches.
        assert_eq!(find_eval(&ctx, &input).unwrap(), Value::Number(1.0));
        let input = vec![Value::from(json!([[], []])), builtin("flatten")];
        assert!(find_eval(&ctx, &input).unwrap().is_null());
        assert_eq!(find_index_eval(&ctx, &input).unwrap(), Value::Number(-1.0));
    }

    #[test]
    fn test_slice() {
        assert_eq!(
            slice_eval(&args(json!([[1, 2, 3, 4], 1, 3]))).unwrap(),
            Value::from(json!([2, 3]))
        );
        assert_eq!(
            slice_eval(&args(json!([[1, 2, 3, 4], -2]))).unwrap(),
            Value::from(json!([3, 4]))
        );
    }

    #[test]
    fn test_flatten_one_level() {
        assert_eq!(
            flatten_eval(&args(json!([[[1, [2]], 3, [4]]]))).unwrap(),
            Value::from(json!([1, [2], 3, 4]))
        );
    }

    #[test]
    fn test_sort() {
        assert_eq!(
            sort_eval(&args(json!([[10, 9, 1]]))).unwrap(),
            Value::from(json!([1, 9, 10]))
        );
        assert_eq!(
            sort_eval(&args(json!([["b", "a", "C"]]))).unwrap(),
            Value::from(json!(["C", "a", "b"]))
        );
        assert_eq!(
            sort_eval(&args(json!([[10, "9", 1]]))).unwrap(),
            Value::from(json!([1, 10, "9"]))
        );
    }

    #[test]
    fn test_reverse() {
        assert_eq!(
            reverse_eval(&args(json!([[1, 2, 3]]))).unwrap(),
            Value::from(json!([3, 2, 1]))
        );
    }
}
