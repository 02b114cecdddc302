//! Type inspection and conversion builtins.

use super::{arg_str, BuiltinDefinition, Signature, ANY, JSON, STRING};
use crate::context::Context;
use crate::error::Error;
use crate::util::is_truthy;
use crate::value::Value;

fn typeof_eval(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::from(args.first().map_or("null", Value::type_name)))
}

fn defined_eval(context: &Context, args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(context.contains(arg_str(args, 0))))
}

fn boolean_eval(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(args.first().is_some_and(is_truthy)))
}

fn json_eval(args: &[Value]) -> Result<Value, Error> {
    let json = args.first().cloned().unwrap_or(Value::Null).to_json()?;
    serde_json::to_string(&json)
        .map(Value::String)
        .map_err(|err| Error::builtin(format!("invalid arguments to builtin: json: {}", err)))
}

fn parse_json_eval(args: &[Value]) -> Result<Value, Error> {
    serde_json::from_str::<serde_json::Value>(arg_str(args, 0))
        .map(Value::from)
        .map_err(|err| {
            Error::builtin(format!(
                "invalid arguments to builtin: parseJSON: invalid JSON string: {}",
                err
            ))
        })
}

/// Arrays pass through, null becomes empty, anything else is wrapped.
fn to_array_eval(args: &[Value]) -> Result<Value, Error> {
    Ok(match args.first() {
        Some(Value::Array(items)) => Value::Array(items.clone()),
        None | Some(Value::Null) => Value::Array(Vec::new()),
        Some(other) => Value::Array(vec![other.clone()]),
    })
}

pub fn builtins() -> Vec<BuiltinDefinition> {
    vec![
        BuiltinDefinition::plain("typeof", Signature::fixed(&[ANY]), typeof_eval),
        BuiltinDefinition::with_context("defined", Signature::fixed(&[STRING]), defined_eval),
        BuiltinDefinition::plain("boolean", Signature::fixed(&[JSON]), boolean_eval),
        BuiltinDefinition::plain("json", Signature::fixed(&[JSON]), json_eval),
        BuiltinDefinition::plain("parseJSON", Signature::fixed(&[STRING]), parse_json_eval),
        // The argument may be omitted entirely.
        BuiltinDefinition::plain("toArray", Signature::fixed(&[JSON]).min(0), to_array_eval),
    ]
}
