//! Builtin library seeded into every default context.
//!
//! Each builtin declares its argument signature; [`BuiltinDefinition::call`]
//! validates the arguments against it before dispatching, so the
//! implementations below only ever see well-typed input.

pub mod array;
pub mod math;
pub mod object;
pub mod string;
pub mod time;
pub mod type_ops;

use crate::context::Context;
use crate::error::Error;
use crate::util::is_integer;
use crate::value::{Function, Object, Value};
use std::fmt;
use std::sync::OnceLock;

/// Runtime type tags used in signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    String,
    Number,
    /// A number with no fractional part.
    Integer,
    Boolean,
    Array,
    Object,
    Null,
    Function,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Integer => "integer",
            TypeTag::Boolean => "boolean",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
            TypeTag::Null => "null",
            TypeTag::Function => "function",
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeTag::String, Value::String(_)) => true,
            (TypeTag::Number, Value::Number(_)) => true,
            (TypeTag::Integer, Value::Number(n)) => is_integer(*n),
            (TypeTag::Boolean, Value::Bool(_)) => true,
            (TypeTag::Array, Value::Array(_)) => true,
            (TypeTag::Object, Value::Object(_)) => true,
            (TypeTag::Null, Value::Null) => true,
            (TypeTag::Function, Value::Function(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) const STRING: &[TypeTag] = &[TypeTag::String];
pub(crate) const NUMBER: &[TypeTag] = &[TypeTag::Number];
pub(crate) const INTEGER: &[TypeTag] = &[TypeTag::Integer];
pub(crate) const ARRAY: &[TypeTag] = &[TypeTag::Array];
pub(crate) const OBJECT: &[TypeTag] = &[TypeTag::Object];
pub(crate) const FUNCTION: &[TypeTag] = &[TypeTag::Function];
pub(crate) const STRING_OR_NUMBER: &[TypeTag] = &[TypeTag::String, TypeTag::Number];
/// Any JSON value.
pub(crate) const JSON: &[TypeTag] = &[
    TypeTag::String,
    TypeTag::Number,
    TypeTag::Boolean,
    TypeTag::Array,
    TypeTag::Object,
    TypeTag::Null,
];
pub(crate) const ANY: &[TypeTag] = &[
    TypeTag::String,
    TypeTag::Number,
    TypeTag::Boolean,
    TypeTag::Array,
    TypeTag::Object,
    TypeTag::Null,
    TypeTag::Function,
];

/// Declarative argument constraints. Each positional entry is a union of
/// allowed tags.
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub params: &'static [&'static [TypeTag]],
    /// Tag union applied to every argument past `params`.
    pub variadic: Option<&'static [TypeTag]>,
    pub min_args: Option<usize>,
}

impl Signature {
    pub const fn fixed(params: &'static [&'static [TypeTag]]) -> Self {
        Signature {
            params,
            variadic: None,
            min_args: None,
        }
    }

    pub const fn variadic(params: &'static [&'static [TypeTag]], rest: &'static [TypeTag]) -> Self {
        Signature {
            params,
            variadic: Some(rest),
            min_args: None,
        }
    }

    /// Lowers the required count. On a fixed signature the parameters past
    /// `min_args` become optional, and arguments beyond `params` are still
    /// rejected.
    pub const fn min(mut self, min_args: usize) -> Self {
        self.min_args = Some(min_args);
        self
    }

    /// Checks `args` against the signature, in this order: fixed arity,
    /// declared minimum, then each argument's tag.
    pub fn validate(&self, name: &str, args: &[Value]) -> Result<(), Error> {
        let found = args.len();
        if self.variadic.is_none() && self.min_args.is_none() && found < self.params.len() {
            return Err(arity_error(name, "at least", self.params.len(), found));
        }
        if let Some(min) = self.min_args {
            if found < min {
                return Err(arity_error(name, "at least", min, found));
            }
        }
        for (i, arg) in args.iter().enumerate() {
            let allowed = match self.params.get(i).copied().or(self.variadic) {
                Some(allowed) => allowed,
                None => return Err(arity_error(name, "at most", self.params.len(), found)),
            };
            if !allowed.iter().any(|tag| tag.matches(arg)) {
                let tags: Vec<&str> = allowed.iter().map(TypeTag::as_str).collect();
                return Err(Error::builtin(format!(
                    "invalid arguments to builtin: {}: argument {} to be {} found {}",
                    name,
                    i + 1,
                    tags.join("|"),
                    arg.type_name()
                )));
            }
        }
        Ok(())
    }
}

fn arity_error(name: &str, bound: &str, expected: usize, found: usize) -> Error {
    Error::builtin(format!(
        "invalid arguments to builtin: {}: expected {} {} arguments, found {}",
        name, bound, expected, found
    ))
}

pub type PlainFn = fn(&[Value]) -> Result<Value, Error>;
pub type ContextFn = fn(&Context, &[Value]) -> Result<Value, Error>;

/// Native implementation, tagged with whether it wants the caller's context.
#[derive(Clone, Copy)]
pub enum Invoke {
    Plain(PlainFn),
    WithContext(ContextFn),
}

/// A named native callable.
pub struct BuiltinDefinition {
    pub name: &'static str,
    pub signature: Signature,
    pub invoke: Invoke,
}

impl BuiltinDefinition {
    pub const fn plain(name: &'static str, signature: Signature, eval: PlainFn) -> Self {
        BuiltinDefinition {
            name,
            signature,
            invoke: Invoke::Plain(eval),
        }
    }

    pub const fn with_context(name: &'static str, signature: Signature, eval: ContextFn) -> Self {
        BuiltinDefinition {
            name,
            signature,
            invoke: Invoke::WithContext(eval),
        }
    }

    pub fn needs_context(&self) -> bool {
        matches!(self.invoke, Invoke::WithContext(_))
    }

    /// Validates `args` and runs the builtin.
    pub fn call(&self, context: &Context, args: Vec<Value>) -> Result<Value, Error> {
        tracing::trace!(builtin = self.name, args = args.len(), "invoking builtin");
        self.signature.validate(self.name, &args)?;
        match self.invoke {
            Invoke::Plain(f) => f(&args),
            Invoke::WithContext(f) => f(context, &args),
        }
    }
}

impl fmt::Debug for BuiltinDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinDefinition")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("needs_context", &self.needs_context())
            .finish()
    }
}

/// Every builtin, in registration order.
pub fn all_builtins() -> Vec<BuiltinDefinition> {
    let mut defs = Vec::new();
    defs.extend(math::builtins());
    defs.extend(string::builtins());
    defs.extend(array::builtins());
    defs.extend(object::builtins());
    defs.extend(type_ops::builtins());
    defs.extend(time::builtins());
    defs
}

/// The process-wide registry.
pub fn definitions() -> impl Iterator<Item = &'static BuiltinDefinition> {
    static REGISTRY: OnceLock<Vec<BuiltinDefinition>> = OnceLock::new();
    REGISTRY.get_or_init(all_builtins).iter()
}

pub fn lookup(name: &str) -> Option<&'static BuiltinDefinition> {
    definitions().find(|def| def.name == name)
}

/// Upper bound on the number of items (or characters) a single builtin call
/// may generate from its numeric arguments.
pub const MAX_GENERATED_LEN: usize = 1 << 24;

/// Rejects a requested output length above [`MAX_GENERATED_LEN`] before
/// anything is allocated.
pub(crate) fn generated_len(name: &str, len: u128) -> Result<usize, Error> {
    match usize::try_from(len) {
        Ok(len) if len <= MAX_GENERATED_LEN => Ok(len),
        _ => Err(Error::builtin(format!(
            "invalid arguments to builtin: {}: result of {} items exceeds the limit of {}",
            name, len, MAX_GENERATED_LEN
        ))),
    }
}

// Accessors for validated arguments. The fallbacks are unreachable once the
// signature has been checked.

pub(crate) fn arg_f64(args: &[Value], index: usize) -> f64 {
    args.get(index).and_then(Value::as_f64).unwrap_or(f64::NAN)
}

pub(crate) fn arg_str(args: &[Value], index: usize) -> &str {
    args.get(index).and_then(Value::as_str).unwrap_or("")
}

pub(crate) fn arg_array(args: &[Value], index: usize) -> &[Value] {
    args.get(index)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub(crate) fn arg_object(args: &[Value], index: usize) -> Option<&Object> {
    args.get(index).and_then(Value::as_object)
}

pub(crate) fn arg_function<'a>(args: &'a [Value], index: usize) -> Result<&'a Function, Error> {
    match args.get(index) {
        Some(Value::Function(function)) => Ok(function),
        _ => Err(Error::builtin(format!(
            "argument {} must be a function",
            index + 1
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Value>) -> Result<Value, Error> {
        let def = lookup(name).unwrap();
        def.call(&Context::builtins(), args)
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = definitions().map(|d| d.name).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_too_few_arguments() {
        let err = call("pow", vec![Value::Number(2.0)]).unwrap_err();
        assert_eq!(
            err,
            Error::Builtin(
                "invalid arguments to builtin: pow: expected at least 2 arguments, found 1".into()
            )
        );
    }

    #[test]
    fn test_wrong_type_names_argument() {
        let err = call("sin", vec![Value::from("x")]).unwrap_err();
        assert_eq!(
            err,
            Error::Builtin(
                "invalid arguments to builtin: sin: argument 1 to be number found string".into()
            )
        );
    }

    #[test]
    fn test_variadic_extends_constraints() {
        assert_eq!(
            call("max", vec![Value::Number(1.0), Value::Number(3.0), Value::Number(2.0)]).unwrap(),
            Value::Number(3.0)
        );
        let err = call("max", vec![Value::Number(1.0), Value::from("2")]).unwrap_err();
        assert!(err.to_string().contains("argument 2 to be number found string"));
        assert!(call("max", vec![]).is_err());
    }

    #[test]
    fn test_union_tags_in_message() {
        let err = call("len", vec![Value::Number(1.0)]).unwrap_err();
        assert!(err
            .to_string()
            .ends_with("argument 1 to be string|array|object found number"));
    }

    #[test]
    fn test_too_many_arguments() {
        let err = call("sqrt", vec![Value::Number(1.0), Value::Number(2.0)]).unwrap_err();
        assert!(err.to_string().contains("expected at most 1 arguments, found 2"));
    }

    #[test]
    fn test_optional_parameters_are_bounded() {
        let sig = Signature::fixed(&[STRING, NUMBER, NUMBER]).min(2);
        assert!(sig.validate("f", &[Value::from("a"), Value::Number(1.0)]).is_ok());
        let three = [Value::from("a"), Value::Number(1.0), Value::Number(2.0)];
        assert!(sig.validate("f", &three).is_ok());
        let err = sig.validate("f", &[Value::from("a")]).unwrap_err();
        assert!(err.to_string().contains("expected at least 2 arguments, found 1"));
        let four = [
            Value::from("a"),
            Value::Number(1.0),
            Value::Number(2.0),
            Value::Number(3.0),
        ];
        let err = sig.validate("f", &four).unwrap_err();
        assert!(err.to_string().contains("expected at most 3 arguments, found 4"));

        let err = call("padLeft", vec![
            Value::from("a"),
            Value::Number(3.0),
            Value::from("x"),
            Value::from("y"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("padLeft: expected at most 3 arguments, found 4"));
    }

    #[test]
    fn test_generated_len_limit() {
        assert_eq!(generated_len("f", 3).unwrap(), 3);
        assert_eq!(
            generated_len("f", MAX_GENERATED_LEN as u128).unwrap(),
            MAX_GENERATED_LEN
        );
        assert!(matches!(
            generated_len("f", MAX_GENERATED_LEN as u128 + 1),
            Err(Error::Builtin(_))
        ));
        assert!(generated_len("f", u128::MAX).is_err());
    }

    #[test]
    fn test_integer_tag() {
        assert!(TypeTag::Integer.matches(&Value::Number(3.0)));
        assert!(!TypeTag::Integer.matches(&Value::Number(3.5)));
    }
}
