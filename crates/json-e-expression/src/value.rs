//! Runtime values.

use crate::ast::Node;
use crate::builtins::BuiltinDefinition;
use crate::context::Context;
use crate::error::Error;
use crate::interpreter::Interpreter;
use crate::util;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Ordered string → value mapping.
pub type Object = IndexMap<String, Value>;

/// A JSON-compatible value, or a callable.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Object),
    Function(Function),
}

/// Cheaply clonable handle to a callable. Two handles are equal only when
/// they refer to the same callable.
#[derive(Clone)]
pub struct Function(Arc<Callable>);

/// The two calling conventions.
pub enum Callable {
    /// Native builtin; receives the caller's context implicitly.
    Builtin(&'static BuiltinDefinition),
    /// User lambda; evaluates its body in the captured snapshot.
    Lambda(Lambda),
}

pub struct Lambda {
    pub params: Vec<String>,
    pub body: Arc<Node>,
    pub captured: Context,
}

impl Function {
    pub fn builtin(definition: &'static BuiltinDefinition) -> Self {
        Function(Arc::new(Callable::Builtin(definition)))
    }

    pub fn lambda(params: Vec<String>, body: Arc<Node>, captured: Context) -> Self {
        Function(Arc::new(Callable::Lambda(Lambda {
            params,
            body,
            captured,
        })))
    }

    pub fn callable(&self) -> &Callable {
        &self.0
    }

    pub fn is_builtin(&self) -> bool {
        matches!(*self.0, Callable::Builtin(_))
    }

    /// Invokes the callable. `context` is the caller's active context; it is
    /// handed to native builtins and ignored by lambdas.
    pub fn call(&self, context: &Context, args: Vec<Value>) -> Result<Value, Error> {
        match &*self.0 {
            Callable::Builtin(definition) => definition.call(context, args),
            Callable::Lambda(lambda) => {
                tracing::trace!(params = ?lambda.params, args = args.len(), "invoking lambda");
                // Missing arguments leave the parameter unbound.
                let bindings = lambda.params.iter().cloned().zip(args);
                let scope = lambda.captured.bind(bindings);
                Interpreter::new(scope).interpret(&lambda.body)
            }
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            Callable::Builtin(definition) => write!(f, "<builtin {}>", definition.name),
            Callable::Lambda(lambda) => write!(f, "<lambda({})>", lambda.params.join(", ")),
        }
    }
}

impl Value {
    /// Type name as reported by `typeof`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        util::is_truthy(self)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Converts to JSON. Integral numbers become JSON integers and
    /// non-finite numbers become `null`; callables cannot be represented.
    pub fn to_json(&self) -> Result<serde_json::Value, Error> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => util::number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => serde_json::Value::Array(
                items.iter().map(Value::to_json).collect::<Result<_, _>>()?,
            ),
            Value::Object(obj) => {
                let mut map = serde_json::Map::with_capacity(obj.len());
                for (k, v) in obj {
                    map.insert(k.clone(), v.to_json()?);
                }
                serde_json::Value::Object(map)
            }
            Value::Function(func) => {
                return Err(Error::interpreter(format!(
                    "cannot represent {} as JSON",
                    func
                )))
            }
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        util::deep_equal(self, other)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        Value::from(v.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Function(func)
    }
}

/// Strings render bare at the top level; nested values render as JSON text.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            other => write_nested(f, other),
        }
    }
}

fn write_nested(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => f.write_str("null"),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Number(n) => f.write_str(&util::format_number(*n)),
        Value::String(s) => f.write_str(&serde_json::Value::String(s.clone()).to_string()),
        Value::Array(items) => {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write_nested(f, item)?;
            }
            f.write_str("]")
        }
        Value::Object(obj) => {
            f.write_str("{")?;
            for (i, (k, v)) in obj.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}:", serde_json::Value::String(k.clone()))?;
                write_nested(f, v)?;
            }
            f.write_str("}")
        }
        Value::Function(func) => write!(f, "{}", func),
    }
}
