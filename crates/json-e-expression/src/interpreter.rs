//! Tree-walking evaluator.

use crate::ast::{BinaryOperator, Node, Primitive, UnaryOperator};
use crate::context::Context;
use crate::error::Error;
use crate::util::{deep_equal, is_integer, is_truthy, resolve_index, slice_bounds};
use crate::value::{Function, Object, Value};
use std::borrow::Cow;

/// Result of visiting a node. Context values and their members are borrowed
/// until an owner needs them. `Shorted` marks an optional chain that stopped
/// at a missing link; it keeps propagating through further accesses and calls
/// and never leaves the interpreter.
#[derive(Debug)]
enum Evaluated<'a> {
    Value(Cow<'a, Value>),
    Shorted,
}

impl<'a> Evaluated<'a> {
    fn into_cow(self) -> Cow<'a, Value> {
        match self {
            Evaluated::Value(value) => value,
            Evaluated::Shorted => Cow::Owned(Value::Null),
        }
    }
}

impl From<Value> for Evaluated<'_> {
    fn from(value: Value) -> Self {
        Evaluated::Value(Cow::Owned(value))
    }
}

/// Evaluates nodes against one context.
pub struct Interpreter {
    context: Context,
}

impl Interpreter {
    pub fn new(context: Context) -> Self {
        Interpreter { context }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Evaluates `node`; a chain that short-circuited comes back as null.
    pub fn interpret(&self, node: &Node) -> Result<Value, Error> {
        self.value(node)
    }

    fn value(&self, node: &Node) -> Result<Value, Error> {
        Ok(self.operand(node)?.into_owned())
    }

    fn operand(&self, node: &Node) -> Result<Cow<'_, Value>, Error> {
        Ok(self.visit(node)?.into_cow())
    }

    fn visit(&self, node: &Node) -> Result<Evaluated<'_>, Error> {
        match node {
            Node::Primitive(primitive) => Ok(primitive_value(primitive).into()),
            Node::Unary { op, operand } => {
                let operand = self.operand(operand)?;
                unary(*op, &operand).map(Evaluated::from)
            }
            Node::Binary { op, left, right } => self.binary(*op, left, right).map(Evaluated::from),
            Node::Conditional {
                condition,
                then,
                otherwise,
            } => {
                let branch = if is_truthy(&*self.operand(condition)?) {
                    then
                } else {
                    otherwise
                };
                Ok(Evaluated::Value(self.operand(branch)?))
            }
            Node::List(items) => {
                let items = items
                    .iter()
                    .map(|item| self.value(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(items).into())
            }
            Node::Object(entries) => {
                let mut object = Object::with_capacity(entries.len());
                for (key, node) in entries {
                    object.insert(key.clone(), self.value(node)?);
                }
                Ok(Value::Object(object).into())
            }
            Node::ContextValue(name) => Ok(match self.context.get(name) {
                Some(value) => Evaluated::Value(Cow::Borrowed(value)),
                None => Value::Null.into(),
            }),
            Node::Property {
                target,
                name,
                optional,
            } => self.property(target, name, *optional),
            Node::ValueAccess {
                target,
                interval,
                left,
                right,
            } => self.value_access(target, *interval, left.as_deref(), right.as_deref()),
            Node::FunctionCall { callee, args } => self.call(callee, args),
            Node::Lambda { params, body } => Ok(Value::Function(Function::lambda(
                params.clone(),
                body.clone(),
                self.context.clone(),
            ))
            .into()),
        }
    }

    fn binary(&self, op: BinaryOperator, left: &Node, right: &Node) -> Result<Value, Error> {
        let left = self.visit(left)?;
        match op {
            BinaryOperator::Or => {
                let left = left.into_cow();
                return if is_truthy(&left) { Ok(left.into_owned()) } else { self.value(right) };
            }
            BinaryOperator::And => {
                let left = left.into_cow();
                return if is_truthy(&left) { self.value(right) } else { Ok(left.into_owned()) };
            }
            BinaryOperator::Nullish => {
                return match left {
                    Evaluated::Value(value) if !value.is_null() => Ok(value.into_owned()),
                    _ => self.value(right),
                };
            }
            _ => {}
        }
        let left = left.into_cow();
        let right = self.operand(right)?;
        if left.is_null() || right.is_null() {
            return Ok(Value::Null);
        }
        match op {
            BinaryOperator::Equal => Ok(Value::Bool(deep_equal(&left, &right))),
            BinaryOperator::NotEqual => Ok(Value::Bool(!deep_equal(&left, &right))),
            BinaryOperator::Less
            | BinaryOperator::Greater
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterEqual => compare(op, &left, &right),
            BinaryOperator::In => contains(&left, &right),
            BinaryOperator::Add => match (left.as_ref(), right.as_ref()) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => {
                    Ok(Value::String([a.as_str(), b.as_str()].concat()))
                }
                _ => Err(Error::expectation(
                    "infix: +",
                    "numbers/strings + numbers/strings",
                )),
            },
            _ => arithmetic(op, &left, &right),
        }
    }

    fn property(&self, target: &Node, name: &str, optional: bool) -> Result<Evaluated<'_>, Error> {
        let found = match self.visit(target)? {
            Evaluated::Shorted => return Ok(Evaluated::Shorted),
            Evaluated::Value(Cow::Borrowed(value)) => {
                member(value, name, optional)?.map(Cow::Borrowed)
            }
            Evaluated::Value(Cow::Owned(value)) => {
                member(&value, name, optional)?.cloned().map(Cow::Owned)
            }
        };
        Ok(found.map_or(Evaluated::Shorted, Evaluated::Value))
    }

    fn value_access(
        &self,
        target: &Node,
        interval: bool,
        left: Option<&Node>,
        right: Option<&Node>,
    ) -> Result<Evaluated<'_>, Error> {
        let target = match self.visit(target)? {
            Evaluated::Shorted => return Ok(Evaluated::Shorted),
            Evaluated::Value(value) if value.is_null() => return Ok(Value::Null.into()),
            Evaluated::Value(value) => value,
        };
        let left = match left {
            Some(node) => self.operand(node)?,
            None => Cow::Owned(Value::Number(0.0)),
        };
        let right = match right {
            Some(node) => Some(self.operand(node)?),
            None => None,
        };
        let right = right.as_deref();

        let result = match target {
            Cow::Borrowed(value) => index_into(value, interval, &left, right)?,
            Cow::Owned(value) => {
                Cow::Owned(index_into(&value, interval, &left, right)?.into_owned())
            }
        };
        Ok(Evaluated::Value(result))
    }

    fn call(&self, callee: &Node, args: &[Node]) -> Result<Evaluated<'_>, Error> {
        let callee = match self.visit(callee)? {
            Evaluated::Shorted => return Ok(Evaluated::Shorted),
            Evaluated::Value(value) => value,
        };
        match callee.as_ref() {
            Value::Function(function) => {
                let args = args
                    .iter()
                    .map(|arg| self.value(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                function.call(&self.context, args).map(Evaluated::from)
            }
            other => Err(Error::interpreter(format!("{} is not callable", other))),
        }
    }
}

/// Looks up `name` on a mapping; `Ok(None)` means the optional chain stops.
fn member<'v>(target: &'v Value, name: &str, optional: bool) -> Result<Option<&'v Value>, Error> {
    match target {
        Value::Null if optional => Ok(None),
        Value::Null => Err(Error::interpreter(format!(
            "cannot access property \"{}\" of null",
            name
        ))),
        Value::Object(object) => match object.get(name) {
            Some(value) => Ok(Some(value)),
            None if optional => Ok(None),
            None => Err(Error::interpreter(format!(
                "object has no property \"{}\"",
                name
            ))),
        },
        _ if optional => Err(Error::expectation("infix: ?.", "objects")),
        _ => Err(Error::expectation("infix: .", "objects")),
    }
}

/// Bracket access on a non-null target. Array elements and object members
/// are borrowed; slices and characters are built fresh.
fn index_into<'v>(
    target: &'v Value,
    interval: bool,
    left: &Value,
    right: Option<&Value>,
) -> Result<Cow<'v, Value>, Error> {
    match target {
        Value::Array(items) => {
            if interval {
                let (start, end) = interval_bounds(left, right, items.len())?;
                Ok(Cow::Owned(Value::Array(items[start..end].to_vec())))
            } else {
                let index = element_index(left, items.len())?;
                Ok(Cow::Borrowed(&items[index]))
            }
        }
        Value::String(text) => {
            let chars: Vec<char> = text.chars().collect();
            if interval {
                let (start, end) = interval_bounds(left, right, chars.len())?;
                Ok(Cow::Owned(Value::String(chars[start..end].iter().collect())))
            } else {
                let index = element_index(left, chars.len())?;
                Ok(Cow::Owned(Value::String(chars[index].to_string())))
            }
        }
        Value::Object(object) => match left {
            Value::String(key) => Ok(object
                .get(key)
                .map_or(Cow::Owned(Value::Null), Cow::Borrowed)),
            _ => Err(Error::interpreter("object keys must be strings")),
        },
        _ => Err(Error::expectation(
            "infix: \"[..]\"",
            "object, array, or string",
        )),
    }
}

fn primitive_value(primitive: &Primitive) -> Value {
    match primitive {
        Primitive::Number(n) => Value::Number(*n),
        Primitive::String(s) => Value::String(s.clone()),
        Primitive::Bool(b) => Value::Bool(*b),
        Primitive::Null => Value::Null,
    }
}

fn unary(op: UnaryOperator, operand: &Value) -> Result<Value, Error> {
    match (op, operand) {
        (UnaryOperator::Not, operand) => Ok(Value::Bool(!is_truthy(operand))),
        (UnaryOperator::Plus, Value::Number(n)) => Ok(Value::Number(*n)),
        (UnaryOperator::Minus, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnaryOperator::Plus, _) => Err(Error::expectation("unary +", "number")),
        (UnaryOperator::Minus, _) => Err(Error::expectation("unary -", "number")),
    }
}

fn arithmetic(op: BinaryOperator, left: &Value, right: &Value) -> Result<Value, Error> {
    let (a, b) = match (left, right) {
        (Value::Number(a), Value::Number(b)) => (*a, *b),
        _ => {
            let symbol = op.as_str();
            return Err(Error::expectation(
                &format!("infix: {}", symbol),
                &format!("number {} number", symbol),
            ));
        }
    };
    let result = match op {
        BinaryOperator::Subtract => a - b,
        BinaryOperator::Multiply => a * b,
        BinaryOperator::Divide => {
            if b == 0.0 {
                return Err(Error::interpreter("division by zero"));
            }
            a / b
        }
        BinaryOperator::Modulo => {
            if b == 0.0 {
                return Err(Error::interpreter("division by zero in modulo operation"));
            }
            a % b
        }
        _ => a.powf(b),
    };
    Ok(Value::Number(result))
}

fn compare(op: BinaryOperator, left: &Value, right: &Value) -> Result<Value, Error> {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => {
            let symbol = op.as_str();
            return Err(Error::expectation(
                &format!("infix: {}", symbol),
                &format!("numbers/strings {} numbers/strings", symbol),
            ));
        }
    };
    // NaN compares false both ways.
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(false));
    };
    let result = match op {
        BinaryOperator::Less => ordering.is_lt(),
        BinaryOperator::Greater => ordering.is_gt(),
        BinaryOperator::LessEqual => ordering.is_le(),
        _ => ordering.is_ge(),
    };
    Ok(Value::Bool(result))
}

fn contains(needle: &Value, haystack: &Value) -> Result<Value, Error> {
    match haystack {
        Value::Object(object) => match needle {
            Value::String(key) => Ok(Value::Bool(object.contains_key(key))),
            _ => Err(Error::expectation("Infix: in-object", "string on left side")),
        },
        Value::String(text) => match needle {
            Value::String(part) => Ok(Value::Bool(text.contains(part.as_str()))),
            _ => Err(Error::expectation("Infix: in-string", "string on left side")),
        },
        Value::Array(items) => Ok(Value::Bool(items.iter().any(|item| deep_equal(needle, item)))),
        _ => Err(Error::expectation(
            "Infix: in",
            "Array, string, or object on right side",
        )),
    }
}

/// Index for the non-interval form: negatives count from the end (clamped to
/// the start), anything at or past `len` is out of bounds.
fn element_index(index: &Value, len: usize) -> Result<usize, Error> {
    let index = match index {
        Value::Number(n) if is_integer(*n) => *n as i64,
        _ => {
            return Err(Error::interpreter(
                "should only use integers to access arrays or strings",
            ))
        }
    };
    let index = resolve_index(index, len);
    if index >= len {
        return Err(Error::interpreter("index out of bounds"));
    }
    Ok(index)
}

fn interval_bounds(left: &Value, right: Option<&Value>, len: usize) -> Result<(usize, usize), Error> {
    let bound = |value: &Value| match value {
        Value::Number(n) if is_integer(*n) => Ok(*n as i64),
        _ => Err(Error::interpreter(
            "cannot perform interval access with non-integers",
        )),
    };
    let start = bound(left)?;
    let end = right.map(bound).transpose()?;
    Ok(slice_bounds(start, end, len))
}
