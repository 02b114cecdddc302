//! Expression language for JSON-e style templates.
//!
//! # Overview
//!
//! Expression text such as `data?.user?.name ?? 'anonymous'` is tokenized,
//! parsed into an immutable [`Node`] tree and evaluated against a
//! [`Context`]. The default context carries the builtin library (`min`,
//! `map`, `fromNow`, ...); user values shadow builtins of the same name.
//!
//! # Example
//!
//! ```
//! use json_e_expression::{evaluate, Context, Expression, Value};
//! use serde_json::json;
//!
//! let ctx = Context::from_json(json!({"items": [3, 1, 2]})).unwrap();
//! let result = evaluate("sortBy(items, x => -x)[0]", &ctx).unwrap();
//! assert_eq!(result, Value::from(3i64));
//!
//! let expr = Expression::compile("len(items) > 2 ? 'many' : 'few'").unwrap();
//! assert_eq!(expr.evaluate(&ctx).unwrap().to_json().unwrap(), json!("many"));
//! ```

pub mod ast;
pub mod builtins;
pub mod context;
pub mod error;
pub mod expression;
pub mod interpreter;
pub mod parser;
pub mod token;
pub mod util;
pub mod value;

pub use ast::{BinaryOperator, Node, Primitive, UnaryOperator};
pub use builtins::{BuiltinDefinition, Signature, TypeTag};
pub use context::{Context, ContextBuilder};
pub use error::{Error, SyntaxError};
pub use expression::{evaluate, Expression};
pub use interpreter::Interpreter;
pub use parser::{parse, parse_str, Parser};
pub use token::{tokenize, Token, TokenKind};
pub use value::{Function, Object, Value};
