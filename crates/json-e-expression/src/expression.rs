//! Compiled expressions.
//!
//! Parsing happens once in [`Expression::compile`]; the resulting tree is
//! immutable and can be evaluated against any number of contexts, from any
//! number of threads.

use crate::ast::Node;
use crate::context::Context;
use crate::error::Error;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::token::tokenize;
use crate::value::Value;
use std::sync::Arc;

/// A parsed expression ready for evaluation.
#[derive(Debug, Clone)]
pub struct Expression {
    source: Arc<str>,
    ast: Arc<Node>,
}

impl Expression {
    pub fn compile(source: &str) -> Result<Expression, Error> {
        tracing::debug!(source, "compiling expression");
        let tokens = tokenize(source)?;
        let ast = Parser::new(&tokens).parse_expression()?;
        Ok(Expression {
            source: Arc::from(source),
            ast: Arc::new(ast),
        })
    }

    /// Wraps an already parsed tree, e.g. one built from an external token
    /// stream.
    pub fn from_ast(source: &str, ast: Node) -> Expression {
        Expression {
            source: Arc::from(source),
            ast: Arc::new(ast),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Node {
        &self.ast
    }

    pub fn evaluate(&self, context: &Context) -> Result<Value, Error> {
        tracing::debug!(source = %self.source, "evaluating expression");
        Interpreter::new(context.clone()).interpret(&self.ast)
    }
}

/// Compiles and evaluates `source` in one step.
pub fn evaluate(source: &str, context: &Context) -> Result<Value, Error> {
    Expression::compile(source)?.evaluate(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextBuilder;

    #[test]
    fn test_compile_once_evaluate_many() {
        let expr = Expression::compile("x * 2").unwrap();
        for n in 0..3i64 {
            let ctx = ContextBuilder::new().value("x", n).build();
            assert_eq!(expr.evaluate(&ctx).unwrap(), Value::from(n * 2));
        }
    }

    #[test]
    fn test_compile_reports_syntax_errors() {
        assert!(matches!(Expression::compile("1 +"), Err(Error::Syntax(_))));
        assert!(matches!(Expression::compile("'open"), Err(Error::Syntax(_))));
    }

    #[test]
    fn test_expression_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Expression>();
        assert_send_sync::<Context>();
    }
}
