//! Expression AST.
//!
//! Nodes are immutable once built and own their children, so a parsed tree can
//! be cached and evaluated against any number of contexts.

use indexmap::IndexMap;
use std::sync::Arc;

/// Literal values that appear directly in expression text.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Number(f64),
    String(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,  // +
    Minus, // -
    Not,   // !
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Or,           // ||
    And,          // &&
    Nullish,      // ??
    In,           // in
    Equal,        // ==
    NotEqual,     // !=
    Less,         // <
    Greater,      // >
    LessEqual,    // <=
    GreaterEqual, // >=
    Add,          // +
    Subtract,     // -
    Multiply,     // *
    Divide,       // /
    Modulo,       // %
    Power,        // **
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Or => "||",
            BinaryOperator::And => "&&",
            BinaryOperator::Nullish => "??",
            BinaryOperator::In => "in",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::Greater => ">",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Power => "**",
        }
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Primitive(Primitive),
    Unary {
        op: UnaryOperator,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// `condition ? then : otherwise`
    Conditional {
        condition: Box<Node>,
        then: Box<Node>,
        otherwise: Box<Node>,
    },
    List(Vec<Node>),
    Object(IndexMap<String, Node>),
    /// Bare identifier resolved against the context.
    ContextValue(String),
    /// `target.name` (strict) or `target?.name` (optional).
    Property {
        target: Box<Node>,
        name: String,
        optional: bool,
    },
    /// `target[left]` or `target[left:right]`.
    ValueAccess {
        target: Box<Node>,
        interval: bool,
        left: Option<Box<Node>>,
        right: Option<Box<Node>>,
    },
    FunctionCall {
        callee: Box<Node>,
        args: Vec<Node>,
    },
    /// The body is reference counted so closures can hold it without copying
    /// the subtree.
    Lambda {
        params: Vec<String>,
        body: Arc<Node>,
    },
}

impl Node {
    pub fn number(n: f64) -> Node {
        Node::Primitive(Primitive::Number(n))
    }

    pub fn string(s: impl Into<String>) -> Node {
        Node::Primitive(Primitive::String(s.into()))
    }

    pub fn context_value(name: impl Into<String>) -> Node {
        Node::ContextValue(name.into())
    }

    pub fn binary(op: BinaryOperator, left: Node, right: Node) -> Node {
        Node::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn property(target: Node, name: impl Into<String>, optional: bool) -> Node {
        Node::Property {
            target: Box::new(target),
            name: name.into(),
            optional,
        }
    }
}
