use crate::token::{Token, TokenKind};
use std::fmt;
use thiserror::Error;

/// Errors raised while parsing or evaluating an expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("SyntaxError: {0}")]
    Syntax(SyntaxError),

    #[error("InterpreterError: {0}")]
    Interpreter(String),

    #[error("BuiltinError: {0}")]
    Builtin(String),
}

impl Error {
    pub(crate) fn interpreter(message: impl Into<String>) -> Self {
        Error::Interpreter(message.into())
    }

    pub(crate) fn builtin(message: impl Into<String>) -> Self {
        Error::Builtin(message.into())
    }

    /// `"<operator> expects <expectation>"`
    pub(crate) fn expectation(operator: &str, expectation: &str) -> Self {
        Error::Interpreter(format!("{} expects {}", operator, expectation))
    }
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Self {
        Error::Syntax(err)
    }
}

/// Malformed expression text.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub message: String,
    /// The offending token, `None` when the input ran out.
    pub token: Option<Token>,
    /// Byte offset into the source.
    pub position: Option<usize>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, token: Option<Token>) -> Self {
        let position = token.as_ref().map(|t| t.start);
        SyntaxError {
            message: message.into(),
            token,
            position,
        }
    }

    pub(crate) fn at(message: impl Into<String>, position: usize) -> Self {
        SyntaxError {
            message: message.into(),
            token: None,
            position: Some(position),
        }
    }

    pub(crate) fn unexpected_end() -> Self {
        SyntaxError::new("Unexpected end of input", None)
    }

    /// `Found: <value> token, expected one of: <kinds>` with the kinds sorted.
    pub(crate) fn unexpected(token: &Token, expected: &[TokenKind]) -> Self {
        let mut names: Vec<&str> = expected.iter().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        SyntaxError::new(
            format!(
                "Found: {} token, expected one of: {}",
                token.value,
                names.join(", ")
            ),
            Some(token.clone()),
        )
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "{} (at offset {})", self.message, pos),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for SyntaxError {}
