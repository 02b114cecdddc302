//! Recursive-descent expression parser.
//!
//! Binary operators are parsed by precedence climbing over [`LEVELS`]; above
//! them sits a postfix chain (`.name`, `?.name`, `[..]`, `(..)`) over a
//! primary unit.

use crate::ast::{BinaryOperator, Node, Primitive, UnaryOperator};
use crate::error::SyntaxError;
use crate::token::{tokenize, Token, TokenKind};
use indexmap::IndexMap;
use std::sync::Arc;

/// Binary precedence levels, lowest first. The empty level is the ternary.
const LEVELS: &[&[(TokenKind, BinaryOperator)]] = &[
    &[(TokenKind::Or, BinaryOperator::Or)],
    &[(TokenKind::And, BinaryOperator::And)],
    &[(TokenKind::Nullish, BinaryOperator::Nullish)],
    &[],
    &[(TokenKind::In, BinaryOperator::In)],
    &[
        (TokenKind::Eq, BinaryOperator::Equal),
        (TokenKind::NotEq, BinaryOperator::NotEqual),
    ],
    &[
        (TokenKind::Less, BinaryOperator::Less),
        (TokenKind::Greater, BinaryOperator::Greater),
        (TokenKind::LessEq, BinaryOperator::LessEqual),
        (TokenKind::GreaterEq, BinaryOperator::GreaterEqual),
    ],
    &[
        (TokenKind::Plus, BinaryOperator::Add),
        (TokenKind::Minus, BinaryOperator::Subtract),
    ],
    &[
        (TokenKind::Star, BinaryOperator::Multiply),
        (TokenKind::Slash, BinaryOperator::Divide),
        (TokenKind::Percent, BinaryOperator::Modulo),
    ],
    &[(TokenKind::StarStar, BinaryOperator::Power)],
];

const TERNARY_LEVEL: usize = 3;
const EXPONENT_LEVEL: usize = LEVELS.len() - 1;

/// Tokens that may start a primary unit.
const UNIT_START: &[TokenKind] = &[
    TokenKind::Bang,
    TokenKind::LParen,
    TokenKind::Plus,
    TokenKind::Minus,
    TokenKind::LBracket,
    TokenKind::False,
    TokenKind::Identifier,
    TokenKind::Null,
    TokenKind::Number,
    TokenKind::String,
    TokenKind::True,
    TokenKind::LBrace,
];

/// Parses a complete token stream into a single expression.
pub fn parse(tokens: &[Token]) -> Result<Node, SyntaxError> {
    Parser::new(tokens).parse_expression()
}

/// Scans and parses expression text.
pub fn parse_str(source: &str) -> Result<Node, SyntaxError> {
    let tokens = tokenize(source)?;
    parse(&tokens)
}

/// Expression parser over a resettable token cursor.
pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Parser { tokens, pos: 0 }
    }

    /// Parses one expression and requires the stream to be exhausted.
    pub fn parse_expression(&mut self) -> Result<Node, SyntaxError> {
        let node = self.parse_level(0)?;
        if let Some(token) = self.current() {
            return Err(SyntaxError::new(
                format!("Found: {} token, expected end of input", token.value),
                Some(token.clone()),
            ));
        }
        Ok(node)
    }

    fn current(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn at(&self, kind: TokenKind) -> bool {
        matches!(self.current(), Some(t) if t.kind == kind)
    }

    /// Consumes the current token if it is of `kind`.
    fn eat(&mut self, kind: TokenKind) -> Option<&'t Token> {
        let token = self.current().filter(|t| t.kind == kind)?;
        self.pos += 1;
        Some(token)
    }

    /// Consumes the current token, which must be one of `kinds`.
    fn take(&mut self, kinds: &[TokenKind]) -> Result<&'t Token, SyntaxError> {
        let token = self.current().ok_or_else(SyntaxError::unexpected_end)?;
        if !kinds.contains(&token.kind) {
            return Err(SyntaxError::unexpected(token, kinds));
        }
        self.pos += 1;
        Ok(token)
    }

    fn parse_level(&mut self, level: usize) -> Result<Node, SyntaxError> {
        if level == EXPONENT_LEVEL {
            let base = self.parse_postfix()?;
            if self.eat(TokenKind::StarStar).is_some() {
                // right-associative: a ** b ** c == a ** (b ** c)
                let exponent = self.parse_level(level)?;
                return Ok(Node::binary(BinaryOperator::Power, base, exponent));
            }
            return Ok(base);
        }

        if level == TERNARY_LEVEL {
            return self.parse_ternary();
        }

        let mut node = self.parse_level(level + 1)?;
        while let Some(token) = self.current() {
            let Some((_, op)) = LEVELS[level].iter().find(|(kind, _)| *kind == token.kind) else {
                break;
            };
            self.pos += 1;
            let right = self.parse_level(level + 1)?;
            node = Node::binary(*op, node, right);
        }
        Ok(node)
    }

    fn parse_ternary(&mut self) -> Result<Node, SyntaxError> {
        let condition = self.parse_level(TERNARY_LEVEL + 1)?;
        if self.eat(TokenKind::Question).is_none() {
            return Ok(condition);
        }
        let then = self.parse_level(TERNARY_LEVEL + 1)?;
        if self.eat(TokenKind::Colon).is_none() {
            return Err(SyntaxError::new(
                "Expected ':' in ternary operator",
                self.current().cloned(),
            ));
        }
        let otherwise = self.parse_level(TERNARY_LEVEL + 1)?;
        Ok(Node::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_postfix(&mut self) -> Result<Node, SyntaxError> {
        let mut node = self.parse_unit()?;
        while let Some(token) = self.current() {
            node = match token.kind {
                TokenKind::LBracket => self.parse_value_access(node)?,
                TokenKind::LParen => self.parse_function_call(node)?,
                TokenKind::Dot | TokenKind::OptionalDot => {
                    self.pos += 1;
                    let name = self.take(&[TokenKind::Identifier])?;
                    Node::property(node, name.value.clone(), token.kind == TokenKind::OptionalDot)
                }
                _ => break,
            };
        }
        Ok(node)
    }

    fn parse_unit(&mut self) -> Result<Node, SyntaxError> {
        let token = self.current().ok_or_else(SyntaxError::unexpected_end)?;
        match token.kind {
            TokenKind::Plus | TokenKind::Minus | TokenKind::Bang => {
                self.pos += 1;
                let op = match token.kind {
                    TokenKind::Plus => UnaryOperator::Plus,
                    TokenKind::Minus => UnaryOperator::Minus,
                    _ => UnaryOperator::Not,
                };
                let operand = self.parse_unit()?;
                Ok(Node::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Number => {
                self.pos += 1;
                let n = token.value.parse::<f64>().map_err(|_| {
                    SyntaxError::new(format!("Invalid number: {}", token.value), Some(token.clone()))
                })?;
                Ok(Node::number(n))
            }
            TokenKind::String => {
                self.pos += 1;
                Ok(Node::string(strip_quotes(&token.value)))
            }
            TokenKind::True | TokenKind::False => {
                self.pos += 1;
                Ok(Node::Primitive(Primitive::Bool(token.kind == TokenKind::True)))
            }
            TokenKind::Null => {
                self.pos += 1;
                Ok(Node::Primitive(Primitive::Null))
            }
            TokenKind::Identifier => {
                self.pos += 1;
                if self.eat(TokenKind::Arrow).is_some() {
                    return self.finish_lambda(vec![token.value.clone()]);
                }
                Ok(Node::context_value(token.value.clone()))
            }
            TokenKind::LParen => {
                let saved = self.pos;
                if let Some(params) = self.scan_lambda_params() {
                    if self.eat(TokenKind::Arrow).is_some() {
                        return self.finish_lambda(params);
                    }
                }
                self.pos = saved;
                self.pos += 1;
                let node = self.parse_level(0)?;
                self.take(&[TokenKind::RParen])?;
                Ok(node)
            }
            TokenKind::LBracket => self.parse_list(),
            TokenKind::LBrace => self.parse_object(),
            _ => Err(SyntaxError::unexpected(token, UNIT_START)),
        }
    }

    /// Speculatively reads `( ident (, ident)* )`. The caller restores the
    /// cursor when this returns `None` or no `=>` follows.
    fn scan_lambda_params(&mut self) -> Option<Vec<String>> {
        self.eat(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                params.push(self.eat(TokenKind::Identifier)?.value.clone());
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.eat(TokenKind::RParen)?;
        Some(params)
    }

    fn finish_lambda(&mut self, params: Vec<String>) -> Result<Node, SyntaxError> {
        let body = self.parse_level(0)?;
        Ok(Node::Lambda {
            params,
            body: Arc::new(body),
        })
    }

    fn parse_function_call(&mut self, callee: Node) -> Result<Node, SyntaxError> {
        self.take(&[TokenKind::LParen])?;
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            args.push(self.parse_level(0)?);
            while self.eat(TokenKind::Comma).is_some() {
                args.push(self.parse_level(0)?);
            }
        }
        self.take(&[TokenKind::RParen])?;
        Ok(Node::FunctionCall {
            callee: Box::new(callee),
            args,
        })
    }

    fn parse_list(&mut self) -> Result<Node, SyntaxError> {
        self.take(&[TokenKind::LBracket])?;
        let mut items = Vec::new();
        if !self.at(TokenKind::RBracket) {
            items.push(self.parse_level(0)?);
            while self.eat(TokenKind::Comma).is_some() {
                items.push(self.parse_level(0)?);
            }
        }
        self.take(&[TokenKind::RBracket])?;
        Ok(Node::List(items))
    }

    fn parse_value_access(&mut self, target: Node) -> Result<Node, SyntaxError> {
        self.take(&[TokenKind::LBracket])?;
        if let Some(token) = self.current().filter(|t| t.kind == TokenKind::RBracket) {
            let mut expected = UNIT_START.to_vec();
            expected.push(TokenKind::Colon);
            return Err(SyntaxError::unexpected(token, &expected));
        }

        let left = if self.at(TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.parse_level(0)?))
        };
        let interval = self.eat(TokenKind::Colon).is_some();
        let right = if interval && !self.at(TokenKind::RBracket) {
            Some(Box::new(self.parse_level(0)?))
        } else {
            None
        };
        self.take(&[TokenKind::RBracket])?;

        Ok(Node::ValueAccess {
            target: Box::new(target),
            interval,
            left,
            right,
        })
    }

    fn parse_object(&mut self) -> Result<Node, SyntaxError> {
        self.take(&[TokenKind::LBrace])?;
        let mut entries = IndexMap::new();
        if !self.at(TokenKind::RBrace) {
            loop {
                let key = self.take(&[TokenKind::Identifier, TokenKind::String])?;
                let key = match key.kind {
                    TokenKind::String => strip_quotes(&key.value).to_string(),
                    _ => key.value.clone(),
                };
                self.take(&[TokenKind::Colon])?;
                let value = self.parse_level(0)?;
                entries.insert(key, value);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.take(&[TokenKind::RBrace])?;
        Ok(Node::Object(entries))
    }
}

fn strip_quotes(raw: &str) -> &str {
    let mut chars = raw.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('\'' | '"')), Some(close)) if open == close => &raw[1..raw.len() - 1],
        _ => raw,
    }
}
