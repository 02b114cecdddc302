//! Token stream consumed by the parser, plus a small scanner that produces it.

use crate::error::SyntaxError;
use std::fmt;

/// Token kinds. The textual name doubles as the kind's spelling in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    String,
    Identifier,
    True,
    False,
    Null,
    In,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,
    Bang,

    Eq,       // ==
    NotEq,    // !=
    Less,     // <
    Greater,  // >
    LessEq,   // <=
    GreaterEq, // >=

    And,      // &&
    Or,       // ||
    Nullish,  // ??
    Question, // ?
    OptionalDot, // ?.
    Colon,
    Arrow, // =>
    Dot,
    Comma,

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Identifier => "identifier",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::In => "in",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::StarStar => "**",
            TokenKind::Bang => "!",
            TokenKind::Eq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Less => "<",
            TokenKind::Greater => ">",
            TokenKind::LessEq => "<=",
            TokenKind::GreaterEq => ">=",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Nullish => "??",
            TokenKind::Question => "?",
            TokenKind::OptionalDot => "?.",
            TokenKind::Colon => ":",
            TokenKind::Arrow => "=>",
            TokenKind::Dot => ".",
            TokenKind::Comma => ",",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scanned token: kind, literal text and byte offsets into the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, start: usize, end: usize) -> Self {
        Token {
            kind,
            value: value.into(),
            start,
            end,
        }
    }
}

// Longest spellings first so that `**` wins over `*`, `?.` over `?`, etc.
const PUNCTUATORS: &[(&str, TokenKind)] = &[
    ("**", TokenKind::StarStar),
    ("==", TokenKind::Eq),
    ("!=", TokenKind::NotEq),
    ("<=", TokenKind::LessEq),
    (">=", TokenKind::GreaterEq),
    ("&&", TokenKind::And),
    ("||", TokenKind::Or),
    ("??", TokenKind::Nullish),
    ("?.", TokenKind::OptionalDot),
    ("=>", TokenKind::Arrow),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("!", TokenKind::Bang),
    ("<", TokenKind::Less),
    (">", TokenKind::Greater),
    ("?", TokenKind::Question),
    (":", TokenKind::Colon),
    (".", TokenKind::Dot),
    (",", TokenKind::Comma),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
];

/// Scans expression text into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    Scanner { src: source, pos: 0 }.run()
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn run(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(c) = self.peek() else {
                break;
            };
            let token = if c.is_ascii_digit() {
                self.number()
            } else if is_ident_start(c) {
                self.identifier()
            } else if c == '\'' || c == '"' {
                self.string(c)?
            } else {
                self.punctuator()?
            };
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_ascii_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn take_digits(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn number(&mut self) -> Token {
        let start = self.pos;
        self.take_digits();
        let rest = self.rest().as_bytes();
        if rest.len() >= 2 && rest[0] == b'.' && rest[1].is_ascii_digit() {
            self.pos += 1;
            self.take_digits();
        }
        Token::new(TokenKind::Number, &self.src[start..self.pos], start, self.pos)
    }

    fn identifier(&mut self) -> Token {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !is_ident_continue(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        let text = &self.src[start..self.pos];
        let kind = match text {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "in" => TokenKind::In,
            _ => TokenKind::Identifier,
        };
        Token::new(kind, text, start, self.pos)
    }

    fn string(&mut self, quote: char) -> Result<Token, SyntaxError> {
        let start = self.pos;
        let body = &self.src[start + 1..];
        match body.find(quote) {
            Some(len) => {
                self.pos = start + 1 + len + 1;
                Ok(Token::new(TokenKind::String, &self.src[start..self.pos], start, self.pos))
            }
            None => Err(SyntaxError::at("Unterminated string", start)),
        }
    }

    fn punctuator(&mut self) -> Result<Token, SyntaxError> {
        let start = self.pos;
        let rest = self.rest();
        for (spelling, kind) in PUNCTUATORS {
            if rest.starts_with(spelling) {
                self.pos += spelling.len();
                return Ok(Token::new(*kind, *spelling, start, self.pos));
            }
        }
        let c = self.peek().unwrap_or('\0');
        Err(SyntaxError::at(format!("Unexpected character: {}", c), start))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}
