//! Record filter expressions.
//!
//! A filter is a boolean expression over field names, evaluated per record
//! while a DataSet is populated:
//!
//! ```rust
//! use oxide_etl_core::filter::Filter;
//!
//! let filter = Filter::parse("field1 >= 2 and field1 <= 5 and field1 <> 3").unwrap();
//! assert_eq!(filter.to_string(), "((field1 >= 2 AND field1 <= 5) AND field1 <> 3)");
//! ```
//!
//! Supported: `=`, `<>`/`!=`, `<`, `<=`, `>`, `>=`, `and`, `or`, `not`,
//! `is [not] null`, parentheses, numbers, `'quoted'` strings, `null`, `true`,
//! `false`. Comparisons involving NULL are false.

use core::fmt;
use std::cmp::Ordering;

use crate::dataset::DataSet;
use crate::error::{EtlError, Result};
use crate::record::Record;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Identifier(String),
    Integer(i64),
    Float(f64),
    String(String),
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    LeftParen,
    RightParen,
    And,
    Or,
    Not,
    Is,
    Null,
    True,
    False,
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

fn syntax_error(message: impl Into<String>, position: usize) -> EtlError {
    EtlError::FilterSyntax {
        message: message.into(),
        position,
    }
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    const fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.advance();
            }
            let start = self.pos;
            let Some(c) = self.advance() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    pos: start,
                });
                return Ok(tokens);
            };
            let kind = match c {
                '(' => TokenKind::LeftParen,
                ')' => TokenKind::RightParen,
                '=' => TokenKind::Eq,
                '!' if self.peek() == Some('=') => {
                    self.advance();
                    TokenKind::NotEq
                }
                '<' => match self.peek() {
                    Some('>') => {
                        self.advance();
                        TokenKind::NotEq
                    }
                    Some('=') => {
                        self.advance();
                        TokenKind::LtEq
                    }
                    _ => TokenKind::Lt,
                },
                '>' => {
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::GtEq
                    } else {
                        TokenKind::Gt
                    }
                }
                '\'' => self.scan_string(start)?,
                '"' => self.scan_quoted_identifier(start)?,
                c if c.is_ascii_digit() || c == '-' || c == '.' => self.scan_number(start)?,
                c if c.is_alphabetic() || c == '_' => self.scan_word(start),
                other => return Err(syntax_error(format!("unexpected character '{other}'"), start)),
            };
            tokens.push(Token { kind, pos: start });
        }
    }

    fn scan_string(&mut self, start: usize) -> Result<TokenKind> {
        let mut text = String::new();
        loop {
            match self.advance() {
                Some('\'') if self.peek() == Some('\'') => {
                    self.advance();
                    text.push('\'');
                }
                Some('\'') => return Ok(TokenKind::String(text)),
                Some(c) => text.push(c),
                None => return Err(syntax_error("unterminated string literal", start)),
            }
        }
    }

    fn scan_quoted_identifier(&mut self, start: usize) -> Result<TokenKind> {
        let content_start = self.pos;
        while self.peek().is_some_and(|c| c != '"') {
            self.advance();
        }
        if self.peek().is_none() {
            return Err(syntax_error("unterminated quoted identifier", start));
        }
        let name = self.input[content_start..self.pos].to_string();
        self.advance();
        Ok(TokenKind::Identifier(name))
    }

    fn scan_number(&mut self, start: usize) -> Result<TokenKind> {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E'))
        {
            self.advance();
        }
        let text = &self.input[start..self.pos];
        if let Ok(n) = text.parse::<i64>() {
            return Ok(TokenKind::Integer(n));
        }
        text.parse::<f64>()
            .map(TokenKind::Float)
            .map_err(|e| syntax_error(format!("invalid number '{text}': {e}"), start))
    }

    fn scan_word(&mut self, start: usize) -> TokenKind {
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            self.advance();
        }
        let word = &self.input[start..self.pos];
        match word.to_ascii_lowercase().as_str() {
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "is" => TokenKind::Is,
            "null" => TokenKind::Null,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => TokenKind::Identifier(word.to_string()),
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>` or `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
}

impl CompareOp {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
        }
    }

    fn holds(self, ord: Ordering) -> bool {
        match self {
            Self::Eq => ord == Ordering::Equal,
            Self::NotEq => ord != Ordering::Equal,
            Self::Lt => ord == Ordering::Less,
            Self::LtEq => ord != Ordering::Greater,
            Self::Gt => ord == Ordering::Greater,
            Self::GtEq => ord != Ordering::Less,
        }
    }
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Reference to a field by name.
    Field(String),
    /// Literal value.
    Literal(Value),
    /// Binary comparison.
    Compare {
        /// Operator.
        op: CompareOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Logical AND.
    And(Box<Expr>, Box<Expr>),
    /// Logical OR.
    Or(Box<Expr>, Box<Expr>),
    /// Logical NOT.
    Not(Box<Expr>),
    /// `IS NULL` / `IS NOT NULL`.
    IsNull {
        /// Tested operand.
        expr: Box<Expr>,
        /// `true` for `IS NOT NULL`.
        negated: bool,
    },
}

const NOT_BP: u8 = 5;
const IS_BP: u8 = 9;

const fn infix_binding_power(kind: &TokenKind) -> Option<(u8, u8)> {
    match kind {
        TokenKind::Or => Some((1, 2)),
        TokenKind::And => Some((3, 4)),
        TokenKind::Eq
        | TokenKind::NotEq
        | TokenKind::Lt
        | TokenKind::LtEq
        | TokenKind::Gt
        | TokenKind::GtEq => Some((7, 8)),
        _ => None,
    }
}

const fn token_to_compare_op(kind: &TokenKind) -> Option<CompareOp> {
    match kind {
        TokenKind::Eq => Some(CompareOp::Eq),
        TokenKind::NotEq => Some(CompareOp::NotEq),
        TokenKind::Lt => Some(CompareOp::Lt),
        TokenKind::LtEq => Some(CompareOp::LtEq),
        TokenKind::Gt => Some(CompareOp::Gt),
        TokenKind::GtEq => Some(CompareOp::GtEq),
        _ => None,
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<()> {
        let token = self.next();
        if &token.kind == kind {
            Ok(())
        } else {
            Err(syntax_error(
                format!("expected {what}, found {:?}", token.kind),
                token.pos,
            ))
        }
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr> {
        let token = self.next();
        let mut lhs = match token.kind {
            TokenKind::Not => Expr::Not(Box::new(self.parse_expr(NOT_BP)?)),
            TokenKind::LeftParen => {
                let inner = self.parse_expr(0)?;
                self.expect(&TokenKind::RightParen, "')'")?;
                inner
            }
            TokenKind::Identifier(name) => Expr::Field(name),
            TokenKind::Integer(n) => Expr::Literal(Value::Int(n)),
            TokenKind::Float(f) => Expr::Literal(Value::Float(f)),
            TokenKind::String(s) => Expr::Literal(Value::Text(s)),
            TokenKind::Null => Expr::Literal(Value::Null),
            TokenKind::True => Expr::Literal(Value::Bool(true)),
            TokenKind::False => Expr::Literal(Value::Bool(false)),
            other => {
                return Err(syntax_error(
                    format!("expected an operand, found {other:?}"),
                    token.pos,
                ))
            }
        };

        loop {
            let kind = self.peek().kind.clone();
            if kind == TokenKind::Is {
                if IS_BP < min_bp {
                    break;
                }
                self.next();
                let negated = if self.peek().kind == TokenKind::Not {
                    self.next();
                    true
                } else {
                    false
                };
                self.expect(&TokenKind::Null, "NULL")?;
                lhs = Expr::IsNull {
                    expr: Box::new(lhs),
                    negated,
                };
                continue;
            }

            let Some((left_bp, right_bp)) = infix_binding_power(&kind) else {
                break;
            };
            if left_bp < min_bp {
                break;
            }
            self.next();
            let rhs = self.parse_expr(right_bp)?;
            lhs = match kind {
                TokenKind::And => Expr::And(Box::new(lhs), Box::new(rhs)),
                TokenKind::Or => Expr::Or(Box::new(lhs), Box::new(rhs)),
                other => {
                    let op = token_to_compare_op(&other).ok_or_else(|| {
                        syntax_error(format!("unsupported operator {other:?}"), self.peek().pos)
                    })?;
                    Expr::Compare {
                        op,
                        left: Box::new(lhs),
                        right: Box::new(rhs),
                    }
                }
            };
        }
        Ok(lhs)
    }
}

impl Expr {
    fn operand<'a>(&'a self, dataset: &DataSet, record: &'a Record) -> Option<&'a Value> {
        match self {
            Self::Field(name) => dataset
                .field_index(name)
                .and_then(|col| record.value(col)),
            Self::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Evaluates the expression as a predicate over `record`.
    ///
    /// Unknown field names evaluate to NULL.
    #[must_use]
    pub fn eval(&self, dataset: &DataSet, record: &Record) -> bool {
        match self {
            Self::And(a, b) => a.eval(dataset, record) && b.eval(dataset, record),
            Self::Or(a, b) => a.eval(dataset, record) || b.eval(dataset, record),
            Self::Not(inner) => !inner.eval(dataset, record),
            Self::IsNull { expr, negated } => {
                let is_null = expr.operand(dataset, record).map_or(true, Value::is_null);
                is_null != *negated
            }
            Self::Compare { op, left, right } => {
                let (Some(l), Some(r)) = (
                    left.operand(dataset, record),
                    right.operand(dataset, record),
                ) else {
                    return false;
                };
                if l.is_null() || r.is_null() {
                    return false;
                }
                op.holds(l.compare(r))
            }
            Self::Literal(Value::Bool(b)) => *b,
            Self::Field(_) | Self::Literal(_) => {
                matches!(self.operand(dataset, record), Some(Value::Bool(true)))
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Literal(Value::Null) => f.write_str("NULL"),
            Self::Literal(Value::Text(s)) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Literal(v) => write!(f, "{v}"),
            Self::Compare { op, left, right } => write!(f, "{left} {} {right}", op.as_str()),
            Self::And(a, b) => write!(f, "({a} AND {b})"),
            Self::Or(a, b) => write!(f, "({a} OR {b})"),
            Self::Not(inner) => write!(f, "NOT {inner}"),
            Self::IsNull { expr, negated } => {
                if *negated {
                    write!(f, "{expr} IS NOT NULL")
                } else {
                    write!(f, "{expr} IS NULL")
                }
            }
        }
    }
}

/// A parsed, reusable filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    expr: Expr,
}

impl Filter {
    /// Parses a filter expression.
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = Lexer::new(text).tokenize()?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_expr(0)?;
        let trailing = parser.peek();
        if trailing.kind != TokenKind::Eof {
            return Err(syntax_error(
                format!("unexpected {:?} after expression", trailing.kind),
                trailing.pos,
            ));
        }
        Ok(Self { expr })
    }

    /// The parsed expression tree.
    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Whether `record` (shaped like `dataset`) passes the filter.
    #[must_use]
    pub fn matches(&self, dataset: &DataSet, record: &Record) -> bool {
        self.expr.eval(dataset, record)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.expr.fmt(f)
    }
}
