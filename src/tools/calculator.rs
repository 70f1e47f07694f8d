//! Calculator tool - local arithmetic evaluator
//!
//! Supports `+ - * / % ^` (`**` is accepted for `^`), parentheses, unary
//! signs and decimals. Precedence from low to high: additive, multiplicative,
//! unary, power (right associative).

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use super::traits::Tool;
use crate::error::Result;

pub const NAME: &str = "Calculator";
pub const DESCRIPTION: &str = "Useful for when you need to answer questions about math.";

/// Deepest nesting of parentheses, signs and exponents
pub const MAX_DEPTH: usize = 64;

/// Longest expression accepted, in characters
pub const MAX_INPUT_LEN: usize = 1024;

/// Why an expression could not be evaluated
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("missing closing parenthesis")]
    UnclosedParen,
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NotFinite,
    #[error("no arithmetic expression found")]
    Empty,
    #[error("expression is nested more than {} levels deep", MAX_DEPTH)]
    TooDeep,
    #[error("expression is longer than {} characters", MAX_INPUT_LEN)]
    TooLong,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, CalcError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | ',' => {}
            '0'..='9' | '.' => {
                let start = i;
                while i + 1 < chars.len() && (chars[i + 1].is_ascii_digit() || chars[i + 1] == '.') {
                    i += 1;
                }
                let text: String = chars[start..=i].iter().collect();
                let value = text.parse().map_err(|_| CalcError::InvalidNumber(text))?;
                tokens.push(Token::Num(value));
            }
            '+' => tokens.push(Token::Plus),
            '-' | '−' => tokens.push(Token::Minus),
            '*' if chars.get(i + 1) == Some(&'*') => {
                i += 1;
                tokens.push(Token::Caret);
            }
            '*' | '×' => tokens.push(Token::Star),
            '/' | '÷' => tokens.push(Token::Slash),
            '%' => tokens.push(Token::Percent),
            '^' => tokens.push(Token::Caret),
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            other => return Err(CalcError::UnexpectedChar(other)),
        }
        i += 1;
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn descend(&mut self) -> std::result::Result<(), CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        Ok(())
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> std::result::Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> std::result::Result<f64, CalcError> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::Percent)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match op {
                Token::Star => value * rhs,
                _ if rhs == 0.0 => return Err(CalcError::DivisionByZero),
                Token::Slash => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> std::result::Result<f64, CalcError> {
        match self.peek() {
            Some(op @ (Token::Minus | Token::Plus)) => {
                self.pos += 1;
                self.descend()?;
                let value = self.unary()?;
                self.depth -= 1;
                Ok(if op == Token::Minus { -value } else { value })
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> std::result::Result<f64, CalcError> {
        let base = self.primary()?;
        if self.peek() == Some(Token::Caret) {
            self.pos += 1;
            self.descend()?;
            let exponent = self.unary()?;
            self.depth -= 1;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> std::result::Result<f64, CalcError> {
        match self.next() {
            Some(Token::Num(value)) => Ok(value),
            Some(Token::LParen) => {
                self.descend()?;
                let value = self.expr()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(CalcError::UnclosedParen),
                }
            }
            Some(Token::RParen) => Err(CalcError::UnexpectedChar(')')),
            Some(_) | None => Err(CalcError::UnexpectedEnd),
        }
    }
}

/// Evaluate an arithmetic expression
pub fn evaluate(expression: &str) -> std::result::Result<f64, CalcError> {
    if expression.chars().count() > MAX_INPUT_LEN {
        return Err(CalcError::TooLong);
    }
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(match token {
            Token::RParen => CalcError::UnexpectedChar(')'),
            Token::LParen => CalcError::UnexpectedChar('('),
            _ => CalcError::UnexpectedEnd,
        });
    }
    if !value.is_finite() {
        return Err(CalcError::NotFinite);
    }
    Ok(value)
}

/// Format a result; integral values print without a fraction
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let rounded = (value * 1e10).round() / 1e10;
    format!("{}", rounded)
}

/// Start of a query, for echoing back in error text
fn preview(query: &str) -> String {
    const PREVIEW_CHARS: usize = 48;
    let query = query.trim();
    if query.chars().count() <= PREVIEW_CHARS {
        return query.to_string();
    }
    let head: String = query.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", head)
}

/// Keep only the characters that can be part of an expression
fn extract_expression(query: &str) -> String {
    query
        .chars()
        .filter(|c| c.is_ascii_digit() || "+-*/%^().× ÷−".contains(*c))
        .collect::<String>()
        .trim()
        .trim_end_matches('.')
        .to_string()
}

/// Local arithmetic tool
#[derive(Debug, Default, Clone)]
pub struct CalculatorTool;

impl CalculatorTool {
    pub fn new() -> Self {
        CalculatorTool
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    async fn invoke(&self, query: &str) -> Result<String> {
        // Models sometimes pass the question instead of the expression.
        let result = evaluate(query).or_else(|first| {
            let extracted = extract_expression(query);
            if extracted.is_empty() || extracted == query.trim() {
                Err(first)
            } else {
                evaluate(&extracted)
            }
        });

        match result {
            Ok(value) => Ok(format_number(value)),
            Err(e) => {
                let shown = preview(query);
                debug!("Calculator could not evaluate '{}': {}", shown, e);
                Ok(format!("Could not evaluate '{}': {}", shown, e))
            }
        }
    }
}
