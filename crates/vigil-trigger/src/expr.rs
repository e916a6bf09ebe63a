//! The embedded condition-expression evaluator
//!
//! Resolved trigger conditions are plain text like `'95' > 90 && !false`.
//! This module lexes and evaluates them in one pass with a small precedence
//! ladder. The operator set and its coercion rules are part of the
//! configuration format:
//!
//! - `||` and `&&` return one of their operands, not a boolean
//! - `==`/`!=` coerce across types; `null` is loosely equal only to `null`
//! - `===`/`!==` compare strictly, without coercion
//! - `<` `<=` `>` `>=` compare lexicographically when both sides are
//!   strings, numerically otherwise; `null` coerces to `0`, so `null < 90`
//!   holds while `null > 90` does not
//! - `+` concatenates when either side is a string, adds otherwise
//! - any comparison against a value that coerces to NaN is false
//!
//! The caller applies the final truthiness cast: `false`, `0`, NaN, the
//! empty string and `null` are falsy, everything else is truthy.

use std::fmt;

use thiserror::Error;

pub type ExprResult<T> = Result<T, ExprError>;

/// A malformed condition expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("Unexpected character '{found}'")]
    UnexpectedChar { found: char, at: usize },

    #[error("Unterminated string literal")]
    UnterminatedString { at: usize },

    #[error("Invalid number literal '{text}'")]
    InvalidNumber { text: String, at: usize },

    #[error("Unknown identifier '{name}'")]
    UnknownIdentifier { name: String, at: usize },

    #[error("Unexpected token '{token}'")]
    UnexpectedToken { token: String, at: usize },

    #[error("Unexpected end of expression")]
    UnexpectedEnd { at: usize },
}

impl ExprError {
    /// Byte offset of the problem in the expression text.
    pub fn offset(&self) -> usize {
        match self {
            ExprError::UnexpectedChar { at, .. }
            | ExprError::UnterminatedString { at }
            | ExprError::InvalidNumber { at, .. }
            | ExprError::UnknownIdentifier { at, .. }
            | ExprError::UnexpectedToken { at, .. }
            | ExprError::UnexpectedEnd { at } => *at,
        }
    }

    /// Byte width of the offending span, zero when only a point is known.
    pub fn width(&self) -> usize {
        match self {
            ExprError::UnexpectedChar { found, .. } => found.len_utf8(),
            ExprError::UnterminatedString { .. } => 1,
            ExprError::InvalidNumber { text, .. } => text.len(),
            ExprError::UnknownIdentifier { name, .. } => name.len(),
            ExprError::UnexpectedToken { token, .. } => token.len(),
            ExprError::UnexpectedEnd { .. } => 0,
        }
    }
}

/// A value produced while evaluating a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprValue {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
}

impl ExprValue {
    /// The truthiness cast applied at the condition boundary.
    pub fn truthy(&self) -> bool {
        match self {
            ExprValue::Null => false,
            ExprValue::Bool(b) => *b,
            ExprValue::Num(n) => *n != 0.0 && !n.is_nan(),
            ExprValue::Str(s) => !s.is_empty(),
        }
    }

    fn to_number(&self) -> f64 {
        match self {
            ExprValue::Null => 0.0,
            ExprValue::Bool(false) => 0.0,
            ExprValue::Bool(true) => 1.0,
            ExprValue::Num(n) => *n,
            ExprValue::Str(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
        }
    }

    fn to_text(&self) -> String {
        match self {
            ExprValue::Null => "null".to_string(),
            ExprValue::Bool(b) => b.to_string(),
            ExprValue::Num(n) => num_to_string(*n),
            ExprValue::Str(s) => s.clone(),
        }
    }
}

impl fmt::Display for ExprValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn num_to_string(n: f64) -> String {
    if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        n.to_string()
    }
}

fn loose_eq(a: &ExprValue, b: &ExprValue) -> bool {
    use ExprValue::*;
    match (a, b) {
        (Null, Null) => true,
        (Null, _) | (_, Null) => false,
        (Str(x), Str(y)) => x == y,
        (Bool(x), Bool(y)) => x == y,
        // mixed scalar types coerce to numbers; NaN never equals anything
        _ => a.to_number() == b.to_number(),
    }
}

fn strict_eq(a: &ExprValue, b: &ExprValue) -> bool {
    use ExprValue::*;
    match (a, b) {
        (Null, Null) => true,
        (Bool(x), Bool(y)) => x == y,
        (Num(x), Num(y)) => x == y,
        (Str(x), Str(y)) => x == y,
        _ => false,
    }
}

fn compare(op: Op, a: &ExprValue, b: &ExprValue) -> bool {
    if let (ExprValue::Str(x), ExprValue::Str(y)) = (a, b) {
        return match op {
            Op::Lt => x < y,
            Op::Le => x <= y,
            Op::Gt => x > y,
            Op::Ge => x >= y,
            _ => false,
        };
    }
    let (x, y) = (a.to_number(), b.to_number());
    if x.is_nan() || y.is_nan() {
        return false;
    }
    match op {
        Op::Lt => x < y,
        Op::Le => x <= y,
        Op::Gt => x > y,
        Op::Ge => x >= y,
        _ => false,
    }
}

fn add(a: &ExprValue, b: &ExprValue) -> ExprValue {
    if matches!(a, ExprValue::Str(_)) || matches!(b, ExprValue::Str(_)) {
        ExprValue::Str(format!("{}{}", a.to_text(), b.to_text()))
    } else {
        ExprValue::Num(a.to_number() + b.to_number())
    }
}

// --- lexer ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Or,
    And,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Num(f64),
    Str(String),
    Bool(bool),
    Null,
    Op(Op),
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    at: usize,
    len: usize,
}

fn lex(text: &str) -> ExprResult<Vec<Token>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        let kind = match c {
            b'\'' | b'"' => {
                let (value, end) = scan_string(text, i, c as char)?;
                i = end;
                TokenKind::Str(value)
            }
            b'0'..=b'9' => {
                let (value, end) = scan_number(text, i)?;
                i = end;
                TokenKind::Num(value)
            }
            b'.' if bytes.get(i + 1).is_some_and(u8::is_ascii_digit) => {
                let (value, end) = scan_number(text, i)?;
                i = end;
                TokenKind::Num(value)
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                let end = text[i..]
                    .find(|ch: char| !ch.is_ascii_alphanumeric() && ch != '_')
                    .map(|off| i + off)
                    .unwrap_or(text.len());
                i = end;
                match &text[start..end] {
                    "true" => TokenKind::Bool(true),
                    "false" => TokenKind::Bool(false),
                    "null" => TokenKind::Null,
                    name => {
                        return Err(ExprError::UnknownIdentifier {
                            name: name.to_string(),
                            at: start,
                        })
                    }
                }
            }
            _ => {
                let (op, len) = scan_operator(text, i)?;
                i += len;
                op
            }
        };
        tokens.push(Token {
            kind,
            at: start,
            len: i - start,
        });
    }
    Ok(tokens)
}

fn scan_string(text: &str, start: usize, quote: char) -> ExprResult<(String, usize)> {
    let mut value = String::new();
    let mut chars = text[start + 1..].char_indices();
    while let Some((off, c)) = chars.next() {
        if c == quote {
            return Ok((value, start + 1 + off + c.len_utf8()));
        }
        if c == '\\' {
            match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, 'r')) => value.push('\r'),
                Some((_, escaped)) => value.push(escaped),
                None => break,
            }
        } else {
            value.push(c);
        }
    }
    Err(ExprError::UnterminatedString { at: start })
}

fn scan_number(text: &str, start: usize) -> ExprResult<(f64, usize)> {
    let bytes = text.as_bytes();
    let mut i = start;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    let literal = &text[start..i];
    match literal.parse() {
        Ok(value) => Ok((value, i)),
        Err(_) => Err(ExprError::InvalidNumber {
            text: literal.to_string(),
            at: start,
        }),
    }
}

fn scan_operator(text: &str, at: usize) -> ExprResult<(TokenKind, usize)> {
    let rest = &text[at..];
    for (pattern, op) in [
        ("===", Op::StrictEq),
        ("!==", Op::StrictNe),
        ("==", Op::Eq),
        ("!=", Op::Ne),
        ("<=", Op::Le),
        (">=", Op::Ge),
        ("&&", Op::And),
        ("||", Op::Or),
        ("<", Op::Lt),
        (">", Op::Gt),
        ("+", Op::Add),
        ("-", Op::Sub),
        ("*", Op::Mul),
        ("/", Op::Div),
        ("%", Op::Rem),
        ("!", Op::Not),
    ] {
        if rest.starts_with(pattern) {
            return Ok((TokenKind::Op(op), pattern.len()));
        }
    }
    if rest.starts_with('(') {
        Ok((TokenKind::LParen, 1))
    } else if rest.starts_with(')') {
        Ok((TokenKind::RParen, 1))
    } else {
        let found = rest.chars().next().unwrap_or(' ');
        Err(ExprError::UnexpectedChar { found, at })
    }
}

// --- parser / evaluator ---

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

/// Evaluate a resolved condition expression.
pub fn evaluate(text: &str) -> ExprResult<ExprValue> {
    let tokens = lex(text)?;
    let mut parser = Parser {
        text,
        tokens,
        pos: 0,
    };
    let value = parser.or_expr()?;
    if let Some(token) = parser.peek() {
        return Err(ExprError::UnexpectedToken {
            token: parser.token_text(token),
            at: token.at,
        });
    }
    Ok(value)
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_op(&self) -> Option<Op> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Op(op),
                ..
            }) => Some(*op),
            _ => None,
        }
    }

    fn token_text(&self, token: &Token) -> String {
        self.text[token.at..token.at + token.len].to_string()
    }

    fn or_expr(&mut self) -> ExprResult<ExprValue> {
        let mut lhs = self.and_expr()?;
        while self.peek_op() == Some(Op::Or) {
            self.pos += 1;
            let rhs = self.and_expr()?;
            // || yields the first truthy operand
            if !lhs.truthy() {
                lhs = rhs;
            }
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> ExprResult<ExprValue> {
        let mut lhs = self.equality()?;
        while self.peek_op() == Some(Op::And) {
            self.pos += 1;
            let rhs = self.equality()?;
            // && yields the first falsy operand
            if lhs.truthy() {
                lhs = rhs;
            }
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> ExprResult<ExprValue> {
        let mut lhs = self.relational()?;
        loop {
            let op = match self.peek_op() {
                Some(op @ (Op::Eq | Op::Ne | Op::StrictEq | Op::StrictNe)) => op,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.relational()?;
            lhs = ExprValue::Bool(match op {
                Op::Eq => loose_eq(&lhs, &rhs),
                Op::Ne => !loose_eq(&lhs, &rhs),
                Op::StrictEq => strict_eq(&lhs, &rhs),
                _ => !strict_eq(&lhs, &rhs),
            });
        }
        Ok(lhs)
    }

    fn relational(&mut self) -> ExprResult<ExprValue> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek_op() {
                Some(op @ (Op::Lt | Op::Le | Op::Gt | Op::Ge)) => op,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.additive()?;
            lhs = ExprValue::Bool(compare(op, &lhs, &rhs));
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> ExprResult<ExprValue> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek_op() {
                Some(op @ (Op::Add | Op::Sub)) => op,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.multiplicative()?;
            lhs = match op {
                Op::Add => add(&lhs, &rhs),
                _ => ExprValue::Num(lhs.to_number() - rhs.to_number()),
            };
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> ExprResult<ExprValue> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek_op() {
                Some(op @ (Op::Mul | Op::Div | Op::Rem)) => op,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary()?;
            let (x, y) = (lhs.to_number(), rhs.to_number());
            lhs = ExprValue::Num(match op {
                Op::Mul => x * y,
                Op::Div => x / y,
                _ => x % y,
            });
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> ExprResult<ExprValue> {
        match self.peek_op() {
            Some(Op::Not) => {
                self.pos += 1;
                let value = self.unary()?;
                Ok(ExprValue::Bool(!value.truthy()))
            }
            Some(Op::Sub) => {
                self.pos += 1;
                let value = self.unary()?;
                Ok(ExprValue::Num(-value.to_number()))
            }
            Some(Op::Add) => {
                self.pos += 1;
                let value = self.unary()?;
                Ok(ExprValue::Num(value.to_number()))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> ExprResult<ExprValue> {
        let Some(token) = self.peek() else {
            return Err(ExprError::UnexpectedEnd {
                at: self.text.len(),
            });
        };
        let at = token.at;
        match token.kind.clone() {
            TokenKind::Num(n) => {
                self.pos += 1;
                Ok(ExprValue::Num(n))
            }
            TokenKind::Str(s) => {
                self.pos += 1;
                Ok(ExprValue::Str(s))
            }
            TokenKind::Bool(b) => {
                self.pos += 1;
                Ok(ExprValue::Bool(b))
            }
            TokenKind::Null => {
                self.pos += 1;
                Ok(ExprValue::Null)
            }
            TokenKind::LParen => {
                self.pos += 1;
                let value = self.or_expr()?;
                match self.peek() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => {
                        self.pos += 1;
                        Ok(value)
                    }
                    Some(token) => Err(ExprError::UnexpectedToken {
                        token: self.token_text(token),
                        at: token.at,
                    }),
                    None => Err(ExprError::UnexpectedEnd {
                        at: self.text.len(),
                    }),
                }
            }
            TokenKind::RParen | TokenKind::Op(_) => {
                let token = self.token_text(token);
                Err(ExprError::UnexpectedToken { token, at })
            }
        }
    }
}
