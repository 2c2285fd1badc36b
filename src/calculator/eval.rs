//! Restricted arithmetic evaluator.
//!
//! Accepts decimal literals, `+ - * /` (and the display forms `− × ÷`),
//! unary sign and parentheses.  Anything else is rejected; nothing is ever
//! executed.
//!
//! Grammar:
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := ('+' | '-') factor | number | '(' expr ')'
//! ```

use crate::error::EvalError;

/// Nesting limit for unary signs and parentheses combined.
const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tok {
    Num(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

/// Token plus the character offset it started at.
#[derive(Debug, Clone, Copy)]
struct Spanned {
    tok: Tok,
    pos: usize,
}

fn tokenize(src: &str) -> Result<Vec<Spanned>, EvalError> {
    let chars: Vec<char> = src.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let tok = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| EvalError::BadNumber(text.clone()))?;
                out.push(Spanned {
                    tok: Tok::Num(value),
                    pos: start,
                });
                continue;
            }
            '+' => Tok::Plus,
            '-' | '−' => Tok::Minus,
            '*' | '×' => Tok::Star,
            '/' | '÷' => Tok::Slash,
            '(' => Tok::LParen,
            ')' => Tok::RParen,
            ch => return Err(EvalError::UnsupportedToken { ch, pos: i }),
        };
        out.push(Spanned { tok, pos: i });
        i += 1;
    }
    Ok(out)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Tok> {
        self.tokens.get(self.pos).map(|t| t.tok)
    }

    fn bump(&mut self) -> Option<Tok> {
        let tok = self.peek()?;
        self.pos += 1;
        Some(tok)
    }

    fn expr(&mut self) -> Result<f64, EvalError> {
        let mut acc = self.term()?;
        loop {
            match self.peek() {
                Some(Tok::Plus) => {
                    self.pos += 1;
                    acc += self.term()?;
                }
                Some(Tok::Minus) => {
                    self.pos += 1;
                    acc -= self.term()?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut acc = self.factor()?;
        loop {
            match self.peek() {
                Some(Tok::Star) => {
                    self.pos += 1;
                    acc *= self.factor()?;
                }
                Some(Tok::Slash) => {
                    self.pos += 1;
                    let rhs = self.factor()?;
                    if rhs == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    acc /= rhs;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn factor(&mut self) -> Result<f64, EvalError> {
        let at = self.pos;
        match self.bump() {
            Some(Tok::Num(v)) => Ok(v),
            Some(sign @ (Tok::Plus | Tok::Minus)) => {
                self.descend()?;
                let v = self.factor()?;
                self.depth -= 1;
                Ok(if sign == Tok::Minus { -v } else { v })
            }
            Some(Tok::LParen) => {
                self.descend()?;
                let v = self.expr()?;
                self.depth -= 1;
                match self.bump() {
                    Some(Tok::RParen) => Ok(v),
                    None => Err(EvalError::UnbalancedParens),
                    Some(_) => Err(EvalError::UnexpectedToken(self.offset(self.pos - 1))),
                }
            }
            Some(Tok::RParen) if self.tokens[..at].iter().all(|t| t.tok != Tok::LParen) => {
                Err(EvalError::UnbalancedParens)
            }
            Some(_) => Err(EvalError::UnexpectedToken(self.offset(at))),
            None => Err(EvalError::UnexpectedEnd),
        }
    }

    fn descend(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn offset(&self, index: usize) -> usize {
        self.tokens.get(index).map(|t| t.pos).unwrap_or(0)
    }
}

/// Evaluate an arithmetic expression.
pub fn eval_expression(src: &str) -> Result<f64, EvalError> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(EvalError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;

    match parser.peek() {
        None => {}
        Some(Tok::RParen) => return Err(EvalError::UnbalancedParens),
        Some(_) => return Err(EvalError::UnexpectedToken(parser.offset(parser.pos))),
    }

    if !value.is_finite() {
        return Err(EvalError::NonFinite);
    }
    Ok(value)
}

/// Render a result the way the display shows it.
///
/// Integral values drop the fractional part; `-0` prints as `0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    format!("{}", value)
}
