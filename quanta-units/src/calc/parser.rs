//! Recursive-descent parser for quantity expressions
//!
//! ```text
//! expression := term (('+' | '-') term)*
//! term       := factor (('*' | '/') factor)*
//! factor     := ('-' | '+') factor | atom ('^' exponent)?
//! atom       := number unit? | array unit? | unit | '(' expression ')'
//! exponent   := '-'? integer | '(' '-'? integer (('/' | ':') integer)? ')'
//! ```

use num_rational::Ratio;

use quanta_core::{Result, UnitError};

use super::ast::{Expr, ExprKind};
use super::lexer::{Spanned, Token};
use crate::dimension::{exp, Exponent};
use crate::BinOp;

/// Parse tokens into an expression tree
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, tokens: Vec<Spanned>) -> Self {
        Parser { source, tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<&Spanned> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    /// End offset of the most recently consumed token
    fn last_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |s| s.end)
    }

    fn error_here(&self, message: &str) -> UnitError {
        match self.tokens.get(self.pos) {
            Some(s) => UnitError::parse_error(s.start, &self.source[s.start..s.end], message),
            None => UnitError::parse_error(self.source.len(), "", message),
        }
    }

    /// Parse a complete expression; trailing tokens are an error
    pub fn parse(mut self) -> Result<Expr> {
        if self.tokens.is_empty() {
            return Err(UnitError::parse_error(0, "", "empty expression"));
        }
        let expr = self.parse_expr()?;
        if self.pos < self.tokens.len() {
            return Err(self.error_here("unexpected token after expression"));
        }
        Ok(expr)
    }

    // expr = term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = Expr::binary(left, op, right);
        }

        Ok(left)
    }

    // term = factor (('*' | '/') factor)*
    fn parse_term(&mut self) -> Result<Expr> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            left = Expr::binary(left, op, right);
        }

        Ok(left)
    }

    // factor = ('-' | '+') factor | atom ('^' exponent)?
    fn parse_factor(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::Minus) | Some(Token::Plus) => {
                let negate = matches!(self.peek(), Some(Token::Minus));
                let start = self.tokens[self.pos].start;
                self.advance();
                let inner = self.parse_factor()?;
                if !negate {
                    return Ok(inner);
                }
                let end = inner.end;
                return Ok(Expr::new(ExprKind::Neg(Box::new(inner)), start, end));
            }
            _ => {}
        }

        let atom = self.parse_atom()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.advance();
            let exponent = self.parse_exponent()?;
            let (start, end) = (atom.start, self.last_end());
            return Ok(Expr::new(ExprKind::Pow(Box::new(atom), exponent), start, end));
        }
        Ok(atom)
    }

    // atom = number unit? | array unit? | unit | '(' expr ')'
    fn parse_atom(&mut self) -> Result<Expr> {
        let Some(spanned) = self.tokens.get(self.pos).cloned() else {
            return Err(self.error_here("unexpected end of expression"));
        };
        let (start, end) = (spanned.start, spanned.end);

        match spanned.token {
            Token::Number { value, error } => {
                self.advance();
                let number = Expr::new(ExprKind::Number { value, error }, start, end);
                self.with_optional_unit(number)
            }
            Token::Array { values, errors } => {
                self.advance();
                let array = Expr::new(ExprKind::Array { values, errors }, start, end);
                self.with_optional_unit(array)
            }
            Token::Unit { symbol, exponent } => {
                self.advance();
                let exponent = exponent.unwrap_or_else(|| exp(1));
                Ok(Expr::new(ExprKind::Unit { symbol, exponent }, start, end))
            }
            Token::LParen => {
                self.advance();
                let mut inner = self.parse_expr()?;
                if !matches!(self.peek(), Some(Token::RParen)) {
                    return Err(self.error_here("expected closing ')'"));
                }
                self.advance();
                inner.start = start;
                inner.end = self.last_end();
                Ok(inner)
            }
            _ => Err(self.error_here("expected a number, unit or '('")),
        }
    }

    /// A unit written right after a number multiplies it: `3 km`
    fn with_optional_unit(&mut self, value: Expr) -> Result<Expr> {
        if !matches!(self.peek(), Some(Token::Unit { .. })) {
            return Ok(value);
        }
        let unit = self.parse_atom()?;
        Ok(Expr::binary(value, BinOp::Mul, unit))
    }

    // exponent = '-'? integer | '(' '-'? integer (('/' | ':') integer)? ')'
    fn parse_exponent(&mut self) -> Result<Exponent> {
        if !matches!(self.peek(), Some(Token::LParen)) {
            return self.parse_signed_integer().map(exp);
        }
        self.advance();
        let numer = self.parse_signed_integer()?;
        let denom = match self.peek() {
            Some(Token::Slash) | Some(Token::Colon) => {
                self.advance();
                self.parse_signed_integer()?
            }
            _ => 1,
        };
        if !matches!(self.peek(), Some(Token::RParen)) {
            return Err(self.error_here("expected closing ')' in exponent"));
        }
        self.advance();
        if denom == 0 {
            return Err(self.error_here("zero denominator in exponent"));
        }
        Ok(Ratio::new(numer, denom))
    }

    fn parse_signed_integer(&mut self) -> Result<i32> {
        let negative = matches!(self.peek(), Some(Token::Minus));
        if negative {
            self.advance();
        }
        match self.peek() {
            Some(&Token::Number { value, error })
                if error == 0.0 && value.fract() == 0.0 && value <= i32::MAX as f64 =>
            {
                self.advance();
                let n = value as i32;
                Ok(if negative { -n } else { n })
            }
            _ => Err(self.error_here("expected an integer exponent")),
        }
    }
}
