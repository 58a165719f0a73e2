//! Tokenizer for quantity expressions

use num_rational::Ratio;

use quanta_core::{Result, UnitError};

use crate::dimension::Exponent;
use crate::SystemType;

/// Token types for the expression parser
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Number with its uncertainty (`23.45(12)` has error 0.12)
    Number { value: f64, error: f64 },
    /// Array literal `{1, 2.5(3), -4}`
    Array { values: Vec<f64>, errors: Vec<f64> },
    /// Unit symbol with an optional glued exponent (`km2`, `s-1`, `m1:2`)
    Unit { symbol: String, exponent: Option<Exponent> },
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Colon,
    LParen,
    RParen,
}

/// A token with its byte range in the source text
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

/// Strip a leading `US_` style system tag
///
/// Returns the tagged system and the byte offset at which the expression
/// itself starts.
pub fn system_tag(input: &str) -> (Option<SystemType>, usize) {
    let trimmed = input.trim_start();
    let lead = input.len() - trimmed.len();
    for system in SystemType::ALL {
        let tag = system.abbrev();
        if trimmed.starts_with(tag) && trimmed[tag.len()..].starts_with('_') {
            return (Some(system), lead + tag.len() + 1);
        }
    }
    (None, 0)
}

struct Lexer<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str, offset: usize) -> Self {
        let chars = input[offset..]
            .char_indices()
            .map(|(i, c)| (i + offset, c))
            .collect();
        Lexer { input, chars, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|&(_, c)| c)
    }

    /// Byte offset of the current character
    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.input.len(), |&(i, _)| i)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn error(&self, start: usize, message: impl Into<String>) -> UnitError {
        let token: String = self.input[start..].chars().take(8).collect();
        UnitError::parse_error(start, token, message)
    }

    fn tokenize(mut self) -> Result<Vec<Spanned>> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek() {
            let start = self.offset();
            let token = match ch {
                c if c.is_whitespace() => {
                    self.bump();
                    continue;
                }
                '+' => self.single(Token::Plus),
                '-' => self.single(Token::Minus),
                '*' | '·' => self.single(Token::Star),
                '/' => self.single(Token::Slash),
                '^' => self.single(Token::Caret),
                ':' => self.single(Token::Colon),
                '(' => self.single(Token::LParen),
                ')' => self.single(Token::RParen),
                '{' => self.array()?,
                '0'..='9' | '.' => {
                    let (value, error) = self.number()?;
                    Token::Number { value, error }
                }
                '[' => self.bracketed('[', ']')?,
                '<' => self.bracketed('<', '>')?,
                c if is_unit_char(c) => self.unit()?,
                other => return Err(self.error(start, format!("unexpected character '{}'", other))),
            };
            tokens.push(Spanned {
                token,
                start,
                end: self.offset(),
            });
        }

        Ok(tokens)
    }

    fn single(&mut self, token: Token) -> Token {
        self.bump();
        token
    }

    /// Number with optional `(digits)` uncertainty and exponent
    fn number(&mut self) -> Result<(f64, f64)> {
        let start = self.offset();
        let mut mantissa = String::new();
        let mut decimals: i32 = 0;
        let mut seen_dot = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                if seen_dot {
                    decimals += 1;
                }
                mantissa.push(c);
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                mantissa.push(c);
            } else {
                break;
            }
            self.bump();
        }
        if !mantissa.chars().any(|c| c.is_ascii_digit()) {
            return Err(self.error(start, "malformed number"));
        }

        // uncertainty in units of the last mantissa digit
        let mut error_digits = None;
        if self.peek() == Some('(') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            let save = self.pos;
            self.bump();
            let mut digits = String::new();
            while let Some(c) = self.peek().filter(|c| c.is_ascii_digit()) {
                digits.push(c);
                self.bump();
            }
            if self.peek() == Some(')') {
                self.bump();
                error_digits = Some(digits);
            } else {
                self.pos = save;
            }
        }

        let mut exponent: i32 = 0;
        if matches!(self.peek(), Some('e') | Some('E')) {
            let digit_at = match self.peek_at(1) {
                Some('+') | Some('-') => 2,
                _ => 1,
            };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
                let mut text = String::new();
                if digit_at == 2 {
                    text.extend(self.bump());
                }
                while let Some(c) = self.peek().filter(|c| c.is_ascii_digit()) {
                    text.push(c);
                    self.bump();
                }
                exponent = text
                    .parse()
                    .map_err(|_| self.error(start, "exponent out of range"))?;
            }
        }

        let value: f64 = format!("{}e{}", mantissa, exponent)
            .parse()
            .map_err(|_| self.error(start, "malformed number"))?;
        let error = match error_digits {
            Some(digits) => {
                let scale = exponent
                    .checked_sub(decimals)
                    .ok_or_else(|| self.error(start, "exponent out of range"))?;
                format!("{}e{}", digits, scale)
                    .parse()
                    .map_err(|_| self.error(start, "malformed uncertainty"))?
            }
            None => 0.0,
        };
        Ok((value, error))
    }

    /// Array literal of signed numbers
    fn array(&mut self) -> Result<Token> {
        let start = self.offset();
        self.bump();
        let mut values = Vec::new();
        let mut errors = Vec::new();

        loop {
            self.skip_whitespace();
            let negative = match self.peek() {
                Some('-') => {
                    self.bump();
                    true
                }
                Some('+') => {
                    self.bump();
                    false
                }
                _ => false,
            };
            self.skip_whitespace();
            match self.peek() {
                Some(c) if c.is_ascii_digit() || c == '.' => {
                    let (value, error) = self.number()?;
                    values.push(if negative { -value } else { value });
                    errors.push(error);
                }
                _ => return Err(self.error(self.offset(), "expected a number in array literal")),
            }
            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                Some('}') => break,
                _ => return Err(self.error(start, "unterminated array literal")),
            }
        }

        Ok(Token::Array { values, errors })
    }

    /// `[constant]` or `<kind>` token
    fn bracketed(&mut self, open: char, close: char) -> Result<Token> {
        let start = self.offset();
        let mut symbol = String::new();
        symbol.extend(self.bump());
        loop {
            match self.bump() {
                Some(c) if c == close => {
                    symbol.push(c);
                    break;
                }
                Some(c) if c != open && !c.is_whitespace() => symbol.push(c),
                _ => return Err(self.error(start, format!("missing '{}'", close))),
            }
        }
        let exponent = self.glued_exponent(start)?;
        Ok(Token::Unit { symbol, exponent })
    }

    fn unit(&mut self) -> Result<Token> {
        let start = self.offset();
        let mut symbol = String::new();
        while let Some(c) = self.peek().filter(|&c| is_unit_char(c)) {
            symbol.push(c);
            self.bump();
        }
        let exponent = self.glued_exponent(start)?;
        Ok(Token::Unit { symbol, exponent })
    }

    /// Exponent written directly after a unit: `2`, `-1`, `1:2`
    fn glued_exponent(&mut self, start: usize) -> Result<Option<Exponent>> {
        let negative = self.peek() == Some('-');
        let first_digit = if negative { self.peek_at(1) } else { self.peek() };
        if !first_digit.is_some_and(|c| c.is_ascii_digit()) {
            return Ok(None);
        }
        if negative {
            self.bump();
        }
        let numer = self.integer(start)?;
        let denom = if self.peek() == Some(':') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.integer(start)?
        } else {
            1
        };
        if denom == 0 {
            return Err(self.error(start, "zero denominator in exponent"));
        }
        let numer = if negative { -numer } else { numer };
        Ok(Some(Ratio::new(numer, denom)))
    }

    fn integer(&mut self, start: usize) -> Result<i32> {
        let mut digits = String::new();
        while let Some(c) = self.peek().filter(|c| c.is_ascii_digit()) {
            digits.push(c);
            self.bump();
        }
        digits
            .parse()
            .map_err(|_| self.error(start, "exponent out of range"))
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }
}

fn is_unit_char(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '°'
}

/// Tokenize `input` starting at byte `offset`
pub fn tokenize(input: &str, offset: usize) -> Result<Vec<Spanned>> {
    Lexer::new(input, offset).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::exp;

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input, 0)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_simple_expression() {
        assert_eq!(
            tokens("34*km + 25*m"),
            vec![
                Token::Number { value: 34.0, error: 0.0 },
                Token::Star,
                Token::Unit { symbol: "km".into(), exponent: None },
                Token::Plus,
                Token::Number { value: 25.0, error: 0.0 },
                Token::Star,
                Token::Unit { symbol: "m".into(), exponent: None },
            ]
        );
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(tokens("2.5e-3"), vec![Token::Number { value: 2.5e-3, error: 0.0 }]);
        match &tokens("23.45(12)")[0] {
            Token::Number { value, error } => {
                assert_eq!(*value, 23.45);
                assert!((error - 0.12).abs() < 1e-12);
            }
            other => panic!("unexpected token {other:?}"),
        }
        match &tokens("2.334(20)e+01")[0] {
            Token::Number { value, error } => {
                assert!((value - 23.34).abs() < 1e-12);
                assert!((error - 0.2).abs() < 1e-12);
            }
            other => panic!("unexpected token {other:?}"),
        }
    }

    #[test]
    fn test_e_without_digits_is_a_unit() {
        assert_eq!(
            tokens("2eV"),
            vec![
                Token::Number { value: 2.0, error: 0.0 },
                Token::Unit { symbol: "eV".into(), exponent: None },
            ]
        );
    }

    #[test]
    fn test_glued_exponents() {
        assert_eq!(
            tokens("m2 s-1 m1:2"),
            vec![
                Token::Unit { symbol: "m".into(), exponent: Some(exp(2)) },
                Token::Unit { symbol: "s".into(), exponent: Some(exp(-1)) },
                Token::Unit { symbol: "m".into(), exponent: Some(Ratio::new(1, 2)) },
            ]
        );
    }

    #[test]
    fn test_minus_with_space_is_operator() {
        assert_eq!(
            tokens("m - 1")[1],
            Token::Minus
        );
    }

    #[test]
    fn test_array_literal() {
        match &tokens("{2.23(12), 3.5, -1}")[0] {
            Token::Array { values, errors } => {
                assert_eq!(values, &vec![2.23, 3.5, -1.0]);
                assert!((errors[0] - 0.12).abs() < 1e-12);
                assert_eq!(errors[1], 0.0);
            }
            other => panic!("unexpected token {other:?}"),
        }
    }

    #[test]
    fn test_bracketed_tokens() {
        assert_eq!(
            tokens("[k_B]*<B>2"),
            vec![
                Token::Unit { symbol: "[k_B]".into(), exponent: None },
                Token::Star,
                Token::Unit { symbol: "<B>".into(), exponent: Some(exp(2)) },
            ]
        );
    }

    #[test]
    fn test_errors_carry_position() {
        match tokenize("3 m # 2", 0) {
            Err(UnitError::ParseError { position, .. }) => assert_eq!(position, 4),
            other => panic!("unexpected result {other:?}"),
        }
        assert!(tokenize("[c", 0).is_err());
        assert!(matches!(
            tokenize("1.5(1)e-2147483648", 0),
            Err(UnitError::ParseError { position: 0, .. })
        ));
        assert!(tokenize("{1, 2", 0).is_err());
    }

    #[test]
    fn test_system_tag() {
        assert_eq!(system_tag("US_23*ft"), (Some(SystemType::US), 3));
        assert_eq!(system_tag("ESU_statA"), (Some(SystemType::ESU), 4));
        assert_eq!(system_tag("23*ft"), (None, 0));
        let (_, offset) = system_tag("US_23*ft");
        assert_eq!(tokens_from("US_23*ft", offset).len(), 3);
    }

    fn tokens_from(input: &str, offset: usize) -> Vec<Spanned> {
        tokenize(input, offset).unwrap()
    }
}
