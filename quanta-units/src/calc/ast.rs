//! Expression tree for quantity expressions

use crate::dimension::Exponent;
use crate::BinOp;

/// Expression node with its byte range in the source text
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number { value: f64, error: f64 },
    Array { values: Vec<f64>, errors: Vec<f64> },
    Unit { symbol: String, exponent: Exponent },
    BinaryOp(Box<Expr>, BinOp, Box<Expr>),
    Neg(Box<Expr>),
    Pow(Box<Expr>, Exponent),
}

impl Expr {
    pub fn new(kind: ExprKind, start: usize, end: usize) -> Self {
        Expr { kind, start, end }
    }

    pub fn binary(left: Expr, op: BinOp, right: Expr) -> Self {
        let (start, end) = (left.start, right.end);
        Expr::new(ExprKind::BinaryOp(Box::new(left), op, Box::new(right)), start, end)
    }

    /// Source text of this node
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or(source).trim()
    }
}
