//! Expression calculator
//!
//! Turns text like `"US_3.2 ft/s^2 * 4(1) s"` into a [`Quantity`]. A leading
//! system tag (`SI_`, `US_`, `ESU_`, `EMU_`) selects the unit system for
//! that expression only.

mod ast;
mod eval;
mod lexer;
mod parser;

pub use ast::{Expr, ExprKind};
pub use eval::evaluate;
pub use lexer::{system_tag, tokenize, Spanned, Token};
pub use parser::Parser;

use tracing::debug;

use quanta_core::Result;

use crate::system::active_system;
use crate::{Quantity, SystemType};

/// Parses and evaluates quantity expressions
#[derive(Debug, Clone, Copy, Default)]
pub struct Calculator {
    system: Option<SystemType>,
}

impl Calculator {
    /// Calculator that follows the active unit system
    pub fn new() -> Self {
        Calculator { system: None }
    }

    /// Pin the unit system instead of following the active one
    pub fn with_system(mut self, system: SystemType) -> Self {
        self.system = Some(system);
        self
    }

    pub fn system(&self) -> SystemType {
        self.system.unwrap_or_else(active_system)
    }

    /// Parse a tree without evaluating it
    pub fn parse(&self, expr: &str) -> Result<(Expr, SystemType)> {
        let (tag, offset) = system_tag(expr);
        let system = tag.unwrap_or_else(|| self.system());
        let tokens = tokenize(expr, offset)?;
        Ok((Parser::new(expr, tokens).parse()?, system))
    }

    /// Evaluate an expression
    pub fn solve(&self, expr: &str) -> Result<Quantity> {
        let (tree, system) = self.parse(expr)?;
        debug!(expression = expr, system = %system, "solving expression");
        evaluate(&tree, expr, system)
    }
}

/// Evaluate an expression in the active unit system
pub fn solve(expr: &str) -> Result<Quantity> {
    Calculator::new().solve(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UnitSystem;
    use quanta_core::UnitError;

    #[test]
    fn test_solve() {
        assert_eq!(solve("34*km + 25*m").unwrap().to_string(), "34.025*km");
        assert_eq!(solve("4*dm * 3*m / (6*s)").unwrap().to_string(), "2*dm*m*s-1");
        assert_eq!(solve("23.45(12)*km").unwrap().to_string(), "2.345(12)e+01*km");
    }

    #[test]
    fn test_system_tags() {
        let q = solve("US_23*ft").unwrap();
        assert_eq!(q.unit_system(), SystemType::US);
        assert!(matches!(solve("23*ft"), Err(UnitError::UnknownUnit(_))));

        let calc = Calculator::new().with_system(SystemType::ESU);
        assert_eq!(calc.solve("EMU_abA").unwrap().unit_system(), SystemType::EMU);
        assert_eq!(calc.solve("statA").unwrap().unit_system(), SystemType::ESU);
    }

    #[test]
    fn test_follows_active_system() {
        let calc = Calculator::new();
        assert_eq!(calc.system(), SystemType::SI);
        let _emu = UnitSystem::new(SystemType::EMU);
        assert_eq!(calc.system(), SystemType::EMU);
        assert_eq!(calc.solve("abA").unwrap().unit_system(), SystemType::EMU);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(solve("3 m +"), Err(UnitError::ParseError { .. })));
        assert!(matches!(solve("US_"), Err(UnitError::ParseError { .. })));
        match solve("3 m + 2 s") {
            Err(UnitError::DimensionMismatch { expression, .. }) => {
                assert_eq!(expression.as_deref(), Some("3 m + 2 s"));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
