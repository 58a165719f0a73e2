//! Evaluation of expression trees into quantities

use quanta_core::{ArrayValue, Magnitude, Result};

use super::ast::{Expr, ExprKind};
use crate::dimension::checked_mul;
use crate::quantity::apply;
use crate::{registry, CompoundUnit, Quantity, SystemType};

/// Evaluate `expr`, resolving unit symbols in `system`
///
/// Dimensional errors name the smallest subexpression that caused them.
pub fn evaluate(expr: &Expr, source: &str, system: SystemType) -> Result<Quantity> {
    evaluate_node(expr, source, system).map_err(|e| e.in_expression(expr.text(source)))
}

fn evaluate_node(expr: &Expr, source: &str, system: SystemType) -> Result<Quantity> {
    match &expr.kind {
        ExprKind::Number { value, error } => {
            let magnitude = Magnitude::with_error(*value, *error)?;
            Ok(Quantity::from_parts(magnitude, CompoundUnit::unitless(), system))
        }
        ExprKind::Array { values, errors } => {
            let magnitude = Magnitude::new(
                ArrayValue::from_vec(values.clone()),
                ArrayValue::from_vec(errors.clone()),
            )?;
            Ok(Quantity::from_parts(magnitude, CompoundUnit::unitless(), system))
        }
        ExprKind::Unit { symbol, exponent } => {
            let atom = registry().resolve(symbol, system)?;
            let units = CompoundUnit::from_atom(atom.with_exponent(checked_mul(atom.exponent, *exponent)?))?;
            Ok(Quantity::from_parts(Magnitude::scalar(1.0), units, system))
        }
        ExprKind::BinaryOp(left, op, right) => {
            let left = evaluate(left, source, system)?;
            let right = evaluate(right, source, system)?;
            apply(left, *op, right)
        }
        ExprKind::Neg(inner) => Ok(evaluate(inner, source, system)?.neg()),
        ExprKind::Pow(base, exponent) => evaluate(base, source, system)?.pow(*exponent),
    }
}
