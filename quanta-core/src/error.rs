//! Structured errors for quantity computations
//!
//! Every fault is detected where it happens and returned as a value.
//! Nothing is retried and no partial result is produced.

use serde::Serialize;
use thiserror::Error;

/// Standard error codes (machine-readable)
pub mod codes {
    pub const UNKNOWN_UNIT: &str = "UNKNOWN_UNIT";
    pub const INVALID_PREFIX: &str = "INVALID_PREFIX";
    pub const DIMENSION_MISMATCH: &str = "DIMENSION_MISMATCH";
    pub const INCOMPATIBLE_UNIT_KIND: &str = "INCOMPATIBLE_UNIT_KIND";
    pub const SHAPE_MISMATCH: &str = "SHAPE_MISMATCH";
    pub const DOMAIN_FAULT: &str = "DOMAIN_FAULT";
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
}

/// Result alias used throughout the workspace
pub type Result<T> = std::result::Result<T, UnitError>;

/// Error type for unit, quantity and expression operations
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitError {
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Prefix '{prefix}' is not permitted on unit '{unit}'")]
    InvalidPrefix { prefix: String, unit: String },

    #[error("Dimension mismatch: {left} is not compatible with {right}{}", located(.expression))]
    DimensionMismatch {
        left: String,
        right: String,
        expression: Option<String>,
    },

    #[error("Incompatible unit kind: {reason}{}", located(.expression))]
    IncompatibleUnitKind {
        reason: String,
        expression: Option<String>,
    },

    #[error("Shape mismatch: {left:?} and {right:?} cannot be broadcast together")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },

    #[error("Domain fault: {0}")]
    DomainFault(String),

    #[error("Parse error at position {position} near '{token}': {message}")]
    ParseError {
        position: usize,
        token: String,
        message: String,
    },
}

fn located(expression: &Option<String>) -> String {
    match expression {
        Some(expr) => format!(" in '{}'", expr),
        None => String::new(),
    }
}

impl UnitError {
    // ========== Common Error Constructors ==========

    pub fn unknown_unit(symbol: impl Into<String>) -> Self {
        Self::UnknownUnit(symbol.into())
    }

    pub fn invalid_prefix(prefix: impl Into<String>, unit: impl Into<String>) -> Self {
        Self::InvalidPrefix {
            prefix: prefix.into(),
            unit: unit.into(),
        }
    }

    pub fn dimension_mismatch(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::DimensionMismatch {
            left: left.into(),
            right: right.into(),
            expression: None,
        }
    }

    pub fn incompatible_kind(reason: impl Into<String>) -> Self {
        Self::IncompatibleUnitKind {
            reason: reason.into(),
            expression: None,
        }
    }

    pub fn shape_mismatch(left: &[usize], right: &[usize]) -> Self {
        Self::ShapeMismatch {
            left: left.to_vec(),
            right: right.to_vec(),
        }
    }

    pub fn domain_fault(details: impl Into<String>) -> Self {
        Self::DomainFault(details.into())
    }

    pub fn parse_error(position: usize, token: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            position,
            token: token.into(),
            message: message.into(),
        }
    }

    /// Attach the offending subexpression to dimensional errors.
    ///
    /// Errors that already carry an expression keep the innermost one.
    pub fn in_expression(self, expr: impl Into<String>) -> Self {
        match self {
            Self::DimensionMismatch { left, right, expression: None } => Self::DimensionMismatch {
                left,
                right,
                expression: Some(expr.into()),
            },
            Self::IncompatibleUnitKind { reason, expression: None } => Self::IncompatibleUnitKind {
                reason,
                expression: Some(expr.into()),
            },
            other => other,
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownUnit(_) => codes::UNKNOWN_UNIT,
            Self::InvalidPrefix { .. } => codes::INVALID_PREFIX,
            Self::DimensionMismatch { .. } => codes::DIMENSION_MISMATCH,
            Self::IncompatibleUnitKind { .. } => codes::INCOMPATIBLE_UNIT_KIND,
            Self::ShapeMismatch { .. } => codes::SHAPE_MISMATCH,
            Self::DomainFault(_) => codes::DOMAIN_FAULT,
            Self::ParseError { .. } => codes::PARSE_ERROR,
        }
    }

    /// Suggestion for fixing the error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::UnknownUnit(_) => Some("Check the spelling or the active unit system"),
            Self::InvalidPrefix { .. } => Some("Use the unit without a prefix"),
            Self::DimensionMismatch { .. } => Some("Convert operands to compatible units first"),
            Self::IncompatibleUnitKind { .. } => {
                Some("Convert temperatures or logarithmic values to a linear unit first")
            }
            Self::ShapeMismatch { .. } => Some("Use arrays of equal shape or a scalar"),
            Self::DomainFault(_) => None,
            Self::ParseError { .. } => Some("Check expression syntax"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(UnitError::unknown_unit("xyz").code(), codes::UNKNOWN_UNIT);
        assert_eq!(UnitError::shape_mismatch(&[3], &[2]).code(), codes::SHAPE_MISMATCH);
        assert_eq!(UnitError::parse_error(2, "+", "unexpected end").code(), codes::PARSE_ERROR);
    }

    #[test]
    fn test_display() {
        let err = UnitError::dimension_mismatch("L", "T");
        assert_eq!(err.to_string(), "Dimension mismatch: L is not compatible with T");

        let err = err.in_expression("3 m + 2 s");
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: L is not compatible with T in '3 m + 2 s'"
        );
    }

    #[test]
    fn test_innermost_expression_kept() {
        let err = UnitError::incompatible_kind("degC cannot be squared")
            .in_expression("degC^2")
            .in_expression("1 + degC^2");
        match err {
            UnitError::IncompatibleUnitKind { expression, .. } => {
                assert_eq!(expression.as_deref(), Some("degC^2"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_shape_display() {
        let err = UnitError::shape_mismatch(&[3], &[2]);
        assert!(err.to_string().contains("[3]"));
        assert!(err.to_string().contains("[2]"));
    }
}
