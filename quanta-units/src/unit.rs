//! Unit representation with conversion to the SI reference

use std::fmt;

use quanta_core::{Result, UnitError};

use crate::{Dimension, SystemType};

/// How values of a unit map onto the SI reference unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitKind {
    /// `y = x * factor`
    Linear,
    /// `y = x * factor + offset` (temperature scales)
    Affine { offset: f64 },
    /// `y = factor * radix^(x / multiplier)` (neper, bel, decibel)
    Logarithmic { radix: f64, multiplier: f64 },
}

/// Catalog grouping of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Base,
    Derived,
    Logarithmic,
    Temperature,
    Constant,
    Quantity,
}

/// Whether a unit accepts SI and binary prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixRule {
    Allowed,
    Forbidden,
}

/// Represents a physical unit with its dimension and conversion to SI
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    /// The unit symbol (e.g., "m", "g", "degC")
    pub symbol: String,
    /// The unit name (e.g., "meter", "gram", "degree Celsius")
    pub name: String,
    /// The dimensional signature
    pub dimension: Dimension,
    /// Factor to the coherent SI unit (reference value for logarithmic units)
    pub factor: f64,
    pub kind: UnitKind,
    pub category: Category,
    pub prefixes: PrefixRule,
    /// Systems the unit belongs to; empty means every system
    pub systems: Vec<SystemType>,
}

impl Unit {
    /// Create a linear unit that accepts prefixes
    pub fn new(symbol: &str, name: &str, dimension: Dimension, factor: f64, category: Category) -> Self {
        Unit {
            symbol: symbol.to_string(),
            name: name.to_string(),
            dimension,
            factor,
            kind: UnitKind::Linear,
            category,
            prefixes: PrefixRule::Allowed,
            systems: Vec::new(),
        }
    }

    /// Create a unit with offset (temperature scales); prefixes are forbidden
    pub fn with_offset(symbol: &str, name: &str, factor: f64, offset: f64) -> Self {
        Unit {
            kind: UnitKind::Affine { offset },
            prefixes: PrefixRule::Forbidden,
            ..Unit::new(symbol, name, Dimension::TEMPERATURE, factor, Category::Temperature)
        }
    }

    /// Create a logarithmic unit relative to `reference` SI units
    pub fn logarithmic(
        symbol: &str,
        name: &str,
        dimension: Dimension,
        reference: f64,
        radix: f64,
        multiplier: f64,
    ) -> Self {
        Unit {
            kind: UnitKind::Logarithmic { radix, multiplier },
            prefixes: PrefixRule::Forbidden,
            ..Unit::new(symbol, name, dimension, reference, Category::Logarithmic)
        }
    }

    pub fn no_prefixes(mut self) -> Self {
        self.prefixes = PrefixRule::Forbidden;
        self
    }

    pub fn in_systems(mut self, systems: &[SystemType]) -> Self {
        self.systems = systems.to_vec();
        self
    }

    pub fn is_linear(&self) -> bool {
        matches!(self.kind, UnitKind::Linear)
    }

    pub fn allows_prefixes(&self) -> bool {
        self.prefixes == PrefixRule::Allowed
    }

    /// Check if the unit can be used in `system`
    pub fn belongs_to(&self, system: SystemType) -> bool {
        self.systems.is_empty() || self.systems.contains(&system)
    }

    /// Convert a value in this unit to the SI reference
    pub fn to_base(&self, x: f64) -> f64 {
        match self.kind {
            UnitKind::Linear => x * self.factor,
            UnitKind::Affine { offset } => x * self.factor + offset,
            UnitKind::Logarithmic { radix, multiplier } => self.factor * radix.powf(x / multiplier),
        }
    }

    /// Convert a value in the SI reference to this unit
    pub fn from_base(&self, y: f64) -> Result<f64> {
        match self.kind {
            UnitKind::Linear => Ok(y / self.factor),
            UnitKind::Affine { offset } => Ok((y - offset) / self.factor),
            UnitKind::Logarithmic { radix, multiplier } => {
                let ratio = y / self.factor;
                if ratio <= 0.0 || !ratio.is_finite() {
                    return Err(UnitError::domain_fault(format!(
                        "{} of a non-positive value {}",
                        self.symbol, y
                    )));
                }
                Ok(multiplier * ratio.ln() / radix.ln())
            }
        }
    }

    /// Derivative of `to_base` at `x`
    pub fn to_base_slope(&self, x: f64) -> f64 {
        match self.kind {
            UnitKind::Linear | UnitKind::Affine { .. } => self.factor,
            UnitKind::Logarithmic { radix, multiplier } => {
                self.factor * radix.powf(x / multiplier) * radix.ln() / multiplier
            }
        }
    }

    /// Derivative of `from_base` at `y`
    pub fn from_base_slope(&self, y: f64) -> f64 {
        match self.kind {
            UnitKind::Linear | UnitKind::Affine { .. } => 1.0 / self.factor,
            UnitKind::Logarithmic { radix, multiplier } => multiplier / (y * radix.ln()),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}
