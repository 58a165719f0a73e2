//! Dimensional analysis types
//!
//! Each physical quantity has dimensions represented as a 7-element vector
//! of rational exponents:
//! [length, mass, time, current, temperature, amount, luminosity]

use num_rational::Ratio;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;

use quanta_core::{Result, UnitError};

/// Rational exponent of a base dimension or unit atom
pub type Exponent = Ratio<i32>;

/// Dimension indices for the 7 SI base quantities
pub const LENGTH: usize = 0;
pub const MASS: usize = 1;
pub const TIME: usize = 2;
pub const CURRENT: usize = 3;
pub const TEMPERATURE: usize = 4;
pub const AMOUNT: usize = 5;
pub const LUMINOSITY: usize = 6;

/// Number of base dimensions
pub const BASE_COUNT: usize = 7;

/// Symbols of the base dimensions, in index order
pub const SYMBOLS: [&str; BASE_COUNT] = ["L", "M", "T", "I", "Θ", "N", "J"];

/// Largest numerator or denominator a unit or dimension exponent may have
pub const MAX_EXPONENT: i32 = 1 << 16;

/// Integer exponent
pub const fn exp(n: i32) -> Exponent {
    Ratio::new_raw(n, 1)
}

/// Reduce a wide ratio back to an exponent within `MAX_EXPONENT`
fn narrow(numer: i128, denom: i128) -> Result<Exponent> {
    let r = Ratio::new(numer, denom);
    let limit = i128::from(MAX_EXPONENT);
    if r.numer().abs() > limit || *r.denom() > limit {
        return Err(UnitError::domain_fault(format!(
            "exponent {} exceeds the supported range of ±{}",
            r, MAX_EXPONENT
        )));
    }
    Ok(Ratio::new_raw(*r.numer() as i32, *r.denom() as i32))
}

fn wide(e: Exponent) -> (i128, i128) {
    (i128::from(*e.numer()), i128::from(*e.denom()))
}

/// Check that an exponent lies within `MAX_EXPONENT`
pub fn bounded(e: Exponent) -> Result<Exponent> {
    let (n, d) = wide(e);
    narrow(n, d)
}

/// `a + b`, failing instead of overflowing
pub fn checked_add(a: Exponent, b: Exponent) -> Result<Exponent> {
    let ((an, ad), (bn, bd)) = (wide(a), wide(b));
    narrow(an * bd + bn * ad, ad * bd)
}

/// `a * b`, failing instead of overflowing
pub fn checked_mul(a: Exponent, b: Exponent) -> Result<Exponent> {
    let ((an, ad), (bn, bd)) = (wide(a), wide(b));
    narrow(an * bn, ad * bd)
}

const fn dim(e: [i32; BASE_COUNT]) -> Dimension {
    Dimension {
        exponents: [
            exp(e[0]),
            exp(e[1]),
            exp(e[2]),
            exp(e[3]),
            exp(e[4]),
            exp(e[5]),
            exp(e[6]),
        ],
    }
}

/// Represents the dimensions of a physical quantity
/// as exponents of the 7 SI base dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    /// [length, mass, time, current, temperature, amount, luminosity]
    pub exponents: [Exponent; BASE_COUNT],
}

impl Dimension {
    /// Dimensionless quantity (all exponents zero)
    pub const DIMENSIONLESS: Dimension = dim([0, 0, 0, 0, 0, 0, 0]);

    /// Length dimension [L]
    pub const LENGTH: Dimension = dim([1, 0, 0, 0, 0, 0, 0]);

    /// Mass dimension [M]
    pub const MASS: Dimension = dim([0, 1, 0, 0, 0, 0, 0]);

    /// Time dimension [T]
    pub const TIME: Dimension = dim([0, 0, 1, 0, 0, 0, 0]);

    /// Electric current dimension [I]
    pub const CURRENT: Dimension = dim([0, 0, 0, 1, 0, 0, 0]);

    /// Temperature dimension [Θ]
    pub const TEMPERATURE: Dimension = dim([0, 0, 0, 0, 1, 0, 0]);

    /// Amount of substance dimension [N]
    pub const AMOUNT: Dimension = dim([0, 0, 0, 0, 0, 1, 0]);

    /// Luminous intensity dimension [J]
    pub const LUMINOSITY: Dimension = dim([0, 0, 0, 0, 0, 0, 1]);

    pub const AREA: Dimension = dim([2, 0, 0, 0, 0, 0, 0]);
    pub const VOLUME: Dimension = dim([3, 0, 0, 0, 0, 0, 0]);
    pub const FREQUENCY: Dimension = dim([0, 0, -1, 0, 0, 0, 0]);
    pub const VELOCITY: Dimension = dim([1, 0, -1, 0, 0, 0, 0]);
    pub const ACCELERATION: Dimension = dim([1, 0, -2, 0, 0, 0, 0]);
    pub const FORCE: Dimension = dim([1, 1, -2, 0, 0, 0, 0]);
    pub const PRESSURE: Dimension = dim([-1, 1, -2, 0, 0, 0, 0]);
    pub const ENERGY: Dimension = dim([2, 1, -2, 0, 0, 0, 0]);
    pub const POWER: Dimension = dim([2, 1, -3, 0, 0, 0, 0]);
    pub const ACTION: Dimension = dim([2, 1, -1, 0, 0, 0, 0]);
    pub const DENSITY: Dimension = dim([-3, 1, 0, 0, 0, 0, 0]);
    pub const DYNAMIC_VISCOSITY: Dimension = dim([-1, 1, -1, 0, 0, 0, 0]);
    pub const KINEMATIC_VISCOSITY: Dimension = dim([2, 0, -1, 0, 0, 0, 0]);
    pub const CHARGE: Dimension = dim([0, 0, 1, 1, 0, 0, 0]);
    pub const VOLTAGE: Dimension = dim([2, 1, -3, -1, 0, 0, 0]);
    pub const CAPACITANCE: Dimension = dim([-2, -1, 4, 2, 0, 0, 0]);
    pub const RESISTANCE: Dimension = dim([2, 1, -3, -2, 0, 0, 0]);
    pub const CONDUCTANCE: Dimension = dim([-2, -1, 3, 2, 0, 0, 0]);
    pub const MAGNETIC_FLUX: Dimension = dim([2, 1, -2, -1, 0, 0, 0]);
    pub const MAGNETIC_FLUX_DENSITY: Dimension = dim([0, 1, -2, -1, 0, 0, 0]);
    pub const MAGNETIC_FIELD: Dimension = dim([-1, 0, 0, 1, 0, 0, 0]);
    pub const INDUCTANCE: Dimension = dim([2, 1, -2, -2, 0, 0, 0]);
    pub const ILLUMINANCE: Dimension = dim([-2, 0, 0, 0, 0, 0, 1]);
    pub const ABSORBED_DOSE: Dimension = dim([2, 0, -2, 0, 0, 0, 0]);
    pub const CATALYTIC_ACTIVITY: Dimension = dim([0, 0, -1, 0, 0, 1, 0]);
    pub const HEAT_CAPACITY: Dimension = dim([2, 1, -2, 0, -1, 0, 0]);
    pub const MOLAR_HEAT_CAPACITY: Dimension = dim([2, 1, -2, 0, -1, -1, 0]);
    pub const PERMITTIVITY: Dimension = dim([-3, -1, 4, 2, 0, 0, 0]);
    pub const PERMEABILITY: Dimension = dim([1, 1, -2, -2, 0, 0, 0]);
    pub const GRAVITATIONAL: Dimension = dim([3, -1, -2, 0, 0, 0, 0]);
    pub const RADIANT_EXITANCE_PER_T4: Dimension = dim([0, 1, -3, 0, -4, 0, 0]);
    pub const PER_AMOUNT: Dimension = dim([0, 0, 0, 0, 0, -1, 0]);

    /// Create a dimension from integer exponents
    pub fn new(exponents: [i32; BASE_COUNT]) -> Self {
        dim(exponents)
    }

    /// Check if this is a dimensionless quantity
    pub fn is_dimensionless(&self) -> bool {
        self.exponents.iter().all(|e| e.is_zero())
    }

    /// Index of the base dimension when exactly one exponent is 1
    /// and all others are zero
    pub fn single_base(&self) -> Option<usize> {
        let mut found = None;
        for (i, e) in self.exponents.iter().enumerate() {
            if e.is_zero() {
                continue;
            }
            if *e != exp(1) || found.is_some() {
                return None;
            }
            found = Some(i);
        }
        found
    }

    /// Multiply dimensions (add exponents)
    pub fn multiply(&self, other: &Dimension) -> Result<Dimension> {
        let mut result = self.exponents;
        for (r, o) in result.iter_mut().zip(other.exponents.iter()) {
            *r = checked_add(*r, *o)?;
        }
        Ok(Dimension { exponents: result })
    }

    /// Divide dimensions (subtract exponents)
    pub fn divide(&self, other: &Dimension) -> Result<Dimension> {
        self.multiply(&other.invert())
    }

    /// Raise to a rational power (multiply exponents)
    pub fn power(&self, n: Exponent) -> Result<Dimension> {
        let mut result = self.exponents;
        for r in result.iter_mut() {
            *r = checked_mul(*r, n)?;
        }
        Ok(Dimension { exponents: result })
    }

    /// Invert dimensions (negate exponents)
    pub fn invert(&self) -> Dimension {
        Dimension {
            exponents: self.exponents.map(|e| -e),
        }
    }

    /// Check if two dimensions can be added or converted into each other
    pub fn is_compatible(&self, other: &Dimension) -> bool {
        self == other
    }

    /// Fail with `DimensionMismatch` unless both dimensions are equal
    pub fn ensure_compatible(&self, other: &Dimension) -> Result<()> {
        if self.is_compatible(other) {
            Ok(())
        } else {
            Err(UnitError::dimension_mismatch(self.to_string(), other.to_string()))
        }
    }

    /// Get the dimension name if it matches a common dimension
    pub fn name(&self) -> Option<&'static str> {
        const NAMED: &[(Dimension, &str)] = &[
            (Dimension::DIMENSIONLESS, "dimensionless"),
            (Dimension::LENGTH, "length"),
            (Dimension::MASS, "mass"),
            (Dimension::TIME, "time"),
            (Dimension::CURRENT, "current"),
            (Dimension::TEMPERATURE, "temperature"),
            (Dimension::AMOUNT, "amount"),
            (Dimension::LUMINOSITY, "luminosity"),
            (Dimension::AREA, "area"),
            (Dimension::VOLUME, "volume"),
            (Dimension::VELOCITY, "velocity"),
            (Dimension::ACCELERATION, "acceleration"),
            (Dimension::FORCE, "force"),
            (Dimension::ENERGY, "energy"),
            (Dimension::POWER, "power"),
            (Dimension::PRESSURE, "pressure"),
            (Dimension::FREQUENCY, "frequency"),
            (Dimension::CHARGE, "charge"),
            (Dimension::VOLTAGE, "voltage"),
            (Dimension::RESISTANCE, "resistance"),
        ];
        NAMED.iter().find(|(d, _)| d == self).map(|(_, n)| *n)
    }
}

/// Format a rational exponent: `2`, `-1`, `1/2`
pub(crate) fn format_exponent(e: &Exponent, separator: char) -> String {
    if *e.denom() == 1 {
        e.numer().to_string()
    } else {
        format!("{}{}{}", e.numer(), separator, e.denom())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        for (i, e) in self.exponents.iter().enumerate() {
            if e.is_zero() {
                continue;
            }
            if *e == exp(1) {
                parts.push(SYMBOLS[i].to_string());
            } else {
                parts.push(format!("{}^{}", SYMBOLS[i], format_exponent(e, '/')));
            }
        }

        if parts.is_empty() {
            write!(f, "1")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self::DIMENSIONLESS
    }
}
