//! Quantity type combining a magnitude, a compound unit and a unit system

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use quanta_core::format::{format_magnitude, DEFAULT_PRECISION};
use quanta_core::{ArrayValue, Magnitude, Result, UnitError};

use crate::calc::Calculator;
use crate::compound::ratio_to_f64;
use crate::dimension::Exponent;
use crate::kinds::lookup_kind;
use crate::system::active_system;
use crate::{registry, CompoundUnit, Dformat, Dimension, SystemType};

/// Arithmetic operators shared by quantities and the calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }
}

/// Anything that can be turned into a magnitude
pub trait IntoMagnitude {
    fn into_magnitude(self) -> Result<Magnitude>;
}

impl IntoMagnitude for Magnitude {
    fn into_magnitude(self) -> Result<Magnitude> {
        Ok(self)
    }
}

impl IntoMagnitude for f64 {
    fn into_magnitude(self) -> Result<Magnitude> {
        Ok(Magnitude::scalar(self))
    }
}

impl IntoMagnitude for (f64, f64) {
    fn into_magnitude(self) -> Result<Magnitude> {
        Magnitude::with_error(self.0, self.1)
    }
}

impl IntoMagnitude for ArrayValue {
    fn into_magnitude(self) -> Result<Magnitude> {
        Ok(Magnitude::exact(self))
    }
}

impl IntoMagnitude for (ArrayValue, ArrayValue) {
    fn into_magnitude(self) -> Result<Magnitude> {
        Magnitude::new(self.0, self.1)
    }
}

impl IntoMagnitude for Vec<f64> {
    fn into_magnitude(self) -> Result<Magnitude> {
        Ok(Magnitude::exact(ArrayValue::from_vec(self)))
    }
}

impl IntoMagnitude for (Vec<f64>, Vec<f64>) {
    fn into_magnitude(self) -> Result<Magnitude> {
        Magnitude::new(ArrayValue::from_vec(self.0), ArrayValue::from_vec(self.1))
    }
}

/// Values or errors of a quantity in the requested shape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Values {
    Scalar(f64),
    List(Vec<f64>),
    Array(ArrayValue),
}

impl Values {
    fn from_array(array: &ArrayValue, as_array: bool) -> Values {
        if as_array {
            Values::Array(array.clone())
        } else if array.len() == 1 {
            Values::Scalar(array.at(0))
        } else {
            Values::List(array.as_slice().to_vec())
        }
    }
}

/// A magnitude with units and the unit system it was expressed in
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    magnitude: Magnitude,
    units: CompoundUnit,
    system: SystemType,
}

impl Quantity {
    /// Create a quantity in the active unit system
    ///
    /// `unit` is a unit expression such as `"km/h"`; a numeric factor in it
    /// multiplies the magnitude.
    pub fn new(magnitude: impl IntoMagnitude, unit: &str) -> Result<Self> {
        Self::in_system(magnitude, unit, active_system())
    }

    /// Create a quantity whose unit expression is resolved in `system`
    pub fn in_system(magnitude: impl IntoMagnitude, unit: &str, system: SystemType) -> Result<Self> {
        let magnitude = magnitude.into_magnitude()?;
        if unit.trim().is_empty() {
            return Ok(Self::from_parts(magnitude, CompoundUnit::unitless(), system));
        }
        let label = Calculator::new().with_system(system).solve(unit)?;
        Ok(Quantity {
            magnitude: magnitude.mul(&label.magnitude)?,
            units: label.units,
            system: label.system,
        })
    }

    /// Unitless quantity in the active unit system
    pub fn dimensionless(magnitude: impl IntoMagnitude) -> Result<Self> {
        Ok(Self::from_parts(
            magnitude.into_magnitude()?,
            CompoundUnit::unitless(),
            active_system(),
        ))
    }

    pub fn from_parts(magnitude: Magnitude, units: CompoundUnit, system: SystemType) -> Self {
        Quantity {
            magnitude,
            units,
            system,
        }
    }

    /// Evaluate an expression such as `"3.2 km/h + 400 m/min"`
    pub fn parse(expr: &str) -> Result<Self> {
        Calculator::new().solve(expr)
    }

    pub fn parse_in(expr: &str, system: SystemType) -> Result<Self> {
        Calculator::new().with_system(system).solve(expr)
    }

    // ========== Inspection ==========

    pub fn unit_system(&self) -> SystemType {
        self.system
    }

    pub fn dimension(&self) -> Dimension {
        self.units.dimension()
    }

    pub fn units(&self) -> &CompoundUnit {
        &self.units
    }

    pub fn magnitude(&self) -> &Magnitude {
        &self.magnitude
    }

    pub fn size(&self) -> usize {
        self.magnitude.len()
    }

    pub fn shape(&self) -> &[usize] {
        self.magnitude.shape()
    }

    pub fn value(&self, as_array: bool) -> Values {
        Values::from_array(self.magnitude.value(), as_array)
    }

    pub fn error(&self, as_array: bool) -> Values {
        Values::from_array(self.magnitude.error(), as_array)
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimension().is_dimensionless()
    }

    // ========== Arithmetic ==========

    pub fn add(&self, rhs: impl Into<Operand>) -> Result<Quantity> {
        apply(self, BinOp::Add, rhs)
    }

    pub fn sub(&self, rhs: impl Into<Operand>) -> Result<Quantity> {
        apply(self, BinOp::Sub, rhs)
    }

    pub fn mul(&self, rhs: impl Into<Operand>) -> Result<Quantity> {
        apply(self, BinOp::Mul, rhs)
    }

    pub fn div(&self, rhs: impl Into<Operand>) -> Result<Quantity> {
        apply(self, BinOp::Div, rhs)
    }

    /// Raise to a rational power
    pub fn pow(&self, exponent: Exponent) -> Result<Quantity> {
        if !self.units.is_linear() && exponent != Exponent::from_integer(1) {
            return Err(UnitError::incompatible_kind(format!(
                "non-linear unit '{}' cannot be raised to a power",
                self.units
            )));
        }
        let units = self.units.power(exponent)?;
        Ok(Quantity {
            magnitude: self.magnitude.powf(ratio_to_f64(&exponent))?,
            units,
            system: self.system,
        })
    }

    pub fn neg(&self) -> Quantity {
        Quantity {
            magnitude: self.magnitude.neg(),
            units: self.units.clone(),
            system: self.system,
        }
    }

    fn add_like(&self, rhs: &Quantity, op: BinOp) -> Result<Quantity> {
        self.dimension().ensure_compatible(&rhs.dimension())?;
        let combine = |a: &Magnitude, b: &Magnitude| match op {
            BinOp::Sub => a.sub(b),
            _ => a.add(b),
        };

        let magnitude = if self.units.is_linear() {
            let right = convert_magnitude(&rhs.magnitude, &rhs.units, &self.units)?;
            combine(&self.magnitude, &right)?
        } else {
            let left = self.units.to_base(&self.magnitude)?;
            let right = rhs.units.to_base(&rhs.magnitude)?;
            self.units.from_base(&combine(&left, &right)?)?
        };

        Ok(Quantity {
            magnitude,
            units: self.units.clone(),
            system: self.system,
        })
    }

    fn mul_like(&self, rhs: &Quantity, op: BinOp) -> Result<Quantity> {
        let left_nonlinear = !self.units.is_linear();
        let right_nonlinear = !rhs.units.is_linear();
        if left_nonlinear || right_nonlinear {
            let scaled_only = match op {
                BinOp::Div => left_nonlinear && rhs.units.is_unitless(),
                _ => {
                    (left_nonlinear && rhs.units.is_unitless())
                        || (right_nonlinear && self.units.is_unitless())
                }
            };
            if !scaled_only {
                return Err(UnitError::incompatible_kind(format!(
                    "'{}' {} '{}' combines a non-linear unit",
                    self.units,
                    op.symbol(),
                    rhs.units
                )));
            }
        }

        let (magnitude, units) = match op {
            BinOp::Div => (
                self.magnitude.div(&rhs.magnitude)?,
                self.units.divide(&rhs.units)?,
            ),
            _ => (
                self.magnitude.mul(&rhs.magnitude)?,
                self.units.multiply(&rhs.units)?,
            ),
        };
        Ok(Quantity {
            magnitude,
            units,
            system: self.system,
        })
    }

    // ========== Conversion ==========

    /// Convert into `target` units of the quantity's own system
    pub fn convert(&self, target: &str) -> Result<Quantity> {
        self.convert_to(target, self.system, None)
    }

    /// Convert into `target` units resolved in `system`
    ///
    /// An empty target selects the preferred base units of `system`.
    pub fn convert_in(&self, target: &str, system: SystemType) -> Result<Quantity> {
        self.convert_to(target, system, None)
    }

    /// Convert using a quantity kind such as `"I"` or `"B"` as context
    pub fn convert_kind(&self, target: &str, system: SystemType, kind: &str) -> Result<Quantity> {
        self.convert_to(target, system, Some(kind))
    }

    /// Express the quantity in the base units of a dimension format
    ///
    /// The quantity keeps its system when that system knows the format's
    /// units; otherwise the result moves to the format's native system.
    pub fn convert_format(&self, format: Dformat) -> Result<Quantity> {
        let dimension = self.dimension();
        let symbols = format.base_units();
        let (units, system) = match base_units_for(&dimension, &symbols, self.system) {
            Ok(units) => (units, self.system),
            Err(_) => {
                let native = format.native_system();
                (base_units_for(&dimension, &symbols, native)?, native)
            }
        };
        self.convert_units(&units, system)
    }

    /// Express the quantity in the base units of a format, resolved in `system`
    pub fn convert_format_in(&self, format: Dformat, system: SystemType) -> Result<Quantity> {
        let units = base_units_for(&self.dimension(), &format.base_units(), system)?;
        self.convert_units(&units, system)
    }

    /// Convert into already resolved units
    pub fn convert_units(&self, units: &CompoundUnit, system: SystemType) -> Result<Quantity> {
        self.dimension().ensure_compatible(&units.dimension())?;
        debug!(from = %self.units, to = %units, system = %system, "converting quantity");
        Ok(Quantity {
            magnitude: convert_magnitude(&self.magnitude, &self.units, units)?,
            units: units.clone(),
            system,
        })
    }

    fn convert_to(&self, target: &str, system: SystemType, kind: Option<&str>) -> Result<Quantity> {
        if let Some(kind) = kind {
            self.dimension().ensure_compatible(&lookup_kind(kind)?.dimension)?;
        }

        if target.trim().is_empty() {
            let units = base_units_for(&self.dimension(), &system.preferred_units(), system)?;
            return self.convert_units(&units, system);
        }

        let label = Calculator::new().with_system(system).solve(target)?;
        if !label.magnitude.is_exactly(1.0) {
            return Err(UnitError::parse_error(
                0,
                target,
                "conversion target must be a unit expression without a numeric factor",
            ));
        }
        self.convert_units(&label.units, label.system)
    }

    /// Merge atoms of the same unit into one prefix
    pub fn rebase_prefixes(&self) -> Result<Quantity> {
        let (factor, units) = self.units.rebase_prefixes()?;
        Ok(self.rescaled(factor, units))
    }

    /// Merge atoms measuring the same base dimension into one unit
    pub fn rebase_dimensions(&self) -> Result<Quantity> {
        let (factor, units) = self.units.rebase_dimensions()?;
        Ok(self.rescaled(factor, units))
    }

    fn rescaled(&self, factor: f64, units: CompoundUnit) -> Quantity {
        Quantity {
            magnitude: self.magnitude.scale(factor),
            units,
            system: self.system,
        }
    }

    // ========== Output ==========

    /// Render as `value*units` with `precision` significant digits
    pub fn render(&self, precision: usize) -> String {
        let magnitude = format_magnitude(&self.magnitude, precision);
        if self.units.is_unitless() {
            magnitude
        } else {
            format!("{}*{}", magnitude, self.units)
        }
    }
}

/// Convert a magnitude between two compound units of equal dimension
fn convert_magnitude(magnitude: &Magnitude, from: &CompoundUnit, to: &CompoundUnit) -> Result<Magnitude> {
    if from.is_linear() && to.is_linear() {
        Ok(magnitude.scale(from.factor() / to.factor()))
    } else {
        to.from_base(&from.to_base(magnitude)?)
    }
}

/// Compound of base units for `dimension`, ordered L M T I Θ N J
fn base_units_for(dimension: &Dimension, symbols: &[&str; 7], system: SystemType) -> Result<CompoundUnit> {
    let mut atoms = Vec::new();
    for (exponent, symbol) in dimension.exponents.iter().zip(symbols.iter()) {
        if *exponent.numer() == 0 {
            continue;
        }
        atoms.push(registry().resolve(symbol, system)?.with_exponent(*exponent));
    }
    CompoundUnit::from_atoms(atoms)
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(f.precision().unwrap_or(DEFAULT_PRECISION)))
    }
}

impl FromStr for Quantity {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self> {
        Quantity::parse(s)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Quantity", 6)?;
        state.serialize_field("value", &self.value(false))?;
        state.serialize_field("error", &self.error(false))?;
        state.serialize_field("shape", self.shape())?;
        state.serialize_field("units", &self.units.to_string())?;
        state.serialize_field("dimension", &self.dimension().to_string())?;
        state.serialize_field("system", &self.system)?;
        state.end()
    }
}

/// One side of a binary operation
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(f64),
    Array(ArrayValue),
    Quantity(Quantity),
}

impl Operand {
    fn system(&self) -> Option<SystemType> {
        match self {
            Operand::Quantity(q) => Some(q.system),
            _ => None,
        }
    }

    fn into_quantity(self, system: SystemType) -> Quantity {
        match self {
            Operand::Scalar(x) => Quantity::from_parts(Magnitude::scalar(x), CompoundUnit::unitless(), system),
            Operand::Array(a) => Quantity::from_parts(Magnitude::exact(a), CompoundUnit::unitless(), system),
            Operand::Quantity(q) => q,
        }
    }
}

impl From<f64> for Operand {
    fn from(x: f64) -> Self {
        Operand::Scalar(x)
    }
}

impl From<ArrayValue> for Operand {
    fn from(a: ArrayValue) -> Self {
        Operand::Array(a)
    }
}

impl From<Vec<f64>> for Operand {
    fn from(values: Vec<f64>) -> Self {
        Operand::Array(ArrayValue::from_vec(values))
    }
}

impl From<Quantity> for Operand {
    fn from(q: Quantity) -> Self {
        Operand::Quantity(q)
    }
}

impl From<&Quantity> for Operand {
    fn from(q: &Quantity) -> Self {
        Operand::Quantity(q.clone())
    }
}

/// Apply `op` to two operands
///
/// The result is bound to the left quantity's system; a bare number on the
/// left takes the system of the right operand.
pub fn apply(lhs: impl Into<Operand>, op: BinOp, rhs: impl Into<Operand>) -> Result<Quantity> {
    let (lhs, rhs) = (lhs.into(), rhs.into());
    let system = lhs.system().or(rhs.system()).unwrap_or_else(active_system);
    let lhs = lhs.into_quantity(system);
    let rhs = rhs.into_quantity(system);
    match op {
        BinOp::Add | BinOp::Sub => lhs.add_like(&rhs, op),
        BinOp::Mul | BinOp::Div => lhs.mul_like(&rhs, op),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::exp;
    use crate::UnitSystem;

    fn q(magnitude: impl IntoMagnitude, unit: &str) -> Quantity {
        Quantity::new(magnitude, unit).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    fn scalar(values: Values) -> f64 {
        match values {
            Values::Scalar(x) => x,
            other => panic!("expected a scalar, got {other:?}"),
        }
    }

    #[test]
    fn test_init_scalars() {
        assert_eq!(q(23.0, "").to_string(), "23");
        assert_eq!(q(23.0, "km").to_string(), "23*km");
        let ft = Quantity::in_system(23.0, "ft", SystemType::US).unwrap();
        assert_eq!(ft.to_string(), "23*ft");
        assert_eq!(ft.unit_system(), SystemType::US);
        assert_eq!(Quantity::parse("23*km").unwrap().to_string(), "23*km");
    }

    #[test]
    fn test_init_arrays() {
        let a = q(vec![2.0, 3.0, 4.0], "");
        assert_eq!(a.to_string(), "{2, 3, ...}");
        assert_eq!(a.size(), 3);
        assert_eq!(q(vec![2.0, 3.0, 4.0], "km").to_string(), "{2, 3, ...}*km");
        let parsed = Quantity::parse_in("{2,3,4}*ft", SystemType::US).unwrap();
        assert_eq!(parsed.to_string(), "{2, 3, ...}*ft");
    }

    #[test]
    fn test_init_errors() {
        assert_eq!(q((23.34, 0.2), "").to_string(), "2.334(20)e+01");
        assert_eq!(q((23.34, 0.2), "km").to_string(), "2.334(20)e+01*km");
        let arr = q((vec![2.34, 3.45, 4.56], vec![0.1, 0.2, 0.3]), "km");
        assert_eq!(arr.to_string(), "{2.34(10), 3.45(20), ...}*km");
    }

    #[test]
    fn test_unit_system_tags() {
        assert_eq!(Quantity::parse("23*km").unwrap().unit_system(), SystemType::SI);
        assert_eq!(Quantity::parse("US_23*ft").unwrap().unit_system(), SystemType::US);
        {
            let _us = UnitSystem::new(SystemType::EMU);
            assert_eq!(Quantity::parse("abA").unwrap().unit_system(), SystemType::EMU);
        }
        assert_eq!(Quantity::parse("km").unwrap().unit_system(), SystemType::SI);
    }

    #[test]
    fn test_conversion_chain() {
        let km = q(23.0, "km");
        let m = km.convert("m").unwrap();
        assert_eq!(m.to_string(), "23000*m");
        let yd = m.convert_in("yd", SystemType::US).unwrap();
        assert_eq!(yd.unit_system(), SystemType::US);
        assert_eq!(yd.to_string(), "25153.1*yd");
        let cm = yd.convert_kind("cm", SystemType::ESU, "l").unwrap();
        assert_eq!(cm.unit_system(), SystemType::ESU);
        assert_eq!(cm.to_string(), "2.3e+06*cm");
    }

    #[test]
    fn test_conversion_with_kind() {
        let current = q(23.0, "A").convert_kind("statA", SystemType::ESU, "I").unwrap();
        assert_eq!(current.to_string(), "6.89523e+10*statA");

        let field = q(23.0, "<B>").convert_kind("<B>", SystemType::EMU, "B").unwrap();
        assert_eq!(field.unit_system(), SystemType::EMU);
        assert_eq!(field.to_string(), "230000*<B>");

        assert!(matches!(
            q(23.0, "A").convert_kind("statA", SystemType::ESU, "B"),
            Err(UnitError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_conversion_to_formats() {
        let energy = q(23.0, "J");
        assert_eq!(energy.convert_format(Dformat::MKS).unwrap().to_string(), "23*m2*kg*s-2");
        assert_eq!(energy.convert_format(Dformat::MGS).unwrap().to_string(), "23000*m2*g*s-2");
        assert_eq!(energy.convert_format(Dformat::CGS).unwrap().to_string(), "2.3e+08*cm2*g*s-2");
        let us = Quantity::in_system(23.0, "yd2*s/oz", SystemType::US).unwrap();
        assert_eq!(us.convert_format(Dformat::FPS).unwrap().to_string(), "3312*ft2*lb-1*s");

        let fps = energy.convert_format(Dformat::FPS).unwrap();
        assert_eq!(fps.unit_system(), SystemType::US);
        let cgs = energy.convert_format_in(Dformat::CGS, SystemType::ESU).unwrap();
        assert_eq!(cgs.unit_system(), SystemType::ESU);
        assert!(energy.convert_format_in(Dformat::FPS, SystemType::SI).is_err());
    }

    #[test]
    fn test_convert_to_system_base_units() {
        let speed = q(36.0, "km/h");
        let base = speed.convert("").unwrap();
        assert_eq!(base.to_string(), "10*m*s-1");
    }

    #[test]
    fn test_conversion_errors() {
        assert!(matches!(q(1.0, "km").convert("s"), Err(UnitError::DimensionMismatch { .. })));
        assert!(matches!(q(1.0, "km").convert("1000*m"), Err(UnitError::ParseError { .. })));
    }

    #[test]
    fn test_round_trip() {
        let original = q((12.5, 0.3), "km/h");
        let back = original
            .convert_in("ft/s", SystemType::US)
            .unwrap()
            .convert_in("km/h", SystemType::SI)
            .unwrap();
        assert!(close(scalar(back.value(false)), 12.5));
        assert!(close(scalar(back.error(false)), 0.3));
        assert_eq!(back.units(), original.units());
    }

    #[test]
    fn test_temperature() {
        let zero = q(0.0, "degC");
        let kelvin = zero.convert("K").unwrap();
        assert!(close(scalar(kelvin.value(false)), 273.15));
        let back = kelvin.convert("degC").unwrap();
        assert!(scalar(back.value(false)).abs() < 1e-9);

        let boiling = q(212.0, "degF").convert("degC").unwrap();
        assert!(close(scalar(boiling.value(false)), 100.0));
    }

    #[test]
    fn test_logarithmic() {
        let level = q(30.0, "dBm").convert("W").unwrap();
        assert!(close(scalar(level.value(false)), 1.0));
        let back = q(0.0, "W").convert("dBm");
        assert!(matches!(back, Err(UnitError::DomainFault(_))));
    }

    #[test]
    fn test_arithmetics_quantities() {
        let qq = q(21.0, "km");
        let r = q(3.0, "m");
        assert_eq!(qq.add(&r).unwrap().to_string(), "21.003*km");
        assert_eq!(qq.sub(&r).unwrap().to_string(), "20.997*km");
        assert_eq!(qq.mul(&r).unwrap().to_string(), "63*km*m");
        assert_eq!(qq.div(&r).unwrap().to_string(), "7*km*m-1");
    }

    #[test]
    fn test_arithmetics_scalars() {
        let n = q(12.0, "");
        let qq = q(21.0, "km");
        assert_eq!(n.add(2.0).unwrap().to_string(), "14");
        assert_eq!(apply(2.0, BinOp::Add, &n).unwrap().to_string(), "14");
        assert_eq!(n.sub(2.0).unwrap().to_string(), "10");
        assert_eq!(apply(2.0, BinOp::Sub, &n).unwrap().to_string(), "-10");
        assert_eq!(qq.mul(2.0).unwrap().to_string(), "42*km");
        assert_eq!(apply(2.0, BinOp::Mul, &qq).unwrap().to_string(), "42*km");
        assert_eq!(qq.div(2.0).unwrap().to_string(), "10.5*km");
        assert_eq!(apply(2.0, BinOp::Div, &qq).unwrap().to_string(), "0.0952381*km-1");
    }

    #[test]
    fn test_arithmetics_arrays() {
        let n = q(12.0, "");
        let qq = q(21.0, "km");
        let a = || vec![2.0, 3.0, 4.0];
        assert_eq!(n.add(a()).unwrap().to_string(), "{14, 15, ...}");
        assert_eq!(apply(a(), BinOp::Add, &n).unwrap().to_string(), "{14, 15, ...}");
        assert_eq!(n.sub(a()).unwrap().to_string(), "{10, 9, ...}");
        assert_eq!(apply(a(), BinOp::Sub, &n).unwrap().to_string(), "{-10, -9, ...}");
        assert_eq!(qq.mul(a()).unwrap().to_string(), "{42, 63, ...}*km");
        assert_eq!(apply(a(), BinOp::Mul, &qq).unwrap().to_string(), "{42, 63, ...}*km");
        assert_eq!(qq.div(a()).unwrap().to_string(), "{10.5, 7, ...}*km");
        assert_eq!(
            apply(a(), BinOp::Div, &qq).unwrap().to_string(),
            "{0.0952381, 0.142857, ...}*km-1"
        );
    }

    #[test]
    fn test_chained_units() {
        let r = q(4.0, "dm").mul(q(3.0, "m")).unwrap().div(q(6.0, "s")).unwrap();
        assert_eq!(r.to_string(), "2*dm*m*s-1");
    }

    #[test]
    fn test_error_propagation() {
        let sum = q((10.0, 1.0), "").add(q((20.0, 2.0), "")).unwrap();
        assert!(close(scalar(sum.value(false)), 30.0));
        assert!(close(scalar(sum.error(false)), 5f64.sqrt()));

        let product = q((4.0, 0.4), "m").mul(q((2.0, 0.2), "s")).unwrap();
        assert!(close(scalar(product.value(false)), 8.0));
        assert!((scalar(product.error(false)) - 1.131).abs() < 1e-3);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = q(3.0, "m").add(q(2.0, "s")).unwrap_err();
        assert!(matches!(err, UnitError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_shape_mismatch() {
        let three = q(vec![1.0, 2.0, 3.0], "m");
        assert_eq!(three.add(q(1.0, "m")).unwrap().shape(), &[3]);
        let err = three.add(q(vec![1.0, 2.0], "m")).unwrap_err();
        assert!(matches!(err, UnitError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_nonlinear_rules() {
        let t = q(10.0, "degC");
        assert_eq!(t.mul(2.0).unwrap().to_string(), "20*degC");
        assert_eq!(apply(2.0, BinOp::Mul, &t).unwrap().to_string(), "20*degC");
        assert_eq!(t.div(2.0).unwrap().to_string(), "5*degC");
        assert!(matches!(apply(2.0, BinOp::Div, &t), Err(UnitError::IncompatibleUnitKind { .. })));
        assert!(matches!(t.mul(q(1.0, "m")), Err(UnitError::IncompatibleUnitKind { .. })));
        assert!(matches!(t.pow(exp(2)), Err(UnitError::IncompatibleUnitKind { .. })));

        let sum = t.add(q(1.0, "K")).unwrap();
        assert_eq!(sum.units().to_string(), "degC");
        assert!(close(scalar(sum.value(false)), 11.0));

        // both operands are absolute temperatures: 293.15 K - 283.15 K = 10 K = -263.15 degC
        let diff = q(20.0, "degC").sub(q(10.0, "degC")).unwrap();
        assert_eq!(diff.units().to_string(), "degC");
        assert!(close(scalar(diff.value(false)), -263.15));
        let in_kelvin = q(20.0, "degC").convert("K").unwrap().sub(q(10.0, "degC")).unwrap();
        assert!(close(scalar(in_kelvin.value(false)), 10.0));
    }

    #[test]
    fn test_pow() {
        let area = q((3.0, 0.1), "m").pow(exp(2)).unwrap();
        assert_eq!(area.to_string(), "9.00(60)*m2");
        assert_eq!(area.dimension(), Dimension::AREA);
        let root = q(4.0, "m2").pow(Exponent::new(1, 2)).unwrap();
        assert_eq!(root.to_string(), "2*m");

        let uncertain_zero = q((0.0, 0.1), "m");
        assert!(matches!(
            uncertain_zero.pow(Exponent::new(1, 2)),
            Err(UnitError::DomainFault(_))
        ));
        assert!(matches!(q(1.0, "m").pow(exp(i32::MAX)), Err(UnitError::DomainFault(_))));
    }

    #[test]
    fn test_rebase() {
        let p = Quantity::parse("23*cm*m2*kg*mg").unwrap().rebase_prefixes().unwrap();
        assert_eq!(p.to_string(), "0.23*kg2*cm3");
        let d = Quantity::parse("23*km*au2*s2/h").unwrap().rebase_dimensions().unwrap();
        assert_eq!(d.to_string(), "1.4298e+14*km3*s");
    }

    #[test]
    fn test_magnitude_output() {
        let single = Quantity::parse("23.45(12)*km").unwrap();
        assert_eq!(single.value(false), Values::Scalar(23.45));
        assert!(close(scalar(single.error(false)), 0.12));

        let list = Quantity::parse("{2.23(12),3.5,4.48(94),5.293}*km").unwrap();
        match list.value(false) {
            Values::List(v) => assert_eq!(v, vec![2.23, 3.5, 4.48, 5.293]),
            other => panic!("unexpected {other:?}"),
        }
        match list.error(true) {
            Values::Array(a) => {
                assert_eq!(a.shape(), &[4]);
                assert!(close(a.at(2), 0.94));
                assert_eq!(a.at(3), 0.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_display_precision() {
        let third = q(1.0 / 3.0, "m");
        assert_eq!(format!("{}", third), "0.333333*m");
        assert_eq!(format!("{:.3}", third), "0.333*m");
    }
}
