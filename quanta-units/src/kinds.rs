//! Quantity kinds
//!
//! A quantity kind names a physical dimension (`B` is magnetic flux
//! density). Kinds are used as a conversion context and, written as `<B>`,
//! as a unit whose size is the system's preferred base-unit combination.

use quanta_core::{Result, UnitError};

use crate::Dimension;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantityKind {
    pub symbol: &'static str,
    pub name: &'static str,
    pub dimension: Dimension,
}

const fn kind(symbol: &'static str, name: &'static str, dimension: Dimension) -> QuantityKind {
    QuantityKind { symbol, name, dimension }
}

pub static KINDS: &[QuantityKind] = &[
    kind("l", "length", Dimension::LENGTH),
    kind("m", "mass", Dimension::MASS),
    kind("t", "time", Dimension::TIME),
    kind("I", "electric current", Dimension::CURRENT),
    kind("T", "temperature", Dimension::TEMPERATURE),
    kind("N", "amount of substance", Dimension::AMOUNT),
    kind("Iv", "luminous intensity", Dimension::LUMINOSITY),
    kind("A", "area", Dimension::AREA),
    kind("V", "volume", Dimension::VOLUME),
    kind("v", "velocity", Dimension::VELOCITY),
    kind("a", "acceleration", Dimension::ACCELERATION),
    kind("F", "force", Dimension::FORCE),
    kind("p", "pressure", Dimension::PRESSURE),
    kind("E", "energy", Dimension::ENERGY),
    kind("P", "power", Dimension::POWER),
    kind("f", "frequency", Dimension::FREQUENCY),
    kind("Q", "electric charge", Dimension::CHARGE),
    kind("U", "electric potential", Dimension::VOLTAGE),
    kind("R", "electric resistance", Dimension::RESISTANCE),
    kind("C", "capacitance", Dimension::CAPACITANCE),
    kind("B", "magnetic flux density", Dimension::MAGNETIC_FLUX_DENSITY),
    kind("Phi", "magnetic flux", Dimension::MAGNETIC_FLUX),
    kind("H", "magnetic field strength", Dimension::MAGNETIC_FIELD),
    kind("rho", "mass density", Dimension::DENSITY),
];

/// Look up a quantity kind by symbol, with or without angle brackets
pub fn lookup_kind(symbol: &str) -> Result<&'static QuantityKind> {
    let bare = symbol
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(symbol);
    KINDS
        .iter()
        .find(|k| k.symbol == bare)
        .ok_or_else(|| UnitError::unknown_unit(format!("quantity kind '{}'", symbol)))
}
