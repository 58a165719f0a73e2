//! Decimal and binary unit prefixes

use quanta_core::{Result, UnitError};
use std::fmt;

/// A multiplicative prefix such as `k` (10^3) or `Ki` (2^10)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prefix {
    pub symbol: &'static str,
    pub name: &'static str,
    pub factor: f64,
    /// Power of two rather than power of ten
    pub binary: bool,
}

const fn decimal(symbol: &'static str, name: &'static str, factor: f64) -> Prefix {
    Prefix { symbol, name, factor, binary: false }
}

const fn binary(symbol: &'static str, name: &'static str, factor: f64) -> Prefix {
    Prefix { symbol, name, factor, binary: true }
}

/// All known prefixes; the three micro spellings share one factor
pub static PREFIXES: &[Prefix] = &[
    decimal("Q", "quetta", 1e30),
    decimal("R", "ronna", 1e27),
    decimal("Y", "yotta", 1e24),
    decimal("Z", "zetta", 1e21),
    decimal("E", "exa", 1e18),
    decimal("P", "peta", 1e15),
    decimal("T", "tera", 1e12),
    decimal("G", "giga", 1e9),
    decimal("M", "mega", 1e6),
    decimal("k", "kilo", 1e3),
    decimal("h", "hecto", 1e2),
    decimal("da", "deca", 1e1),
    decimal("d", "deci", 1e-1),
    decimal("c", "centi", 1e-2),
    decimal("m", "milli", 1e-3),
    decimal("u", "micro", 1e-6),
    decimal("µ", "micro", 1e-6),
    decimal("μ", "micro", 1e-6),
    decimal("n", "nano", 1e-9),
    decimal("p", "pico", 1e-12),
    decimal("f", "femto", 1e-15),
    decimal("a", "atto", 1e-18),
    decimal("z", "zepto", 1e-21),
    decimal("y", "yocto", 1e-24),
    decimal("r", "ronto", 1e-27),
    decimal("q", "quecto", 1e-30),
    binary("Ki", "kibi", 1024.0),
    binary("Mi", "mebi", 1048576.0),
    binary("Gi", "gibi", 1073741824.0),
    binary("Ti", "tebi", 1099511627776.0),
    binary("Pi", "pebi", 1125899906842624.0),
    binary("Ei", "exbi", 1152921504606846976.0),
    binary("Zi", "zebi", 1180591620717411303424.0),
    binary("Yi", "yobi", 1208925819614629174706176.0),
];

/// Look up a prefix by its exact symbol
pub fn lookup_prefix(symbol: &str) -> Result<&'static Prefix> {
    PREFIXES
        .iter()
        .find(|p| p.symbol == symbol)
        .ok_or_else(|| UnitError::unknown_unit(format!("prefix '{}'", symbol)))
}

/// Split `token` into a known prefix and the remainder
///
/// Longer prefixes are tried first so `da` and `Ki` win over `d` and `K`.
/// Candidates are returned in that order; the caller decides which remainder
/// is an actual unit.
pub fn split_prefix(token: &str) -> Vec<(&'static Prefix, &str)> {
    let mut candidates: Vec<(&'static Prefix, &str)> = PREFIXES
        .iter()
        .filter(|p| token.len() > p.symbol.len() && token.starts_with(p.symbol))
        .map(|p| (p, &token[p.symbol.len()..]))
        .collect();
    candidates.sort_by(|a, b| b.0.symbol.len().cmp(&a.0.symbol.len()));
    candidates
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}
