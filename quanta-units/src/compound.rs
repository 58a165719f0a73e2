//! Compound unit labels such as `km*m*s-1`
//!
//! A `CompoundUnit` is an ordered list of prefixed unit atoms with rational
//! exponents. Its dimension and SI factor are derived from the atoms.

use num_traits::{One, Zero};
use std::collections::BTreeMap;
use std::fmt;

use quanta_core::{Magnitude, Result, UnitError};

use crate::dimension::{checked_add, checked_mul, format_exponent, Exponent};
use crate::{Dimension, Prefix, Unit};

/// One `prefix unit ^ exponent` factor of a compound unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitAtom {
    pub prefix: Option<&'static Prefix>,
    pub unit: &'static Unit,
    pub exponent: Exponent,
}

impl UnitAtom {
    pub fn new(prefix: Option<&'static Prefix>, unit: &'static Unit) -> Self {
        UnitAtom {
            prefix,
            unit,
            exponent: Exponent::one(),
        }
    }

    pub fn with_exponent(mut self, exponent: Exponent) -> Self {
        self.exponent = exponent;
        self
    }

    /// Prefix factor times unit factor, without the exponent
    pub fn scale(&self) -> f64 {
        self.prefix.map_or(1.0, |p| p.factor) * self.unit.factor
    }

    /// Factor to SI including the exponent
    pub fn factor(&self) -> f64 {
        self.scale().powf(ratio_to_f64(&self.exponent))
    }

    pub fn dimension(&self) -> Result<Dimension> {
        self.unit.dimension.power(self.exponent)
    }

    /// Prefixed symbol without exponent
    pub fn symbol(&self) -> String {
        match self.prefix {
            Some(p) => format!("{}{}", p.symbol, self.unit.symbol),
            None => self.unit.symbol.clone(),
        }
    }

    fn same_label(&self, other: &UnitAtom) -> bool {
        self.prefix.map(|p| p.symbol) == other.prefix.map(|p| p.symbol) && self.unit == other.unit
    }
}

impl fmt::Display for UnitAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exponent.is_one() {
            write!(f, "{}", self.symbol())
        } else {
            write!(f, "{}{}", self.symbol(), format_exponent(&self.exponent, ':'))
        }
    }
}

pub(crate) fn ratio_to_f64(r: &Exponent) -> f64 {
    *r.numer() as f64 / *r.denom() as f64
}

/// Product of unit atoms
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundUnit {
    atoms: Vec<UnitAtom>,
    dimension: Dimension,
}

impl Default for CompoundUnit {
    fn default() -> Self {
        Self::unitless()
    }
}

impl CompoundUnit {
    /// The empty label of a dimensionless number
    pub fn unitless() -> Self {
        CompoundUnit {
            atoms: Vec::new(),
            dimension: Dimension::DIMENSIONLESS,
        }
    }

    /// Wrap merged atoms, computing their combined dimension
    fn build(atoms: Vec<UnitAtom>) -> Result<Self> {
        let mut dimension = Dimension::DIMENSIONLESS;
        for atom in &atoms {
            dimension = dimension.multiply(&atom.dimension()?)?;
        }
        Ok(CompoundUnit { atoms, dimension })
    }

    pub fn from_atom(atom: UnitAtom) -> Result<Self> {
        Self::from_atoms(vec![atom])
    }

    /// Build a compound, merging repeated atoms
    pub fn from_atoms(atoms: Vec<UnitAtom>) -> Result<Self> {
        let mut merged = Vec::new();
        for atom in atoms {
            push(&mut merged, atom)?;
        }
        let compound = Self::build(merged)?;
        compound.validate()?;
        Ok(compound)
    }

    pub fn atoms(&self) -> &[UnitAtom] {
        &self.atoms
    }

    pub fn is_unitless(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Factor to the coherent SI unit (linear compounds only)
    pub fn factor(&self) -> f64 {
        self.atoms.iter().map(|a| a.factor()).product()
    }

    pub fn is_linear(&self) -> bool {
        self.atoms.iter().all(|a| a.unit.is_linear())
    }

    /// The single non-linear unit of a temperature or logarithmic label
    pub fn nonlinear_unit(&self) -> Option<&'static Unit> {
        self.atoms.iter().find(|a| !a.unit.is_linear()).map(|a| a.unit)
    }

    /// Reject non-linear units that are raised to a power or combined
    pub fn validate(&self) -> Result<()> {
        if let Some(unit) = self.nonlinear_unit() {
            if self.atoms.len() != 1 || !self.atoms[0].exponent.is_one() {
                return Err(UnitError::incompatible_kind(format!(
                    "non-linear unit '{}' cannot be combined with other units or raised to a power",
                    unit.symbol
                )));
            }
        }
        Ok(())
    }

    pub fn multiply(&self, other: &CompoundUnit) -> Result<CompoundUnit> {
        let mut atoms = self.atoms.clone();
        for atom in &other.atoms {
            push(&mut atoms, *atom)?;
        }
        let result = Self::build(atoms)?;
        result.validate()?;
        Ok(result)
    }

    pub fn divide(&self, other: &CompoundUnit) -> Result<CompoundUnit> {
        self.multiply(&other.power(-Exponent::one())?)
    }

    pub fn power(&self, n: Exponent) -> Result<CompoundUnit> {
        if n.is_zero() {
            return Ok(CompoundUnit::unitless());
        }
        let atoms = self
            .atoms
            .iter()
            .map(|a| Ok(a.with_exponent(checked_mul(a.exponent, n)?)))
            .collect::<Result<Vec<_>>>()?;
        Self::build(atoms)
    }

    /// Convert magnitudes in this unit to the SI reference
    pub fn to_base(&self, magnitude: &Magnitude) -> Result<Magnitude> {
        match self.nonlinear_unit() {
            Some(unit) => magnitude.map(|x| Ok(unit.to_base(x)), |x| unit.to_base_slope(x)),
            None => Ok(magnitude.scale(self.factor())),
        }
    }

    /// Convert magnitudes in the SI reference to this unit
    pub fn from_base(&self, magnitude: &Magnitude) -> Result<Magnitude> {
        match self.nonlinear_unit() {
            Some(unit) => magnitude.map(|y| unit.from_base(y), |y| unit.from_base_slope(y)),
            None => Ok(magnitude.scale(1.0 / self.factor())),
        }
    }

    /// Merge atoms of the same unit into the prefix of its first occurrence
    ///
    /// Groups are emitted in lexical order of the unit symbol. Returns the
    /// numeric factor that compensates for the changed prefixes.
    pub fn rebase_prefixes(&self) -> Result<(f64, CompoundUnit)> {
        if !self.is_linear() {
            return Ok((1.0, self.clone()));
        }
        let mut groups: BTreeMap<&str, Vec<&UnitAtom>> = BTreeMap::new();
        for atom in &self.atoms {
            groups.entry(atom.unit.symbol.as_str()).or_default().push(atom);
        }

        let mut factor = 1.0;
        let mut atoms = Vec::new();
        for members in groups.values() {
            let target = members[0];
            let mut exponent = Exponent::zero();
            for atom in members {
                factor *= (atom.scale() / target.scale()).powf(ratio_to_f64(&atom.exponent));
                exponent = checked_add(exponent, atom.exponent)?;
            }
            if !exponent.is_zero() {
                atoms.push(target.with_exponent(exponent));
            }
        }
        Ok((factor, Self::build(atoms)?))
    }

    /// Merge atoms measuring the same base dimension into the first such unit
    ///
    /// Only atoms whose unit measures exactly one base dimension take part;
    /// the others are kept as they are. Order of first appearance is kept.
    pub fn rebase_dimensions(&self) -> Result<(f64, CompoundUnit)> {
        if !self.is_linear() {
            return Ok((1.0, self.clone()));
        }
        let mut factor = 1.0;
        let mut atoms: Vec<UnitAtom> = Vec::new();
        let mut targets: Vec<(usize, usize)> = Vec::new();

        for atom in &self.atoms {
            let base = match atom.unit.dimension.single_base() {
                Some(base) => base,
                None => {
                    atoms.push(*atom);
                    continue;
                }
            };
            match targets.iter().find(|(b, _)| *b == base) {
                Some(&(_, slot)) => {
                    let target = atoms[slot];
                    factor *= (atom.scale() / target.scale()).powf(ratio_to_f64(&atom.exponent));
                    atoms[slot].exponent = checked_add(atoms[slot].exponent, atom.exponent)?;
                }
                None => {
                    targets.push((base, atoms.len()));
                    atoms.push(*atom);
                }
            }
        }
        atoms.retain(|a| !a.exponent.is_zero());
        Ok((factor, Self::build(atoms)?))
    }
}

/// Append `atom`, merging it into an atom with the same label
fn push(atoms: &mut Vec<UnitAtom>, atom: UnitAtom) -> Result<()> {
    if atom.exponent.is_zero() {
        return Ok(());
    }
    match atoms.iter().position(|a| a.same_label(&atom)) {
        Some(i) => {
            atoms[i].exponent = checked_add(atoms[i].exponent, atom.exponent)?;
            if atoms[i].exponent.is_zero() {
                atoms.remove(i);
            }
        }
        None => atoms.push(atom),
    }
    Ok(())
}

impl fmt::Display for CompoundUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.atoms.iter().map(|a| a.to_string()).collect();
        write!(f, "{}", parts.join("*"))
    }
}
