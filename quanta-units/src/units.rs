//! Unit definitions organized by category and unit system

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::LazyLock;
use tracing::trace;

use quanta_core::{Result, UnitError};

use crate::compound::ratio_to_f64;
use crate::kinds::KINDS;
use crate::prefix::split_prefix;
use crate::unit::Category;
use crate::{Dimension, SystemType, Unit, UnitAtom};

/// Global unit registry
pub static UNITS: LazyLock<UnitRegistry> = LazyLock::new(UnitRegistry::new);

/// The global registry, built on first use
pub fn registry() -> &'static UnitRegistry {
    &UNITS
}

/// Look up a unit by exact symbol or alias in the global registry
pub fn lookup_unit(symbol: &str) -> Result<&'static Unit> {
    registry().lookup_unit(symbol)
}

/// Resolve a unit token in `system` using the global registry
pub fn resolve(token: &str, system: SystemType) -> Result<UnitAtom> {
    registry().resolve(token, system)
}

const US: &[SystemType] = &[SystemType::US];
const ESU: &[SystemType] = &[SystemType::ESU];
const EMU: &[SystemType] = &[SystemType::EMU];
const CGS: &[SystemType] = &[SystemType::ESU, SystemType::EMU];

/// Speed of light, used by the Gaussian electrical units
const C_CGS: f64 = 29979245800.0;

/// Registry of all known units
pub struct UnitRegistry {
    units: Vec<Unit>,
    index: HashMap<String, usize>,
    aliases: HashMap<String, String>,
    kinds: HashMap<SystemType, HashMap<String, Unit>>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        let mut registry = UnitRegistry {
            units: Vec::new(),
            index: HashMap::new(),
            aliases: HashMap::new(),
            kinds: HashMap::new(),
        };
        registry.register_all_units();
        registry.register_kind_units();
        trace!(
            units = registry.units.len(),
            aliases = registry.aliases.len(),
            kinds = registry.kinds.values().map(|k| k.len()).sum::<usize>(),
            "unit registry built"
        );
        registry
    }

    /// Get a unit by symbol or alias
    pub fn get(&self, symbol: &str) -> Option<&Unit> {
        // Try direct lookup first
        if let Some(&i) = self.index.get(symbol) {
            return Some(&self.units[i]);
        }
        // Try alias lookup
        let canonical = self.aliases.get(symbol)?;
        self.index.get(canonical).map(|&i| &self.units[i])
    }

    pub fn lookup_unit(&self, symbol: &str) -> Result<&Unit> {
        self.get(symbol).ok_or_else(|| UnitError::unknown_unit(symbol))
    }

    /// The `<kind>` unit of `system`; `symbol` is given without brackets
    pub fn kind_unit(&self, symbol: &str, system: SystemType) -> Result<&Unit> {
        self.kinds
            .get(&system)
            .and_then(|units| units.get(symbol))
            .ok_or_else(|| UnitError::unknown_unit(format!("<{}>", symbol)))
    }

    /// Resolve a unit token into a prefixed unit atom
    ///
    /// Exact symbols and aliases win over prefix splits, even when the
    /// exact unit belongs to another system: `pt` in SI is the US pint
    /// reported as unknown, never a picotonne.
    pub fn resolve(&'static self, token: &str, system: SystemType) -> Result<UnitAtom> {
        if let Some(kind) = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            return Ok(UnitAtom::new(None, self.kind_unit(kind, system)?));
        }

        if let Some(unit) = self.get(token) {
            if unit.belongs_to(system) {
                return Ok(UnitAtom::new(None, unit));
            }
            let owners: Vec<&str> = unit.systems.iter().map(|s| s.abbrev()).collect();
            let mut message = format!("{} (defined in {}, not in {}", token, owners.join(", "), system);
            if let Some(Ok(atom)) = self.split_prefixed(token, system) {
                let prefix = atom.prefix.map_or("", |p| p.name);
                message.push_str(&format!("; the symbol shadows {}{}", prefix, atom.unit.name));
            }
            message.push(')');
            return Err(UnitError::unknown_unit(message));
        }

        if token.starts_with('[') {
            return Err(UnitError::unknown_unit(format!("constant {}", token)));
        }

        self.split_prefixed(token, system)
            .unwrap_or_else(|| Err(UnitError::unknown_unit(token)))
    }

    /// First prefix split of `token` whose remainder is a unit of `system`
    fn split_prefixed(&'static self, token: &str, system: SystemType) -> Option<Result<UnitAtom>> {
        for (prefix, rest) in split_prefix(token) {
            let unit = match self.get(rest) {
                Some(unit) if unit.belongs_to(system) => unit,
                _ => continue,
            };
            if !unit.allows_prefixes() {
                return Some(Err(UnitError::invalid_prefix(prefix.symbol, &unit.symbol)));
            }
            return Some(Ok(UnitAtom::new(Some(prefix), unit)));
        }
        None
    }

    /// Get all units in a category, in registration order
    pub fn by_category(&self, category: Category) -> Vec<&Unit> {
        self.units.iter().filter(|u| u.category == category).collect()
    }

    /// Units defined specifically for `system`
    pub fn system_units(&self, system: SystemType) -> Vec<&Unit> {
        self.units.iter().filter(|u| u.systems.contains(&system)).collect()
    }

    /// Aliases pointing at `symbol`
    pub fn aliases_of(&self, symbol: &str) -> Vec<&str> {
        let mut aliases: Vec<&str> = self
            .aliases
            .iter()
            .filter(|(_, target)| target.as_str() == symbol)
            .map(|(alias, _)| alias.as_str())
            .collect();
        aliases.sort_unstable();
        aliases
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn register(&mut self, unit: Unit) {
        self.index.insert(unit.symbol.clone(), self.units.len());
        self.units.push(unit);
    }

    fn alias(&mut self, alias: &str, symbol: &str) {
        self.aliases.insert(alias.to_string(), symbol.to_string());
    }

    /// SI factor of a possibly prefixed symbol, during construction
    fn scale_of(&self, symbol: &str) -> Option<f64> {
        if let Some(unit) = self.get(symbol) {
            return Some(unit.factor);
        }
        split_prefix(symbol)
            .into_iter()
            .find_map(|(p, rest)| self.get(rest).map(|u| p.factor * u.factor))
    }

    fn register_all_units(&mut self) {
        self.register_base_units();
        self.register_derived_units();
        self.register_accepted_units();
        self.register_temperature_units();
        self.register_logarithmic_units();
        self.register_constants();
        self.register_us_units();
        self.register_cgs_units();
        self.register_esu_units();
        self.register_emu_units();
    }

    fn register_base_units(&mut self) {
        self.register(Unit::new("m", "metre", Dimension::LENGTH, 1.0, Category::Base));
        self.register(Unit::new("g", "gram", Dimension::MASS, 1e-3, Category::Base));
        self.register(Unit::new("s", "second", Dimension::TIME, 1.0, Category::Base));
        self.register(Unit::new("A", "ampere", Dimension::CURRENT, 1.0, Category::Base));
        self.register(Unit::new("K", "kelvin", Dimension::TEMPERATURE, 1.0, Category::Base));
        self.register(Unit::new("mol", "mole", Dimension::AMOUNT, 1.0, Category::Base));
        self.register(Unit::new("cd", "candela", Dimension::LUMINOSITY, 1.0, Category::Base));
    }

    fn register_derived_units(&mut self) {
        let derived = [
            ("rad", "radian", Dimension::DIMENSIONLESS),
            ("sr", "steradian", Dimension::DIMENSIONLESS),
            ("Hz", "hertz", Dimension::FREQUENCY),
            ("N", "newton", Dimension::FORCE),
            ("Pa", "pascal", Dimension::PRESSURE),
            ("J", "joule", Dimension::ENERGY),
            ("W", "watt", Dimension::POWER),
            ("C", "coulomb", Dimension::CHARGE),
            ("V", "volt", Dimension::VOLTAGE),
            ("F", "farad", Dimension::CAPACITANCE),
            ("Ohm", "ohm", Dimension::RESISTANCE),
            ("S", "siemens", Dimension::CONDUCTANCE),
            ("Wb", "weber", Dimension::MAGNETIC_FLUX),
            ("T", "tesla", Dimension::MAGNETIC_FLUX_DENSITY),
            ("H", "henry", Dimension::INDUCTANCE),
            ("lm", "lumen", Dimension::LUMINOSITY),
            ("lx", "lux", Dimension::ILLUMINANCE),
            ("Bq", "becquerel", Dimension::FREQUENCY),
            ("Gy", "gray", Dimension::ABSORBED_DOSE),
            ("Sv", "sievert", Dimension::ABSORBED_DOSE),
            ("kat", "katal", Dimension::CATALYTIC_ACTIVITY),
        ];
        for (symbol, name, dimension) in derived {
            self.register(Unit::new(symbol, name, dimension, 1.0, Category::Derived));
        }

        self.alias("Ω", "Ohm");
        self.alias("ohm", "Ohm");
    }

    fn register_accepted_units(&mut self) {
        // Accepted for use with SI, no prefixes
        let fixed = [
            ("min", "minute", Dimension::TIME, 60.0),
            ("h", "hour", Dimension::TIME, 3600.0),
            ("d", "day", Dimension::TIME, 86400.0),
            ("au", "astronomical unit", Dimension::LENGTH, 149597870700.0),
            ("deg", "degree", Dimension::DIMENSIONLESS, PI / 180.0),
            ("arcmin", "arcminute", Dimension::DIMENSIONLESS, PI / 10800.0),
            ("arcsec", "arcsecond", Dimension::DIMENSIONLESS, PI / 648000.0),
            ("atm", "standard atmosphere", Dimension::PRESSURE, 101325.0),
            ("Ang", "angstrom", Dimension::LENGTH, 1e-10),
        ];
        for (symbol, name, dimension, factor) in fixed {
            self.register(Unit::new(symbol, name, dimension, factor, Category::Derived).no_prefixes());
        }

        // Accepted units that take prefixes (mL, kt, MeV, kDa, Mpc, mbar)
        self.register(Unit::new("L", "litre", Dimension::VOLUME, 1e-3, Category::Derived));
        self.register(Unit::new("t", "tonne", Dimension::MASS, 1e3, Category::Derived));
        self.register(Unit::new("eV", "electronvolt", Dimension::ENERGY, 1.602176634e-19, Category::Derived));
        self.register(Unit::new("Da", "dalton", Dimension::MASS, 1.66053906660e-27, Category::Derived));
        self.register(Unit::new("ly", "light year", Dimension::LENGTH, 9460730472580800.0, Category::Derived));
        self.register(Unit::new("pc", "parsec", Dimension::LENGTH, 3.0856775814913673e16, Category::Derived));
        self.register(Unit::new("bar", "bar", Dimension::PRESSURE, 1e5, Category::Derived));

        self.alias("l", "L");
        self.alias("Å", "Ang");
        self.alias("°", "deg");
    }

    fn register_temperature_units(&mut self) {
        // Celsius: K = C + 273.15
        self.register(Unit::with_offset("degC", "degree Celsius", 1.0, 273.15));

        // Fahrenheit: K = (F + 459.67) * 5/9
        self.register(Unit::with_offset(
            "degF",
            "degree Fahrenheit",
            5.0 / 9.0,
            459.67 * 5.0 / 9.0,
        ));

        // Rankine: K = R * 5/9
        self.register(
            Unit::new("degR", "degree Rankine", Dimension::TEMPERATURE, 5.0 / 9.0, Category::Temperature)
                .no_prefixes(),
        );

        self.alias("°C", "degC");
        self.alias("°F", "degF");
        self.alias("°R", "degR");
    }

    fn register_logarithmic_units(&mut self) {
        use std::f64::consts::E;

        self.register(Unit::logarithmic("Np", "neper", Dimension::DIMENSIONLESS, 1.0, E, 1.0));
        self.register(Unit::logarithmic("B", "bel", Dimension::DIMENSIONLESS, 1.0, 10.0, 1.0));
        self.register(Unit::logarithmic("dB", "decibel", Dimension::DIMENSIONLESS, 1.0, 10.0, 10.0));
        self.register(Unit::logarithmic("dBm", "decibel-milliwatt", Dimension::POWER, 1e-3, 10.0, 10.0));
        self.register(Unit::logarithmic("dBW", "decibel-watt", Dimension::POWER, 1.0, 10.0, 10.0));
        self.register(Unit::logarithmic("dBV", "decibel-volt", Dimension::VOLTAGE, 1.0, 10.0, 20.0));
        self.register(Unit::logarithmic(
            "dBSPL",
            "decibel sound pressure level",
            Dimension::PRESSURE,
            20e-6,
            10.0,
            20.0,
        ));
    }

    fn register_constants(&mut self) {
        let constants = [
            ("[c]", "speed of light in vacuum", Dimension::VELOCITY, 299792458.0),
            ("[h]", "Planck constant", Dimension::ACTION, 6.62607015e-34),
            ("[hbar]", "reduced Planck constant", Dimension::ACTION, 1.054571817e-34),
            ("[e]", "elementary charge", Dimension::CHARGE, 1.602176634e-19),
            ("[k_B]", "Boltzmann constant", Dimension::HEAT_CAPACITY, 1.380649e-23),
            ("[N_A]", "Avogadro constant", Dimension::PER_AMOUNT, 6.02214076e23),
            ("[G]", "gravitational constant", Dimension::GRAVITATIONAL, 6.67430e-11),
            ("[g0]", "standard gravity", Dimension::ACCELERATION, 9.80665),
            ("[m_e]", "electron mass", Dimension::MASS, 9.1093837015e-31),
            ("[m_p]", "proton mass", Dimension::MASS, 1.67262192369e-27),
            ("[eps0]", "vacuum permittivity", Dimension::PERMITTIVITY, 8.8541878128e-12),
            ("[mu0]", "vacuum permeability", Dimension::PERMEABILITY, 1.25663706212e-6),
            ("[R]", "molar gas constant", Dimension::MOLAR_HEAT_CAPACITY, 8.314462618),
            ("[sigma]", "Stefan-Boltzmann constant", Dimension::RADIANT_EXITANCE_PER_T4, 5.670374419e-8),
            ("[a0]", "Bohr radius", Dimension::LENGTH, 5.29177210903e-11),
            ("[alpha]", "fine-structure constant", Dimension::DIMENSIONLESS, 7.2973525693e-3),
        ];
        for (symbol, name, dimension, value) in constants {
            self.register(Unit::new(symbol, name, dimension, value, Category::Constant).no_prefixes());
        }
    }

    fn register_us_units(&mut self) {
        let us = [
            ("in", "inch", Dimension::LENGTH, 0.0254),
            ("ft", "foot", Dimension::LENGTH, 0.3048),
            ("yd", "yard", Dimension::LENGTH, 0.9144),
            ("mi", "mile", Dimension::LENGTH, 1609.344),
            ("lb", "pound", Dimension::MASS, 0.45359237),
            ("oz", "ounce", Dimension::MASS, 0.028349523125),
            ("gal", "gallon", Dimension::VOLUME, 3.785411784e-3),
            ("qt", "quart", Dimension::VOLUME, 9.46352946e-4),
            ("pt", "pint", Dimension::VOLUME, 4.73176473e-4),
            ("floz", "fluid ounce", Dimension::VOLUME, 2.95735295625e-5),
            ("ac", "acre", Dimension::AREA, 4046.8564224),
            ("lbf", "pound-force", Dimension::FORCE, 4.4482216152605),
            ("psi", "pound per square inch", Dimension::PRESSURE, 6894.757293168361),
            ("BTU", "British thermal unit", Dimension::ENERGY, 1055.05585262),
            ("mph", "mile per hour", Dimension::VELOCITY, 0.44704),
            ("hp", "horsepower", Dimension::POWER, 745.6998715822702),
        ];
        for (symbol, name, dimension, factor) in us {
            self.register(
                Unit::new(symbol, name, dimension, factor, Category::Derived)
                    .no_prefixes()
                    .in_systems(US),
            );
        }
    }

    fn register_cgs_units(&mut self) {
        // Mechanical units shared by both Gaussian systems
        let cgs = [
            ("dyn", "dyne", Dimension::FORCE, 1e-5),
            ("erg", "erg", Dimension::ENERGY, 1e-7),
            ("Gal", "gal", Dimension::ACCELERATION, 1e-2),
            ("P", "poise", Dimension::DYNAMIC_VISCOSITY, 0.1),
            ("St", "stokes", Dimension::KINEMATIC_VISCOSITY, 1e-4),
            ("Ba", "barye", Dimension::PRESSURE, 0.1),
        ];
        for (symbol, name, dimension, factor) in cgs {
            self.register(Unit::new(symbol, name, dimension, factor, Category::Derived).in_systems(CGS));
        }
    }

    fn register_esu_units(&mut self) {
        let stat_c = 10.0 / C_CGS;
        let esu = [
            ("statC", "statcoulomb", Dimension::CHARGE, stat_c),
            ("statA", "statampere", Dimension::CURRENT, stat_c),
            ("statV", "statvolt", Dimension::VOLTAGE, C_CGS * 1e-8),
            ("statOhm", "statohm", Dimension::RESISTANCE, C_CGS * C_CGS * 1e-9),
            ("statF", "statfarad", Dimension::CAPACITANCE, 1.0 / (C_CGS * C_CGS * 1e-9)),
        ];
        for (symbol, name, dimension, factor) in esu {
            self.register(Unit::new(symbol, name, dimension, factor, Category::Derived).in_systems(ESU));
        }
        self.alias("Fr", "statC");
    }

    fn register_emu_units(&mut self) {
        let emu = [
            ("abA", "abampere", Dimension::CURRENT, 10.0),
            ("abC", "abcoulomb", Dimension::CHARGE, 10.0),
            ("abV", "abvolt", Dimension::VOLTAGE, 1e-8),
            ("abOhm", "abohm", Dimension::RESISTANCE, 1e-9),
            ("G", "gauss", Dimension::MAGNETIC_FLUX_DENSITY, 1e-4),
            ("Mx", "maxwell", Dimension::MAGNETIC_FLUX, 1e-8),
            ("Oe", "oersted", Dimension::MAGNETIC_FIELD, 1e3 / (4.0 * PI)),
        ];
        for (symbol, name, dimension, factor) in emu {
            self.register(Unit::new(symbol, name, dimension, factor, Category::Derived).in_systems(EMU));
        }
        self.alias("Bi", "abA");
    }

    /// Synthesize `<kind>` units from each system's preferred base units
    fn register_kind_units(&mut self) {
        for system in SystemType::ALL {
            let scales: Vec<f64> = system
                .preferred_units()
                .iter()
                .map(|symbol| self.scale_of(symbol).unwrap_or(1.0))
                .collect();

            for kind in KINDS {
                let factor: f64 = kind
                    .dimension
                    .exponents
                    .iter()
                    .zip(&scales)
                    .map(|(e, scale)| scale.powf(ratio_to_f64(e)))
                    .product();
                let unit = Unit::new(
                    &format!("<{}>", kind.symbol),
                    kind.name,
                    kind.dimension,
                    factor,
                    Category::Quantity,
                )
                .no_prefixes()
                .in_systems(&[system]);
                self.kinds
                    .entry(system)
                    .or_default()
                    .insert(kind.symbol.to_string(), unit);
            }
        }
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs())
    }

    #[test]
    fn test_exact_lookup() {
        assert_eq!(lookup_unit("m").unwrap().name, "metre");
        assert_eq!(lookup_unit("Ω").unwrap().symbol, "Ohm");
        assert!(matches!(lookup_unit("xyz"), Err(UnitError::UnknownUnit(_))));
    }

    #[test]
    fn test_prefix_split() {
        let km = resolve("km", SystemType::SI).unwrap();
        assert_eq!(km.prefix.map(|p| p.symbol), Some("k"));
        assert_eq!(km.unit.symbol, "m");
        assert_eq!(km.scale(), 1000.0);

        let kg = resolve("kg", SystemType::SI).unwrap();
        assert!(close(kg.scale(), 1.0));

        let dam = resolve("dam", SystemType::SI).unwrap();
        assert_eq!(dam.prefix.map(|p| p.symbol), Some("da"));
    }

    #[test]
    fn test_exact_symbol_beats_prefix() {
        // minute, not milli-inch; candela, not centi-day
        assert_eq!(resolve("min", SystemType::SI).unwrap().unit.name, "minute");
        assert_eq!(resolve("cd", SystemType::SI).unwrap().unit.name, "candela");
        assert_eq!(resolve("Pa", SystemType::SI).unwrap().unit.name, "pascal");
    }

    #[test]
    fn test_micro_spellings() {
        for token in ["um", "µm", "μm"] {
            let atom = resolve(token, SystemType::SI).unwrap();
            assert!(close(atom.scale(), 1e-6));
        }
    }

    #[test]
    fn test_invalid_prefix() {
        let err = resolve("kdegC", SystemType::SI).unwrap_err();
        assert_eq!(err, UnitError::invalid_prefix("k", "degC"));
        assert!(matches!(resolve("mdB", SystemType::SI), Err(UnitError::InvalidPrefix { .. })));
        assert!(matches!(resolve("k[c]", SystemType::SI), Err(UnitError::InvalidPrefix { .. })));
    }

    #[test]
    fn test_system_membership() {
        assert!(resolve("ft", SystemType::US).is_ok());
        match resolve("ft", SystemType::SI) {
            Err(UnitError::UnknownUnit(msg)) => assert!(msg.contains("US")),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(resolve("statA", SystemType::ESU).is_ok());
        assert!(resolve("abA", SystemType::EMU).is_ok());
        assert!(resolve("abA", SystemType::ESU).is_err());
        assert!(resolve("cm", SystemType::ESU).is_ok());
    }

    #[test]
    fn test_foreign_symbol_shadows_prefix_split() {
        match resolve("pt", SystemType::SI) {
            Err(UnitError::UnknownUnit(msg)) => {
                assert!(msg.contains("US"));
                assert!(msg.contains("picotonne"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(resolve("pt", SystemType::US).unwrap().unit.name, "pint");
        assert_eq!(resolve("nt", SystemType::SI).unwrap().symbol(), "nt");
    }

    #[test]
    fn test_constants() {
        let c = resolve("[c]", SystemType::SI).unwrap();
        assert_eq!(c.unit.factor, 299792458.0);
        assert_eq!(c.unit.dimension, Dimension::VELOCITY);
        assert!(resolve("[nope]", SystemType::SI).is_err());
    }

    #[test]
    fn test_kind_units() {
        let si = resolve("<B>", SystemType::SI).unwrap();
        assert!(close(si.unit.factor, 1.0));
        let emu = resolve("<B>", SystemType::EMU).unwrap();
        assert!(close(emu.unit.factor, 1e-4));
        let us = resolve("<l>", SystemType::US).unwrap();
        assert!(close(us.unit.factor, 0.3048));
        assert!(resolve("<zz>", SystemType::SI).is_err());
    }

    #[test]
    fn test_gaussian_factors() {
        let stat_a = lookup_unit("statA").unwrap();
        assert!(close(stat_a.factor, 3.3356409519815204e-10));
        let stat_v = lookup_unit("statV").unwrap();
        assert!(close(stat_v.factor, 299.792458));
    }

    #[test]
    fn test_categories() {
        assert_eq!(registry().by_category(Category::Base).len(), 7);
        assert_eq!(registry().by_category(Category::Constant).len(), 16);
        assert!(!registry().by_category(Category::Logarithmic).is_empty());
        assert!(!registry().system_units(SystemType::US).is_empty());
    }
}
