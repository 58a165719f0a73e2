//! Quanta Units - Physical Quantities and Unit Systems
//!
//! Provides quantities with dimensional analysis, error propagation and
//! conversion between the SI, US customary, ESU and EMU unit systems.
//!
//! Building blocks:
//! - Dimensions (7 SI base dimensions, rational exponents)
//! - Prefixes (decimal `Q`..`q`, binary `Ki`..`Yi`)
//! - Units (linear, affine temperature scales, logarithmic levels)
//! - Unit systems (per-thread active system with scoped overrides)
//! - Quantities (magnitude with errors, compound units, conversions)
//! - Calculator (expressions such as `US_3 ft/s * 2(1) min`)
//! - Catalogs (printable tables of everything above)

mod compound;
mod dimension;
mod kinds;
mod prefix;
mod quantity;
mod system;
mod unit;
mod units;

pub mod calc;
pub mod lists;

pub use calc::{solve, Calculator};
pub use compound::{CompoundUnit, UnitAtom};
pub use dimension::{exp, Dimension, Exponent};
pub use kinds::{lookup_kind, QuantityKind, KINDS};
pub use prefix::{lookup_prefix, Prefix, PREFIXES};
pub use quantity::{apply, BinOp, IntoMagnitude, Operand, Quantity, Values};
pub use system::{active_system, scope_depth, Dformat, SystemStack, SystemType, UnitSystem};
pub use unit::{Category, PrefixRule, Unit, UnitKind};
pub use units::{lookup_unit, registry, resolve, UnitRegistry, UNITS};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        solve, Calculator, Dformat, Dimension, Quantity, SystemType, UnitSystem, Values,
    };
    pub use quanta_core::prelude::*;
}
