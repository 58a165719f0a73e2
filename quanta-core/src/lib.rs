//! Quanta Core - Numeric foundation
//!
//! This crate provides the types every other Quanta crate builds on:
//! - `ArrayValue`: shaped buffers of `f64` with scalar broadcasting
//! - `Magnitude`: values paired with measurement errors
//! - `UnitError`: structured errors with machine-readable codes
//! - `format`: `%g`-style and parenthetical-uncertainty number output

mod array;
mod error;
mod magnitude;
pub mod format;

pub use array::{broadcast_shape, ArrayValue};
pub use error::{codes, Result, UnitError};
pub use magnitude::Magnitude;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::codes;
    pub use crate::{ArrayValue, Magnitude, Result, UnitError};
}
