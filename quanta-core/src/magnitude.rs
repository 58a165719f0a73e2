//! Values with measurement errors
//!
//! Errors are treated as independent and propagated to first order:
//! sums add absolute errors in quadrature, products and quotients add
//! relative errors in quadrature.

use serde::{Deserialize, Serialize};

use crate::array::broadcast_shape;
use crate::{ArrayValue, Result, UnitError};

/// A value array paired with an equally shaped error array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMagnitude")]
pub struct Magnitude {
    value: ArrayValue,
    error: ArrayValue,
}

#[derive(Deserialize)]
struct RawMagnitude {
    value: ArrayValue,
    error: ArrayValue,
}

impl TryFrom<RawMagnitude> for Magnitude {
    type Error = UnitError;

    fn try_from(raw: RawMagnitude) -> Result<Self> {
        Magnitude::new(raw.value, raw.error)
    }
}

impl Magnitude {
    /// Create a magnitude, rejecting unequal shapes and invalid errors
    pub fn new(value: ArrayValue, error: ArrayValue) -> Result<Self> {
        if value.shape() != error.shape() {
            return Err(UnitError::shape_mismatch(value.shape(), error.shape()));
        }
        if let Some(bad) = error.iter().find(|e| !(e.is_finite() && **e >= 0.0)) {
            return Err(UnitError::domain_fault(format!(
                "measurement error must be a non-negative finite number, got {}",
                bad
            )));
        }
        Ok(Magnitude { value, error })
    }

    /// Magnitude without error
    pub fn exact(value: ArrayValue) -> Self {
        let error = value.zeros_like();
        Magnitude { value, error }
    }

    pub fn scalar(value: f64) -> Self {
        Magnitude::exact(ArrayValue::scalar(value))
    }

    pub fn with_error(value: f64, error: f64) -> Result<Self> {
        Magnitude::new(ArrayValue::scalar(value), ArrayValue::scalar(error))
    }

    pub fn value(&self) -> &ArrayValue {
        &self.value
    }

    pub fn error(&self) -> &ArrayValue {
        &self.error
    }

    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// True when every error entry is exactly zero
    pub fn is_exact(&self) -> bool {
        self.error.iter().all(|&e| e == 0.0)
    }

    /// True for a single exact element equal to `x`
    pub fn is_exactly(&self, x: f64) -> bool {
        self.len() == 1 && self.value.at(0) == x && self.error.at(0) == 0.0
    }

    pub fn add(&self, other: &Magnitude) -> Result<Magnitude> {
        self.combine(other, |a, ea, b, eb| Ok((a + b, ea.hypot(eb))))
    }

    pub fn sub(&self, other: &Magnitude) -> Result<Magnitude> {
        self.combine(other, |a, ea, b, eb| Ok((a - b, ea.hypot(eb))))
    }

    pub fn mul(&self, other: &Magnitude) -> Result<Magnitude> {
        // |a*b| * sqrt((ea/a)^2 + (eb/b)^2), without dividing by a or b
        self.combine(other, |a, ea, b, eb| Ok((a * b, (ea * b).hypot(eb * a))))
    }

    pub fn div(&self, other: &Magnitude) -> Result<Magnitude> {
        self.combine(other, |a, ea, b, eb| {
            if b == 0.0 {
                return Err(UnitError::domain_fault(format!("division of {} by zero", a)));
            }
            Ok((a / b, (ea / b).hypot(eb * a / (b * b))))
        })
    }

    /// Raise every element to the real power `p`
    pub fn powf(&self, p: f64) -> Result<Magnitude> {
        let mut values = Vec::with_capacity(self.len());
        let mut errors = Vec::with_capacity(self.len());
        for (&x, &e) in self.value.iter().zip(self.error.iter()) {
            let r = x.powf(p);
            if !r.is_finite() {
                return Err(UnitError::domain_fault(format!("{}^{} is undefined", x, p)));
            }
            let err = if e == 0.0 { 0.0 } else { (p * x.powf(p - 1.0)).abs() * e };
            values.push(r);
            errors.push(propagated(err, x)?);
        }
        let shape = self.shape().to_vec();
        Ok(Magnitude {
            value: ArrayValue::new(values, shape.clone())?,
            error: ArrayValue::new(errors, shape)?,
        })
    }

    /// Multiply by an exact factor
    pub fn scale(&self, factor: f64) -> Magnitude {
        Magnitude {
            value: self.value.map(|v| v * factor),
            error: self.error.map(|e| e * factor.abs()),
        }
    }

    pub fn neg(&self) -> Magnitude {
        Magnitude {
            value: self.value.map(|v| -v),
            error: self.error.clone(),
        }
    }

    /// Apply a non-linear map `f` with derivative `df`
    ///
    /// Errors become `|df(x)| * e`. Fails when `f` produces a non-finite
    /// value or error.
    pub fn map(
        &self,
        f: impl Fn(f64) -> Result<f64>,
        df: impl Fn(f64) -> f64,
    ) -> Result<Magnitude> {
        let mut values = Vec::with_capacity(self.len());
        let mut errors = Vec::with_capacity(self.len());
        for (&x, &e) in self.value.iter().zip(self.error.iter()) {
            let y = f(x)?;
            if !y.is_finite() {
                return Err(UnitError::domain_fault(format!("conversion of {} is undefined", x)));
            }
            values.push(y);
            errors.push(propagated(if e == 0.0 { 0.0 } else { df(x).abs() * e }, x)?);
        }
        let shape = self.shape().to_vec();
        Ok(Magnitude {
            value: ArrayValue::new(values, shape.clone())?,
            error: ArrayValue::new(errors, shape)?,
        })
    }

    fn combine(
        &self,
        other: &Magnitude,
        f: impl Fn(f64, f64, f64, f64) -> Result<(f64, f64)>,
    ) -> Result<Magnitude> {
        let shape = broadcast_shape(self.shape(), self.len(), other.shape(), other.len())?;
        let len: usize = shape.iter().product();
        let mut values = Vec::with_capacity(len);
        let mut errors = Vec::with_capacity(len);
        for i in 0..len {
            let (v, e) = f(
                self.value.at(i),
                self.error.at(i),
                other.value.at(i),
                other.error.at(i),
            )?;
            values.push(v);
            errors.push(propagated(e, self.value.at(i))?);
        }
        Ok(Magnitude {
            value: ArrayValue::new(values, shape.clone())?,
            error: ArrayValue::new(errors, shape)?,
        })
    }
}

/// Propagated error of the element computed from `x`
fn propagated(error: f64, x: f64) -> Result<f64> {
    if error.is_finite() {
        Ok(error)
    } else {
        Err(UnitError::domain_fault(format!(
            "error propagation at {} gives a non-finite error",
            x
        )))
    }
}

impl From<f64> for Magnitude {
    fn from(value: f64) -> Self {
        Magnitude::scalar(value)
    }
}

impl From<ArrayValue> for Magnitude {
    fn from(value: ArrayValue) -> Self {
        Magnitude::exact(value)
    }
}

impl From<Vec<f64>> for Magnitude {
    fn from(values: Vec<f64>) -> Self {
        Magnitude::exact(ArrayValue::from_vec(values))
    }
}

impl TryFrom<(f64, f64)> for Magnitude {
    type Error = UnitError;

    fn try_from((value, error): (f64, f64)) -> Result<Self> {
        Magnitude::with_error(value, error)
    }
}

impl TryFrom<(ArrayValue, ArrayValue)> for Magnitude {
    type Error = UnitError;

    fn try_from((value, error): (ArrayValue, ArrayValue)) -> Result<Self> {
        Magnitude::new(value, error)
    }
}
