//! Flat numeric buffers with a shape
//!
//! `ArrayValue` holds the elements in row-major order. A scalar is an
//! array of shape `[1]`; it broadcasts against any other shape.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Result, UnitError};

/// N-dimensional array of `f64` stored as a flat buffer plus shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawArray")]
pub struct ArrayValue {
    values: Vec<f64>,
    shape: Vec<usize>,
}

/// Unchecked wire form of `ArrayValue`
#[derive(Deserialize)]
struct RawArray {
    values: Vec<f64>,
    shape: Vec<usize>,
}

impl TryFrom<RawArray> for ArrayValue {
    type Error = UnitError;

    fn try_from(raw: RawArray) -> Result<Self> {
        ArrayValue::new(raw.values, raw.shape)
    }
}

impl ArrayValue {
    /// Create an array, checking that the buffer fills the shape
    pub fn new(values: Vec<f64>, shape: Vec<usize>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if shape.is_empty() || expected != values.len() {
            return Err(UnitError::shape_mismatch(&[values.len()], &shape));
        }
        Ok(ArrayValue { values, shape })
    }

    /// Single-element array
    pub fn scalar(value: f64) -> Self {
        ArrayValue {
            values: vec![value],
            shape: vec![1],
        }
    }

    /// One-dimensional array
    pub fn from_vec(values: Vec<f64>) -> Self {
        let shape = vec![values.len()];
        ArrayValue { values, shape }
    }

    /// Array of zeros with the same shape as `self`
    pub fn zeros_like(&self) -> Self {
        ArrayValue {
            values: vec![0.0; self.values.len()],
            shape: self.shape.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A single element broadcasts like a scalar
    pub fn is_scalar(&self) -> bool {
        self.values.len() == 1
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.values.iter()
    }

    /// Element lookup with scalar broadcasting
    pub fn at(&self, index: usize) -> f64 {
        if self.is_scalar() {
            self.values[0]
        } else {
            self.values[index]
        }
    }

    /// Apply `f` to every element
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        ArrayValue {
            values: self.values.iter().map(|&v| f(v)).collect(),
            shape: self.shape.clone(),
        }
    }

    /// Combine two arrays elementwise, broadcasting scalars
    pub fn zip_with(&self, other: &ArrayValue, f: impl Fn(f64, f64) -> f64) -> Result<Self> {
        let shape = broadcast_shape(&self.shape, self.len(), &other.shape, other.len())?;
        let len = shape.iter().product();
        let values = (0..len).map(|i| f(self.at(i), other.at(i))).collect();
        Ok(ArrayValue { values, shape })
    }
}

/// Shape of the result of an elementwise operation
///
/// Equal shapes combine as-is; a single-element operand takes the shape of
/// the other one. Anything else fails with `ShapeMismatch`.
pub fn broadcast_shape(
    left: &[usize],
    left_len: usize,
    right: &[usize],
    right_len: usize,
) -> Result<Vec<usize>> {
    if left == right {
        Ok(left.to_vec())
    } else if right_len == 1 {
        Ok(left.to_vec())
    } else if left_len == 1 {
        Ok(right.to_vec())
    } else {
        Err(UnitError::shape_mismatch(left, right))
    }
}

impl From<f64> for ArrayValue {
    fn from(value: f64) -> Self {
        ArrayValue::scalar(value)
    }
}

impl From<Vec<f64>> for ArrayValue {
    fn from(values: Vec<f64>) -> Self {
        ArrayValue::from_vec(values)
    }
}

impl From<&[f64]> for ArrayValue {
    fn from(values: &[f64]) -> Self {
        ArrayValue::from_vec(values.to_vec())
    }
}

impl fmt::Display for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_shape() {
        assert!(ArrayValue::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]).is_ok());
        assert!(ArrayValue::new(vec![1.0, 2.0, 3.0], vec![2, 2]).is_err());
        assert!(ArrayValue::new(vec![1.0], vec![]).is_err());
    }

    #[test]
    fn test_deserialize_checks_shape() {
        let a: ArrayValue = serde_json::from_str(r#"{"values":[1,2,3,4],"shape":[2,2]}"#).unwrap();
        assert_eq!(a.shape(), &[2, 2]);
        assert!(serde_json::from_str::<ArrayValue>(r#"{"values":[1,2],"shape":[3]}"#).is_err());
        assert!(serde_json::from_str::<ArrayValue>(r#"{"values":[1],"shape":[]}"#).is_err());
    }

    #[test]
    fn test_scalar() {
        let a = ArrayValue::scalar(4.0);
        assert!(a.is_scalar());
        assert_eq!(a.shape(), &[1]);
        assert_eq!(a.at(7), 4.0);
    }

    #[test]
    fn test_zip_equal_shapes() {
        let a = ArrayValue::from_vec(vec![1.0, 2.0, 3.0]);
        let b = ArrayValue::from_vec(vec![10.0, 20.0, 30.0]);
        let c = a.zip_with(&b, |x, y| x + y).unwrap();
        assert_eq!(c.as_slice(), &[11.0, 22.0, 33.0]);
        assert_eq!(c.shape(), &[3]);
    }

    #[test]
    fn test_zip_broadcasts_scalar() {
        let a = ArrayValue::from_vec(vec![1.0, 2.0, 3.0]);
        let s = ArrayValue::scalar(2.0);
        let left = s.zip_with(&a, |x, y| x * y).unwrap();
        let right = a.zip_with(&s, |x, y| x * y).unwrap();
        assert_eq!(left.as_slice(), &[2.0, 4.0, 6.0]);
        assert_eq!(right.shape(), &[3]);
    }

    #[test]
    fn test_zip_shape_mismatch() {
        let a = ArrayValue::from_vec(vec![1.0, 2.0, 3.0]);
        let b = ArrayValue::from_vec(vec![1.0, 2.0]);
        let err = a.zip_with(&b, |x, y| x + y).unwrap_err();
        assert_eq!(err, UnitError::shape_mismatch(&[3], &[2]));
    }

    #[test]
    fn test_two_dimensional() {
        let a = ArrayValue::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]).unwrap();
        let doubled = a.map(|x| 2.0 * x);
        assert_eq!(doubled.shape(), &[2, 3]);
        assert_eq!(doubled.as_slice()[5], 12.0);
    }
}
