//! Named, validated numeric vectors.
//!
//! A [`NumericVector`] is the right-hand side consumed by the solver and the
//! shape in which solutions are handed back. Every element is finite and the
//! vector never changes after construction.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::validate_finite;

/// An immutable sequence of finite `f64` values with an optional name.
///
/// The serde form is `{ "name": ..., "length": ..., "values": [...] }`;
/// deserialisation re-runs validation and rejects a `length` that disagrees
/// with the number of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawVector", into = "RawVector")]
pub struct NumericVector {
    name: Option<String>,
    values: Vec<f64>,
}

impl NumericVector {
    /// Build an unnamed vector.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NonFiniteValue`] if any element is NaN or infinite.
    pub fn new(values: Vec<f64>) -> Result<Self, ValidationError> {
        validate_finite(&values, "vector")?;
        Ok(Self { name: None, values })
    }

    /// Build a named vector.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NonFiniteValue`] if any element is NaN or infinite.
    pub fn named(name: impl Into<String>, values: Vec<f64>) -> Result<Self, ValidationError> {
        let name = name.into();
        validate_finite(&values, &name)?;
        Ok(Self {
            name: Some(name),
            values,
        })
    }

    /// A vector of `n` zeros.
    pub fn zeros(n: usize) -> Self {
        Self {
            name: None,
            values: vec![0.0; n],
        }
    }

    /// Wrap values the caller already knows to be finite (solver iterates).
    pub(crate) fn from_finite(name: Option<String>, values: Vec<f64>) -> Self {
        debug_assert!(values.iter().all(|v| v.is_finite()));
        Self { name, values }
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume the vector and return its values.
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

impl AsRef<[f64]> for NumericVector {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

impl TryFrom<Vec<f64>> for NumericVector {
    type Error = ValidationError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

/// Wire shape of a [`NumericVector`].
#[derive(Serialize, Deserialize)]
struct RawVector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    length: Option<usize>,
    values: Vec<f64>,
}

impl TryFrom<RawVector> for NumericVector {
    type Error = ValidationError;

    fn try_from(raw: RawVector) -> Result<Self, Self::Error> {
        if let Some(length) = raw.length {
            if length != raw.values.len() {
                return Err(ValidationError::DimensionMismatch(format!(
                    "declared length {length} but {} values present",
                    raw.values.len()
                )));
            }
        }
        match raw.name {
            Some(name) => Self::named(name, raw.values),
            None => Self::new(raw.values),
        }
    }
}

impl From<NumericVector> for RawVector {
    fn from(v: NumericVector) -> Self {
        Self {
            length: Some(v.values.len()),
            name: v.name,
            values: v.values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_name_values_and_length() {
        let v = NumericVector::named("b", vec![3.0, 4.0, 5.0]).unwrap();
        assert_eq!(v.name(), Some("b"));
        assert_eq!(v.values(), &[3.0, 4.0, 5.0]);
        assert_eq!(v.len(), 3);
        assert!(!v.is_empty());
    }

    #[test]
    fn rejects_non_finite() {
        assert!(NumericVector::new(vec![1.0, f64::NAN]).is_err());
        assert!(NumericVector::named("f", vec![f64::NEG_INFINITY]).is_err());
    }

    #[test]
    fn zeros_and_empty() {
        let z = NumericVector::zeros(4);
        assert_eq!(z.values(), &[0.0; 4]);
        assert!(z.name().is_none());
        assert!(NumericVector::new(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn deserialises_structured_form() {
        let v: NumericVector =
            serde_json::from_str(r#"{"name":"b","length":3,"values":[3,4,5]}"#).unwrap();
        assert_eq!(v.name(), Some("b"));
        assert_eq!(v.into_values(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn rejects_length_mismatch_on_deserialise() {
        let res: Result<NumericVector, _> =
            serde_json::from_str(r#"{"name":"b","length":4,"values":[3,4,5]}"#);
        let err = res.unwrap_err().to_string();
        assert!(err.contains("declared length 4"), "got: {err}");
    }

    #[test]
    fn serialises_with_length() {
        let v = NumericVector::named("x", vec![1.0, 2.0]).unwrap();
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["length"], 2);
        assert_eq!(json["name"], "x");
    }
}
