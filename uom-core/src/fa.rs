//! Function approximation: mapping raw states to feature vectors.
mod tabular;
use crate::error::UomError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
pub use tabular::TabularApproximator;

/// A fixed-length feature representation of a state.
///
/// Every learning operator in the crate consumes states in this form.
/// Instances are owned transiently by the caller; approximators return a
/// fresh vector per query and never hand out aliased buffers.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    /// Wraps a raw vector of feature activations.
    pub fn from_vec(v: Vec<f32>) -> Self {
        Self(v)
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector has zero length.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The activations as a slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// The activation of feature `i`.
    pub fn get(&self, i: usize) -> f32 {
        self.0[i]
    }

    /// Inner product with a weight vector of the same length.
    pub fn dot(&self, w: &[f32]) -> Result<f32> {
        if w.len() != self.0.len() {
            return Err(UomError::Dimension {
                expected: self.0.len(),
                got: w.len(),
            }
            .into());
        }
        Ok(self.0.iter().zip(w.iter()).map(|(a, b)| a * b).sum())
    }

    /// Fails with [`UomError::InvalidInput`] if any entry is not finite.
    pub fn check_finite(&self) -> Result<()> {
        if self.0.iter().any(|v| !v.is_finite()) {
            return Err(UomError::InvalidInput(
                "feature vector contains non-finite entries".into(),
            )
            .into());
        }
        Ok(())
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(v: Vec<f32>) -> Self {
        Self(v)
    }
}

/// Maps a raw state to a feature vector.
///
/// Implementations must be deterministic and side-effect free: the same
/// state always maps to the same vector.
pub trait FunctionApproximator {
    /// The raw state type the approximator accepts.
    type State;

    /// Length of the feature vectors this approximator produces.
    fn n_features(&self) -> usize;

    /// Computes the feature vector for a state.
    fn evaluate(&self, state: &Self::State) -> Result<FeatureVector>;
}

#[cfg(test)]
mod tests {
    use super::FeatureVector;
    use crate::error::UomError;

    #[test]
    fn test_dot() {
        let fv = FeatureVector::from_vec(vec![1.0, 0.0, 2.0]);
        assert_eq!(fv.dot(&[3.0, 5.0, 0.5]).unwrap(), 4.0);
    }

    #[test]
    fn test_dot_dimension_mismatch() {
        let fv = FeatureVector::from_vec(vec![1.0, 0.0]);
        assert!(fv.dot(&[1.0]).is_err());
    }

    #[test]
    fn test_check_finite() {
        let fv = FeatureVector::from_vec(vec![1.0, f32::NAN]);
        let err = fv.check_finite().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UomError>(),
            Some(UomError::InvalidInput(_))
        ));
        let fv = FeatureVector::from_vec(vec![1.0, 2.0]);
        assert!(fv.check_finite().is_ok());
    }
}
