//! Tabular one-hot encoding of discrete states.
use super::{FeatureVector, FunctionApproximator};
use crate::error::UomError;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One-hot encoder over a discrete state space.
///
/// State index `i` in `[0, n)` maps to the length-`n` vector with a
/// single `1.0` at position `i`. Indices outside the range are rejected
/// with [`UomError::OutOfRange`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TabularApproximator {
    n: usize,
}

impl TabularApproximator {
    /// Builds an encoder over `n` states. `n` must be positive.
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(
                UomError::Configuration("tabular approximator needs n > 0".into()).into(),
            );
        }
        Ok(Self { n })
    }
}

impl FunctionApproximator for TabularApproximator {
    type State = i64;

    fn n_features(&self) -> usize {
        self.n
    }

    fn evaluate(&self, state: &i64) -> Result<FeatureVector> {
        if *state < 0 || *state >= self.n as i64 {
            return Err(UomError::OutOfRange {
                index: *state,
                n: self.n,
            }
            .into());
        }
        let mut v = vec![0.0f32; self.n];
        v[*state as usize] = 1.0;
        Ok(FeatureVector::from_vec(v))
    }
}
