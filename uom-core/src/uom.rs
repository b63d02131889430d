//! Universal option models.
//!
//! A universal option model (UOM) is a pair of linear operators learned
//! for an option's fixed internal policy: `M` predicts the expected
//! discounted feature vector accumulated while the option runs, and `U`
//! turns an arbitrary reward weighting into the option's expected
//! discounted return. `U` is learned independently of any reward signal,
//! so one model answers return queries for every downstream reward
//! function without relearning.
use crate::{error::UomError, fa::FeatureVector, mat::Mat};
use anyhow::Result;
use log::trace;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`UniversalOptionModel`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct UomConfig {
    /// Step size of the incremental operator updates.
    pub alpha: f32,

    /// Discount factor applied to future feature contributions.
    pub gamma: f32,

    /// Largest entry magnitude either operator may reach during
    /// learning before the update fails with
    /// [`UomError::Divergence`].
    pub divergence_bound: f32,
}

impl Default for UomConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            divergence_bound: 1e6,
        }
    }
}

impl UomConfig {
    /// Sets the step size.
    pub fn alpha(mut self, v: f32) -> Self {
        self.alpha = v;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the divergence bound.
    pub fn divergence_bound(mut self, v: f32) -> Self {
        self.divergence_bound = v;
        self
    }

    /// Constructs [`UomConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`UomConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }

    pub(crate) fn check(&self) -> Result<()> {
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(
                UomError::Configuration(format!("alpha must be positive: {}", self.alpha)).into(),
            );
        }
        if !self.gamma.is_finite() || !(0.0..=1.0).contains(&self.gamma) {
            return Err(UomError::Configuration(format!(
                "gamma must be in [0, 1]: {}",
                self.gamma
            ))
            .into());
        }
        if !self.divergence_bound.is_finite() || self.divergence_bound <= 0.0 {
            return Err(UomError::Configuration(format!(
                "divergence bound must be positive: {}",
                self.divergence_bound
            ))
            .into());
        }
        Ok(())
    }
}

/// A pair of linear operators modelling one option.
///
/// Rows of both operators correspond to input feature indices. The
/// operators are mutated only by [`update`](Self::update) and read by
/// the two query methods; visualization collaborators may inspect them
/// through [`m`](Self::m) and [`u`](Self::u) but must never mutate core
/// state.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct UniversalOptionModel {
    m: Mat,
    u: Mat,
    alpha: f32,
    gamma: f32,
    divergence_bound: f32,
    n: usize,
}

impl UniversalOptionModel {
    /// Builds a model over `n` features with zero-initialized operators.
    pub fn build(n: usize, config: &UomConfig) -> Result<Self> {
        config.check()?;
        if n == 0 {
            return Err(UomError::Configuration("feature dimension must be positive".into()).into());
        }
        Ok(Self {
            m: Mat::zeros(n, n),
            u: Mat::zeros(n, n),
            alpha: config.alpha,
            gamma: config.gamma,
            divergence_bound: config.divergence_bound,
            n,
        })
    }

    /// Number of features the operators are defined over.
    pub fn n_features(&self) -> usize {
        self.n
    }

    /// The feature-transition operator `M`, read-only.
    pub fn m(&self) -> &Mat {
        &self.m
    }

    /// The return-composition operator `U`, read-only.
    pub fn u(&self) -> &Mat {
        &self.u
    }

    /// The expected discounted feature vector `M·φ` accumulated when the
    /// option runs to termination from `φ`.
    pub fn next_fv(&self, fv: &FeatureVector) -> Result<FeatureVector> {
        fv.check_finite()?;
        Ok(FeatureVector::from_vec(self.m.matvec(fv.as_slice())?))
    }

    /// The expected discounted return `rᵀ·U·φ` of executing the option
    /// from `φ` under an arbitrary reward weighting `r`.
    ///
    /// `r` was never seen during learning; this is the universal query.
    pub fn expected_return(&self, r: &[f32], fv: &FeatureVector) -> Result<f32> {
        fv.check_finite()?;
        if r.iter().any(|v| !v.is_finite()) {
            return Err(
                UomError::InvalidInput("reward vector contains non-finite entries".into()).into(),
            );
        }
        let ufv = self.u.matvec(fv.as_slice())?;
        if r.len() != ufv.len() {
            return Err(UomError::Dimension {
                expected: ufv.len(),
                got: r.len(),
            }
            .into());
        }
        Ok(r.iter().zip(ufv.iter()).map(|(a, b)| a * b).sum())
    }

    /// Performs one incremental fixed-point step from the transition
    /// `φ → φ_next`.
    ///
    /// With the option terminated at `φ_next`, the targets are `φ` for
    /// `M` and the identity contribution `φ` for `U`. While the option
    /// continues, both targets bootstrap through the next feature
    /// vector: `φ + γ·M·φ_next` and `φ + γ·U·φ_next`. Either way the
    /// operators take the rank-one step
    /// `Op ← Op + α·(target − Op·φ)·φᵀ`.
    ///
    /// Fails with [`UomError::Divergence`] if an operator's entries grow
    /// past the configured bound; the caller must not keep learning past
    /// that point.
    pub fn update(
        &mut self,
        fv: &FeatureVector,
        fv_next: &FeatureVector,
        terminated: bool,
    ) -> Result<()> {
        fv.check_finite()?;
        fv_next.check_finite()?;
        if fv.len() != self.n {
            return Err(UomError::Dimension {
                expected: self.n,
                got: fv.len(),
            }
            .into());
        }
        if fv_next.len() != self.n {
            return Err(UomError::Dimension {
                expected: self.n,
                got: fv_next.len(),
            }
            .into());
        }

        let phi = fv.as_slice();
        let phi_next = fv_next.as_slice();

        let target_m = self.bootstrap_target(&self.m, phi, phi_next, terminated)?;
        let target_u = self.bootstrap_target(&self.u, phi, phi_next, terminated)?;

        let residual_m = Self::residual(&self.m, phi, &target_m)?;
        let residual_u = Self::residual(&self.u, phi, &target_u)?;
        self.m.add_scaled_outer(&residual_m, phi, self.alpha)?;
        self.u.add_scaled_outer(&residual_u, phi, self.alpha)?;

        let magnitude = self.m.max_abs().max(self.u.max_abs());
        if !magnitude.is_finite() || magnitude > self.divergence_bound {
            return Err(UomError::Divergence {
                magnitude,
                bound: self.divergence_bound,
            }
            .into());
        }
        trace!(
            "uom update: terminated={}, operator magnitude={}",
            terminated,
            magnitude
        );
        Ok(())
    }

    /// `φ` when terminated, `φ + γ·Op·φ_next` while continuing.
    fn bootstrap_target(
        &self,
        op: &Mat,
        phi: &[f32],
        phi_next: &[f32],
        terminated: bool,
    ) -> Result<Vec<f32>> {
        if terminated {
            return Ok(phi.to_vec());
        }
        let next = op.matvec(phi_next)?;
        Ok(phi
            .iter()
            .zip(next.iter())
            .map(|(p, x)| p + self.gamma * x)
            .collect())
    }

    fn residual(op: &Mat, phi: &[f32], target: &[f32]) -> Result<Vec<f32>> {
        let pred = op.matvec(phi)?;
        Ok(target.iter().zip(pred.iter()).map(|(t, p)| t - p).collect())
    }
}
