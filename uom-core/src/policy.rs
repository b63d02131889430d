//! Value functions and the value-iteration policy.
use crate::{error::UomError, fa::FeatureVector, uom::UniversalOptionModel};
use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`ViPolicy`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PolicyConfig {
    /// Step size of the value and reward updates.
    pub alpha: f32,

    /// Discount factor used when scoring candidate decisions.
    pub gamma: f32,

    /// Probability of taking a uniformly random decision.
    pub epsilon: f32,

    /// Seed of the exploration random number generator.
    pub seed: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.1,
            seed: 42,
        }
    }
}

impl PolicyConfig {
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

    /// Sets the exploration rate.
    pub fn epsilon(mut self, v: f32) -> Self {
        self.epsilon = v;
        self
    }

    /// Sets the exploration seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`PolicyConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`PolicyConfig`].
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
        if !self.epsilon.is_finite() || !(0.0..=1.0).contains(&self.epsilon) {
            return Err(UomError::Configuration(format!(
                "epsilon must be in [0, 1]: {}",
                self.epsilon
            ))
            .into());
        }
        Ok(())
    }
}

/// Per-feature reward and value estimates.
///
/// Owns the reward model `r` and the value weights `theta`; both are
/// mutated only by the bounded-step update rules and read everywhere
/// else.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ValueFunction {
    r: Vec<f32>,
    theta: Vec<f32>,
    alpha: f32,
}

impl ValueFunction {
    fn build(n: usize, alpha: f32) -> Self {
        Self {
            r: vec![0.0; n],
            theta: vec![0.0; n],
            alpha,
        }
    }

    /// Number of features.
    pub fn n_features(&self) -> usize {
        self.theta.len()
    }

    /// The per-feature reward estimates, read-only.
    pub fn r(&self) -> &[f32] {
        &self.r
    }

    /// The per-feature value weights, read-only.
    pub fn theta(&self) -> &[f32] {
        &self.theta
    }

    /// Estimated one-step reward `r·φ`.
    pub fn reward(&self, fv: &FeatureVector) -> Result<f32> {
        fv.check_finite()?;
        fv.dot(&self.r)
    }

    /// Estimated value `θ·φ`.
    pub fn value(&self, fv: &FeatureVector) -> Result<f32> {
        fv.check_finite()?;
        fv.dot(&self.theta)
    }

    /// Moves `r` toward an observed reward with a bounded step.
    pub fn update_reward(&mut self, fv: &FeatureVector, observed: f32) -> Result<()> {
        if !observed.is_finite() {
            return Err(UomError::InvalidInput(format!("non-finite reward: {}", observed)).into());
        }
        let delta = self.alpha * (observed - self.reward(fv)?);
        for (w, p) in self.r.iter_mut().zip(fv.as_slice().iter()) {
            *w += delta * p;
        }
        Ok(())
    }

    /// Moves `θ` toward a value target with a bounded step.
    pub fn update_value(&mut self, fv: &FeatureVector, target: f32) -> Result<()> {
        if !target.is_finite() {
            return Err(
                UomError::InvalidInput(format!("non-finite value target: {}", target)).into(),
            );
        }
        let delta = self.alpha * (target - self.value(fv)?);
        for (w, p) in self.theta.iter_mut().zip(fv.as_slice().iter()) {
            *w += delta * p;
        }
        Ok(())
    }
}

/// Value-iteration policy: ε-greedy selection over candidate decisions
/// scored with their option models.
///
/// A candidate's score is `rᵀ·U·φ + γ·θᵀ·M·φ`, the expected return of
/// the decision under the learned reward model plus the discounted
/// value of its predicted feature accumulation. Scoring reads the
/// models only; no option is ever simulated to rank it.
pub struct ViPolicy {
    vi: ValueFunction,
    epsilon: f32,
    gamma: f32,
    rng: StdRng,
}

impl ViPolicy {
    /// Builds a policy over `n` features.
    pub fn build(n: usize, config: &PolicyConfig) -> Result<Self> {
        config.check()?;
        if n == 0 {
            return Err(UomError::Configuration("feature dimension must be positive".into()).into());
        }
        Ok(Self {
            vi: ValueFunction::build(n, config.alpha),
            epsilon: config.epsilon,
            gamma: config.gamma,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// The owned value function, read-only.
    pub fn vi(&self) -> &ValueFunction {
        &self.vi
    }

    /// Moves the reward model toward an observed reward.
    pub fn update_reward(&mut self, fv: &FeatureVector, observed: f32) -> Result<()> {
        self.vi.update_reward(fv, observed)
    }

    /// Moves the value weights toward a TD target built from an
    /// observed reward and the next feature vector.
    pub fn update_value(&mut self, fv: &FeatureVector, reward: f32, fv_next: &FeatureVector) -> Result<()> {
        let target = reward + self.gamma * self.vi.value(fv_next)?;
        self.vi.update_value(fv, target)
    }

    /// Scores one candidate decision with its option model.
    pub fn q(&self, fv: &FeatureVector, model: &UniversalOptionModel) -> Result<f32> {
        let expected = model.expected_return(&self.vi.r, fv)?;
        let accumulated = model.next_fv(fv)?;
        Ok(expected + self.gamma * self.vi.value(&accumulated)?)
    }

    /// ε-greedy selection among the candidates scored by `models`.
    pub fn choose_action(
        &mut self,
        fv: &FeatureVector,
        models: &[&UniversalOptionModel],
    ) -> Result<usize> {
        if models.is_empty() {
            return Err(UomError::Configuration("no candidate decisions".into()).into());
        }
        if self.rng.gen::<f32>() < self.epsilon {
            return Ok(self.rng.gen_range(0..models.len()));
        }
        self.greedy(fv, models)
    }

    /// Greedy argmax over the candidates; ties break toward the lowest
    /// index so selection is reproducible.
    pub fn greedy(&self, fv: &FeatureVector, models: &[&UniversalOptionModel]) -> Result<usize> {
        if models.is_empty() {
            return Err(UomError::Configuration("no candidate decisions".into()).into());
        }
        let mut best = 0;
        let mut best_q = self.q(fv, models[0])?;
        for (i, model) in models.iter().enumerate().skip(1) {
            let q = self.q(fv, model)?;
            if q > best_q {
                best = i;
                best_q = q;
            }
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::{PolicyConfig, ViPolicy};
    use crate::{
        fa::FeatureVector,
        uom::{UniversalOptionModel, UomConfig},
    };
    use tempdir::TempDir;

    fn one_hot(i: usize, n: usize) -> FeatureVector {
        let mut v = vec![0.0f32; n];
        v[i] = 1.0;
        FeatureVector::from_vec(v)
    }

    #[test]
    fn test_update_reward_moves_toward_observed() {
        let mut policy = ViPolicy::build(3, &PolicyConfig::default()).unwrap();
        let phi = one_hot(1, 3);
        for _ in 0..100 {
            policy.update_reward(&phi, 2.0).unwrap();
        }
        let estimate = policy.vi().reward(&phi).unwrap();
        assert!((estimate - 2.0).abs() < 1e-3, "got {}", estimate);
    }

    #[test]
    fn test_greedy_tie_break_is_lowest_index() {
        let mut policy = ViPolicy::build(3, &PolicyConfig::default().epsilon(0.0)).unwrap();
        let uom_a = UniversalOptionModel::build(3, &UomConfig::default()).unwrap();
        let uom_b = uom_a.clone();
        let phi = one_hot(0, 3);
        // Identical zero-initialized models: every score ties.
        for _ in 0..10 {
            assert_eq!(policy.greedy(&phi, &[&uom_a, &uom_b]).unwrap(), 0);
            assert_eq!(policy.choose_action(&phi, &[&uom_a, &uom_b]).unwrap(), 0);
        }
    }

    #[test]
    fn test_greedy_prefers_higher_scored_model() {
        let mut policy = ViPolicy::build(2, &PolicyConfig::default().epsilon(0.0)).unwrap();
        let phi0 = one_hot(0, 2);
        let phi1 = one_hot(1, 2);
        // Reward model favors feature 1.
        for _ in 0..200 {
            policy.update_reward(&phi1, 1.0).unwrap();
            policy.update_reward(&phi0, 0.0).unwrap();
        }
        let stay = {
            let mut uom = UniversalOptionModel::build(2, &UomConfig::default().alpha(1.0)).unwrap();
            uom.update(&phi0, &phi0, true).unwrap();
            uom
        };
        let go = {
            let mut uom = UniversalOptionModel::build(2, &UomConfig::default().alpha(1.0)).unwrap();
            uom.update(&phi1, &phi1, true).unwrap();
            uom.update(&phi0, &phi1, false).unwrap();
            uom.update(&phi0, &phi1, false).unwrap();
            uom
        };
        assert_eq!(policy.greedy(&phi0, &[&stay, &go]).unwrap(), 1);
    }

    #[test]
    fn test_choose_action_empty_candidates() {
        let mut policy = ViPolicy::build(2, &PolicyConfig::default()).unwrap();
        assert!(policy.choose_action(&one_hot(0, 2), &[]).is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(ViPolicy::build(2, &PolicyConfig::default().alpha(0.0)).is_err());
        assert!(ViPolicy::build(2, &PolicyConfig::default().epsilon(1.5)).is_err());
        assert!(ViPolicy::build(2, &PolicyConfig::default().gamma(-0.1)).is_err());
    }

    #[test]
    fn test_config_yaml_round_trip() {
        let config = PolicyConfig::default().alpha(0.05).epsilon(0.2).seed(7);
        let dir = TempDir::new("uom_policy_config").unwrap();
        let path = dir.path().join("policy.yaml");
        config.save(&path).unwrap();
        let loaded = PolicyConfig::load(&path).unwrap();
        assert_eq!(config, loaded);
    }
}
