//! Options: temporally-extended actions.
//!
//! An option couples an internal policy over primitive actions with a
//! universal option model and a termination strategy. Executing an
//! option means following its internal policy until the strategy
//! reports termination; planning with an option means querying its
//! model instead of simulating it.
use crate::{
    fa::FeatureVector,
    policy::{PolicyConfig, ViPolicy},
    uom::{UniversalOptionModel, UomConfig},
};
use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Execution state of an option.
///
/// A fresh execution starts `Running` and moves to `Terminated` exactly
/// when the termination strategy fires for the current feature vector.
/// `Terminated` is absorbing for that execution; starting the option
/// again begins a new `Running` episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionStatus {
    /// The option keeps control of action selection.
    Running,
    /// The option has given control back to the agent.
    Terminated,
}

/// Decides whether an option terminates in a given feature vector.
///
/// Strategies may be deterministic or stochastic; the option model's
/// contract does not change either way. Takes `&mut self` so stochastic
/// strategies can own their generator.
pub trait Termination {
    /// Status of the option at the given feature vector.
    fn status(&mut self, fv: &FeatureVector) -> OptionStatus;
}

/// Terminates after a single decision point.
pub struct OneStep;

impl Termination for OneStep {
    fn status(&mut self, _fv: &FeatureVector) -> OptionStatus {
        OptionStatus::Terminated
    }
}

/// Runs while a tracked feature stays active, terminates once its
/// activation drops below a threshold.
pub struct LeaveFeature {
    feature: usize,
    threshold: f32,
}

impl LeaveFeature {
    /// Tracks `feature`; the option terminates when its activation is
    /// below `threshold`.
    pub fn new(feature: usize, threshold: f32) -> Self {
        Self { feature, threshold }
    }
}

impl Termination for LeaveFeature {
    fn status(&mut self, fv: &FeatureVector) -> OptionStatus {
        let active = fv
            .as_slice()
            .get(self.feature)
            .map_or(false, |v| *v >= self.threshold);
        if active {
            OptionStatus::Running
        } else {
            OptionStatus::Terminated
        }
    }
}

/// Terminates with a fixed probability at every decision point.
pub struct WithProbability {
    p: f32,
    rng: StdRng,
}

impl WithProbability {
    /// Terminates with probability `p`, drawn from a seeded generator.
    pub fn new(p: f32, seed: u64) -> Self {
        Self {
            p: p.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Termination for WithProbability {
    fn status(&mut self, _fv: &FeatureVector) -> OptionStatus {
        if self.rng.gen::<f32>() < self.p {
            OptionStatus::Terminated
        } else {
            OptionStatus::Running
        }
    }
}

/// A temporally-extended action: internal policy, universal option
/// model, and termination strategy under one roof.
pub struct TemporalOption {
    policy: ViPolicy,
    uom: UniversalOptionModel,
    termination: Box<dyn Termination>,
}

impl TemporalOption {
    /// Builds an option over `n` features.
    pub fn build(
        n: usize,
        policy_config: &PolicyConfig,
        uom_config: &UomConfig,
        termination: Box<dyn Termination>,
    ) -> Result<Self> {
        Ok(Self {
            policy: ViPolicy::build(n, policy_config)?,
            uom: UniversalOptionModel::build(n, uom_config)?,
            termination,
        })
    }

    /// The option's internal policy, read-only.
    pub fn policy(&self) -> &ViPolicy {
        &self.policy
    }

    /// The option's model, read-only.
    pub fn uom(&self) -> &UniversalOptionModel {
        &self.uom
    }

    /// Expected discounted feature vector reached by running the option
    /// from `φ`; delegates to the model.
    pub fn next_fv(&self, fv: &FeatureVector) -> Result<FeatureVector> {
        self.uom.next_fv(fv)
    }

    /// Expected discounted return of the option from `φ` under an
    /// arbitrary reward weighting; delegates to the model.
    pub fn expected_return(&self, r: &[f32], fv: &FeatureVector) -> Result<f32> {
        self.uom.expected_return(r, fv)
    }

    /// Status of the option at the given feature vector.
    pub fn status(&mut self, fv: &FeatureVector) -> OptionStatus {
        self.termination.status(fv)
    }

    /// Lets the internal policy pick a primitive action, scored with the
    /// given per-action models.
    pub fn choose_primitive(
        &mut self,
        fv: &FeatureVector,
        models: &[&UniversalOptionModel],
    ) -> Result<usize> {
        self.policy.choose_action(fv, models)
    }

    /// Feeds one transition into the option's policy and model.
    pub fn observe(
        &mut self,
        fv: &FeatureVector,
        fv_next: &FeatureVector,
        reward: f32,
        terminated: bool,
    ) -> Result<()> {
        self.uom.update(fv, fv_next, terminated)?;
        self.policy.update_reward(fv, reward)?;
        self.policy.update_value(fv, reward, fv_next)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        LeaveFeature, OneStep, OptionStatus, Termination, TemporalOption, WithProbability,
    };
    use crate::{fa::FeatureVector, policy::PolicyConfig, uom::UomConfig};

    fn one_hot(i: usize, n: usize) -> FeatureVector {
        let mut v = vec![0.0f32; n];
        v[i] = 1.0;
        FeatureVector::from_vec(v)
    }

    #[test]
    fn test_one_step_always_terminates() {
        let mut t = OneStep;
        for i in 0..4 {
            assert_eq!(t.status(&one_hot(i, 4)), OptionStatus::Terminated);
        }
    }

    #[test]
    fn test_leave_feature() {
        let mut t = LeaveFeature::new(1, 0.5);
        assert_eq!(t.status(&one_hot(1, 3)), OptionStatus::Running);
        assert_eq!(t.status(&one_hot(0, 3)), OptionStatus::Terminated);
        assert_eq!(t.status(&one_hot(2, 3)), OptionStatus::Terminated);
    }

    #[test]
    fn test_with_probability_is_seeded() {
        let fv = one_hot(0, 2);
        let run = |seed: u64| -> Vec<OptionStatus> {
            let mut t = WithProbability::new(0.5, seed);
            (0..16).map(|_| t.status(&fv)).collect()
        };
        assert_eq!(run(3), run(3));
        // Degenerate probabilities behave deterministically.
        let mut never = WithProbability::new(0.0, 0);
        let mut always = WithProbability::new(1.0, 0);
        for _ in 0..8 {
            assert_eq!(never.status(&fv), OptionStatus::Running);
            assert_eq!(always.status(&fv), OptionStatus::Terminated);
        }
    }

    #[test]
    fn test_queries_delegate_to_model() {
        let mut opt = TemporalOption::build(
            3,
            &PolicyConfig::default(),
            &UomConfig::default().alpha(1.0),
            Box::new(OneStep),
        )
        .unwrap();
        let phi = one_hot(0, 3);
        let phi_next = one_hot(1, 3);
        opt.observe(&phi, &phi_next, 1.0, true).unwrap();
        assert_eq!(opt.next_fv(&phi).unwrap(), opt.uom().next_fv(&phi).unwrap());
        let r = [1.0, 2.0, 3.0];
        assert_eq!(
            opt.expected_return(&r, &phi).unwrap(),
            opt.uom().expected_return(&r, &phi).unwrap()
        );
    }
}
