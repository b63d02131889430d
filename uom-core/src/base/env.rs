//! Environment.
use anyhow::Result;
use std::fmt::Debug;

/// Represents an environment, typically an MDP.
///
/// The core asks little of an environment: rewards are scalar, actions
/// are indices into a fixed primitive repertoire, and states must be
/// convertible to feature vectors by a
/// [`FunctionApproximator`](crate::FunctionApproximator). Transition
/// dynamics are entirely the environment's business.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// State of the environment.
    type State: Clone + Debug;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Number of primitive actions.
    fn n_actions(&self) -> usize;

    /// Generates the state an episode starts from.
    fn initial_state(&mut self) -> Result<Self::State>;

    /// Applies an action in a state, returning the next state and the
    /// scalar reward.
    fn take_action(&mut self, state: &Self::State, action: usize) -> Result<(Self::State, f32)>;
}
