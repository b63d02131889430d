#![warn(missing_docs)]
//! Hierarchical reinforcement learning with universal option models.
//!
//! An option is a temporally-extended action: an internal policy plus a
//! termination strategy. Each option carries a [`UniversalOptionModel`],
//! a pair of linear operators learned once and queried for arbitrarily
//! many reward functions: `M` predicts the expected discounted feature
//! vector the option accumulates, `U` converts any reward weighting into
//! the option's expected discounted return.
//!
//! The crate provides:
//!
//! * [`FunctionApproximator`] and [`TabularApproximator`]: raw states to
//!   feature vectors.
//! * [`ViPolicy`] and [`ValueFunction`]: per-feature reward and value
//!   estimates with ε-greedy selection over model-scored decisions.
//! * [`UniversalOptionModel`]: incremental learning and the two
//!   universal queries.
//! * [`TemporalOption`] and [`Termination`]: the option abstraction with
//!   pluggable termination.
//! * [`UomAgent`]: the composition, choosing between
//!   [`Decision::Primitive`] and [`Decision::Extended`] at every
//!   decision point.
//!
//! Environments implement the [`Env`] trait; drivers and visualization
//! are external collaborators reading, never mutating, core state.
pub mod error;
pub mod record;

mod agent;
mod base;
mod fa;
mod mat;
mod option;
mod policy;
mod uom;

pub use agent::{AgentConfig, Decision, UomAgent};
pub use base::Env;
pub use fa::{FeatureVector, FunctionApproximator, TabularApproximator};
pub use mat::Mat;
pub use option::{
    LeaveFeature, OneStep, OptionStatus, TemporalOption, Termination, WithProbability,
};
pub use policy::{PolicyConfig, ValueFunction, ViPolicy};
pub use uom::{UniversalOptionModel, UomConfig};
