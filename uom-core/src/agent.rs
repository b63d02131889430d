//! Agent composing primitive actions and options.
mod config;
use crate::{
    base::Env,
    error::UomError,
    fa::{FeatureVector, FunctionApproximator},
    option::{OptionStatus, TemporalOption},
    policy::ViPolicy,
    record::{Record, RecordValue},
    uom::UniversalOptionModel,
};
use anyhow::Result;
use chrono::prelude::Local;
pub use config::AgentConfig;
use log::{debug, info};
use std::collections::VecDeque;

/// A decision the agent can take at a decision point.
///
/// Options are addressed by their own index space, never by offsetting
/// primitive action indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Take primitive action `a` for one environment step.
    Primitive(usize),
    /// Run option `i` until its termination strategy fires.
    Extended(usize),
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Hierarchical agent over primitive actions and options.
///
/// # Decision cycle
///
/// 1. Encode the current raw state as a feature vector `φ`.
/// 2. Score every candidate decision with its option model and let the
///    primitive-level policy pick one (ε-greedy, lowest-index
///    tie-break). Primitive actions carry one-step models so one
///    scoring rule covers both decision kinds.
/// 3. A primitive decision takes a single environment step. An extended
///    decision runs the option's internal policy until the option's
///    termination strategy fires; every inner transition feeds the
///    option's policy and model.
/// 4. All transitions also update the primitive-level value function
///    and the one-step model of the primitive action taken.
///
/// ```mermaid
/// graph LR
///     A[UomAgent]-->|action|B[Env]
///     B-->|state, reward|A
///     A-->|transitions|C[TemporalOption]
///     C-->|M and U queries|A
/// ```
///
/// The agent also keeps a rolling buffer of visited raw states for
/// external diagnostics; no learning rule reads it.
pub struct UomAgent<F: FunctionApproximator> {
    fa: F,
    policy: ViPolicy,
    primitive_models: Vec<UniversalOptionModel>,
    options: Vec<TemporalOption>,
    samples: VecDeque<F::State>,
    sample_capacity: usize,
}

impl<F: FunctionApproximator> UomAgent<F>
where
    F::State: Clone,
{
    /// Builds an agent from its configuration, an approximator and a
    /// fixed set of options.
    ///
    /// The options persist for the agent's lifetime; none are added or
    /// destroyed mid-run.
    pub fn build(config: &AgentConfig, fa: F, options: Vec<TemporalOption>) -> Result<Self> {
        config.check()?;
        if fa.n_features() != config.n_features {
            return Err(UomError::Dimension {
                expected: config.n_features,
                got: fa.n_features(),
            }
            .into());
        }
        for opt in options.iter() {
            if opt.uom().n_features() != config.n_features {
                return Err(UomError::Dimension {
                    expected: config.n_features,
                    got: opt.uom().n_features(),
                }
                .into());
            }
        }
        let primitive_models = (0..config.n_actions)
            .map(|_| UniversalOptionModel::build(config.n_features, &config.uom))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            fa,
            policy: ViPolicy::build(config.n_features, &config.policy)?,
            primitive_models,
            options,
            samples: VecDeque::with_capacity(config.sample_capacity),
            sample_capacity: config.sample_capacity,
        })
    }

    /// The primitive-level policy, read-only.
    pub fn policy(&self) -> &ViPolicy {
        &self.policy
    }

    /// The one-step models of the primitive actions, read-only.
    pub fn primitive_models(&self) -> &[UniversalOptionModel] {
        &self.primitive_models
    }

    /// The agent's options, read-only.
    pub fn options(&self) -> &[TemporalOption] {
        &self.options
    }

    /// Visited raw states, newest last. Diagnostics only.
    pub fn samples(&self) -> &VecDeque<F::State> {
        &self.samples
    }

    fn record_sample(&mut self, state: &F::State) {
        if self.sample_capacity == 0 {
            return;
        }
        if self.samples.len() == self.sample_capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(state.clone());
    }

    /// Chooses a primitive action or an option at the current feature
    /// vector.
    pub fn decide(&mut self, fv: &FeatureVector) -> Result<Decision> {
        let mut decisions = Vec::with_capacity(self.primitive_models.len() + self.options.len());
        let mut models: Vec<&UniversalOptionModel> = Vec::with_capacity(decisions.capacity());
        for (a, model) in self.primitive_models.iter().enumerate() {
            decisions.push(Decision::Primitive(a));
            models.push(model);
        }
        for (i, opt) in self.options.iter().enumerate() {
            decisions.push(Decision::Extended(i));
            models.push(opt.uom());
        }
        let ix = self.policy.choose_action(fv, &models)?;
        Ok(decisions[ix])
    }

    /// Performs one decision point: a single environment step for a
    /// primitive decision, a full option execution for an extended one.
    ///
    /// Returns the state the agent ends in, the accumulated reward and
    /// the number of environment steps taken.
    pub fn step<E>(&mut self, env: &mut E, state: &F::State) -> Result<(F::State, f32, usize)>
    where
        E: Env<State = F::State>,
    {
        self.record_sample(state);
        let fv = self.fa.evaluate(state)?;
        match self.decide(&fv)? {
            Decision::Primitive(a) => {
                let (next, reward) = env.take_action(state, a)?;
                let fv_next = self.fa.evaluate(&next)?;
                // A primitive action is a one-step option of its model.
                self.primitive_models[a].update(&fv, &fv_next, true)?;
                self.policy.update_reward(&fv, reward)?;
                self.policy.update_value(&fv, reward, &fv_next)?;
                debug!("primitive action {}: reward={}", a, reward);
                Ok((next, reward, 1))
            }
            Decision::Extended(i) => self.run_option(env, i, state),
        }
    }

    /// Runs option `i` from `state` until its termination strategy
    /// fires.
    ///
    /// The execution starts `Running`; it moves to `Terminated` exactly
    /// when the strategy fires for the current feature vector, and that
    /// ends the execution.
    fn run_option<E>(&mut self, env: &mut E, i: usize, state: &F::State) -> Result<(F::State, f32, usize)>
    where
        E: Env<State = F::State>,
    {
        let mut state = state.clone();
        let mut total_reward = 0.0;
        let mut steps = 0;
        let mut status = OptionStatus::Running;
        while status == OptionStatus::Running {
            let fv = self.fa.evaluate(&state)?;
            let a = {
                let models: Vec<&UniversalOptionModel> = self.primitive_models.iter().collect();
                self.options[i].choose_primitive(&fv, &models)?
            };
            let (next, reward) = env.take_action(&state, a)?;
            let fv_next = self.fa.evaluate(&next)?;
            status = self.options[i].status(&fv_next);
            let terminated = status == OptionStatus::Terminated;
            self.options[i].observe(&fv, &fv_next, reward, terminated)?;
            self.primitive_models[a].update(&fv, &fv_next, true)?;
            self.policy.update_reward(&fv, reward)?;
            self.policy.update_value(&fv, reward, &fv_next)?;
            total_reward += reward;
            steps += 1;
            state = next;
            if !terminated {
                self.record_sample(&state);
            }
        }
        debug!(
            "option {} terminated after {} steps: return={}",
            i, steps, total_reward
        );
        Ok((state, total_reward, steps))
    }

    /// Runs one episode of at most `max_steps` environment steps and
    /// returns its diagnostics.
    ///
    /// Episode count, seeding cadence and persistence stay with the
    /// driver; the agent only owns the per-step decision/update cycle.
    pub fn run_episode<E>(&mut self, env: &mut E, max_steps: usize) -> Result<Record>
    where
        E: Env<State = F::State>,
    {
        let mut state = env.initial_state()?;
        let mut episode_return = 0.0;
        let mut steps = 0;
        while steps < max_steps {
            let (next, reward, taken) = self.step(env, &state)?;
            episode_return += reward;
            steps += taken;
            state = next;
        }
        info!("episode finished: return={}, steps={}", episode_return, steps);
        let mut record = Record::from_scalar("episode_return", episode_return);
        record.insert("steps", RecordValue::Scalar(steps as f32));
        record.insert("datetime", RecordValue::DateTime(Local::now()));
        Ok(record)
    }
}
