//! Configuration of [`UomAgent`](super::UomAgent).
use crate::{error::UomError, policy::PolicyConfig, uom::UomConfig};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`UomAgent`](super::UomAgent).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct AgentConfig {
    /// Length of the feature vectors the approximator produces.
    pub n_features: usize,

    /// Number of primitive actions.
    pub n_actions: usize,

    /// Configuration of the primitive-level policy.
    pub policy: PolicyConfig,

    /// Configuration of the per-primitive one-step models.
    pub uom: UomConfig,

    /// Capacity of the rolling buffer of visited raw states, kept for
    /// external diagnostics only.
    pub sample_capacity: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            n_features: 0,
            n_actions: 0,
            policy: PolicyConfig::default(),
            uom: UomConfig::default(),
            sample_capacity: 1000,
        }
    }
}

impl AgentConfig {
    /// Sets the feature dimension.
    pub fn n_features(mut self, v: usize) -> Self {
        self.n_features = v;
        self
    }

    /// Sets the number of primitive actions.
    pub fn n_actions(mut self, v: usize) -> Self {
        self.n_actions = v;
        self
    }

    /// Sets the primitive-level policy configuration.
    pub fn policy(mut self, v: PolicyConfig) -> Self {
        self.policy = v;
        self
    }

    /// Sets the one-step model configuration.
    pub fn uom(mut self, v: UomConfig) -> Self {
        self.uom = v;
        self
    }

    /// Sets the capacity of the diagnostic sample buffer.
    pub fn sample_capacity(mut self, v: usize) -> Self {
        self.sample_capacity = v;
        self
    }

    /// Constructs [`AgentConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`AgentConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.n_features == 0 {
            return Err(UomError::Configuration("n_features must be positive".into()).into());
        }
        if self.n_actions == 0 {
            return Err(UomError::Configuration("n_actions must be positive".into()).into());
        }
        Ok(())
    }
}
