use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Every policy tunable, explicit. Each policy reads the subset it cares
/// about; nothing is ambient module state, so concurrent runs with different
/// tunables cannot interfere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyParams {
    pub learning_rate: f64,
    pub alpha: f64,
    pub beta: f64,
    pub pseudo_count: f64,
    pub initial_exploration_rate: f64,
    pub decay_factor: f64,
    pub min_exploration_rate: f64,
}

impl Default for PolicyParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.3,
            alpha: 0.5,
            beta: 0.4,
            pseudo_count: 2.0,
            initial_exploration_rate: 0.5,
            decay_factor: 0.98,
            min_exploration_rate: 0.0,
        }
    }
}

impl PolicyParams {
    /// Eager validation; user-supplied tunables are never silently clamped.
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            anyhow::bail!("learning_rate must be in (0, 1], got {}", self.learning_rate);
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            anyhow::bail!("alpha must be in [0, 1], got {}", self.alpha);
        }
        if !(0.0..=1.0).contains(&self.beta) {
            anyhow::bail!("beta must be in [0, 1], got {}", self.beta);
        }
        if !(self.pseudo_count > 0.0) {
            anyhow::bail!("pseudo_count must be positive, got {}", self.pseudo_count);
        }
        if !(0.0..=1.0).contains(&self.initial_exploration_rate) {
            anyhow::bail!(
                "initial_exploration_rate must be in [0, 1], got {}",
                self.initial_exploration_rate
            );
        }
        if !(self.decay_factor > 0.0 && self.decay_factor <= 1.0) {
            anyhow::bail!("decay_factor must be in (0, 1], got {}", self.decay_factor);
        }
        if !(0.0..=1.0).contains(&self.min_exploration_rate) {
            anyhow::bail!(
                "min_exploration_rate must be in [0, 1], got {}",
                self.min_exploration_rate
            );
        }
        if self.min_exploration_rate > self.initial_exploration_rate {
            anyhow::bail!("min_exploration_rate cannot exceed initial_exploration_rate");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub name: String,
    pub policy_name: String,
    pub num_agents: u32,
    pub max_rounds: u64,
    /// Convergence is sampled only every this many rounds.
    pub check_interval: u64,
    /// None picks a fresh seed; set it for reproducible trajectories.
    pub seed: Option<u64>,
    pub params: PolicyParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: "default_run".to_string(),
            policy_name: "pseudo-count".to_string(),
            num_agents: 20,
            max_rounds: 100_000,
            check_interval: 10,
            seed: None,
            params: PolicyParams::default(),
        }
    }
}

impl SimConfig {
    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy_name = policy.into();
        self
    }

    pub fn with_agents(mut self, num_agents: u32) -> Self {
        self.num_agents = num_agents;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: u64) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_agents < 2 {
            anyhow::bail!(
                "a coordination game needs at least 2 agents, got {}",
                self.num_agents
            );
        }
        if self.max_rounds == 0 {
            anyhow::bail!("max_rounds must be positive");
        }
        if self.check_interval == 0 {
            anyhow::bail!("check_interval must be positive");
        }
        self.params.validate()
    }
}
