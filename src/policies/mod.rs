pub mod frequency;
pub mod pseudo_count;
pub mod exploration;
pub mod reward;
pub mod preference;

use crate::simulation::config::PolicyParams;
use crate::simulation::convergence::Criterion;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Blue,
    Red,
}

impl Action {
    /// Fair coin toss, used for every unbiased first move.
    pub fn coin(rng: &mut dyn RngCore) -> Self {
        Self::with_blue_probability(0.5, rng)
    }

    pub fn with_blue_probability(p: f64, rng: &mut dyn RngCore) -> Self {
        if rng.r#gen::<f64>() < p {
            Action::Blue
        } else {
            Action::Red
        }
    }

    pub fn is_blue(self) -> bool {
        self == Action::Blue
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Blue => write!(f, "Blue"),
            Action::Red => write!(f, "Red"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    /// A round succeeds iff both final actions match; symmetric in the pair.
    pub fn from_sides(a: Action, b: Action) -> Self {
        if a == b { Outcome::Success } else { Outcome::Failure }
    }

    pub fn reward(self) -> f64 {
        match self {
            Outcome::Success => 1.0,
            Outcome::Failure => 0.0,
        }
    }

    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }
}

/// Public summary of an agent's belief, for observers and convergence checks.
/// Policies without a separate choice parameter report the same value twice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Belief {
    pub signal_bias: f64,
    pub choice_bias: f64,
}

/// Everything a policy is allowed to see when updating: its own emitted
/// signal and chosen side, the opponent's public signal, and the shared
/// outcome. Never the opponent's internal state.
#[derive(Debug, Clone, Copy)]
pub struct RoundView {
    pub own_signal: Action,
    pub opponent_signal: Action,
    pub chosen_side: Action,
    pub outcome: Outcome,
}

impl RoundView {
    pub fn signals_match(&self) -> bool {
        self.own_signal == self.opponent_signal
    }

    pub fn stuck_with_signal(&self) -> bool {
        self.chosen_side == self.own_signal
    }
}

pub trait Policy: Send + fmt::Debug {
    /// First-phase declaration, from own belief state only.
    fn decide_signal(&mut self, round: u64, rng: &mut dyn RngCore) -> Action;

    /// Final action, after both signals are revealed.
    fn decide_side(
        &mut self,
        own_signal: Action,
        opponent_signal: Action,
        round: u64,
        rng: &mut dyn RngCore,
    ) -> Action;

    /// Mutate own belief from the round outcome.
    fn update(&mut self, view: &RoundView);

    fn belief(&self) -> Belief;
    fn criterion(&self) -> Criterion;
    fn name(&self) -> &str;
    fn reset(&mut self);
    fn clone_box(&self) -> Box<dyn Policy>;
}

pub struct PolicyRegistry {
    policies: HashMap<String, Box<dyn Fn(&PolicyParams) -> Box<dyn Policy> + Send + Sync>>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            policies: HashMap::new(),
        };
        registry.register_builtin();
        registry
    }

    fn register_builtin(&mut self) {
        self.register("frequency-ratio", |_| Box::new(frequency::FrequencyRatio::new()));
        self.register("frequency", |_| Box::new(frequency::FrequencyRatio::new()));
        self.register("pseudo-count", |p| Box::new(pseudo_count::PseudoCountSmoothed::new(p)));
        self.register("pseudocount", |p| Box::new(pseudo_count::PseudoCountSmoothed::new(p)));
        self.register("pseudo-count-direct", |p| Box::new(pseudo_count::PseudoCountDirect::new(p)));
        self.register("exploration-decay", |p| Box::new(exploration::ExplorationDecay::new(p)));
        self.register("exploration", |p| Box::new(exploration::ExplorationDecay::new(p)));
        self.register("reward", |p| Box::new(reward::AsymmetricReward::new(p)));
        self.register("asymmetric-reward", |p| Box::new(reward::AsymmetricReward::new(p)));
        self.register("recent-reward", |p| Box::new(reward::RecentReward::new(p)));
        self.register("preference", |p| Box::new(preference::DirectPreference::new(p)));
        self.register("direct-preference", |p| Box::new(preference::DirectPreference::new(p)));
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&PolicyParams) -> Box<dyn Policy> + Send + Sync + 'static,
    {
        self.policies.insert(name.to_lowercase(), Box::new(factory));
    }

    pub fn create(&self, name: &str, params: &PolicyParams) -> Option<Box<dyn Policy>> {
        self.policies
            .get(&name.to_lowercase())
            .map(|factory| factory(params))
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.policies.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn global() -> &'static PolicyRegistry {
        use std::sync::OnceLock;
        static REGISTRY: OnceLock<PolicyRegistry> = OnceLock::new();
        REGISTRY.get_or_init(PolicyRegistry::new)
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PolicyBuilder {
    name: String,
    params: PolicyParams,
}

impl PolicyBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: PolicyParams::default(),
        }
    }

    pub fn learning_rate(mut self, rate: f64) -> Self {
        self.params.learning_rate = rate;
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.params.alpha = alpha;
        self
    }

    pub fn beta(mut self, beta: f64) -> Self {
        self.params.beta = beta;
        self
    }

    pub fn pseudo_count(mut self, count: f64) -> Self {
        self.params.pseudo_count = count;
        self
    }

    pub fn build(self) -> Option<Box<dyn Policy>> {
        PolicyRegistry::global().create(&self.name, &self.params)
    }
}
