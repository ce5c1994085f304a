use crate::policies::{Action, Belief, Policy, RoundView};
use rand::RngCore;

/// One agent: an identity plus a policy object that owns the belief state.
/// The belief shape (counts, smoothed counts, scalars) is entirely the
/// policy's business.
#[derive(Debug)]
pub struct Agent {
    id: u32,
    policy: Box<dyn Policy>,
    interactions: u64,
    last_side: Option<Action>,
}

impl Agent {
    pub fn new(id: u32, policy: Box<dyn Policy>) -> Self {
        Self {
            id,
            policy,
            interactions: 0,
            last_side: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn decide_signal(&mut self, round: u64, rng: &mut dyn RngCore) -> Action {
        self.policy.decide_signal(round, rng)
    }

    pub fn decide_side(
        &mut self,
        own_signal: Action,
        opponent_signal: Action,
        round: u64,
        rng: &mut dyn RngCore,
    ) -> Action {
        let side = self
            .policy
            .decide_side(own_signal, opponent_signal, round, rng);
        self.last_side = Some(side);
        side
    }

    /// Both agents of a pair must be fed the same view of the round.
    pub fn apply_outcome(&mut self, view: &RoundView) {
        self.policy.update(view);
        self.interactions += 1;
    }

    pub fn belief(&self) -> Belief {
        self.policy.belief()
    }

    /// Latest final action, None until the agent has been matched once.
    pub fn last_side(&self) -> Option<Action> {
        self.last_side
    }

    pub fn has_moved(&self) -> bool {
        self.last_side.is_some()
    }

    pub fn interactions(&self) -> u64 {
        self.interactions
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    pub fn reset(&mut self) {
        self.policy.reset();
        self.interactions = 0;
        self.last_side = None;
    }
}

/// Fixed, ordered collection of agents for one run. No agent joins or
/// leaves mid-run.
#[derive(Debug)]
pub struct Population {
    agents: Vec<Agent>,
}

impl Population {
    pub fn new<F>(num_agents: u32, mut make_policy: F) -> Self
    where
        F: FnMut() -> Box<dyn Policy>,
    {
        let agents = (0..num_agents)
            .map(|id| Agent::new(id, make_policy()))
            .collect();
        Self { agents }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn beliefs(&self) -> Vec<Belief> {
        self.agents.iter().map(Agent::belief).collect()
    }

    /// Mutable access to a matched pair. Indices must be distinct and in
    /// range; the matcher guarantees both.
    pub fn pair_mut(&mut self, i: usize, j: usize) -> (&mut Agent, &mut Agent) {
        assert!(i != j, "an agent cannot be paired with itself");
        if i < j {
            let (left, right) = self.agents.split_at_mut(j);
            (&mut left[i], &mut right[0])
        } else {
            let (left, right) = self.agents.split_at_mut(i);
            (&mut right[0], &mut left[j])
        }
    }
}
