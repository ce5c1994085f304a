use super::{Action, Belief, Policy, RoundView};
use crate::simulation::convergence::Criterion;
use rand::RngCore;

/// Raw frequency counting: signal and side are sampled from the empirical
/// ratio of Blue in the agent's own past interactions. The first move is a
/// fair coin, never a 0/0 ratio.
#[derive(Debug, Clone, Default)]
pub struct FrequencyRatio {
    total_interactions: u64,
    blue_signals: u64,
    blue_choices: u64,
}

impl FrequencyRatio {
    pub fn new() -> Self {
        Self::default()
    }

    fn signal_bias(&self) -> f64 {
        if self.total_interactions == 0 {
            0.5
        } else {
            self.blue_signals as f64 / self.total_interactions as f64
        }
    }

    fn choice_bias(&self) -> f64 {
        if self.total_interactions == 0 {
            0.5
        } else {
            self.blue_choices as f64 / self.total_interactions as f64
        }
    }
}

impl Policy for FrequencyRatio {
    fn decide_signal(&mut self, _round: u64, rng: &mut dyn RngCore) -> Action {
        if self.total_interactions == 0 {
            Action::coin(rng)
        } else {
            Action::with_blue_probability(self.signal_bias(), rng)
        }
    }

    fn decide_side(
        &mut self,
        own_signal: Action,
        opponent_signal: Action,
        _round: u64,
        rng: &mut dyn RngCore,
    ) -> Action {
        if own_signal == opponent_signal {
            own_signal
        } else {
            Action::with_blue_probability(self.choice_bias(), rng)
        }
    }

    fn update(&mut self, view: &RoundView) {
        // Counting is unconditional, outcome does not matter here.
        self.total_interactions += 1;
        if view.own_signal.is_blue() {
            self.blue_signals += 1;
        }
        if view.chosen_side.is_blue() {
            self.blue_choices += 1;
        }
    }

    fn belief(&self) -> Belief {
        Belief {
            signal_bias: self.signal_bias(),
            choice_bias: self.choice_bias(),
        }
    }

    fn criterion(&self) -> Criterion {
        Criterion::LastAction
    }

    fn name(&self) -> &str {
        "frequency-ratio"
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn clone_box(&self) -> Box<dyn Policy> {
        Box::new(self.clone())
    }
}
