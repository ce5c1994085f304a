// Both smoothed variants live here, they only differ in whether the signal
// phase exists at all.

use super::{Action, Belief, Policy, RoundView};
use crate::simulation::config::PolicyParams;
use crate::simulation::convergence::Criterion;
use rand::RngCore;

/// Frequency counting seeded with a fictitious `pseudo_count` on both colors
/// of both tallies, so every ratio is defined and strictly inside (0,1)
/// before and after any finite number of real observations.
#[derive(Debug, Clone)]
pub struct PseudoCountSmoothed {
    pseudo_count: f64,
    signal_total: f64,
    blue_signal: f64,
    choice_total: f64,
    blue_choice: f64,
}

impl PseudoCountSmoothed {
    pub fn new(params: &PolicyParams) -> Self {
        let pc = params.pseudo_count;
        Self {
            pseudo_count: pc,
            signal_total: 2.0 * pc,
            blue_signal: pc,
            choice_total: 2.0 * pc,
            blue_choice: pc,
        }
    }

    fn signal_blue_ratio(&self) -> f64 {
        self.blue_signal / self.signal_total
    }

    fn choice_blue_ratio(&self) -> f64 {
        self.blue_choice / self.choice_total
    }
}

impl Policy for PseudoCountSmoothed {
    fn decide_signal(&mut self, _round: u64, rng: &mut dyn RngCore) -> Action {
        // The seeded counts make this exactly 0.5 on the first move.
        Action::with_blue_probability(self.signal_blue_ratio(), rng)
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
            Action::with_blue_probability(self.choice_blue_ratio(), rng)
        }
    }

    fn update(&mut self, view: &RoundView) {
        self.signal_total += 1.0;
        if view.own_signal.is_blue() {
            self.blue_signal += 1.0;
        }
        self.choice_total += 1.0;
        if view.chosen_side.is_blue() {
            self.blue_choice += 1.0;
        }
    }

    fn belief(&self) -> Belief {
        Belief {
            signal_bias: self.signal_blue_ratio(),
            choice_bias: self.choice_blue_ratio(),
        }
    }

    fn criterion(&self) -> Criterion {
        Criterion::LastAction
    }

    fn name(&self) -> &str {
        "pseudo-count"
    }

    fn reset(&mut self) {
        self.signal_total = 2.0 * self.pseudo_count;
        self.blue_signal = self.pseudo_count;
        self.choice_total = 2.0 * self.pseudo_count;
        self.blue_choice = self.pseudo_count;
    }

    fn clone_box(&self) -> Box<dyn Policy> {
        Box::new(self.clone())
    }
}

/// Smoothed counting over a single direction tally, no signal phase: the
/// sampled direction is emitted as the signal and echoed as the side, which
/// reproduces the one-phase game under the two-phase protocol.
#[derive(Debug, Clone)]
pub struct PseudoCountDirect {
    pseudo_count: f64,
    total: f64,
    blue_count: f64,
}

impl PseudoCountDirect {
    pub fn new(params: &PolicyParams) -> Self {
        let pc = params.pseudo_count;
        Self {
            pseudo_count: pc,
            total: 2.0 * pc,
            blue_count: pc,
        }
    }

    fn blue_ratio(&self) -> f64 {
        self.blue_count / self.total
    }
}

impl Policy for PseudoCountDirect {
    fn decide_signal(&mut self, _round: u64, rng: &mut dyn RngCore) -> Action {
        Action::with_blue_probability(self.blue_ratio(), rng)
    }

    fn decide_side(
        &mut self,
        own_signal: Action,
        _opponent_signal: Action,
        _round: u64,
        _rng: &mut dyn RngCore,
    ) -> Action {
        own_signal
    }

    fn update(&mut self, view: &RoundView) {
        self.total += 1.0;
        if view.chosen_side.is_blue() {
            self.blue_count += 1.0;
        }
    }

    fn belief(&self) -> Belief {
        let ratio = self.blue_ratio();
        Belief {
            signal_bias: ratio,
            choice_bias: ratio,
        }
    }

    fn criterion(&self) -> Criterion {
        Criterion::LastAction
    }

    fn name(&self) -> &str {
        "pseudo-count-direct"
    }

    fn reset(&mut self) {
        self.total = 2.0 * self.pseudo_count;
        self.blue_count = self.pseudo_count;
    }

    fn clone_box(&self) -> Box<dyn Policy> {
        Box::new(self.clone())
    }
}
