use super::{Action, Belief, Policy, RoundView};
use crate::simulation::config::PolicyParams;
use crate::simulation::convergence::Criterion;
use rand::{Rng, RngCore};

/// Reinforcement with geometrically decaying exploration: one EMA success
/// estimate per signal color, plus a scalar propensity to stick with one's
/// own signal when the pair's signals conflict.
#[derive(Debug, Clone)]
pub struct ExplorationDecay {
    blue_success_rate: f64,
    red_success_rate: f64,
    stick_probability: f64,
    total_interactions: u64,
    learning_rate: f64,
    initial_rate: f64,
    decay_factor: f64,
    min_rate: f64,
}

impl ExplorationDecay {
    pub fn new(params: &PolicyParams) -> Self {
        Self {
            blue_success_rate: 0.5,
            red_success_rate: 0.5,
            stick_probability: 0.5,
            total_interactions: 0,
            learning_rate: params.learning_rate,
            initial_rate: params.initial_exploration_rate,
            decay_factor: params.decay_factor,
            min_rate: params.min_exploration_rate,
        }
    }

    fn exploration_rate(&self, round: u64) -> f64 {
        (self.initial_rate * self.decay_factor.powf(round as f64)).max(self.min_rate)
    }

    fn signal_blue_probability(&self) -> f64 {
        let total = self.blue_success_rate + self.red_success_rate;
        if total > 0.0 {
            self.blue_success_rate / total
        } else {
            0.5
        }
    }
}

impl Policy for ExplorationDecay {
    fn decide_signal(&mut self, round: u64, rng: &mut dyn RngCore) -> Action {
        let first_move = self.total_interactions == 0;
        if first_move || rng.r#gen::<f64>() < self.exploration_rate(round) {
            Action::coin(rng)
        } else {
            Action::with_blue_probability(self.signal_blue_probability(), rng)
        }
    }

    fn decide_side(
        &mut self,
        own_signal: Action,
        opponent_signal: Action,
        round: u64,
        rng: &mut dyn RngCore,
    ) -> Action {
        if own_signal == opponent_signal {
            return own_signal;
        }
        let stick = if rng.r#gen::<f64>() < self.exploration_rate(round) {
            rng.r#gen::<f64>() < 0.5
        } else {
            rng.r#gen::<f64>() < self.stick_probability
        };
        if stick { own_signal } else { opponent_signal }
    }

    fn update(&mut self, view: &RoundView) {
        self.total_interactions += 1;
        let reward = view.outcome.reward();

        // Nudge the emitted color's success estimate toward the reward.
        if view.own_signal.is_blue() {
            self.blue_success_rate += self.learning_rate * (reward - self.blue_success_rate);
        } else {
            self.red_success_rate += self.learning_rate * (reward - self.red_success_rate);
        }

        // The non-stick branch tracks (1 - reward): failing after deferring
        // raises the propensity to stick next time.
        if view.stuck_with_signal() {
            self.stick_probability += self.learning_rate * (reward - self.stick_probability);
        } else {
            self.stick_probability +=
                self.learning_rate * ((1.0 - reward) - self.stick_probability);
        }

        self.blue_success_rate = self.blue_success_rate.clamp(0.0, 1.0);
        self.red_success_rate = self.red_success_rate.clamp(0.0, 1.0);
        self.stick_probability = self.stick_probability.clamp(0.0, 1.0);
    }

    fn belief(&self) -> Belief {
        Belief {
            signal_bias: self.signal_blue_probability(),
            choice_bias: self.stick_probability,
        }
    }

    fn criterion(&self) -> Criterion {
        Criterion::LastAction
    }

    fn name(&self) -> &str {
        "exploration-decay"
    }

    fn reset(&mut self) {
        self.blue_success_rate = 0.5;
        self.red_success_rate = 0.5;
        self.stick_probability = 0.5;
        self.total_interactions = 0;
    }

    fn clone_box(&self) -> Box<dyn Policy> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::Outcome;

    fn policy() -> ExplorationDecay {
        ExplorationDecay::new(&PolicyParams {
            learning_rate: 0.3,
            initial_exploration_rate: 0.5,
            decay_factor: 0.98,
            min_exploration_rate: 0.1,
            ..PolicyParams::default()
        })
    }

    #[test]
    fn exploration_decays_geometrically_to_the_floor() {
        let policy = policy();
        assert!((policy.exploration_rate(1) - 0.5 * 0.98).abs() < 1e-12);
        assert!((policy.exploration_rate(2) - 0.5 * 0.98 * 0.98).abs() < 1e-12);
        // Far out the floor takes over.
        assert_eq!(policy.exploration_rate(10_000), 0.1);
    }

    #[test]
    fn stick_update_moves_toward_reward() {
        let mut policy = policy();
        policy.update(&RoundView {
            own_signal: Action::Blue,
            opponent_signal: Action::Red,
            chosen_side: Action::Blue,
            outcome: Outcome::Success,
        });
        // 0.5 + 0.3 * (1 - 0.5)
        assert!((policy.stick_probability - 0.65).abs() < 1e-12);
        assert!((policy.blue_success_rate - 0.65).abs() < 1e-12);
    }

    #[test]
    fn defer_update_tracks_inverted_reward() {
        // Deferring moves the stick estimate toward (1 - reward), so a failed
        // round while deferring raises the propensity to stick.
        let mut policy = policy();
        policy.update(&RoundView {
            own_signal: Action::Blue,
            opponent_signal: Action::Red,
            chosen_side: Action::Red,
            outcome: Outcome::Failure,
        });
        // 0.5 + 0.3 * ((1 - 0) - 0.5)
        assert!((policy.stick_probability - 0.65).abs() < 1e-12);
    }

    #[test]
    fn estimates_stay_within_unit_interval() {
        let mut policy = policy();
        for _ in 0..1_000 {
            policy.update(&RoundView {
                own_signal: Action::Blue,
                opponent_signal: Action::Red,
                chosen_side: Action::Blue,
                outcome: Outcome::Failure,
            });
            assert!((0.0..=1.0).contains(&policy.blue_success_rate));
            assert!((0.0..=1.0).contains(&policy.red_success_rate));
            assert!((0.0..=1.0).contains(&policy.stick_probability));
        }
    }
}
