// Two reward-driven scalar variants: AsymmetricReward punishes toward the
// opposite pole with its own step size, RecentReward relaxes toward 0.5.

use super::{Action, Belief, Policy, RoundView};
use crate::simulation::config::PolicyParams;
use crate::simulation::convergence::Criterion;
use rand::{Rng, RngCore};

/// Scalar propensities with separate step sizes for success (`alpha`) and
/// failure (`beta`). `p_signal` is the probability of emitting Blue;
/// `p_choice` is the probability of sticking with one's own signal when the
/// signals conflict, and it is only ever updated on a conflict round in which
/// the agent stuck.
#[derive(Debug, Clone)]
pub struct AsymmetricReward {
    p_signal: f64,
    p_choice: f64,
    alpha: f64,
    beta: f64,
}

impl AsymmetricReward {
    pub fn new(params: &PolicyParams) -> Self {
        Self {
            p_signal: 0.5,
            p_choice: 0.5,
            alpha: params.alpha,
            beta: params.beta,
        }
    }
}

impl Policy for AsymmetricReward {
    fn decide_signal(&mut self, _round: u64, rng: &mut dyn RngCore) -> Action {
        Action::with_blue_probability(self.p_signal, rng)
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
        } else if rng.r#gen::<f64>() < self.p_choice {
            own_signal
        } else {
            opponent_signal
        }
    }

    fn update(&mut self, view: &RoundView) {
        if view.outcome.is_success() {
            if view.own_signal.is_blue() {
                self.p_signal += self.alpha * (1.0 - self.p_signal);
            } else {
                self.p_signal -= self.alpha * self.p_signal;
            }
        } else if view.own_signal.is_blue() {
            self.p_signal -= self.beta * self.p_signal;
        } else {
            self.p_signal += self.beta * (1.0 - self.p_signal);
        }
        self.p_signal = self.p_signal.clamp(0.0, 1.0);

        if !view.signals_match() {
            if view.outcome.is_success() && view.stuck_with_signal() {
                self.p_choice += self.alpha * (1.0 - self.p_choice);
            } else if !view.outcome.is_success() && view.stuck_with_signal() {
                self.p_choice -= self.beta * self.p_choice;
            }
            self.p_choice = self.p_choice.clamp(0.0, 1.0);
        }
    }

    fn belief(&self) -> Belief {
        Belief {
            signal_bias: self.p_signal,
            choice_bias: self.p_choice,
        }
    }

    fn criterion(&self) -> Criterion {
        Criterion::LastAction
    }

    fn name(&self) -> &str {
        "reward"
    }

    fn reset(&mut self) {
        self.p_signal = 0.5;
        self.p_choice = 0.5;
    }

    fn clone_box(&self) -> Box<dyn Policy> {
        Box::new(self.clone())
    }
}

/// Single learning rate; `p_choice` here is a Blue probability for conflict
/// rounds, and failure relaxes both propensities toward 0.5 instead of
/// pushing to the opposite pole.
#[derive(Debug, Clone)]
pub struct RecentReward {
    p_signal: f64,
    p_choice: f64,
    learning_rate: f64,
}

impl RecentReward {
    pub fn new(params: &PolicyParams) -> Self {
        Self {
            p_signal: 0.5,
            p_choice: 0.5,
            learning_rate: params.learning_rate,
        }
    }

    fn reinforce(value: &mut f64, chosen: Action, success: bool, lr: f64) {
        if success {
            if chosen.is_blue() {
                *value += lr * (1.0 - *value);
            } else {
                *value -= lr * *value;
            }
        } else if chosen.is_blue() {
            *value -= lr * (*value - 0.5);
        } else {
            *value += lr * (0.5 - *value);
        }
        *value = value.clamp(0.0, 1.0);
    }
}

impl Policy for RecentReward {
    fn decide_signal(&mut self, _round: u64, rng: &mut dyn RngCore) -> Action {
        Action::with_blue_probability(self.p_signal, rng)
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
            Action::with_blue_probability(self.p_choice, rng)
        }
    }

    fn update(&mut self, view: &RoundView) {
        let success = view.outcome.is_success();
        Self::reinforce(&mut self.p_signal, view.own_signal, success, self.learning_rate);
        Self::reinforce(&mut self.p_choice, view.chosen_side, success, self.learning_rate);
    }

    fn belief(&self) -> Belief {
        Belief {
            signal_bias: self.p_signal,
            choice_bias: self.p_choice,
        }
    }

    fn criterion(&self) -> Criterion {
        Criterion::LastAction
    }

    fn name(&self) -> &str {
        "recent-reward"
    }

    fn reset(&mut self) {
        self.p_signal = 0.5;
        self.p_choice = 0.5;
    }

    fn clone_box(&self) -> Box<dyn Policy> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::Outcome;

    fn reward_policy(alpha: f64, beta: f64) -> AsymmetricReward {
        AsymmetricReward::new(&PolicyParams {
            alpha,
            beta,
            ..PolicyParams::default()
        })
    }

    #[test]
    fn failure_with_red_raises_blue_propensity() {
        let mut policy = reward_policy(0.8, 0.8);
        policy.update(&RoundView {
            own_signal: Action::Red,
            opponent_signal: Action::Red,
            chosen_side: Action::Red,
            outcome: Outcome::Failure,
        });
        // 0.5 + 0.8 * (1 - 0.5)
        assert!((policy.p_signal - 0.9).abs() < 1e-12);
    }

    #[test]
    fn success_with_blue_reinforces_blue() {
        let mut policy = reward_policy(0.8, 0.8);
        policy.update(&RoundView {
            own_signal: Action::Blue,
            opponent_signal: Action::Blue,
            chosen_side: Action::Blue,
            outcome: Outcome::Success,
        });
        assert!((policy.p_signal - 0.9).abs() < 1e-12);
    }

    #[test]
    fn choice_untouched_when_signals_match() {
        let mut policy = reward_policy(0.8, 0.8);
        policy.update(&RoundView {
            own_signal: Action::Blue,
            opponent_signal: Action::Blue,
            chosen_side: Action::Blue,
            outcome: Outcome::Success,
        });
        assert_eq!(policy.p_choice, 0.5);
    }

    #[test]
    fn choice_untouched_when_agent_deferred() {
        let mut policy = reward_policy(0.8, 0.8);
        policy.update(&RoundView {
            own_signal: Action::Blue,
            opponent_signal: Action::Red,
            chosen_side: Action::Red,
            outcome: Outcome::Success,
        });
        assert_eq!(policy.p_choice, 0.5);
    }

    #[test]
    fn sticking_through_a_conflict_moves_choice() {
        let mut policy = reward_policy(0.8, 0.8);
        policy.update(&RoundView {
            own_signal: Action::Blue,
            opponent_signal: Action::Red,
            chosen_side: Action::Blue,
            outcome: Outcome::Success,
        });
        assert!((policy.p_choice - 0.9).abs() < 1e-12);

        policy.update(&RoundView {
            own_signal: Action::Blue,
            opponent_signal: Action::Red,
            chosen_side: Action::Blue,
            outcome: Outcome::Failure,
        });
        // 0.9 - 0.8 * 0.9
        assert!((policy.p_choice - 0.18).abs() < 1e-12);
    }

    #[test]
    fn recent_reward_failure_relaxes_toward_half() {
        let mut policy = RecentReward::new(&PolicyParams {
            learning_rate: 0.1,
            ..PolicyParams::default()
        });
        policy.p_signal = 0.8;
        policy.update(&RoundView {
            own_signal: Action::Blue,
            opponent_signal: Action::Red,
            chosen_side: Action::Red,
            outcome: Outcome::Failure,
        });
        // 0.8 - 0.1 * (0.8 - 0.5)
        assert!((policy.p_signal - 0.77).abs() < 1e-12);
    }

    #[test]
    fn propensities_survive_adversarial_outcome_streaks() {
        let mut policy = reward_policy(0.9, 0.9);
        for i in 0..1_000u32 {
            let outcome = if i % 3 == 0 { Outcome::Success } else { Outcome::Failure };
            policy.update(&RoundView {
                own_signal: Action::Blue,
                opponent_signal: Action::Red,
                chosen_side: Action::Blue,
                outcome,
            });
            assert!((0.0..=1.0).contains(&policy.p_signal));
            assert!((0.0..=1.0).contains(&policy.p_choice));
        }
    }
}
