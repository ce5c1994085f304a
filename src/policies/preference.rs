use super::{Action, Belief, Policy, RoundView};
use crate::simulation::config::PolicyParams;
use crate::simulation::convergence::Criterion;
use rand::RngCore;

/// A single scalar preference `x` = probability of choosing Blue. No signal
/// phase: the sampled direction is the decision. Success reinforces the
/// chosen pole with step `alpha`, failure relaxes away from it with step
/// `beta`, and `x` is clamped after every update.
#[derive(Debug, Clone)]
pub struct DirectPreference {
    x: f64,
    alpha: f64,
    beta: f64,
}

impl DirectPreference {
    pub fn new(params: &PolicyParams) -> Self {
        Self {
            x: 0.5,
            alpha: params.alpha,
            beta: params.beta,
        }
    }
}

impl Policy for DirectPreference {
    fn decide_signal(&mut self, _round: u64, rng: &mut dyn RngCore) -> Action {
        Action::with_blue_probability(self.x, rng)
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
        if view.outcome.is_success() {
            if view.chosen_side.is_blue() {
                self.x += self.alpha * (1.0 - self.x);
            } else {
                self.x -= self.alpha * self.x;
            }
        } else if view.chosen_side.is_blue() {
            self.x -= self.beta * self.x;
        } else {
            self.x += self.beta * (1.0 - self.x);
        }
        // Guards the probability invariant against floating-point drift.
        self.x = self.x.clamp(0.0, 1.0);
    }

    fn belief(&self) -> Belief {
        Belief {
            signal_bias: self.x,
            choice_bias: self.x,
        }
    }

    fn criterion(&self) -> Criterion {
        Criterion::Preference {
            upper: 0.99,
            lower: 0.01,
        }
    }

    fn name(&self) -> &str {
        "preference"
    }

    fn reset(&mut self) {
        self.x = 0.5;
    }

    fn clone_box(&self) -> Box<dyn Policy> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::Outcome;

    fn policy(alpha: f64, beta: f64) -> DirectPreference {
        DirectPreference::new(&PolicyParams {
            alpha,
            beta,
            ..PolicyParams::default()
        })
    }

    fn view(side: Action, outcome: Outcome) -> RoundView {
        RoundView {
            own_signal: side,
            opponent_signal: side,
            chosen_side: side,
            outcome,
        }
    }

    #[test]
    fn success_with_blue_from_half_gives_three_quarters() {
        let mut p = policy(0.5, 0.4);
        p.update(&view(Action::Blue, Outcome::Success));
        assert!((p.x - 0.75).abs() < 1e-12);
    }

    #[test]
    fn failure_with_red_moves_toward_blue() {
        let mut p = policy(0.5, 0.4);
        p.update(&view(Action::Red, Outcome::Failure));
        // 0.5 + 0.4 * (1 - 0.5)
        assert!((p.x - 0.7).abs() < 1e-12);
    }

    #[test]
    fn preference_is_clamped_under_repeated_reinforcement() {
        let mut p = policy(0.9, 0.9);
        for _ in 0..200 {
            p.update(&view(Action::Blue, Outcome::Success));
            assert!((0.0..=1.0).contains(&p.x));
        }
        assert!(p.x > 0.99);
    }

    #[test]
    fn threshold_criterion_is_reported() {
        let p = policy(0.5, 0.4);
        assert_eq!(
            p.criterion(),
            Criterion::Preference { upper: 0.99, lower: 0.01 }
        );
    }
}
