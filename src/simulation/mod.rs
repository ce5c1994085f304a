pub mod config;
pub mod convergence;
pub mod matcher;
pub mod runner;

pub use config::{PolicyParams, SimConfig};
pub use convergence::{ConvergenceMonitor, Criterion};
pub use matcher::RandomMatcher;
pub use runner::ExperimentRunner;

use crate::agent::Population;
use crate::metrics::{NullObserver, RoundObserver, RoundRecord};
use crate::policies::{Belief, Outcome, PolicyRegistry, RoundView};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Terminal state of one run. A capped run is ordinary data, not an error:
/// `rounds == max_rounds` with `converged == false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceResult {
    pub rounds: u64,
    pub converged: bool,
    pub beliefs: Vec<Belief>,
}

/// One full run: a population, a matcher, and a monitor, driven round by
/// round until the convergence criterion holds or the round cap is hit.
pub struct Simulation {
    config: SimConfig,
    population: Population,
    matcher: RandomMatcher,
    monitor: ConvergenceMonitor,
    rng: StdRng,
    seed: u64,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;

        let prototype = PolicyRegistry::global()
            .create(&config.policy_name, &config.params)
            .ok_or_else(|| anyhow::anyhow!("Unknown policy: {}", config.policy_name))?;
        let criterion = prototype.criterion();

        let population = Population::new(config.num_agents, || prototype.clone_box());
        let matcher = RandomMatcher::new(config.num_agents as usize);
        let monitor = ConvergenceMonitor::new(criterion, config.check_interval);
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().r#gen());
        let rng = StdRng::seed_from_u64(seed);

        Ok(Self {
            config,
            population,
            matcher,
            monitor,
            rng,
            seed,
        })
    }

    /// Seed actually in use, whether configured or freshly drawn.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn run(&mut self) -> ConvergenceResult {
        self.run_with_observer(&mut NullObserver)
    }

    pub fn run_with_observer(&mut self, observer: &mut dyn RoundObserver) -> ConvergenceResult {
        info!(
            "Starting run '{}': policy={}, agents={}, cap={} rounds, seed={}",
            self.config.name,
            self.config.policy_name,
            self.config.num_agents,
            self.config.max_rounds,
            self.seed
        );

        for round in 1..=self.config.max_rounds {
            let record = self.play_round(round);
            observer.on_round(&record);

            if self.monitor.due(round) {
                observer.on_sample(round, &self.population.beliefs());
                if self.monitor.check(&self.population) {
                    info!("Converged after {} rounds", round);
                    return self.result(round, true);
                }
            }
        }

        info!(
            "No convergence within {} rounds, reporting capped run",
            self.config.max_rounds
        );
        self.result(self.config.max_rounds, false)
    }

    /// One interaction round for a matched pair. Both agents decide their
    /// signal from their own state, see each other's signal, commit to a
    /// side, and then both update from the same outcome and the same
    /// signals/sides.
    fn play_round(&mut self, round: u64) -> RoundRecord {
        let (i, j) = self.matcher.pick(&mut self.rng);
        let (a, b) = self.population.pair_mut(i, j);

        let signal_a = a.decide_signal(round, &mut self.rng);
        let signal_b = b.decide_signal(round, &mut self.rng);

        let side_a = a.decide_side(signal_a, signal_b, round, &mut self.rng);
        let side_b = b.decide_side(signal_b, signal_a, round, &mut self.rng);

        let outcome = Outcome::from_sides(side_a, side_b);
        debug!(
            "Round {}: {} vs {} -> signals ({}, {}), sides ({}, {}), {:?}",
            round,
            a.id(),
            b.id(),
            signal_a,
            signal_b,
            side_a,
            side_b,
            outcome
        );

        a.apply_outcome(&RoundView {
            own_signal: signal_a,
            opponent_signal: signal_b,
            chosen_side: side_a,
            outcome,
        });
        b.apply_outcome(&RoundView {
            own_signal: signal_b,
            opponent_signal: signal_a,
            chosen_side: side_b,
            outcome,
        });

        RoundRecord {
            round,
            pair: (a.id(), b.id()),
            signals: (signal_a, signal_b),
            sides: (side_a, side_b),
            outcome,
            beliefs: (a.belief(), b.belief()),
        }
    }

    fn result(&self, rounds: u64, converged: bool) -> ConvergenceResult {
        ConvergenceResult {
            rounds,
            converged,
            beliefs: self.population.beliefs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(policy: &str, agents: u32, rounds: u64, seed: u64) -> SimConfig {
        SimConfig::default()
            .with_policy(policy)
            .with_agents(agents)
            .with_max_rounds(rounds)
            .with_seed(seed)
    }

    #[test]
    fn unknown_policy_is_rejected_at_construction() {
        let result = Simulation::new(config("no-such-policy", 4, 100, 1));
        assert!(result.is_err());
    }

    #[test]
    fn rounds_never_exceed_the_cap() {
        for policy in ["frequency-ratio", "pseudo-count", "reward", "preference"] {
            let mut sim = Simulation::new(config(policy, 6, 500, 9)).unwrap();
            let result = sim.run();
            assert!(result.rounds <= 500);
            assert_eq!(result.beliefs.len(), 6);
        }
    }

    #[test]
    fn identical_seeds_reproduce_identical_trajectories() {
        for policy in ["pseudo-count", "exploration-decay", "preference"] {
            let mut first = Simulation::new(config(policy, 8, 2_000, 1234)).unwrap();
            let mut second = Simulation::new(config(policy, 8, 2_000, 1234)).unwrap();
            let r1 = first.run();
            let r2 = second.run();
            assert_eq!(r1.rounds, r2.rounds, "policy {policy}");
            assert_eq!(r1.converged, r2.converged);
            for (b1, b2) in r1.beliefs.iter().zip(&r2.beliefs) {
                assert_eq!(b1.signal_bias, b2.signal_bias);
                assert_eq!(b1.choice_bias, b2.choice_bias);
            }
        }
    }

    #[test]
    fn capped_run_is_distinguishable_from_convergence() {
        // Cap below the check cadence, so no convergence check ever fires.
        let mut config = config("pseudo-count", 4, 5, 77);
        config.check_interval = 10;
        let mut sim = Simulation::new(config).unwrap();
        let result = sim.run();
        assert_eq!(result.rounds, 5);
        assert!(!result.converged);
    }

    #[test]
    fn beliefs_stay_probabilities_for_every_policy() {
        for policy in [
            "frequency-ratio",
            "pseudo-count",
            "pseudo-count-direct",
            "exploration-decay",
            "reward",
            "recent-reward",
            "preference",
        ] {
            let mut sim = Simulation::new(config(policy, 5, 1_000, 3)).unwrap();
            let result = sim.run();
            for belief in &result.beliefs {
                assert!(
                    (0.0..=1.0).contains(&belief.signal_bias),
                    "policy {policy} leaked signal bias {}",
                    belief.signal_bias
                );
                assert!(
                    (0.0..=1.0).contains(&belief.choice_bias),
                    "policy {policy} leaked choice bias {}",
                    belief.choice_bias
                );
            }
        }
    }
}
