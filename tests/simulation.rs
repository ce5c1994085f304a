use concord::metrics::{MetricsCollector, RoundObserver, RoundRecord};
use concord::policies::Belief;
use concord::simulation::{ExperimentRunner, SimConfig, Simulation};

fn config(policy: &str, agents: u32, rounds: u64, seed: u64) -> SimConfig {
    SimConfig::default()
        .with_policy(policy)
        .with_agents(agents)
        .with_max_rounds(rounds)
        .with_seed(seed)
}

struct RecordingObserver {
    rounds_seen: u64,
    samples_seen: u64,
    last_round: u64,
}

impl RoundObserver for RecordingObserver {
    fn on_round(&mut self, record: &RoundRecord) {
        self.rounds_seen += 1;
        assert_eq!(record.round, self.last_round + 1, "rounds must be totally ordered");
        self.last_round = record.round;
        assert_ne!(record.pair.0, record.pair.1);
    }

    fn on_sample(&mut self, round: u64, beliefs: &[Belief]) {
        self.samples_seen += 1;
        assert_eq!(round % 10, 0);
        for belief in beliefs {
            assert!((0.0..=1.0).contains(&belief.signal_bias));
            assert!((0.0..=1.0).contains(&belief.choice_bias));
        }
    }
}

#[test]
fn observer_sees_every_round_exactly_once() {
    let mut sim = Simulation::new(config("frequency-ratio", 2, 100, 5)).unwrap();
    let mut observer = RecordingObserver {
        rounds_seen: 0,
        samples_seen: 0,
        last_round: 0,
    };
    let result = sim.run_with_observer(&mut observer);
    assert_eq!(observer.rounds_seen, result.rounds);
    // One sample per cadence tick that actually ran.
    assert_eq!(observer.samples_seen, result.rounds / 10);
}

#[test]
fn two_agents_frequency_ratio_reaches_the_cap_or_converges() {
    let mut sim = Simulation::new(config("frequency-ratio", 2, 100, 2024)).unwrap();
    let result = sim.run();
    assert!(result.rounds <= 100);
    if !result.converged {
        assert_eq!(result.rounds, 100);
    }
    // With two agents every agent is matched every round.
    for agent in sim.population().agents() {
        assert_eq!(agent.interactions(), result.rounds);
    }
}

#[test]
fn same_seed_same_trajectory_across_all_policies() {
    for policy in [
        "frequency-ratio",
        "pseudo-count",
        "pseudo-count-direct",
        "exploration-decay",
        "reward",
        "recent-reward",
        "preference",
    ] {
        let r1 = Simulation::new(config(policy, 10, 3_000, 99)).unwrap().run();
        let r2 = Simulation::new(config(policy, 10, 3_000, 99)).unwrap().run();
        assert_eq!(r1.rounds, r2.rounds, "policy {policy} diverged");
        for (b1, b2) in r1.beliefs.iter().zip(&r2.beliefs) {
            assert_eq!(b1.signal_bias, b2.signal_bias, "policy {policy} diverged");
            assert_eq!(b1.choice_bias, b2.choice_bias, "policy {policy} diverged");
        }
    }
}

#[test]
fn different_seeds_eventually_differ() {
    let r1 = Simulation::new(config("preference", 4, 2_000, 1)).unwrap().run();
    let r2 = Simulation::new(config("preference", 4, 2_000, 2)).unwrap().run();
    let same = r1.rounds == r2.rounds
        && r1
            .beliefs
            .iter()
            .zip(&r2.beliefs)
            .all(|(a, b)| a.choice_bias == b.choice_bias);
    assert!(!same, "independent seeds should not reproduce each other");
}

#[test]
fn twenty_agents_converge_under_action_equality_across_seeds() {
    // Convergence is probability-1 in the limit; a handful of seeded trials
    // against a generous cap stands in for that property.
    for seed in [1, 7, 42, 1234, 98765] {
        let mut sim = Simulation::new(config("pseudo-count", 20, 100_000, seed)).unwrap();
        let result = sim.run();
        assert!(
            result.converged,
            "seed {seed} failed to converge within the cap"
        );
        assert!(result.rounds < 100_000);
        assert!(result.rounds % 10 == 0, "convergence is declared on the cadence");
    }
}

#[test]
fn preference_policy_converges_to_a_pole() {
    for seed in [3, 11, 77] {
        let mut sim = Simulation::new(config("preference", 10, 100_000, seed)).unwrap();
        let result = sim.run();
        assert!(result.converged, "seed {seed} failed to converge");
        let all_blue = result.beliefs.iter().all(|b| b.choice_bias >= 0.99);
        let all_red = result.beliefs.iter().all(|b| b.choice_bias <= 0.01);
        assert!(all_blue || all_red);
    }
}

#[test]
fn capped_run_reports_the_cap_and_no_convergence() {
    let mut cfg = config("exploration-decay", 50, 9, 5);
    cfg.check_interval = 10;
    let result = Simulation::new(cfg).unwrap().run();
    assert_eq!(result.rounds, 9);
    assert!(!result.converged);
}

#[test]
fn metrics_collector_tallies_match_round_count() {
    let mut sim = Simulation::new(config("pseudo-count", 6, 2_000, 17)).unwrap();
    let mut collector = MetricsCollector::new();
    let result = sim.run_with_observer(&mut collector);
    assert_eq!(collector.successes() + collector.failures(), result.rounds);
}

#[test]
fn runner_reports_are_bounded_and_complete() {
    let base = config("recent-reward", 2, 20_000, 7);
    let runner = ExperimentRunner::new(base, 5);
    let report = runner.run_size(6).unwrap();
    assert_eq!(report.trials, 5);
    assert!(report.avg_rounds <= 20_000.0);
    assert!((0.0..=1.0).contains(&report.convergence_rate));
    assert!((0.0..=1.0).contains(&report.avg_signal_bias));
    assert!((0.0..=1.0).contains(&report.avg_choice_bias));
}
