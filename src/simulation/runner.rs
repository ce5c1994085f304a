use super::{ConvergenceResult, SimConfig, Simulation};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// One independent run, reduced to what the sweep aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    pub rounds: u64,
    pub converged: bool,
    pub mean_signal_bias: f64,
    pub mean_choice_bias: f64,
}

impl TrialResult {
    fn from_result(result: &ConvergenceResult) -> Self {
        let n = result.beliefs.len().max(1) as f64;
        Self {
            rounds: result.rounds,
            converged: result.converged,
            mean_signal_bias: result.beliefs.iter().map(|b| b.signal_bias).sum::<f64>() / n,
            mean_choice_bias: result.beliefs.iter().map(|b| b.choice_bias).sum::<f64>() / n,
        }
    }
}

/// Aggregate over all trials at one population size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeReport {
    pub policy_name: String,
    pub num_agents: u32,
    pub trials: u32,
    pub avg_rounds: f64,
    pub convergence_rate: f64,
    pub avg_signal_bias: f64,
    pub avg_choice_bias: f64,
}

/// Repeats independent convergence runs per population size and sweeps a
/// size list. Trials share nothing, so they run in parallel; each one gets
/// its own RNG seeded from the base seed plus the trial index, which keeps
/// every trial reproducible regardless of scheduling.
pub struct ExperimentRunner {
    base: SimConfig,
    runs_per_size: u32,
}

impl ExperimentRunner {
    pub fn new(base: SimConfig, runs_per_size: u32) -> Self {
        Self {
            base,
            runs_per_size,
        }
    }

    pub fn run_trials(&self, num_agents: u32) -> Result<Vec<TrialResult>> {
        self.run_trials_with_progress(num_agents, None)
    }

    fn run_trials_with_progress(
        &self,
        num_agents: u32,
        progress: Option<&ProgressBar>,
    ) -> Result<Vec<TrialResult>> {
        let base_seed = self
            .base
            .seed
            .unwrap_or_else(|| rand::thread_rng().r#gen());

        (0..self.runs_per_size)
            .into_par_iter()
            .map(|trial| {
                let mut config = self.base.clone();
                config.name = format!("{}_n{}_t{}", self.base.name, num_agents, trial);
                config.num_agents = num_agents;
                config.seed = Some(base_seed.wrapping_add(trial as u64));

                let mut sim = Simulation::new(config)?;
                let result = sim.run();
                if let Some(bar) = progress {
                    bar.inc(1);
                }
                Ok(TrialResult::from_result(&result))
            })
            .collect()
    }

    pub fn run_size(&self, num_agents: u32) -> Result<SizeReport> {
        let trials = self.run_trials(num_agents)?;
        Ok(self.aggregate(num_agents, &trials))
    }

    pub fn sweep(&self, sizes: &[u32]) -> Result<Vec<SizeReport>> {
        let total = sizes.len() as u64 * self.runs_per_size as u64;
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} trials {msg}")?
                .progress_chars("█▓░"),
        );

        let mut reports = Vec::with_capacity(sizes.len());
        for &size in sizes {
            bar.set_message(format!("n={size}"));
            let trials = self.run_trials_with_progress(size, Some(&bar))?;
            let report = self.aggregate(size, &trials);
            info!(
                "Agent size: {}, avg rounds: {:.1}, convergence rate: {:.0}%, avg p(Blue) signal/choice: {:.2}/{:.2}",
                size,
                report.avg_rounds,
                report.convergence_rate * 100.0,
                report.avg_signal_bias,
                report.avg_choice_bias
            );
            reports.push(report);
        }
        bar.finish_with_message("Sweep complete");

        Ok(reports)
    }

    fn aggregate(&self, num_agents: u32, trials: &[TrialResult]) -> SizeReport {
        let n = trials.len().max(1) as f64;
        SizeReport {
            policy_name: self.base.policy_name.clone(),
            num_agents,
            trials: trials.len() as u32,
            avg_rounds: trials.iter().map(|t| t.rounds as f64).sum::<f64>() / n,
            convergence_rate: trials.iter().filter(|t| t.converged).count() as f64 / n,
            avg_signal_bias: trials.iter().map(|t| t.mean_signal_bias).sum::<f64>() / n,
            avg_choice_bias: trials.iter().map(|t| t.mean_choice_bias).sum::<f64>() / n,
        }
    }
}
