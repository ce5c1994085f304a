use super::MetricsSnapshot;
use crate::simulation::ConvergenceResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub policy_name: String,
    pub rounds: u64,
    pub converged: bool,
    pub success_rate: f64,
    pub final_mean_signal_bias: f64,
    pub final_mean_choice_bias: f64,
}

/// Reduce a run's sampled time series plus its terminal state into one
/// report row.
pub fn analyze(
    snapshots: &[MetricsSnapshot],
    result: &ConvergenceResult,
    policy_name: &str,
) -> AnalysisReport {
    let success_rate = snapshots.last().map(|s| s.success_rate).unwrap_or(0.0);
    let n = result.beliefs.len().max(1) as f64;

    AnalysisReport {
        policy_name: policy_name.to_string(),
        rounds: result.rounds,
        converged: result.converged,
        success_rate,
        final_mean_signal_bias: result.beliefs.iter().map(|b| b.signal_bias).sum::<f64>() / n,
        final_mean_choice_bias: result.beliefs.iter().map(|b| b.choice_bias).sum::<f64>() / n,
    }
}

/// Average a set of reports for the same policy into one row.
pub fn average_reports(reports: &[AnalysisReport]) -> AnalysisReport {
    let n = reports.len() as f64;

    AnalysisReport {
        policy_name: reports[0].policy_name.clone(),
        rounds: (reports.iter().map(|r| r.rounds as f64).sum::<f64>() / n).round() as u64,
        converged: reports.iter().all(|r| r.converged),
        success_rate: reports.iter().map(|r| r.success_rate).sum::<f64>() / n,
        final_mean_signal_bias: reports
            .iter()
            .map(|r| r.final_mean_signal_bias)
            .sum::<f64>()
            / n,
        final_mean_choice_bias: reports
            .iter()
            .map(|r| r.final_mean_choice_bias)
            .sum::<f64>()
            / n,
    }
}
