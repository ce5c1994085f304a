use crate::agent::Population;

/// Policy-specific convergence criterion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Criterion {
    /// Every agent has moved at least once and all latest final actions
    /// agree.
    LastAction,
    /// Every scalar preference is at or beyond one of the poles.
    Preference { upper: f64, lower: f64 },
}

/// Samples the population at a fixed cadence instead of every round, trading
/// detection latency for less overhead.
#[derive(Debug, Clone, Copy)]
pub struct ConvergenceMonitor {
    criterion: Criterion,
    check_interval: u64,
}

impl ConvergenceMonitor {
    pub fn new(criterion: Criterion, check_interval: u64) -> Self {
        Self {
            criterion,
            check_interval,
        }
    }

    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    pub fn due(&self, round: u64) -> bool {
        round % self.check_interval == 0
    }

    pub fn check(&self, population: &Population) -> bool {
        match self.criterion {
            Criterion::LastAction => {
                let mut shared = None;
                for agent in population.agents() {
                    let Some(side) = agent.last_side() else {
                        // An agent that has never been matched blocks
                        // convergence.
                        return false;
                    };
                    match shared {
                        None => shared = Some(side),
                        Some(first) if first != side => return false,
                        Some(_) => {}
                    }
                }
                shared.is_some()
            }
            Criterion::Preference { upper, lower } => {
                let all_high = population
                    .agents()
                    .iter()
                    .all(|a| a.belief().choice_bias >= upper);
                let all_low = population
                    .agents()
                    .iter()
                    .all(|a| a.belief().choice_bias <= lower);
                all_high || all_low
            }
        }
    }
}
