pub mod logger;
pub mod analyzer;

use crate::policies::{Action, Belief, Outcome};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything one round produced, handed to observers and then dropped. The
/// core keeps no per-round history; recorders that want trajectories
/// subscribe here.
#[derive(Debug, Clone, Copy)]
pub struct RoundRecord {
    pub round: u64,
    pub pair: (u32, u32),
    pub signals: (Action, Action),
    pub sides: (Action, Action),
    pub outcome: Outcome,
    pub beliefs: (Belief, Belief),
}

pub trait RoundObserver: Send {
    fn on_round(&mut self, record: &RoundRecord);

    /// Population-wide belief snapshot, delivered at the convergence-check
    /// cadence.
    fn on_sample(&mut self, round: u64, beliefs: &[Belief]) {
        let _ = (round, beliefs);
    }
}

/// Observer that drops everything; used when nobody is recording.
pub struct NullObserver;

impl RoundObserver for NullObserver {
    fn on_round(&mut self, _record: &RoundRecord) {}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub round: u64,
    pub successes: u64,
    pub failures: u64,
    pub success_rate: f64,
    pub mean_signal_bias: f64,
    pub mean_choice_bias: f64,
}

#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<RwLock<MetricsInner>>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    successes: u64,
    failures: u64,
    snapshots: Vec<MetricsSnapshot>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn successes(&self) -> u64 {
        self.inner.read().successes
    }

    pub fn failures(&self) -> u64 {
        self.inner.read().failures
    }

    pub fn success_rate(&self) -> f64 {
        let inner = self.inner.read();
        let total = inner.successes + inner.failures;
        if total > 0 {
            inner.successes as f64 / total as f64
        } else {
            0.0
        }
    }

    pub fn get_snapshots(&self) -> Vec<MetricsSnapshot> {
        self.inner.read().snapshots.clone()
    }
}

impl RoundObserver for MetricsCollector {
    fn on_round(&mut self, record: &RoundRecord) {
        let mut inner = self.inner.write();
        match record.outcome {
            Outcome::Success => inner.successes += 1,
            Outcome::Failure => inner.failures += 1,
        }
    }

    fn on_sample(&mut self, round: u64, beliefs: &[Belief]) {
        let mut inner = self.inner.write();
        let total = inner.successes + inner.failures;
        let success_rate = if total > 0 {
            inner.successes as f64 / total as f64
        } else {
            0.0
        };
        let n = beliefs.len().max(1) as f64;
        let snapshot = MetricsSnapshot {
            round,
            successes: inner.successes,
            failures: inner.failures,
            success_rate,
            mean_signal_bias: beliefs.iter().map(|b| b.signal_bias).sum::<f64>() / n,
            mean_choice_bias: beliefs.iter().map(|b| b.choice_bias).sum::<f64>() / n,
        };
        inner.snapshots.push(snapshot);
    }
}
