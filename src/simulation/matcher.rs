use rand::RngCore;
use rand::seq::index::sample;

/// Uniform random pairing: one unordered pair of distinct agents per round,
/// sampled without replacement. Callers guarantee a population of at least 2
/// (enforced at config validation).
#[derive(Debug, Clone, Copy)]
pub struct RandomMatcher {
    population_size: usize,
}

impl RandomMatcher {
    pub fn new(population_size: usize) -> Self {
        debug_assert!(population_size >= 2);
        Self { population_size }
    }

    pub fn pick(&self, rng: &mut dyn RngCore) -> (usize, usize) {
        let indices = sample(rng, self.population_size, 2);
        (indices.index(0), indices.index(1))
    }
}
