
use rand::Rng;
use std::collections::HashMap;

const SAMPLING_POWER: f64 = 0.75;
const MAX_REDRAWS: usize = 64;

/// Cumulative `frequency^0.75` table for drawing negative samples.
///
/// Built once before training and only read afterwards, so concurrent draws
/// need no synchronization.
#[derive(Clone, Debug, Default)]
pub struct SamplingTable {
    cumulative: Vec<f64>,
    terms: Vec<String>,
    total_pool: f64,
}

impl SamplingTable {

    pub fn new() -> SamplingTable {
        SamplingTable::default()
    }

    /// Terms with zero frequency add nothing to the pool and are never drawn.
    pub fn push(&mut self, term: &str, frequency: u64) {
        if frequency == 0 {
            return;
        }
        self.total_pool += (frequency as f64).powf(SAMPLING_POWER);
        self.cumulative.push(self.total_pool);
        self.terms.push(term.to_string());
    }

    pub fn total_pool(&self) -> f64 {
        self.total_pool
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Term owning the smallest cumulative key `>= x`.
    pub fn ceiling(&self, x: f64) -> Option<&str> {
        let i = self.cumulative.partition_point(|key| *key < x);
        self.terms.get(i).map(|term| term.as_str())
    }

    /// Weighted draw that never returns `exclude`; `None` if nothing else is drawable.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, exclude: &str) -> Option<&str> {

        if self.terms.iter().all(|term| term == exclude) {
            return None;
        }

        let mut last = 0;
        for _ in 0..MAX_REDRAWS {
            let x = rng.gen::<f64>() * self.total_pool;
            last = self.cumulative.partition_point(|key| *key < x).min(self.terms.len() - 1);
            if self.terms[last] != exclude {
                return Some(&self.terms[last]);
            }
        }

        // the excluded term dominates the pool; take the next entry instead
        (1..self.terms.len())
        .map(|step| &self.terms[(last + step) % self.terms.len()])
        .find(|term| term.as_str() != exclude)
        .map(|term| term.as_str())
    }
}

/// Probability of discarding each occurrence of a frequent term, per field.
#[derive(Clone, Debug, Default)]
pub struct SubsamplingTable {
    probabilities: HashMap<String, HashMap<String, f64>>,
}

impl SubsamplingTable {

    pub fn new() -> SubsamplingTable {
        SubsamplingTable::default()
    }

    /// Terms whose share of the corpus exceeds `threshold` are discarded with
    /// probability `1 - sqrt(threshold / share)`.
    pub fn push(&mut self, field: &str, term: &str, frequency: u64, total_count: u64, threshold: f64) {
        if total_count == 0 {
            return;
        }
        let share = frequency as f64 / total_count as f64;
        if share > threshold {
            self.probabilities
            .entry(field.to_string())
            .or_default()
            .insert(term.to_string(), 1.0 - (threshold / share).sqrt());
        }
    }

    pub fn probability(&self, field: &str, term: &str) -> Option<f64> {
        self.probabilities.get(field).and_then(|terms| terms.get(term)).copied()
    }

    /// Draws once and decides whether this occurrence is dropped.
    pub fn discard<R: Rng + ?Sized>(&self, field: &str, term: &str, rng: &mut R) -> bool {
        match self.probability(field, term) {
            Some(p) => rng.gen::<f64>() < p,
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.probabilities.values().map(|terms| terms.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
