pub mod cache;
pub mod tuning;

use serde::{Deserialize, Serialize};
use bicolor_db::models::Pool;

use crate::models::normalize::normalize;
use crate::models::{PoolSignals, ScoreVector};

/// Poids entiers des quatre modèles du mélange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsembleWeights {
    pub hybrid: u32,
    pub markov: u32,
    pub bayes: u32,
    pub ml: u32,
}

impl EnsembleWeights {
    pub const fn new(hybrid: u32, markov: u32, bayes: u32, ml: u32) -> Self {
        Self { hybrid, markov, bayes, ml }
    }

    pub fn total(&self) -> u32 {
        self.hybrid + self.markov + self.bayes + self.ml
    }
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self::new(250, 250, 200, 300)
    }
}

impl std::fmt::Display for EnsembleWeights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hybrid={} markov={} bayes={} ml={}",
            self.hybrid, self.markov, self.bayes, self.ml
        )
    }
}

/// Les quatre scores d'une pool ramenés sur [1, 1000], indépendants des poids.
#[derive(Debug, Clone)]
pub struct NormalizedModels {
    pool: Pool,
    hybrid: ScoreVector,
    markov: ScoreVector,
    bayes: ScoreVector,
    ml: ScoreVector,
}

impl NormalizedModels {
    pub fn new(signals: &PoolSignals) -> Self {
        Self {
            pool: signals.pool,
            hybrid: normalize(&signals.hybrid),
            markov: normalize(&signals.markov),
            bayes: normalize(&signals.bayes),
            ml: normalize(&signals.ml),
        }
    }

    /// Somme pondérée des scores normalisés, au moins 1.
    pub fn blend(&self, weights: &EnsembleWeights) -> ScoreVector {
        let parts = [
            (&self.hybrid, weights.hybrid),
            (&self.markov, weights.markov),
            (&self.bayes, weights.bayes),
            (&self.ml, weights.ml),
        ];
        ScoreVector::from_fn(self.pool, |n| {
            parts
                .iter()
                .fold(0u64, |acc, (scores, w)| acc.saturating_add(scores.get(n).saturating_mul(*w as u64)))
                .max(1)
        })
    }
}

pub fn blend(signals: &PoolSignals, weights: &EnsembleWeights) -> ScoreVector {
    NormalizedModels::new(signals).blend(weights)
}
