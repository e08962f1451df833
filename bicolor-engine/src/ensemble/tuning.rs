use rayon::prelude::*;
use serde::Serialize;

use bicolor_db::models::{Draw, Pick};

use crate::config::EngineConfig;
use crate::constraints::PredictOptions;
use crate::models::{ScoreVector, Signals};
use crate::sampler::{sample_blue, sample_reds, seeded_rng};
use super::{EnsembleWeights, NormalizedModels};

const HYBRID_GRID: [u32; 3] = [150, 250, 350];
const MARKOV_GRID: [u32; 3] = [200, 300, 400];
const BAYES_GRID: [u32; 3] = [100, 200, 300];
const ML_MIN: u32 = 100;
const ML_MAX: u32 = 600;
const WEIGHT_TOTAL: u32 = 1000;

/// Aucun point d'évaluation avant cet index.
const FIRST_EVAL_INDEX: usize = 60;
const BLUE_HIT_BONUS: f64 = 1.5;

/// Combinaisons candidates, dans l'ordre de parcours (hybrid, puis markov, puis bayes).
/// `ml` complète à 1000 et doit rester dans [100, 600].
pub fn grid() -> Vec<EnsembleWeights> {
    let mut combos = Vec::new();
    for &h in &HYBRID_GRID {
        for &m in &MARKOV_GRID {
            for &b in &BAYES_GRID {
                let Some(ml) = WEIGHT_TOTAL.checked_sub(h + m + b) else {
                    continue;
                };
                if (ML_MIN..=ML_MAX).contains(&ml) {
                    combos.push(EnsembleWeights::new(h, m, b, ml));
                }
            }
        }
    }
    combos
}

pub fn has_enough_history(len: usize, config: &EngineConfig) -> bool {
    len >= config.tuner_min_history && len > config.tuner_test_count + 30
}

/// Un point d'évaluation : signaux normalisés sur `draws[..index]`, tirage réel `draws[index]`.
struct EvalPoint<'a> {
    index: usize,
    red: NormalizedModels,
    blue: NormalizedModels,
    red_misses: ScoreVector,
    blue_misses: ScoreVector,
    actual: &'a Draw,
}

impl<'a> EvalPoint<'a> {
    fn new(draws: &'a [Draw], index: usize) -> Self {
        let signals = Signals::build(&draws[..index]);
        Self {
            index,
            red: NormalizedModels::new(&signals.red),
            blue: NormalizedModels::new(&signals.blue),
            red_misses: signals.red.misses,
            blue_misses: signals.blue.misses,
            actual: &draws[index],
        }
    }

    fn score(&self, weights: &EnsembleWeights) -> f64 {
        let unconstrained = PredictOptions::default();
        let mut rng = seeded_rng(&format!("ssq-ens-tune-{}", self.index));
        let reds = sample_reds(&self.red.blend(weights), &self.red_misses, 6, 1..=33, &unconstrained, &mut rng);
        let Some(blue) = sample_blue(&self.blue.blend(weights), &self.blue_misses, &unconstrained, &mut rng) else {
            return 0.0;
        };
        let Some(pick) = Pick::from_slice(&reds, blue) else {
            return 0.0;
        };
        let blue_hit = if pick.blue_hit(self.actual) { BLUE_HIT_BONUS } else { 0.0 };
        pick.red_hits(self.actual) as f64 + blue_hit
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GridScore {
    pub weights: EnsembleWeights,
    pub score: f64,
}

/// Score de chaque combinaison de la grille sur les derniers points d'évaluation.
/// `draws` du plus ancien au plus récent.
pub fn evaluate_grid(draws: &[Draw], test_count: usize) -> Vec<GridScore> {
    let start = FIRST_EVAL_INDEX.max(draws.len().saturating_sub(test_count));
    let points: Vec<EvalPoint> = (start..draws.len())
        .into_par_iter()
        .map(|i| EvalPoint::new(draws, i))
        .collect();

    grid()
        .into_par_iter()
        .map(|weights| GridScore {
            weights,
            score: points.iter().map(|p| p.score(&weights)).sum(),
        })
        .collect()
}

/// Recherche sur grille des poids du mélange. Historique trop court : poids par défaut.
/// À égalité, la première combinaison de la grille l'emporte.
pub fn tune(draws: &[Draw], config: &EngineConfig) -> EnsembleWeights {
    if !has_enough_history(draws.len(), config) {
        return config.default_weights;
    }

    let scores = evaluate_grid(draws, config.tuner_test_count);
    let mut best: Option<&GridScore> = None;
    for candidate in &scores {
        if best.map_or(true, |b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }

    match best {
        Some(best) => {
            log::info!(
                "Calibration sur {} tirages : {} (score {:.1})",
                draws.len(),
                best.weights,
                best.score
            );
            best.weights
        }
        None => config.default_weights,
    }
}
