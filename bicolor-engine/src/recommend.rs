use rayon::prelude::*;

use bicolor_db::models::Draw;

use crate::backtest::{run_backtest, BacktestReport};
use crate::constraints::{PredictOptions, ZoneRatio};
use crate::ensemble::EnsembleWeights;
use crate::strategy::Strategy;

/// Zones 2:2:2 et 2 à 4 impairs.
fn balanced(max_try: u32) -> PredictOptions {
    PredictOptions {
        zone_ratio: Some(ZoneRatio(2, 2, 2)),
        min_odd: Some(2),
        max_odd: Some(4),
        ..Default::default()
    }
    .with_max_try(max_try)
}

/// Zones 2:2:2, 2 à 4 impairs, somme 70 à 140, écart 15 à 28.
fn balanced_sum_span(max_try: u32) -> PredictOptions {
    PredictOptions {
        min_sum: Some(70),
        max_sum: Some(140),
        min_span: Some(15),
        max_span: Some(28),
        ..balanced(max_try)
    }
}

/// Les huit candidats évalués, dans l'ordre de restitution.
pub fn candidate_grid() -> Vec<(Strategy, PredictOptions)> {
    let free = PredictOptions::default();
    let z222 = balanced(200);
    let z222_sum_span = balanced_sum_span(260);
    vec![
        (Strategy::Hybrid, free.clone()),
        (Strategy::WeightedRandom, free.clone()),
        (Strategy::FrequencyTop, free.clone()),
        (Strategy::OmissionTop, free),
        (Strategy::ZoneBalanced, z222.clone()),
        (Strategy::WeightedRandom, z222),
        (Strategy::ZoneBalanced, z222_sum_span.clone()),
        (Strategy::WeightedRandom, z222_sum_span),
    ]
}

/// Index du meilleur score parmi les candidats réussis ; le premier gagne à égalité.
pub fn best_index(reports: &[BacktestReport]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, report) in reports.iter().enumerate() {
        if let Some(score) = report.score() {
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((i, score));
            }
        }
    }
    best.map(|(i, _)| i)
}

/// Backtest de chaque candidat, en parallèle, ordre conservé.
/// `draws` du plus ancien au plus récent.
pub fn run_candidates(
    draws: &[Draw],
    train: usize,
    test: usize,
    weights_for: &(dyn Fn(&[Draw]) -> EnsembleWeights + Sync),
) -> Vec<BacktestReport> {
    candidate_grid()
        .into_par_iter()
        .map(|(strategy, options)| {
            let outcome = run_backtest(strategy, draws, train, test, &options, weights_for);
            BacktestReport::new(strategy, train, test, options, outcome)
        })
        .collect()
}
