use serde::Serialize;

use bicolor_db::models::{Draw, Pick};

use crate::constraints::PredictOptions;
use crate::ensemble::EnsembleWeights;
use crate::error::EngineError;
use crate::generator::generate;
use crate::models::Signals;
use crate::strategy::Strategy;

pub const MIN_TRAIN_WINDOW: usize = 50;
pub const MIN_TEST_COUNT: usize = 10;
pub const MAX_SAMPLES: usize = 10;

const BLUE_RATE_WEIGHT: f64 = 1.2;
const RED_2PLUS_WEIGHT: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestSample {
    pub predicted: Pick,
    pub actual_draw_id: String,
    pub actual_reds: [u8; 6],
    pub actual_blue: u8,
    pub red_hits: usize,
    pub blue_hit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestSummary {
    pub red_hit_total: usize,
    pub blue_hit_total: usize,
    /// Bleu trouvé et au moins un rouge.
    pub both_hit_count: usize,
    /// Index = nombre de rouges trouvés (0 à 6).
    pub red_hit_dist: [usize; 7],
    pub avg_red_hits: f64,
    pub blue_hit_rate: f64,
    pub red2plus_rate: f64,
    pub score: f64,
    pub samples: Vec<BacktestSample>,
}

#[derive(Debug, Default)]
struct Tally {
    red_hit_total: usize,
    blue_hit_total: usize,
    both_hit_count: usize,
    red_hit_dist: [usize; 7],
    samples: Vec<BacktestSample>,
}

impl Tally {
    fn record(&mut self, predicted: Pick, actual: &Draw) {
        let red_hits = predicted.red_hits(actual);
        let blue_hit = predicted.blue_hit(actual);

        self.red_hit_total += red_hits;
        if blue_hit {
            self.blue_hit_total += 1;
            if red_hits > 0 {
                self.both_hit_count += 1;
            }
        }
        self.red_hit_dist[red_hits.min(6)] += 1;

        if self.samples.len() < MAX_SAMPLES {
            self.samples.push(BacktestSample {
                predicted,
                actual_draw_id: actual.draw_id.clone(),
                actual_reds: actual.reds,
                actual_blue: actual.blue,
                red_hits,
                blue_hit,
            });
        }
    }

    fn finish(self, test_count: usize) -> BacktestSummary {
        let n = test_count.max(1) as f64;
        let avg_red_hits = self.red_hit_total as f64 / n;
        let blue_hit_rate = self.blue_hit_total as f64 / n;
        let red2plus_rate = self.red_hit_dist[2..].iter().sum::<usize>() as f64 / n;
        let score = avg_red_hits + BLUE_RATE_WEIGHT * blue_hit_rate + RED_2PLUS_WEIGHT * red2plus_rate;

        BacktestSummary {
            red_hit_total: self.red_hit_total,
            blue_hit_total: self.blue_hit_total,
            both_hit_count: self.both_hit_count,
            red_hit_dist: self.red_hit_dist,
            avg_red_hits,
            blue_hit_rate,
            red2plus_rate,
            score,
            samples: self.samples,
        }
    }
}

/// Fenêtre glissante : pour chaque point de test, entraînement sur les `train`
/// tirages qui le précèdent, une grille générée avec le sel = index du point.
///
/// `draws` du plus ancien au plus récent ; seuls les `train + test` derniers sont utilisés.
/// `weights_for` fournit les poids du mélange pour une fenêtre d'entraînement.
pub fn run_backtest(
    strategy: Strategy,
    draws: &[Draw],
    train: usize,
    test: usize,
    options: &PredictOptions,
    weights_for: &(dyn Fn(&[Draw]) -> EnsembleWeights + Sync),
) -> Result<BacktestSummary, EngineError> {
    let required = train + test;
    if draws.len() < required {
        return Err(EngineError::InsufficientData { required, available: draws.len() });
    }
    let window = &draws[draws.len() - required..];

    let mut tally = Tally::default();
    for i in 0..test {
        let train_set = &window[i..i + train];
        let actual = &window[i + train];

        let signals = Signals::build(train_set);
        let weights = if strategy.is_ml_family() {
            weights_for(train_set)
        } else {
            EnsembleWeights::default()
        };
        let pick = generate(strategy, &signals, &weights, i as u64, options)?;
        tally.record(pick, actual);
    }

    let summary = tally.finish(test);
    log::debug!(
        "Backtest {} ({}+{}) : score {:.3}",
        strategy,
        train,
        test,
        summary.score
    );
    Ok(summary)
}

#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub strategy: Strategy,
    pub train_window: usize,
    pub test_count: usize,
    pub options: PredictOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<BacktestSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EngineError>,
}

impl BacktestReport {
    pub fn new(
        strategy: Strategy,
        train_window: usize,
        test_count: usize,
        options: PredictOptions,
        outcome: Result<BacktestSummary, EngineError>,
    ) -> Self {
        let (summary, error) = match outcome {
            Ok(summary) => (Some(summary), None),
            Err(e) => (None, Some(e)),
        };
        Self { strategy, train_window, test_count, options, summary, error }
    }

    pub fn score(&self) -> Option<f64> {
        self.summary.as_ref().map(|s| s.score)
    }
}
