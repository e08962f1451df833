use anyhow::Result;
use serde::Serialize;

use bicolor_db::history::HistoryProvider;
use bicolor_db::models::{Draw, NumberCount, Pick, Pool};

use crate::backtest::{run_backtest, BacktestReport, MIN_TEST_COUNT, MIN_TRAIN_WINDOW};
use crate::config::EngineConfig;
use crate::constraints::PredictOptions;
use crate::ensemble::cache::{Fingerprint, WeightCache};
use crate::ensemble::{tuning, EnsembleWeights};
use crate::error::EngineError;
use crate::generator::generate;
use crate::models::{frequency, omission, Signals};
use crate::recommend::{best_index, run_candidates};
use crate::strategy::{ResolvedStrategy, Strategy};

pub const DISCLAIMER: &str =
    "Résultats statistiques fournis à titre de divertissement, sans aucune garantie ni valeur de conseil.";

pub const DEFAULT_TREND_WINDOW: usize = 100;
pub const DEFAULT_STATS_WINDOW: usize = 200;
pub const MAX_PICKS: usize = 20;

/// Rapport accompagné de l'avertissement.
#[derive(Debug, Clone, Serialize)]
pub struct Disclaimed<T> {
    #[serde(flatten)]
    pub report: T,
    pub disclaimer: &'static str,
}

impl<T> Disclaimed<T> {
    fn new(report: T) -> Self {
        Self { report, disclaimer: DISCLAIMER }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NumberStats {
    /// Tirages réellement analysés.
    pub draws: usize,
    pub red: Vec<NumberCount>,
    pub blue: Vec<NumberCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trend {
    pub draws: Vec<Draw>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Explain {
    pub mode: &'static str,
    pub weights: EnsembleWeights,
    pub cache_ttl_minutes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictReport {
    pub strategy: Strategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub latest_n: usize,
    pub count: usize,
    pub picks: Vec<Pick>,
    pub options: PredictOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<Explain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EngineError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendReport {
    pub train_window: usize,
    pub test_count: usize,
    pub best: Option<BacktestReport>,
    pub candidates: Vec<BacktestReport>,
}

/// Point d'entrée du moteur. Seul le cache des poids est partagé entre appels.
pub struct Engine {
    config: EngineConfig,
    cache: WeightCache,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// `latest` rend du plus récent au plus ancien ; les modèles veulent l'inverse.
fn chronological(history: &dyn HistoryProvider, n: usize) -> Result<Vec<Draw>> {
    let mut draws = history.latest(n)?;
    draws.reverse();
    Ok(draws)
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let cache = WeightCache::new(config.cache_ttl());
        Self { config, cache }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Poids calibrés pour cet historique, en cache tant que
    /// (dernier tirage, longueur) ne change pas et que le TTL court.
    pub fn ensemble_weights(&self, draws: &[Draw]) -> EnsembleWeights {
        let Some(last) = draws.last() else {
            return self.config.default_weights;
        };
        if !tuning::has_enough_history(draws.len(), &self.config) {
            return self.config.default_weights;
        }
        let fingerprint = Fingerprint { last_draw_id: last.draw_id.clone(), len: draws.len() };
        self.cache.get_or_compute(fingerprint, || tuning::tune(draws, &self.config))
    }

    /// Occurrences par numéro, triées de la plus fréquente à la plus rare.
    pub fn hot_cold(&self, history: &dyn HistoryProvider, latest_n: usize) -> Result<Disclaimed<NumberStats>> {
        let draws = history.latest(latest_n)?;
        Ok(Disclaimed::new(NumberStats {
            draws: draws.len(),
            red: frequency::counts(&draws, Pool::Red).ranked(),
            blue: frequency::counts(&draws, Pool::Blue).ranked(),
        }))
    }

    pub fn trend(&self, history: &dyn HistoryProvider, latest_n: usize) -> Result<Disclaimed<Trend>> {
        let draws = chronological(history, latest_n)?;
        Ok(Disclaimed::new(Trend { draws }))
    }

    /// Retard courant par numéro, du plus en retard au moins en retard.
    pub fn omission(&self, history: &dyn HistoryProvider, latest_n: usize) -> Result<Disclaimed<NumberStats>> {
        let draws = chronological(history, latest_n)?;
        Ok(Disclaimed::new(NumberStats {
            draws: draws.len(),
            red: omission::misses(&draws, Pool::Red).ranked(),
            blue: omission::misses(&draws, Pool::Blue).ranked(),
        }))
    }

    /// `count` grilles (1 à 20), sel = rang de la grille.
    /// Dès qu'une grille échoue, le rapport porte l'erreur et aucune grille.
    pub fn predict(
        &self,
        history: &dyn HistoryProvider,
        latest_n: usize,
        raw_strategy: &str,
        count: usize,
        options: &PredictOptions,
    ) -> Result<Disclaimed<PredictReport>> {
        let ResolvedStrategy { strategy, alias } = Strategy::resolve(raw_strategy);
        let count = count.clamp(1, MAX_PICKS);
        let options = options.clone().with_max_try(options.max_try);

        let draws = chronological(history, latest_n)?;
        let signals = Signals::build(&draws);
        let (weights, explain) = if strategy.is_ml_family() {
            let weights = self.ensemble_weights(&draws);
            let explain = Explain {
                mode: "ensemble_tuned",
                weights,
                cache_ttl_minutes: self.config.cache_ttl_minutes(),
            };
            (weights, Some(explain))
        } else {
            (self.config.default_weights, None)
        };

        let mut picks = Vec::with_capacity(count);
        let mut error = None;
        for salt in 0..count {
            match generate(strategy, &signals, &weights, salt as u64, &options) {
                Ok(pick) => picks.push(pick),
                Err(e) => {
                    picks.clear();
                    error = Some(e);
                    break;
                }
            }
        }

        Ok(Disclaimed::new(PredictReport {
            strategy,
            alias,
            latest_n,
            count,
            picks,
            options,
            explain,
            error,
        }))
    }

    /// Backtest glissant ; `train` ramené à 50 au minimum, `test` à 10.
    pub fn backtest(
        &self,
        history: &dyn HistoryProvider,
        raw_strategy: &str,
        train: usize,
        test: usize,
        options: &PredictOptions,
    ) -> Result<Disclaimed<BacktestReport>> {
        let strategy = Strategy::resolve(raw_strategy).strategy;
        let train = train.max(MIN_TRAIN_WINDOW);
        let test = test.max(MIN_TEST_COUNT);
        let options = options.clone().with_max_try(options.max_try);

        let draws = chronological(history, train + test)?;
        let weights_for = |window: &[Draw]| self.ensemble_weights(window);
        let outcome = run_backtest(strategy, &draws, train, test, &options, &weights_for);
        Ok(Disclaimed::new(BacktestReport::new(strategy, train, test, options, outcome)))
    }

    /// Backtest des huit candidats sur la même fenêtre ; meilleur score retenu.
    pub fn recommend(
        &self,
        history: &dyn HistoryProvider,
        train: usize,
        test: usize,
    ) -> Result<Disclaimed<RecommendReport>> {
        let train = train.max(MIN_TRAIN_WINDOW);
        let test = test.max(MIN_TEST_COUNT);

        let draws = chronological(history, train + test)?;
        let weights_for = |window: &[Draw]| self.ensemble_weights(window);
        let candidates = run_candidates(&draws, train, test, &weights_for);
        let best = best_index(&candidates).map(|i| candidates[i].clone());

        match &best {
            Some(b) => log::info!(
                "Recommandation ({}+{}) : {} score {:.3}",
                train,
                test,
                b.strategy,
                b.score().unwrap_or_default()
            ),
            None => log::warn!("Recommandation ({}+{}) : aucun candidat exploitable", train, test),
        }

        Ok(Disclaimed::new(RecommendReport { train_window: train, test_count: test, best, candidates }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ZoneRatio;
    use crate::models::make_test_draws;
    use bicolor_db::history::MemoryHistory;
    use bicolor_db::models::validate_draw;

    fn history(n: usize) -> MemoryHistory {
        MemoryHistory::new(make_test_draws(n))
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn test_hot_cold_dominant_numbers() {
        let draws: Vec<Draw> = (0..100)
            .map(|i| Draw {
                draw_id: format!("2023{:03}", i),
                date: None,
                reds: [1 + (i % 5) as u8, 7, 10 + (i % 5) as u8, 16 + (i % 5) as u8, 22 + (i % 5) as u8, 28 + (i % 5) as u8],
                blue: 1,
            })
            .collect();
        let report = Engine::default().hot_cold(&MemoryHistory::new(draws), 200).unwrap();
        assert_eq!(report.report.draws, 100);
        assert_eq!(report.report.red[0], NumberCount { number: 7, count: 100 });
        assert_eq!(report.report.blue[0], NumberCount { number: 1, count: 100 });
        assert_eq!(report.report.red.len(), 33);
        assert_eq!(report.report.blue.len(), 16);
        assert_eq!(report.disclaimer, DISCLAIMER);
    }

    #[test]
    fn test_trend_is_chronological() {
        let report = Engine::default().trend(&history(150), 100).unwrap();
        let draws = &report.report.draws;
        assert_eq!(draws.len(), 100);
        assert!(draws.windows(2).all(|w| w[0].draw_id < w[1].draw_id));
        assert_eq!(draws[99].draw_id, "20200150");
    }

    #[test]
    fn test_omission_latest_draw_is_zero() {
        let h = history(60);
        let report = Engine::default().omission(&h, 200).unwrap();
        let last = &h.draws()[59];
        for nc in &report.report.red {
            if last.reds.contains(&nc.number) {
                assert_eq!(nc.count, 0);
            }
        }
        // le rouge 11 n'apparaît jamais : 60 tirages de retard
        assert_eq!(report.report.red[0], NumberCount { number: 11, count: 60 });
    }

    #[test]
    fn test_predict_valid_picks() {
        let engine = Engine::default();
        let report = engine.predict(&history(120), 200, "weighted_random", 5, &PredictOptions::default()).unwrap();
        let r = &report.report;
        assert!(r.error.is_none());
        assert_eq!(r.picks.len(), 5);
        for pick in &r.picks {
            assert!(validate_draw(&pick.reds, pick.blue).is_ok());
        }
        assert!(r.explain.is_none());
        assert!(r.alias.is_none());
    }

    #[test]
    fn test_predict_count_clamped() {
        let engine = Engine::default();
        let h = history(80);
        let many = engine.predict(&h, 200, "hybrid", 50, &PredictOptions::default()).unwrap();
        assert_eq!(many.report.count, 20);
        assert_eq!(many.report.picks.len(), 20);
        let none = engine.predict(&h, 200, "hybrid", 0, &PredictOptions::default()).unwrap();
        assert_eq!(none.report.picks.len(), 1);
    }

    #[test]
    fn test_predict_no_candidate() {
        let opt = PredictOptions {
            zone_ratio: Some(ZoneRatio(6, 0, 0)),
            kill_reds: (1..=11).collect(),
            ..Default::default()
        };
        let report = Engine::default().predict(&history(100), 200, "zone_balanced", 3, &opt).unwrap();
        assert_eq!(report.report.error, Some(EngineError::NoCandidate { max_try: 120 }));
        assert!(report.report.picks.is_empty());
    }

    #[test]
    fn test_explain_only_for_ml_family() {
        let engine = Engine::default();
        let h = history(100);
        let ml = engine.predict(&h, 200, "Ensemble_Tuned", 2, &PredictOptions::default()).unwrap();
        assert_eq!(ml.report.strategy, Strategy::Ensemble);
        assert_eq!(ml.report.alias.as_deref(), Some("Ensemble_Tuned"));
        let explain = ml.report.explain.unwrap();
        assert_eq!(explain.mode, "ensemble_tuned");
        assert_eq!(explain.cache_ttl_minutes, 10);
        assert!(tuning::grid().contains(&explain.weights));

        let json = serde_json::to_value(&ml).unwrap();
        assert_eq!(json["strategy"], "ml");
        assert!(json["disclaimer"].is_string());

        let bayes = engine.predict(&h, 200, "bayes", 2, &PredictOptions::default()).unwrap();
        assert!(bayes.report.explain.is_none());
        assert!(serde_json::to_value(&bayes).unwrap().get("explain").is_none());
    }

    #[test]
    fn test_weights_cached_per_fingerprint() {
        let engine = Engine::default();
        let draws = make_test_draws(90);
        let first = engine.ensemble_weights(&draws);
        let fp = Fingerprint { last_draw_id: draws[89].draw_id.clone(), len: 90 };
        assert_eq!(engine.cache.get(&fp), Some(first));
        assert_eq!(engine.ensemble_weights(&draws), first);
    }

    #[test]
    fn test_short_history_not_cached() {
        let engine = Engine::default();
        let draws = make_test_draws(60);
        assert_eq!(engine.ensemble_weights(&draws), EnsembleWeights::default());
        let fp = Fingerprint { last_draw_id: draws[59].draw_id.clone(), len: 60 };
        assert!(engine.cache.get(&fp).is_none());
        assert_eq!(engine.ensemble_weights(&[]), EnsembleWeights::default());
    }

    #[test]
    fn test_backtest_floors_and_insufficient() {
        let engine = Engine::default();
        let report = engine.backtest(&history(59), "frequency_top", 10, 1, &PredictOptions::default()).unwrap();
        assert_eq!(report.report.train_window, 50);
        assert_eq!(report.report.test_count, 10);
        assert_eq!(report.report.error, Some(EngineError::InsufficientData { required: 60, available: 59 }));

        let ok = engine.backtest(&history(100), "markov", 50, 10, &PredictOptions::default()).unwrap();
        assert!(ok.report.summary.is_some());
    }

    #[test]
    fn test_recommend_returns_all_candidates() {
        let report = Engine::default().recommend(&history(80), 50, 10).unwrap();
        let r = &report.report;
        assert_eq!(r.candidates.len(), 8);
        let best = r.best.as_ref().unwrap();
        let max = r.candidates.iter().filter_map(|c| c.score()).fold(f64::MIN, f64::max);
        assert_eq!(best.score(), Some(max));
    }
}
