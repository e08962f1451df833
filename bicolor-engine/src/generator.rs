use rand::rngs::StdRng;
use bicolor_db::models::{Pick, Pool};

use crate::constraints::{clamp_max_try, PredictOptions};
use crate::ensemble::{blend, EnsembleWeights};
use crate::error::EngineError;
use crate::models::{PoolSignals, ScoreVector, Signals};
use crate::sampler::{sample_blue, sample_reds, seeded_rng, top_k};
use crate::strategy::Strategy;

const ZONES: [(u8, u8); 3] = [(1, 11), (12, 22), (23, 33)];

pub fn seed_for(strategy: Strategy, salt: u64) -> String {
    format!("ssq-{}-{}", strategy.name(), salt)
}

fn top_pick(select: impl Fn(&PoolSignals) -> &ScoreVector, signals: &Signals) -> Option<Pick> {
    let reds = top_k(select(&signals.red), Pool::Red.pick_count());
    let blue = top_k(select(&signals.blue), 1).first().copied()?;
    Pick::from_slice(&reds, blue)
}

fn sampled_pick(
    red_score: &ScoreVector,
    blue_score: &ScoreVector,
    signals: &Signals,
    options: &PredictOptions,
    rng: &mut StdRng,
) -> Option<Pick> {
    let reds = sample_reds(red_score, &signals.red.misses, 6, 1..=33, options, rng);
    let blue = sample_blue(blue_score, &signals.blue.misses, options, rng)?;
    Pick::from_slice(&reds, blue)
}

/// Une grille brute, sans filtrage. `None` si l'échantillonnage n'a pas pu
/// fournir 6 rouges et un bleu (trop d'exclusions).
pub fn raw_pick(
    strategy: Strategy,
    signals: &Signals,
    weights: &EnsembleWeights,
    options: &PredictOptions,
    rng: &mut StdRng,
) -> Option<Pick> {
    match strategy {
        Strategy::FrequencyTop => top_pick(|s| &s.counts, signals),
        Strategy::OmissionTop => top_pick(|s| &s.misses, signals),
        Strategy::Hybrid => top_pick(|s| &s.hybrid, signals),
        Strategy::WeightedRandom => {
            sampled_pick(&signals.red.counts, &signals.blue.counts, signals, options, rng)
        }
        Strategy::ZoneBalanced => {
            let mut reds = Vec::with_capacity(6);
            for (lo, hi) in ZONES {
                reds.extend(sample_reds(&signals.red.counts, &signals.red.misses, 2, lo..=hi, options, rng));
            }
            let blue = sample_blue(&signals.blue.counts, &signals.blue.misses, options, rng)?;
            Pick::from_slice(&reds, blue)
        }
        Strategy::Markov if signals.has_last => {
            sampled_pick(&signals.red.markov, &signals.blue.markov, signals, options, rng)
        }
        Strategy::Bayes => sampled_pick(&signals.red.bayes, &signals.blue.bayes, signals, options, rng),
        Strategy::Ensemble if signals.has_last => {
            let red = blend(&signals.red, weights);
            let blue = blend(&signals.blue, weights);
            sampled_pick(&red, &blue, signals, options, rng)
        }
        // Markov et ensemble sans historique
        Strategy::Markov | Strategy::Ensemble => top_pick(|s| &s.counts, signals),
    }
}

/// Génère-et-filtre : jusqu'à `max_try` essais, sel incrémenté à chaque essai,
/// la première grille acceptée l'emporte.
pub fn generate(
    strategy: Strategy,
    signals: &Signals,
    weights: &EnsembleWeights,
    salt: u64,
    options: &PredictOptions,
) -> Result<Pick, EngineError> {
    let max_try = clamp_max_try(options.max_try);
    for t in 0..max_try as u64 {
        let mut rng = seeded_rng(&seed_for(strategy, salt + t));
        if let Some(pick) = raw_pick(strategy, signals, weights, options, &mut rng) {
            if options.accept(&pick) {
                return Ok(pick);
            }
        }
    }

    if options.has_constraints() {
        log::warn!("{} : aucune grille valide après {} essais", strategy, max_try);
        return Err(EngineError::NoCandidate { max_try });
    }

    let unconstrained = PredictOptions::default();
    let mut rng = seeded_rng(&seed_for(strategy, salt));
    raw_pick(strategy, signals, weights, &unconstrained, &mut rng)
        .or_else(|| top_pick(|s| &s.counts, signals))
        .ok_or(EngineError::NoCandidate { max_try })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ZoneRatio;
    use crate::models::make_test_draws;
    use bicolor_db::models::validate_draw;

    fn signals(n: usize) -> Signals {
        Signals::build(&make_test_draws(n))
    }

    #[test]
    fn test_every_strategy_yields_valid_pick() {
        let s = signals(120);
        let w = EnsembleWeights::default();
        let opt = PredictOptions::default();
        for strategy in Strategy::ALL {
            for salt in 0..10 {
                let pick = generate(strategy, &s, &w, salt, &opt).unwrap();
                assert!(validate_draw(&pick.reds, pick.blue).is_ok(), "{strategy}: {pick}");
                assert!(pick.reds.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn test_empty_history_yields_valid_pick() {
        let s = signals(0);
        let w = EnsembleWeights::default();
        for strategy in Strategy::ALL {
            let pick = generate(strategy, &s, &w, 0, &PredictOptions::default()).unwrap();
            assert!(validate_draw(&pick.reds, pick.blue).is_ok(), "{strategy}");
        }
        // sans historique, markov et ml retombent sur le top fréquence
        let top = generate(Strategy::FrequencyTop, &s, &w, 0, &PredictOptions::default()).unwrap();
        assert_eq!(generate(Strategy::Ensemble, &s, &w, 3, &PredictOptions::default()).unwrap(), top);
        assert_eq!(top.reds, [1, 2, 3, 4, 5, 6]);
        assert_eq!(top.blue, 1);
    }

    #[test]
    fn test_deterministic_for_same_inputs() {
        let s = signals(100);
        let w = EnsembleWeights::default();
        let opt = PredictOptions { zone_ratio: Some(ZoneRatio(2, 2, 2)), ..Default::default() };
        for strategy in Strategy::ALL {
            let a = generate(strategy, &s, &w, 7, &opt);
            let b = generate(strategy, &s, &w, 7, &opt);
            assert_eq!(a, b, "{strategy}");
        }
    }

    #[test]
    fn test_accepted_picks_satisfy_options() {
        let s = signals(100);
        let w = EnsembleWeights::default();
        let opt = PredictOptions {
            min_odd: Some(2),
            max_odd: Some(4),
            min_sum: Some(70),
            max_sum: Some(140),
            kill_blues: [1, 2, 3].into(),
            max_try: 300,
            ..Default::default()
        };
        for strategy in [Strategy::WeightedRandom, Strategy::ZoneBalanced, Strategy::Bayes, Strategy::Ensemble] {
            for salt in 0..5 {
                if let Ok(pick) = generate(strategy, &s, &w, salt, &opt) {
                    assert!(opt.accept(&pick));
                }
            }
        }
    }

    #[test]
    fn test_unsatisfiable_zone_is_no_candidate() {
        let s = signals(100);
        let opt = PredictOptions {
            zone_ratio: Some(ZoneRatio(6, 0, 0)),
            kill_reds: (1..=11).collect(),
            ..Default::default()
        };
        for strategy in Strategy::ALL {
            let res = generate(strategy, &s, &EnsembleWeights::default(), 0, &opt);
            assert_eq!(res, Err(EngineError::NoCandidate { max_try: 120 }), "{strategy}");
        }
    }

    #[test]
    fn test_dan_reds_with_balanced_zones() {
        let s = signals(100);
        let opt = PredictOptions {
            zone_ratio: Some(ZoneRatio(2, 2, 2)),
            dan_reds: [1, 33].into(),
            ..Default::default()
        };
        for strategy in [Strategy::ZoneBalanced, Strategy::WeightedRandom] {
            for salt in 0..10 {
                let pick = generate(strategy, &s, &EnsembleWeights::default(), salt, &opt).unwrap();
                assert!(pick.reds.contains(&1) && pick.reds.contains(&33), "{strategy}: {pick}");
                assert!(opt.accept(&pick));
            }
        }
    }

    #[test]
    fn test_top_strategies_rank_by_signal() {
        let draws: Vec<_> = (0..100)
            .map(|i| bicolor_db::models::Draw {
                draw_id: format!("{:04}", i),
                date: None,
                reds: [7, 10 + (i % 5) as u8, 16, 20, 25, 30],
                blue: 1,
            })
            .collect();
        let s = Signals::build(&draws);
        let pick = generate(Strategy::FrequencyTop, &s, &EnsembleWeights::default(), 0, &PredictOptions::default()).unwrap();
        assert!(pick.reds.contains(&7));
        assert_eq!(pick.blue, 1);

        let omission = generate(Strategy::OmissionTop, &s, &EnsembleWeights::default(), 0, &PredictOptions::default()).unwrap();
        assert!(!omission.reds.contains(&7));
        assert_ne!(omission.blue, 1);
    }
}
