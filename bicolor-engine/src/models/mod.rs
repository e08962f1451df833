pub mod bayes;
pub mod composite;
pub mod frequency;
pub mod markov;
pub mod normalize;
pub mod omission;

use std::ops::RangeInclusive;

use serde::{Serialize, Serializer};
use bicolor_db::models::{Draw, NumberCount, Pool};

/// Score entier par numéro d'une pool, indexé par `numéro - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreVector {
    pool: Pool,
    values: Vec<u64>,
}

impl ScoreVector {
    pub fn zeros(pool: Pool) -> Self {
        Self { pool, values: vec![0; pool.size()] }
    }

    pub fn from_fn(pool: Pool, f: impl Fn(u8) -> u64) -> Self {
        Self {
            pool,
            values: pool.range().map(f).collect(),
        }
    }

    pub fn pool(&self) -> Pool {
        self.pool
    }

    /// 0 pour un numéro hors de la pool.
    pub fn get(&self, number: u8) -> u64 {
        if self.pool.contains(number) {
            self.values[(number - 1) as usize]
        } else {
            0
        }
    }

    pub fn set(&mut self, number: u8, value: u64) {
        if self.pool.contains(number) {
            self.values[(number - 1) as usize] = value;
        }
    }

    pub fn incr(&mut self, number: u8) {
        if self.pool.contains(number) {
            let slot = &mut self.values[(number - 1) as usize];
            *slot = slot.saturating_add(1);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.values.iter().enumerate().map(|(i, &v)| ((i + 1) as u8, v))
    }

    pub fn iter_range(&self, range: RangeInclusive<u8>) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.iter().filter(move |(n, _)| range.contains(n))
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    /// Classement décroissant, à égalité le plus petit numéro d'abord.
    pub fn ranked(&self) -> Vec<NumberCount> {
        let mut ranked: Vec<NumberCount> = self
            .iter()
            .map(|(number, v)| NumberCount { number, count: v.min(u32::MAX as u64) as u32 })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
    }
}

impl Serialize for ScoreVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

/// Tous les signaux d'une pool, calculés une fois par fenêtre.
#[derive(Debug, Clone)]
pub struct PoolSignals {
    pub pool: Pool,
    pub counts: ScoreVector,
    pub misses: ScoreVector,
    /// Transitions depuis les numéros du dernier tirage.
    pub transition: ScoreVector,
    pub markov: ScoreVector,
    pub bayes: ScoreVector,
    pub hybrid: ScoreVector,
    pub ml: ScoreVector,
}

impl PoolSignals {
    /// `draws` du plus ancien au plus récent.
    pub fn build(draws: &[Draw], pool: Pool) -> Self {
        let counts = frequency::counts(draws, pool);
        let misses = omission::misses(draws, pool);
        let transition = markov::Transition::build(draws, pool).from_latest(draws);
        let markov = markov::score(&transition, &counts, &misses);
        let bayes = bayes::score(draws, pool);
        let hybrid = composite::hybrid(&counts, &misses);
        let ml = composite::ml(draws, &counts, &misses, &transition, &markov);
        Self { pool, counts, misses, transition, markov, bayes, hybrid, ml }
    }
}

#[derive(Debug, Clone)]
pub struct Signals {
    pub red: PoolSignals,
    pub blue: PoolSignals,
    pub has_last: bool,
}

impl Signals {
    /// `draws` du plus ancien au plus récent.
    pub fn build(draws: &[Draw]) -> Self {
        Self {
            red: PoolSignals::build(draws, Pool::Red),
            blue: PoolSignals::build(draws, Pool::Blue),
            has_last: !draws.is_empty(),
        }
    }

    pub fn pool(&self, pool: Pool) -> &PoolSignals {
        match pool {
            Pool::Red => &self.red,
            Pool::Blue => &self.blue,
        }
    }
}

/// Historique synthétique chronologique pour les tests.
pub fn make_test_draws(n: usize) -> Vec<Draw> {
    (0..n)
        .map(|i| {
            let base = (i % 5) as u8;
            let mut reds = [
                base * 2 + 1,
                base * 2 + 2,
                base + 12 + (i % 3) as u8,
                base * 2 + 16,
                base + 23,
                33 - (i % 4) as u8,
            ];
            reds.sort();
            Draw {
                draw_id: format!("2020{:04}", i + 1),
                date: None,
                reds,
                blue: (i % 16) as u8 + 1,
            }
        })
        .collect()
}
