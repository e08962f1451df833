use std::collections::HashMap;

use bicolor_db::models::{Draw, Pool};
use super::ScoreVector;

/// Classe d'un tirage d'après la somme, l'écart, le nombre d'impairs et la répartition par zones.
pub fn bucket(draw: &Draw) -> u32 {
    let reds = draw.sorted_reds();
    let sum: u32 = reds.iter().map(|&r| r as u32).sum();
    let span = (reds[5] - reds[0]) as u32;
    let odd = reds.iter().filter(|&&r| r % 2 == 1).count() as u32;
    let (z1, z2, z3) = zone_counts(&reds);

    let sum_b = (sum / 30).min(6);
    let span_b = (span / 5).min(6);
    let zone_b = z1 * 100 + z2 * 10 + z3;
    sum_b * 1000 + span_b * 100 + odd * 10 + zone_b % 10
}

pub fn zone_counts(reds: &[u8]) -> (u32, u32, u32) {
    reds.iter().fold((0, 0, 0), |(z1, z2, z3), &r| match r {
        0..=11 => (z1 + 1, z2, z3),
        12..=22 => (z1, z2 + 1, z3),
        _ => (z1, z2, z3 + 1),
    })
}

/// Fréquence conditionnelle : numéros sortis au tirage suivant un tirage de même classe
/// que le dernier, lissée de +1.
pub fn score(draws: &[Draw], pool: Pool) -> ScoreVector {
    let mut by_bucket: HashMap<u32, ScoreVector> = HashMap::new();
    for pair in draws.windows(2) {
        let counts = by_bucket
            .entry(bucket(&pair[0]))
            .or_insert_with(|| ScoreVector::zeros(pool));
        for &n in pool.numbers_from(&pair[1]) {
            counts.incr(n);
        }
    }

    let current = draws.last().map(bucket).unwrap_or(0);
    match by_bucket.get(&current) {
        Some(counts) => ScoreVector::from_fn(pool, |n| counts.get(n).saturating_add(1)),
        None => ScoreVector::from_fn(pool, |_| 1),
    }
}
