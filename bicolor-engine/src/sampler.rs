use std::ops::RangeInclusive;

use rand::SeedableRng;
use rand::distr::Uniform;
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use sha2::{Digest, Sha256};

use bicolor_db::models::Pool;

use crate::constraints::PredictOptions;
use crate::models::ScoreVector;

/// Générateur déterministe dérivé d'une chaîne (SHA-256 -> seed 32 octets).
pub fn seeded_rng(seed: &str) -> StdRng {
    let digest = Sha256::digest(seed.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    StdRng::from_seed(bytes)
}

/// Poids d'échantillonnage : `1 + 3*score + min(miss, 50)`.
fn weight(score: &ScoreVector, misses: &ScoreVector, n: u8) -> u64 {
    1u64.saturating_add(score.get(n).saturating_mul(3))
        .saturating_add(misses.get(n).min(50))
}

/// Les `k` meilleurs numéros, score décroissant, à égalité le plus petit.
pub fn top_k(scores: &ScoreVector, k: usize) -> Vec<u8> {
    let mut numbers: Vec<u8> = scores.pool().range().collect();
    numbers.sort_by(|&a, &b| scores.get(b).cmp(&scores.get(a)));
    numbers.truncate(k);
    numbers
}

/// Tirage sans remise de `k` rouges dans `range`.
/// Les rouges exclus sont retirés, les fixes de la plage placés d'abord.
/// Peut rendre moins de `k` numéros si la plage s'épuise.
pub fn sample_reds(
    score: &ScoreVector,
    misses: &ScoreVector,
    k: usize,
    range: RangeInclusive<u8>,
    options: &PredictOptions,
    rng: &mut StdRng,
) -> Vec<u8> {
    let mut available: Vec<u8> = range
        .filter(|n| Pool::Red.contains(*n) && !options.kill_reds.contains(n))
        .collect();
    let mut picked = Vec::with_capacity(k);

    for &dan in &options.dan_reds {
        if picked.len() >= k {
            break;
        }
        if let Some(pos) = available.iter().position(|&n| n == dan) {
            picked.push(available.remove(pos));
        }
    }

    while picked.len() < k && !available.is_empty() {
        let weights: Vec<u64> = available.iter().map(|&n| weight(score, misses, n)).collect();
        let Ok(dist) = WeightedIndex::new(&weights) else {
            break;
        };
        let idx = dist.sample(rng);
        picked.push(available.remove(idx));
    }

    picked
}

/// Un bleu. Avec des bleus fixes valides, tirage uniforme parmi eux ;
/// sinon tirage pondéré hors bleus exclus. `None` si tout est exclu.
pub fn sample_blue(
    score: &ScoreVector,
    misses: &ScoreVector,
    options: &PredictOptions,
    rng: &mut StdRng,
) -> Option<u8> {
    let dan: Vec<u8> = options
        .dan_blues
        .iter()
        .copied()
        .filter(|n| Pool::Blue.contains(*n) && !options.kill_blues.contains(n))
        .collect();
    if !dan.is_empty() {
        let idx = Uniform::new(0, dan.len()).ok()?.sample(rng);
        return Some(dan[idx]);
    }

    let available: Vec<u8> = Pool::Blue
        .range()
        .filter(|n| !options.kill_blues.contains(n))
        .collect();
    if available.is_empty() {
        return None;
    }
    let weights: Vec<u64> = available.iter().map(|&n| weight(score, misses, n)).collect();
    let dist = WeightedIndex::new(&weights).ok()?;
    Some(available[dist.sample(rng)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn flat(pool: Pool) -> ScoreVector {
        ScoreVector::from_fn(pool, |_| 1)
    }

    #[test]
    fn test_seed_determinism() {
        let score = ScoreVector::from_fn(Pool::Red, |n| n as u64);
        let misses = ScoreVector::zeros(Pool::Red);
        let opt = PredictOptions::default();

        let a = sample_reds(&score, &misses, 6, 1..=33, &opt, &mut seeded_rng("ssq-test-1"));
        let b = sample_reds(&score, &misses, 6, 1..=33, &opt, &mut seeded_rng("ssq-test-1"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_reds_distinct_in_range() {
        let opt = PredictOptions::default();
        for salt in 0..50 {
            let mut rng = seeded_rng(&format!("reds-{salt}"));
            let reds = sample_reds(&flat(Pool::Red), &flat(Pool::Red), 6, 1..=33, &opt, &mut rng);
            let set: BTreeSet<u8> = reds.iter().copied().collect();
            assert_eq!(set.len(), 6);
            assert!(reds.iter().all(|r| (1..=33).contains(r)));
        }
    }

    #[test]
    fn test_kill_and_dan_reds() {
        let opt = PredictOptions {
            kill_reds: (1..=10).collect(),
            dan_reds: [33, 5].into(),
            ..Default::default()
        };
        for salt in 0..30 {
            let mut rng = seeded_rng(&format!("kill-{salt}"));
            let reds = sample_reds(&flat(Pool::Red), &flat(Pool::Red), 6, 1..=33, &opt, &mut rng);
            assert!(reds.contains(&33));
            // 5 est exclu, donc jamais forcé
            assert!(reds.iter().all(|r| *r > 10));
        }
    }

    #[test]
    fn test_zone_range_and_exhaustion() {
        let opt = PredictOptions { kill_reds: (1..=10).collect(), ..Default::default() };
        let mut rng = seeded_rng("zone");
        let reds = sample_reds(&flat(Pool::Red), &flat(Pool::Red), 2, 1..=11, &opt, &mut rng);
        assert_eq!(reds, vec![11]);
    }

    #[test]
    fn test_dan_capped_at_k() {
        let opt = PredictOptions { dan_reds: [1, 2, 3].into(), ..Default::default() };
        let reds = sample_reds(&flat(Pool::Red), &flat(Pool::Red), 2, 1..=11, &opt, &mut seeded_rng("cap"));
        assert_eq!(reds, vec![1, 2]);
    }

    #[test]
    fn test_heavy_weight_dominates() {
        let score = ScoreVector::from_fn(Pool::Blue, |n| if n == 9 { 1_000_000 } else { 0 });
        let misses = ScoreVector::zeros(Pool::Blue);
        let opt = PredictOptions::default();
        let hits = (0..100)
            .filter(|i| sample_blue(&score, &misses, &opt, &mut seeded_rng(&format!("b{i}"))) == Some(9))
            .count();
        assert!(hits > 90, "hits = {hits}");
    }

    #[test]
    fn test_blue_dan_and_kill() {
        let misses = ScoreVector::zeros(Pool::Blue);
        let opt = PredictOptions { dan_blues: [3, 4].into(), kill_blues: [4].into(), ..Default::default() };
        for i in 0..20 {
            assert_eq!(sample_blue(&flat(Pool::Blue), &misses, &opt, &mut seeded_rng(&format!("d{i}"))), Some(3));
        }

        let all_killed = PredictOptions { kill_blues: (1..=16).collect(), ..Default::default() };
        assert_eq!(sample_blue(&flat(Pool::Blue), &misses, &all_killed, &mut seeded_rng("x")), None);

        let keep_one = PredictOptions { kill_blues: (1..=15).collect(), ..Default::default() };
        assert_eq!(sample_blue(&flat(Pool::Blue), &misses, &keep_one, &mut seeded_rng("y")), Some(16));
    }

    #[test]
    fn test_top_k_ties_lower_first() {
        let scores = ScoreVector::from_fn(Pool::Red, |n| if n % 10 == 0 { 5 } else { 1 });
        assert_eq!(top_k(&scores, 3), vec![10, 20, 30]);
        assert_eq!(top_k(&scores, 5), vec![10, 20, 30, 1, 2]);
        assert_eq!(top_k(&ScoreVector::zeros(Pool::Blue), 1), vec![1]);
    }
}
