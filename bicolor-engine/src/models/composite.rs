use bicolor_db::models::{Draw, Pool};
use super::{frequency, ScoreVector};

pub const RED_RECENT_WINDOW: usize = 30;
pub const BLUE_RECENT_WINDOW: usize = 40;

/// `count*2 + miss`.
pub fn hybrid(counts: &ScoreVector, misses: &ScoreVector) -> ScoreVector {
    ScoreVector::from_fn(counts.pool(), |n| {
        counts.get(n).saturating_mul(2).saturating_add(misses.get(n))
    })
}

/// Mélange linéaire fixe : fréquence, retard plafonné, fréquence récente, plus
/// le score de Markov (rouges) ou la transition depuis le dernier bleu (bleus).
pub fn ml(
    draws: &[Draw],
    counts: &ScoreVector,
    misses: &ScoreVector,
    transition: &ScoreVector,
    markov: &ScoreVector,
) -> ScoreVector {
    let pool = counts.pool();
    let (window, link, link_weight) = match pool {
        Pool::Red => (RED_RECENT_WINDOW, markov, 2),
        Pool::Blue => (BLUE_RECENT_WINDOW, transition, 20),
    };
    let recent = frequency::recent_counts(draws, pool, window);

    ScoreVector::from_fn(pool, |n| {
        counts
            .get(n)
            .saturating_mul(4)
            .saturating_add(misses.get(n).min(50).saturating_mul(2))
            .saturating_add(recent.get(n).saturating_mul(6))
            .saturating_add(link.get(n).saturating_mul(link_weight))
    })
}
