use bicolor_db::models::{Draw, Pool};
use super::ScoreVector;

/// Nombre d'apparitions de chaque numéro dans la fenêtre.
pub fn counts(draws: &[Draw], pool: Pool) -> ScoreVector {
    let mut counts = ScoreVector::zeros(pool);
    for draw in draws {
        for &n in pool.numbers_from(draw) {
            counts.incr(n);
        }
    }
    counts
}

/// Apparitions sur les `window` derniers tirages (fenêtre chronologique).
pub fn recent_counts(draws: &[Draw], pool: Pool, window: usize) -> ScoreVector {
    let start = draws.len().saturating_sub(window);
    counts(&draws[start..], pool)
}
