use bicolor_db::models::{Draw, Pool};
use super::ScoreVector;

/// Retard courant : nombre de tirages consécutifs, en partant du plus récent,
/// sans apparition du numéro. 0 s'il est sorti au dernier tirage.
pub fn misses(draws: &[Draw], pool: Pool) -> ScoreVector {
    let mut misses = ScoreVector::zeros(pool);
    for draw in draws {
        let drawn = pool.numbers_from(draw);
        for n in pool.range() {
            if drawn.contains(&n) {
                misses.set(n, 0);
            } else {
                misses.set(n, misses.get(n).saturating_add(1));
            }
        }
    }
    misses
}
