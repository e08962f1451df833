use std::ops::RangeInclusive;

use super::ScoreVector;

pub const NORM_MIN: u64 = 1;
pub const NORM_MAX: u64 = 1000;

/// Remet à l'échelle [1, 1000] les valeurs de toute la pool.
pub fn normalize(scores: &ScoreVector) -> ScoreVector {
    let pool = scores.pool();
    normalize_range(scores, pool.range())
}

/// Remet à l'échelle [1, 1000] les valeurs de `range` : le minimum vaut 1, le maximum 1000.
/// Valeurs toutes égales : 1000 partout. Hors de `range` : 0.
pub fn normalize_range(scores: &ScoreVector, range: RangeInclusive<u8>) -> ScoreVector {
    let pool = scores.pool();
    let in_range: Vec<u64> = scores.iter_range(range.clone()).map(|(_, v)| v).collect();
    let (Some(&min), Some(&max)) = (in_range.iter().min(), in_range.iter().max()) else {
        return ScoreVector::zeros(pool);
    };

    let spread = (max - min) as u128;
    ScoreVector::from_fn(pool, |n| {
        if !range.contains(&n) {
            return 0;
        }
        if spread == 0 {
            return NORM_MAX;
        }
        let offset = (scores.get(n) - min) as u128 * (NORM_MAX - NORM_MIN) as u128;
        // arrondi au plus proche
        NORM_MIN + ((offset * 2 + spread) / (spread * 2)) as u64
    })
}
