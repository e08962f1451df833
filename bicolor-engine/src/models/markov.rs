use bicolor_db::models::{Draw, Pool};
use super::ScoreVector;

/// Matrice de transition d'ordre 1 entre tirages consécutifs.
/// `cell(a, b)` = nombre de fois où `b` est sorti au tirage suivant un tirage contenant `a`.
pub struct Transition {
    pool: Pool,
    cells: Vec<u64>,
}

impl Transition {
    /// `draws` du plus ancien au plus récent.
    pub fn build(draws: &[Draw], pool: Pool) -> Self {
        let size = pool.size();
        let mut cells = vec![0u64; size * size];

        for pair in draws.windows(2) {
            let prev = pool.numbers_from(&pair[0]);
            let next = pool.numbers_from(&pair[1]);
            for &a in prev {
                if !pool.contains(a) {
                    continue;
                }
                for &b in next {
                    if pool.contains(b) {
                        let idx = (a - 1) as usize * size + (b - 1) as usize;
                        cells[idx] = cells[idx].saturating_add(1);
                    }
                }
            }
        }

        Self { pool, cells }
    }

    pub fn cell(&self, from: u8, to: u8) -> u64 {
        if !self.pool.contains(from) || !self.pool.contains(to) {
            return 0;
        }
        let size = self.pool.size();
        self.cells[(from - 1) as usize * size + (to - 1) as usize]
    }

    /// Somme des lignes des numéros de `from`.
    pub fn row_sum(&self, from: &[u8]) -> ScoreVector {
        ScoreVector::from_fn(self.pool, |to| {
            from.iter().fold(0u64, |acc, &a| acc.saturating_add(self.cell(a, to)))
        })
    }

    /// Lignes des numéros du dernier tirage, ou zéro sans historique.
    pub fn from_latest(&self, draws: &[Draw]) -> ScoreVector {
        match draws.last() {
            Some(last) => self.row_sum(self.pool.numbers_from(last)),
            None => ScoreVector::zeros(self.pool),
        }
    }
}

/// `transition*10 + count*2 + min(miss, 50)`.
pub fn score(transition: &ScoreVector, counts: &ScoreVector, misses: &ScoreVector) -> ScoreVector {
    ScoreVector::from_fn(transition.pool(), |n| {
        transition
            .get(n)
            .saturating_mul(10)
            .saturating_add(counts.get(n).saturating_mul(2))
            .saturating_add(misses.get(n).min(50))
    })
}
