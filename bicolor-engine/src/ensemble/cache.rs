use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::EnsembleWeights;

/// Identité d'un historique : dernier `draw_id` et longueur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub last_draw_id: String,
    pub len: usize,
}

#[derive(Debug, Clone)]
struct Entry {
    fingerprint: Fingerprint,
    weights: EnsembleWeights,
    computed_at: Instant,
}

/// Dernier résultat de calibration, valable `ttl`.
/// Le verrou ne couvre que la lecture et le remplacement, jamais le calcul :
/// deux calibrations concurrentes sont possibles, la dernière écrite gagne.
pub struct WeightCache {
    ttl: Duration,
    entry: Mutex<Option<Entry>>,
}

impl WeightCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: Mutex::new(None) }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<EnsembleWeights> {
        self.get_at(fingerprint, Instant::now())
    }

    fn get_at(&self, fingerprint: &Fingerprint, now: Instant) -> Option<EnsembleWeights> {
        let guard = self.entry.lock();
        guard
            .as_ref()
            .filter(|e| e.fingerprint == *fingerprint && now.saturating_duration_since(e.computed_at) < self.ttl)
            .map(|e| e.weights)
    }

    pub fn put(&self, fingerprint: Fingerprint, weights: EnsembleWeights) {
        self.put_at(fingerprint, weights, Instant::now());
    }

    fn put_at(&self, fingerprint: Fingerprint, weights: EnsembleWeights, computed_at: Instant) {
        *self.entry.lock() = Some(Entry { fingerprint, weights, computed_at });
    }

    pub fn get_or_compute(&self, fingerprint: Fingerprint, compute: impl FnOnce() -> EnsembleWeights) -> EnsembleWeights {
        if let Some(weights) = self.get(&fingerprint) {
            log::debug!("Poids en cache pour {}:{}", fingerprint.last_draw_id, fingerprint.len);
            return weights;
        }
        let weights = compute();
        self.put(fingerprint, weights);
        weights
    }

    pub fn clear(&self) {
        *self.entry.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(id: &str, len: usize) -> Fingerprint {
        Fingerprint { last_draw_id: id.to_string(), len }
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = WeightCache::new(Duration::from_secs(600));
        let w = EnsembleWeights::new(150, 400, 100, 350);
        cache.put(fp("2024100", 200), w);
        assert_eq!(cache.get(&fp("2024100", 200)), Some(w));
    }

    #[test]
    fn test_fingerprint_mismatch() {
        let cache = WeightCache::new(Duration::from_secs(600));
        cache.put(fp("2024100", 200), EnsembleWeights::default());
        assert_eq!(cache.get(&fp("2024101", 200)), None);
        assert_eq!(cache.get(&fp("2024100", 201)), None);
    }

    #[test]
    fn test_expired_after_ttl() {
        let cache = WeightCache::new(Duration::from_secs(600));
        let start = Instant::now();
        cache.put_at(fp("a", 100), EnsembleWeights::default(), start);
        assert!(cache.get_at(&fp("a", 100), start + Duration::from_secs(599)).is_some());
        assert!(cache.get_at(&fp("a", 100), start + Duration::from_secs(600)).is_none());
    }

    #[test]
    fn test_get_or_compute_computes_once() {
        let cache = WeightCache::new(Duration::from_secs(600));
        let mut calls = 0;
        let w1 = cache.get_or_compute(fp("x", 90), || {
            calls += 1;
            EnsembleWeights::new(350, 200, 100, 350)
        });
        let w2 = cache.get_or_compute(fp("x", 90), || {
            calls += 1;
            EnsembleWeights::default()
        });
        assert_eq!(w1, w2);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_single_entry_last_writer_wins() {
        let cache = WeightCache::new(Duration::from_secs(600));
        cache.put(fp("a", 1), EnsembleWeights::default());
        cache.put(fp("b", 2), EnsembleWeights::new(150, 200, 300, 350));
        assert!(cache.get(&fp("a", 1)).is_none());
        assert!(cache.get(&fp("b", 2)).is_some());

        cache.clear();
        assert!(cache.get(&fp("b", 2)).is_none());
    }
}
