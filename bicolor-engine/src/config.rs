use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ensemble::EnsembleWeights;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Durée de vie des poids calibrés en cache.
    pub cache_ttl_secs: u64,
    /// En dessous, la calibration rend les poids par défaut.
    pub tuner_min_history: usize,
    /// Nombre de points d'évaluation par combinaison de la grille.
    pub tuner_test_count: usize,
    pub default_weights: EnsembleWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 600,
            tuner_min_history: 80,
            tuner_test_count: 20,
            default_weights: EnsembleWeights::default(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire la configuration {:?}", path))?;
        let config: EngineConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Configuration invalide {:?}", path))?;
        log::debug!("Configuration chargée depuis {:?}: {:?}", path, config);
        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_ttl_minutes(&self) -> u64 {
        self.cache_ttl_secs / 60
    }
}
