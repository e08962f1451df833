use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    FrequencyTop,
    OmissionTop,
    Hybrid,
    WeightedRandom,
    ZoneBalanced,
    Markov,
    Bayes,
    /// Mélange pondéré calibré, exposé sous le nom `ml`.
    #[serde(rename = "ml", alias = "ensemble", alias = "ensemble_tuned")]
    Ensemble,
}

impl Strategy {
    pub const ALL: [Strategy; 8] = [
        Strategy::FrequencyTop,
        Strategy::OmissionTop,
        Strategy::Hybrid,
        Strategy::WeightedRandom,
        Strategy::ZoneBalanced,
        Strategy::Markov,
        Strategy::Bayes,
        Strategy::Ensemble,
    ];

    /// Résolution insensible à la casse ; nom inconnu -> `FrequencyTop`.
    pub fn resolve(raw: &str) -> ResolvedStrategy {
        let name = raw.trim();
        let strategy = match name.to_ascii_lowercase().as_str() {
            "omission_top" => Strategy::OmissionTop,
            "hybrid" => Strategy::Hybrid,
            "weighted_random" => Strategy::WeightedRandom,
            "zone_balanced" => Strategy::ZoneBalanced,
            "markov" => Strategy::Markov,
            "bayes" => Strategy::Bayes,
            "ml" | "ensemble" | "ensemble_tuned" => Strategy::Ensemble,
            _ => Strategy::FrequencyTop,
        };
        let alias = (strategy == Strategy::Ensemble).then(|| name.to_string());
        ResolvedStrategy { strategy, alias }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::FrequencyTop => "frequency_top",
            Strategy::OmissionTop => "omission_top",
            Strategy::Hybrid => "hybrid",
            Strategy::WeightedRandom => "weighted_random",
            Strategy::ZoneBalanced => "zone_balanced",
            Strategy::Markov => "markov",
            Strategy::Bayes => "bayes",
            Strategy::Ensemble => "ml",
        }
    }

    pub fn is_ml_family(&self) -> bool {
        *self == Strategy::Ensemble
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Stratégie résolue, avec le nom saisi pour la famille `ml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedStrategy {
    pub strategy: Strategy,
    pub alias: Option<String>,
}
