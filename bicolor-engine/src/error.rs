use serde::Serialize;

/// Issues métier rendues dans les rapports plutôt que propagées comme pannes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineError {
    #[error("historique insuffisant : {required} tirages requis, {available} disponibles")]
    InsufficientData { required: usize, available: usize },

    #[error("aucune grille ne satisfait les contraintes après {max_try} essais (relâcher somme/écart/zones/parité/fixes/exclus ou augmenter max_try)")]
    NoCandidate { max_try: u32 },
}
