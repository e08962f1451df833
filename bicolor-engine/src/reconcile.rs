use anyhow::Result;
use serde::Serialize;

use bicolor_db::history::HistoryProvider;
use bicolor_db::models::{format_reds, parse_numbers, Draw, PredictionOutcome, PredictionRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub scanned: usize,
    pub updated: usize,
    pub not_found: usize,
}

fn round6(v: f64) -> f64 {
    (v * 1_000_000.0).round() / 1_000_000.0
}

/// Compare une prédiction enregistrée au tirage réel.
pub fn evaluate(record: &PredictionRecord, actual: &Draw) -> PredictionOutcome {
    let predicted = parse_numbers(&record.predict_reds);
    let red_hit = predicted.iter().filter(|r| actual.reds.contains(r)).count() as u8;
    let blue_hit = record.predict_blue == actual.blue;
    let hit_rate = round6((red_hit as f64 + if blue_hit { 1.0 } else { 0.0 }) / 7.0);

    PredictionOutcome {
        actual_reds: format_reds(&actual.reds),
        actual_blue: actual.blue,
        red_hit,
        blue_hit,
        hit_rate,
        error_rate: round6(1.0 - hit_rate),
    }
}

/// Rapproche les prédictions non résolues dont le tirage est connu.
/// `apply` persiste le résultat et renvoie `true` si l'enregistrement a changé.
pub fn reconcile(
    unresolved: &[PredictionRecord],
    history: &dyn HistoryProvider,
    mut apply: impl FnMut(&PredictionRecord, &PredictionOutcome) -> Result<bool>,
) -> Result<ReconcileSummary> {
    let mut summary = ReconcileSummary::default();
    for record in unresolved {
        summary.scanned += 1;
        let Some(actual) = history.find_by_key(&record.draw_id)? else {
            summary.not_found += 1;
            continue;
        };
        let outcome = evaluate(record, &actual);
        if apply(record, &outcome)? {
            summary.updated += 1;
        }
    }
    log::info!(
        "Rapprochement : {} lus, {} mis à jour, {} tirages introuvables",
        summary.scanned,
        summary.updated,
        summary.not_found
    );
    Ok(summary)
}
