use anyhow::{Context, Result, bail};
use bicolor_db::rusqlite::Connection;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;

use bicolor_db::db::insert_draw;
use bicolor_db::models::Draw;

/// `AAAA-MM-JJ`, `AAAA/MM/JJ` ou `JJ/MM/AAAA` ; vide -> pas de date.
pub fn parse_date(raw: &str) -> Result<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Ok(Some(date));
        }
    }
    bail!("Format de date invalide: '{}'", raw)
}

fn parse_record(record: &csv::StringRecord) -> Result<Draw> {
    let get = |idx: usize| -> Result<&str> {
        record
            .get(idx)
            .map(str::trim)
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let get_u8 = |idx: usize| -> Result<u8> {
        let s = get(idx)?;
        s.parse::<u8>()
            .with_context(|| format!("Impossible de parser '{}' (index {})", s, idx))
    };

    let draw_id = get(0)?;
    if draw_id.is_empty() {
        bail!("Identifiant de tirage vide");
    }
    let date = parse_date(get(1)?)?;
    let reds = [get_u8(2)?, get_u8(3)?, get_u8(4)?, get_u8(5)?, get_u8(6)?, get_u8(7)?];
    let blue = get_u8(8)?;

    Draw::new(draw_id, date, reds, blue)
}

/// Ligne d'en-tête : la première boule rouge n'est pas un nombre.
fn is_header(record: &csv::StringRecord) -> bool {
    record.get(2).is_some_and(|s| s.trim().parse::<u8>().is_err())
}

fn detect_delimiter(content: &str) -> u8 {
    let first = content.lines().next().unwrap_or_default();
    if first.contains(';') { b';' } else { b',' }
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

/// Import `draw_id;date;r1..r6;blue`, séparateur `;` ou `,`, en-tête facultatif.
/// Une seule transaction ; les lignes en erreur sont comptées et journalisées.
pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(&content))
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult::default();

    for (line, record_result) in reader.records().enumerate() {
        let record = match record_result {
            Ok(record) => record,
            Err(e) => {
                result.total_records += 1;
                log::warn!("Erreur lecture ligne {}: {}", line + 1, e);
                result.errors += 1;
                continue;
            }
        };
        if line == 0 && is_header(&record) {
            continue;
        }
        result.total_records += 1;
        match parse_record(&record) {
            Ok(draw) => match insert_draw(&tx, &draw) {
                Ok(true) => result.inserted += 1,
                Ok(false) => result.skipped += 1,
                Err(e) => {
                    log::warn!("Erreur insertion tirage {}: {}", draw.draw_id, e);
                    result.errors += 1;
                }
            },
            Err(e) => {
                log::warn!("Erreur parsing ligne {}: {:#}", line + 1, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    log::info!(
        "Import {:?} : {} insérés, {} doublons, {} erreurs",
        path,
        result.inserted,
        result.skipped,
        result.errors
    );
    Ok(result)
}
