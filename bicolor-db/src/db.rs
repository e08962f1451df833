use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;

use crate::models::{format_reds, parse_numbers, Draw, Pick, PredictionOutcome, PredictionRecord};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    draw_id     TEXT PRIMARY KEY,
    draw_date   TEXT,
    red_1       INTEGER NOT NULL,
    red_2       INTEGER NOT NULL,
    red_3       INTEGER NOT NULL,
    red_4       INTEGER NOT NULL,
    red_5       INTEGER NOT NULL,
    red_6       INTEGER NOT NULL,
    blue        INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_draws_date ON draws(draw_date);

CREATE TABLE IF NOT EXISTS prediction_records (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    draw_id       TEXT NOT NULL,
    predict_reds  TEXT NOT NULL,
    predict_blue  INTEGER NOT NULL,
    actual_reds   TEXT,
    actual_blue   INTEGER,
    red_hit       INTEGER,
    blue_hit      INTEGER,
    hit_rate      REAL,
    error_rate    REAL,
    created_at    TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at    TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (draw_id, predict_reds, predict_blue)
);
";

const DRAW_COLUMNS: &str = "draw_id, draw_date, red_1, red_2, red_3, red_4, red_5, red_6, blue";

const PREDICTION_COLUMNS: &str =
    "id, draw_id, predict_reds, predict_blue, actual_reds, actual_blue, red_hit, blue_hit, hit_rate, error_rate, created_at";

pub const MAX_PAGE_SIZE: u32 = 200;
pub const MAX_UNRESOLVED: u32 = 5000;

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("bicolor.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    log::debug!("Base ouverte : {:?}", path);
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

fn row_to_draw(row: &Row<'_>) -> rusqlite::Result<Draw> {
    Ok(Draw {
        draw_id: row.get(0)?,
        date: row.get(1)?,
        reds: [
            row.get::<_, u8>(2)?,
            row.get::<_, u8>(3)?,
            row.get::<_, u8>(4)?,
            row.get::<_, u8>(5)?,
            row.get::<_, u8>(6)?,
            row.get::<_, u8>(7)?,
        ],
        blue: row.get(8)?,
    })
}

pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let changed = conn.execute(
        &format!("INSERT OR IGNORE INTO draws ({DRAW_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
        params![
            draw.draw_id,
            draw.date,
            draw.reds[0],
            draw.reds[1],
            draw.reds[2],
            draw.reds[3],
            draw.reds[4],
            draw.reds[5],
            draw.blue,
        ],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

/// Les `limit` tirages les plus récents, du plus récent au plus ancien.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DRAW_COLUMNS} FROM draws ORDER BY draw_id DESC LIMIT ?1"
    ))?;
    let draws = stmt
        .query_map([limit], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn find_draw(conn: &Connection, draw_id: &str) -> Result<Option<Draw>> {
    let draw = conn
        .query_row(
            &format!("SELECT {DRAW_COLUMNS} FROM draws WHERE draw_id = ?1"),
            [draw_id],
            row_to_draw,
        )
        .optional()
        .with_context(|| format!("Échec de la lecture du tirage {}", draw_id))?;
    Ok(draw)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

/// Filtres de recherche des tirages. Les champs absents ne filtrent pas.
#[derive(Debug, Clone, Default)]
pub struct DrawFilter {
    pub from_id: Option<String>,
    pub to_id: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub include_red: Option<u8>,
    pub include_blue: Option<u8>,
    /// Numéro de page, à partir de 0.
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub total: u64,
    pub page: u32,
    pub size: u32,
    pub rows: Vec<T>,
}

pub fn search_draws(conn: &Connection, filter: &DrawFilter) -> Result<Page<Draw>> {
    let size = filter.size.clamp(1, MAX_PAGE_SIZE);
    let offset = filter.page as i64 * size as i64;

    let mut clause = String::from(" FROM draws WHERE 1=1");
    let mut args: Vec<Value> = Vec::new();

    if let Some(from) = filter.from_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        clause.push_str(" AND draw_id >= ?");
        args.push(Value::Text(from.to_string()));
    }
    if let Some(to) = filter.to_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        clause.push_str(" AND draw_id <= ?");
        args.push(Value::Text(to.to_string()));
    }
    if let Some(from) = filter.from_date {
        clause.push_str(" AND draw_date >= ?");
        args.push(Value::Text(from.format("%Y-%m-%d").to_string()));
    }
    if let Some(to) = filter.to_date {
        clause.push_str(" AND draw_date <= ?");
        args.push(Value::Text(to.format("%Y-%m-%d").to_string()));
    }
    if let Some(red) = filter.include_red {
        clause.push_str(" AND ? IN (red_1, red_2, red_3, red_4, red_5, red_6)");
        args.push(Value::Integer(red as i64));
    }
    if let Some(blue) = filter.include_blue {
        clause.push_str(" AND blue = ?");
        args.push(Value::Integer(blue as i64));
    }

    let total: u64 = conn
        .query_row(&format!("SELECT COUNT(*){clause}"), params_from_iter(args.iter()), |row| row.get(0))
        .context("Échec du comptage")?;

    let mut page_args = args;
    page_args.push(Value::Integer(size as i64));
    page_args.push(Value::Integer(offset));

    let mut stmt = conn.prepare(&format!(
        "SELECT {DRAW_COLUMNS}{clause} ORDER BY draw_id DESC LIMIT ? OFFSET ?"
    ))?;
    let rows = stmt
        .query_map(params_from_iter(page_args.iter()), row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page { total, page: filter.page, size, rows })
}

fn row_to_prediction(row: &Row<'_>) -> rusqlite::Result<PredictionRecord> {
    Ok(PredictionRecord {
        id: row.get(0)?,
        draw_id: row.get(1)?,
        predict_reds: row.get(2)?,
        predict_blue: row.get(3)?,
        actual_reds: row.get(4)?,
        actual_blue: row.get(5)?,
        red_hit: row.get(6)?,
        blue_hit: row.get(7)?,
        hit_rate: row.get(8)?,
        error_rate: row.get(9)?,
        created_at: row.get(10)?,
    })
}

/// Enregistre une grille pour un tirage. `false` si la même grille existe déjà.
pub fn insert_prediction(conn: &Connection, draw_id: &str, pick: &Pick) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO prediction_records (draw_id, predict_reds, predict_blue) VALUES (?1, ?2, ?3)",
        params![draw_id.trim(), format_reds(&pick.reds), pick.blue],
    ).context("Échec de l'enregistrement de la prédiction")?;
    Ok(changed > 0)
}

pub fn list_unresolved(conn: &Connection, limit: u32) -> Result<Vec<PredictionRecord>> {
    let limit = limit.clamp(1, MAX_UNRESOLVED);
    let mut stmt = conn.prepare(&format!(
        "SELECT {PREDICTION_COLUMNS} FROM prediction_records
         WHERE actual_reds IS NULL OR actual_blue IS NULL
         ORDER BY draw_id ASC, id ASC LIMIT ?1"
    ))?;
    let records = stmt
        .query_map([limit], row_to_prediction)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

pub fn update_prediction_result(conn: &Connection, id: i64, outcome: &PredictionOutcome) -> Result<bool> {
    let actual_reds = format_reds(&parse_numbers(&outcome.actual_reds));
    let changed = conn.execute(
        "UPDATE prediction_records
         SET actual_reds = ?1, actual_blue = ?2, red_hit = ?3, blue_hit = ?4,
             hit_rate = ?5, error_rate = ?6, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?7",
        params![
            actual_reds,
            outcome.actual_blue,
            outcome.red_hit,
            outcome.blue_hit,
            outcome.hit_rate,
            outcome.error_rate,
            id,
        ],
    ).with_context(|| format!("Échec de la mise à jour de la prédiction {}", id))?;
    Ok(changed > 0)
}

pub fn search_predictions(conn: &Connection, draw_id: Option<&str>, page: u32, size: u32) -> Result<Page<PredictionRecord>> {
    let size = size.clamp(1, MAX_PAGE_SIZE);
    let offset = page as i64 * size as i64;

    let mut clause = String::from(" FROM prediction_records WHERE 1=1");
    let mut args: Vec<Value> = Vec::new();
    if let Some(id) = draw_id.map(str::trim).filter(|s| !s.is_empty()) {
        clause.push_str(" AND draw_id = ?");
        args.push(Value::Text(id.to_string()));
    }

    let total: u64 = conn
        .query_row(&format!("SELECT COUNT(*){clause}"), params_from_iter(args.iter()), |row| row.get(0))
        .context("Échec du comptage")?;

    let mut page_args = args;
    page_args.push(Value::Integer(size as i64));
    page_args.push(Value::Integer(offset));

    let mut stmt = conn.prepare(&format!(
        "SELECT {PREDICTION_COLUMNS}{clause} ORDER BY draw_id DESC, id DESC LIMIT ? OFFSET ?"
    ))?;
    let rows = stmt
        .query_map(params_from_iter(page_args.iter()), row_to_prediction)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page { total, page, size, rows })
}
