use anyhow::Result;
use rusqlite::Connection;

use crate::db;
use crate::models::Draw;

/// Source d'historique consommée par le moteur.
pub trait HistoryProvider {
    /// Les `n` tirages les plus récents, du plus récent au plus ancien.
    fn latest(&self, n: usize) -> Result<Vec<Draw>>;
    fn find_by_key(&self, draw_id: &str) -> Result<Option<Draw>>;
}

/// Historique en mémoire, trié par `draw_id` croissant.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    draws: Vec<Draw>,
}

impl MemoryHistory {
    pub fn new(mut draws: Vec<Draw>) -> Self {
        draws.sort_by(|a, b| a.draw_id.cmp(&b.draw_id));
        draws.dedup_by(|a, b| a.draw_id == b.draw_id);
        Self { draws }
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn draws(&self) -> &[Draw] {
        &self.draws
    }
}

impl HistoryProvider for MemoryHistory {
    fn latest(&self, n: usize) -> Result<Vec<Draw>> {
        Ok(self.draws.iter().rev().take(n).cloned().collect())
    }

    fn find_by_key(&self, draw_id: &str) -> Result<Option<Draw>> {
        Ok(self
            .draws
            .binary_search_by(|d| d.draw_id.as_str().cmp(draw_id))
            .ok()
            .map(|i| self.draws[i].clone()))
    }
}

pub struct SqliteHistory<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteHistory<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl HistoryProvider for SqliteHistory<'_> {
    fn latest(&self, n: usize) -> Result<Vec<Draw>> {
        db::fetch_last_draws(self.conn, n.min(u32::MAX as usize) as u32)
    }

    fn find_by_key(&self, draw_id: &str) -> Result<Option<Draw>> {
        db::find_draw(self.conn, draw_id)
    }
}
