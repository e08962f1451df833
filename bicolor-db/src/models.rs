use std::ops::RangeInclusive;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const RED_MAX: u8 = 33;
pub const BLUE_MAX: u8 = 16;
pub const RED_PICK: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub draw_id: String,
    pub date: Option<NaiveDate>,
    pub reds: [u8; 6],
    pub blue: u8,
}

impl Draw {
    pub fn new(draw_id: impl Into<String>, date: Option<NaiveDate>, reds: [u8; 6], blue: u8) -> Result<Self> {
        validate_draw(&reds, blue)?;
        Ok(Self {
            draw_id: draw_id.into(),
            date,
            reds,
            blue,
        })
    }

    pub fn sorted_reds(&self) -> [u8; 6] {
        let mut reds = self.reds;
        reds.sort();
        reds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pool {
    Red,
    Blue,
}

impl Pool {
    pub fn size(&self) -> usize {
        match self {
            Pool::Red => RED_MAX as usize,
            Pool::Blue => BLUE_MAX as usize,
        }
    }

    pub fn pick_count(&self) -> usize {
        match self {
            Pool::Red => RED_PICK,
            Pool::Blue => 1,
        }
    }

    pub fn range(&self) -> RangeInclusive<u8> {
        1..=self.size() as u8
    }

    pub fn contains(&self, number: u8) -> bool {
        self.range().contains(&number)
    }

    pub fn numbers_from<'a>(&self, draw: &'a Draw) -> &'a [u8] {
        match self {
            Pool::Red => &draw.reds,
            Pool::Blue => std::slice::from_ref(&draw.blue),
        }
    }
}

/// Une combinaison candidate. Les rouges sont toujours triées.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pick {
    pub reds: [u8; 6],
    pub blue: u8,
}

impl Pick {
    pub fn new(mut reds: [u8; 6], blue: u8) -> Self {
        reds.sort();
        Self { reds, blue }
    }

    /// Construit une grille depuis un tirage du sampler, `None` si le sampler n'a pas fourni 6 rouges.
    pub fn from_slice(reds: &[u8], blue: u8) -> Option<Self> {
        let reds: [u8; 6] = reds.try_into().ok()?;
        Some(Self::new(reds, blue))
    }

    pub fn red_hits(&self, draw: &Draw) -> usize {
        self.reds.iter().filter(|r| draw.reds.contains(r)).count()
    }

    pub fn blue_hit(&self, draw: &Draw) -> bool {
        self.blue == draw.blue
    }
}

impl std::fmt::Display for Pick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} + {:02}", format_reds(&self.reds), self.blue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberCount {
    pub number: u8,
    pub count: u32,
}

/// Prédiction enregistrée pour un tirage pas forcément encore publié.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub draw_id: String,
    pub predict_reds: String,
    pub predict_blue: u8,
    pub actual_reds: Option<String>,
    pub actual_blue: Option<u8>,
    pub red_hit: Option<u8>,
    pub blue_hit: Option<bool>,
    pub hit_rate: Option<f64>,
    pub error_rate: Option<f64>,
    pub created_at: String,
}

impl PredictionRecord {
    pub fn is_resolved(&self) -> bool {
        self.actual_reds.is_some() && self.actual_blue.is_some()
    }
}

/// Résultat du rapprochement d'une prédiction avec le tirage réel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutcome {
    pub actual_reds: String,
    pub actual_blue: u8,
    pub red_hit: u8,
    pub blue_hit: bool,
    pub hit_rate: f64,
    pub error_rate: f64,
}

pub fn validate_draw(reds: &[u8; 6], blue: u8) -> Result<()> {
    for &r in reds {
        if !Pool::Red.contains(r) {
            bail!("Rouge {} hors limites (1-{})", r, RED_MAX);
        }
    }
    if !Pool::Blue.contains(blue) {
        bail!("Bleu {} hors limites (1-{})", blue, BLUE_MAX);
    }
    for i in 0..reds.len() {
        for j in (i + 1)..reds.len() {
            if reds[i] == reds[j] {
                bail!("Rouge en double : {}", reds[i]);
            }
        }
    }
    Ok(())
}

/// Triées, sur deux chiffres, séparées par un espace : `03 08 12 19 27 33`.
pub fn format_reds(reds: &[u8]) -> String {
    let mut sorted = reds.to_vec();
    sorted.sort();
    sorted
        .iter()
        .map(|r| format!("{:02}", r))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Toutes les suites de chiffres de `s`, dans l'ordre. Le reste sert de séparateur.
pub fn parse_numbers(s: &str) -> Vec<u8> {
    s.split(|c: char| !c.is_ascii_digit())
        .filter(|t| !t.is_empty())
        .filter_map(|t| t.parse::<u8>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(reds: [u8; 6], blue: u8) -> Draw {
        Draw {
            draw_id: "2024001".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2),
            reds,
            blue,
        }
    }

    #[test]
    fn test_validate_draw_ok() {
        assert!(validate_draw(&[1, 2, 3, 4, 5, 6], 1).is_ok());
        assert!(validate_draw(&[33, 32, 31, 30, 29, 28], 16).is_ok());
    }

    #[test]
    fn test_validate_draw_red_out_of_range() {
        assert!(validate_draw(&[0, 2, 3, 4, 5, 6], 1).is_err());
        assert!(validate_draw(&[1, 2, 3, 4, 5, 34], 1).is_err());
    }

    #[test]
    fn test_validate_draw_blue_out_of_range() {
        assert!(validate_draw(&[1, 2, 3, 4, 5, 6], 0).is_err());
        assert!(validate_draw(&[1, 2, 3, 4, 5, 6], 17).is_err());
    }

    #[test]
    fn test_validate_draw_duplicate_reds() {
        assert!(validate_draw(&[1, 1, 3, 4, 5, 6], 1).is_err());
        assert!(Draw::new("x", None, [9, 2, 3, 4, 5, 9], 1).is_err());
    }

    #[test]
    fn test_pool_size_and_pick_count() {
        assert_eq!(Pool::Red.size(), 33);
        assert_eq!(Pool::Blue.size(), 16);
        assert_eq!(Pool::Red.pick_count(), 6);
        assert_eq!(Pool::Blue.pick_count(), 1);
        assert_eq!(Pool::Blue.range().count(), 16);
    }

    #[test]
    fn test_pool_numbers_from() {
        let d = draw([1, 2, 3, 4, 5, 6], 7);
        assert_eq!(Pool::Red.numbers_from(&d), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(Pool::Blue.numbers_from(&d), &[7]);
    }

    #[test]
    fn test_pick_sorted_and_hits() {
        let pick = Pick::new([30, 1, 12, 5, 22, 9], 4);
        assert_eq!(pick.reds, [1, 5, 9, 12, 22, 30]);

        let d = draw([1, 5, 7, 8, 22, 33], 4);
        assert_eq!(pick.red_hits(&d), 3);
        assert!(pick.blue_hit(&d));
        assert_eq!(pick.to_string(), "01 05 09 12 22 30 + 04");
    }

    #[test]
    fn test_pick_from_slice_requires_six() {
        assert!(Pick::from_slice(&[1, 2, 3, 4, 5], 1).is_none());
        assert_eq!(Pick::from_slice(&[6, 5, 4, 3, 2, 1], 1).map(|p| p.reds), Some([1, 2, 3, 4, 5, 6]));
    }

    #[test]
    fn test_format_and_parse_numbers() {
        assert_eq!(format_reds(&[27, 3, 12]), "03 12 27");
        assert_eq!(parse_numbers("3, 12，27 x 8"), vec![3, 12, 27, 8]);
        assert!(parse_numbers("  ").is_empty());
    }
}
