use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use bicolor_db::models::{Pick, Pool};

use crate::models::bayes::zone_counts;

pub const DEFAULT_MAX_TRY: u32 = 120;
pub const MIN_MAX_TRY: u32 = 10;
pub const MAX_MAX_TRY: u32 = 500;

/// Répartition exacte des 6 rouges sur [1,11], [12,22], [23,33].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRatio(pub u8, pub u8, pub u8);

impl ZoneRatio {
    /// `a:b:c` (deux-points ASCII ou pleine chasse), somme 6. `None` si mal formé.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.trim().split([':', '：']).collect();
        if parts.len() != 3 {
            return None;
        }
        let a: u8 = parts[0].trim().parse().ok()?;
        let b: u8 = parts[1].trim().parse().ok()?;
        let c: u8 = parts[2].trim().parse().ok()?;
        if a as u32 + b as u32 + c as u32 != 6 {
            return None;
        }
        Some(Self(a, b, c))
    }
}

impl fmt::Display for ZoneRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.0, self.1, self.2)
    }
}

/// Liste de numéros séparés par virgules (ASCII ou pleine chasse) ou espaces.
/// Jetons non numériques ou hors de la pool ignorés ; vide si rien ne reste.
pub fn parse_num_set(s: &str, pool: Pool) -> BTreeSet<u8> {
    s.split(|c: char| c == ',' || c == '，' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .filter_map(|t| t.parse::<u8>().ok())
        .filter(|&n| pool.contains(n))
        .collect()
}

pub fn clamp_max_try(max_try: u32) -> u32 {
    max_try.clamp(MIN_MAX_TRY, MAX_MAX_TRY)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictOptions {
    pub min_sum: Option<u32>,
    pub max_sum: Option<u32>,
    pub min_span: Option<u32>,
    pub max_span: Option<u32>,
    pub min_odd: Option<u32>,
    pub max_odd: Option<u32>,
    pub zone_ratio: Option<ZoneRatio>,
    pub dan_reds: BTreeSet<u8>,
    pub kill_reds: BTreeSet<u8>,
    pub dan_blues: BTreeSet<u8>,
    pub kill_blues: BTreeSet<u8>,
    pub max_try: u32,
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self {
            min_sum: None,
            max_sum: None,
            min_span: None,
            max_span: None,
            min_odd: None,
            max_odd: None,
            zone_ratio: None,
            dan_reds: BTreeSet::new(),
            kill_reds: BTreeSet::new(),
            dan_blues: BTreeSet::new(),
            kill_blues: BTreeSet::new(),
            max_try: DEFAULT_MAX_TRY,
        }
    }
}

impl PredictOptions {
    pub fn with_max_try(mut self, max_try: u32) -> Self {
        self.max_try = clamp_max_try(max_try);
        self
    }

    /// Vrai si au moins un champ restreint les grilles acceptées.
    pub fn has_constraints(&self) -> bool {
        self.min_sum.is_some()
            || self.max_sum.is_some()
            || self.min_span.is_some()
            || self.max_span.is_some()
            || self.min_odd.is_some()
            || self.max_odd.is_some()
            || self.zone_ratio.is_some()
            || !self.dan_reds.is_empty()
            || !self.kill_reds.is_empty()
            || !self.dan_blues.is_empty()
            || !self.kill_blues.is_empty()
    }

    pub fn accept(&self, pick: &Pick) -> bool {
        let reds = &pick.reds;
        let distinct: BTreeSet<u8> = reds.iter().copied().collect();
        if distinct.len() != 6 {
            return false;
        }

        if reds.iter().any(|r| self.kill_reds.contains(r)) {
            return false;
        }
        if self.kill_blues.contains(&pick.blue) {
            return false;
        }

        if !self.dan_reds.is_subset(&distinct) {
            return false;
        }
        if !self.dan_blues.is_empty() && !self.dan_blues.contains(&pick.blue) {
            return false;
        }

        let sum: u32 = reds.iter().map(|&r| r as u32).sum();
        let span = match (distinct.first(), distinct.last()) {
            (Some(&lo), Some(&hi)) => (hi - lo) as u32,
            _ => 0,
        };
        let odd = reds.iter().filter(|&&r| r % 2 == 1).count() as u32;

        if !within(sum, self.min_sum, self.max_sum)
            || !within(span, self.min_span, self.max_span)
            || !within(odd, self.min_odd, self.max_odd)
        {
            return false;
        }

        if let Some(ZoneRatio(a, b, c)) = self.zone_ratio {
            if zone_counts(reds) != (a as u32, b as u32, c as u32) {
                return false;
            }
        }
        true
    }
}

fn within(value: u32, min: Option<u32>, max: Option<u32>) -> bool {
    min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pick(reds: [u8; 6], blue: u8) -> Pick {
        Pick::new(reds, blue)
    }

    #[test]
    fn test_unconstrained_accepts_valid() {
        let opt = PredictOptions::default();
        assert!(!opt.has_constraints());
        assert!(opt.accept(&pick([1, 2, 3, 4, 5, 6], 1)));
        assert!(!opt.accept(&Pick { reds: [1, 1, 3, 4, 5, 6], blue: 1 }));
    }

    #[test]
    fn test_kill_and_dan() {
        let opt = PredictOptions {
            kill_reds: [5].into(),
            dan_reds: [1, 33].into(),
            dan_blues: [7, 8].into(),
            ..Default::default()
        };
        assert!(opt.has_constraints());
        assert!(opt.accept(&pick([1, 2, 3, 4, 6, 33], 7)));
        assert!(!opt.accept(&pick([1, 2, 3, 4, 5, 33], 7)));
        assert!(!opt.accept(&pick([1, 2, 3, 4, 6, 32], 7)));
        assert!(!opt.accept(&pick([1, 2, 3, 4, 6, 33], 9)));

        let kill_blue = PredictOptions { kill_blues: [9].into(), ..Default::default() };
        assert!(!kill_blue.accept(&pick([1, 2, 3, 4, 6, 33], 9)));
    }

    #[test]
    fn test_sum_span_odd_bounds() {
        let p = pick([1, 2, 3, 4, 5, 6], 1); // somme 21, écart 5, 3 impairs
        let opt = PredictOptions { min_sum: Some(21), max_sum: Some(21), ..Default::default() };
        assert!(opt.accept(&p));
        let opt = PredictOptions { min_sum: Some(22), ..Default::default() };
        assert!(!opt.accept(&p));
        let opt = PredictOptions { max_span: Some(4), ..Default::default() };
        assert!(!opt.accept(&p));
        let opt = PredictOptions { min_odd: Some(2), max_odd: Some(3), ..Default::default() };
        assert!(opt.accept(&p));
        let opt = PredictOptions { max_odd: Some(2), ..Default::default() };
        assert!(!opt.accept(&p));
    }

    #[test]
    fn test_zone_ratio_exact() {
        let opt = PredictOptions { zone_ratio: Some(ZoneRatio(2, 2, 2)), ..Default::default() };
        assert!(opt.accept(&pick([1, 11, 12, 22, 23, 33], 1)));
        assert!(!opt.accept(&pick([1, 2, 3, 22, 23, 33], 1)));
    }

    #[test]
    fn test_constraints_are_independent() {
        let p = pick([3, 8, 14, 19, 27, 31], 6);
        let sum_only = PredictOptions { min_sum: Some(100), max_sum: Some(105), ..Default::default() };
        let zone_only = PredictOptions { zone_ratio: Some(ZoneRatio(2, 2, 2)), ..Default::default() };
        let both = PredictOptions {
            min_sum: Some(100),
            max_sum: Some(105),
            zone_ratio: Some(ZoneRatio(2, 2, 2)),
            ..Default::default()
        };
        assert_eq!(both.accept(&p), sum_only.accept(&p) && zone_only.accept(&p));
        let far = PredictOptions { min_sum: Some(150), ..both.clone() };
        assert!(!far.accept(&p));
        assert!(zone_only.accept(&p));
    }

    #[test]
    fn test_parse_zone_ratio() {
        assert_eq!(ZoneRatio::parse("2:2:2"), Some(ZoneRatio(2, 2, 2)));
        assert_eq!(ZoneRatio::parse(" 3：2：1 "), Some(ZoneRatio(3, 2, 1)));
        assert_eq!(ZoneRatio::parse("6:0:0"), Some(ZoneRatio(6, 0, 0)));
        assert_eq!(ZoneRatio::parse("2:2:3"), None);
        assert_eq!(ZoneRatio::parse("2:2"), None);
        assert_eq!(ZoneRatio::parse("a:b:c"), None);
        assert_eq!(ZoneRatio::parse(""), None);
        assert_eq!(ZoneRatio(1, 2, 3).to_string(), "1:2:3");
    }

    #[test]
    fn test_parse_num_set() {
        let set = parse_num_set("1, 5，33 40 x 0", Pool::Red);
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 5, 33]);
        assert!(parse_num_set("17 99", Pool::Blue).is_empty());
        assert!(parse_num_set("", Pool::Blue).is_empty());
    }

    #[test]
    fn test_max_try_clamp() {
        assert_eq!(PredictOptions::default().max_try, 120);
        assert_eq!(PredictOptions::default().with_max_try(3).max_try, 10);
        assert_eq!(PredictOptions::default().with_max_try(9999).max_try, 500);
        assert_eq!(clamp_max_try(260), 260);
    }
}
