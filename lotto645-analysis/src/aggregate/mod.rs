//! Statistiques agrégées recalculées par relecture complète de l'historique.
//!
//! Chaque calculateur prend les tirages en ordre croissant et renvoie `None`
//! quand l'historique est vide.

pub mod combination;
pub mod frequency;
pub mod pattern;

pub use combination::{
    consecutive_stats, pair_stats, ConsecutiveCountStat, ConsecutiveExample, ConsecutiveStats,
    PairStat, PairStats,
};
pub use frequency::{number_stats, position_stats, reappear_stats, PositionStat, PositionStats};
pub use pattern::{
    color_stats, grid_stats, ratio_stats, ColorPatternStat, ColorStats, GridStats, LineDistStat,
    LineStat, RatioStat, RatioStats,
};

use lotto645_db::models::Draw;
use std::collections::HashMap;

fn latest_draw_no(draws: &[Draw]) -> u32 {
    draws.iter().map(|d| d.draw_no).max().unwrap_or(0)
}

/// Trie des comptages par effectif décroissant, clé croissante en cas d'égalité.
fn ranked<K: Ord + Clone>(counts: &HashMap<K, u32>) -> Vec<(K, u32)> {
    let mut entries: Vec<(K, u32)> = counts.iter().map(|(k, &c)| (k.clone(), c)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}

fn ratio(count: u32, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}
