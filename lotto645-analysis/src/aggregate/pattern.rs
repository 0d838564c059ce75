use lotto645_db::models::{Draw, PICK_COUNT};
use serde::Serialize;
use std::collections::HashMap;

use super::{latest_draw_no, ranked, ratio};

/// Les numéros 23 à 45 sont « hauts », 1 à 22 « bas ».
const HIGH_THRESHOLD: u8 = 23;
const GRID_WIDTH: u8 = 7;
/// Bandes de couleur des boules, dans l'ordre d'affichage.
pub const COLOR_BANDS: [char; 5] = ['Y', 'B', 'R', 'G', 'E'];

#[derive(Debug, Clone, Serialize)]
pub struct RatioStat {
    pub ratio: String,
    pub count: u32,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatioStats {
    /// Clés « impairs:pairs », de "6:0" à "0:6".
    pub odd_even: Vec<RatioStat>,
    /// Clés « hauts:bas », de "6:0" à "0:6".
    pub high_low: Vec<RatioStat>,
    pub total_draws: usize,
    pub latest_draw_no: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColorPatternStat {
    pub pattern: String,
    pub count: u32,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColorCount {
    pub band: char,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColorStats {
    pub top_patterns: Vec<ColorPatternStat>,
    pub color_counts: Vec<ColorCount>,
    pub total_draws: usize,
    pub latest_draw_no: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineStat {
    pub line: u8,
    pub count: u32,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineDistStat {
    pub distribution: String,
    pub count: u32,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridStats {
    pub rows: Vec<LineStat>,
    pub cols: Vec<LineStat>,
    pub top_row_patterns: Vec<LineDistStat>,
    pub top_col_patterns: Vec<LineDistStat>,
    pub total_draws: usize,
    pub latest_draw_no: u32,
}

pub fn color_of(number: u8) -> char {
    match number {
        1..=10 => 'Y',
        11..=20 => 'B',
        21..=30 => 'R',
        31..=40 => 'G',
        _ => 'E',
    }
}

/// Position (ligne, colonne) sur la grille 7×7 du bulletin, indices à partir de 1.
pub fn grid_position(number: u8) -> (u8, u8) {
    ((number - 1) / GRID_WIDTH + 1, (number - 1) % GRID_WIDTH + 1)
}

fn ratio_buckets(counts: &HashMap<usize, u32>, total: usize) -> Vec<RatioStat> {
    (0..=PICK_COUNT)
        .rev()
        .map(|left| {
            let count = counts.get(&left).copied().unwrap_or(0);
            RatioStat {
                ratio: format!("{}:{}", left, PICK_COUNT - left),
                count,
                probability: ratio(count, total),
            }
        })
        .collect()
}

pub fn ratio_stats(draws: &[Draw]) -> Option<RatioStats> {
    if draws.is_empty() {
        return None;
    }

    let mut odd_counts: HashMap<usize, u32> = HashMap::new();
    let mut high_counts: HashMap<usize, u32> = HashMap::new();
    for draw in draws {
        let odd = draw.numbers.iter().filter(|&&n| n % 2 == 1).count();
        let high = draw.numbers.iter().filter(|&&n| n >= HIGH_THRESHOLD).count();
        *odd_counts.entry(odd).or_insert(0) += 1;
        *high_counts.entry(high).or_insert(0) += 1;
    }

    let total = draws.len();
    Some(RatioStats {
        odd_even: ratio_buckets(&odd_counts, total),
        high_low: ratio_buckets(&high_counts, total),
        total_draws: total,
        latest_draw_no: latest_draw_no(draws),
    })
}

pub fn color_stats(draws: &[Draw], top_n: usize) -> Option<ColorStats> {
    if draws.is_empty() {
        return None;
    }

    let mut patterns: HashMap<String, u32> = HashMap::new();
    let mut band_counts: HashMap<char, u32> = HashMap::new();
    for draw in draws {
        let pattern: String = draw.numbers.iter().map(|&n| color_of(n)).collect();
        for band in pattern.chars() {
            *band_counts.entry(band).or_insert(0) += 1;
        }
        *patterns.entry(pattern).or_insert(0) += 1;
    }

    let total = draws.len();
    let top_patterns = ranked(&patterns)
        .into_iter()
        .take(top_n)
        .map(|(pattern, count)| ColorPatternStat {
            pattern,
            count,
            probability: ratio(count, total),
        })
        .collect();

    let color_counts = COLOR_BANDS
        .iter()
        .map(|&band| ColorCount {
            band,
            count: band_counts.get(&band).copied().unwrap_or(0),
        })
        .collect();

    Some(ColorStats {
        top_patterns,
        color_counts,
        total_draws: total,
        latest_draw_no: latest_draw_no(draws),
    })
}

fn distribution_key(dist: &[u32; 8]) -> String {
    dist[1..]
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(":")
}

pub fn grid_stats(draws: &[Draw], top_n: usize) -> Option<GridStats> {
    if draws.is_empty() {
        return None;
    }

    let mut row_counts = [0u32; 8];
    let mut col_counts = [0u32; 8];
    let mut row_patterns: HashMap<String, u32> = HashMap::new();
    let mut col_patterns: HashMap<String, u32> = HashMap::new();

    for draw in draws {
        let mut row_dist = [0u32; 8];
        let mut col_dist = [0u32; 8];
        for &n in &draw.numbers {
            let (row, col) = grid_position(n);
            row_counts[row as usize] += 1;
            col_counts[col as usize] += 1;
            row_dist[row as usize] += 1;
            col_dist[col as usize] += 1;
        }
        *row_patterns.entry(distribution_key(&row_dist)).or_insert(0) += 1;
        *col_patterns.entry(distribution_key(&col_dist)).or_insert(0) += 1;
    }

    let total = draws.len();
    let slots = total * PICK_COUNT;
    let lines = |counts: &[u32; 8]| {
        (1..=GRID_WIDTH)
            .map(|line| LineStat {
                line,
                count: counts[line as usize],
                probability: ratio(counts[line as usize], slots),
            })
            .collect::<Vec<_>>()
    };
    let top = |patterns: &HashMap<String, u32>| {
        ranked(patterns)
            .into_iter()
            .take(top_n)
            .map(|(distribution, count)| LineDistStat {
                distribution,
                count,
                probability: ratio(count, total),
            })
            .collect::<Vec<_>>()
    };

    Some(GridStats {
        rows: lines(&row_counts),
        cols: lines(&col_counts),
        top_row_patterns: top(&row_patterns),
        top_col_patterns: top(&col_patterns),
        total_draws: total,
        latest_draw_no: latest_draw_no(draws),
    })
}
