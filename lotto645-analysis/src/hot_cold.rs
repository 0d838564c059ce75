use lotto645_db::models::{Draw, MAX_NUMBER, PICK_COUNT, POOL_SIZE};
use serde::Serialize;

use crate::config::AnalysisConfig;

const TOP_LIST: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HotColdStatus {
    Hot,
    Cold,
    Neutral,
}

impl std::fmt::Display for HotColdStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            HotColdStatus::Hot => "HOT",
            HotColdStatus::Cold => "COLD",
            HotColdStatus::Neutral => "NEUTRAL",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HotColdNumber {
    pub number: u8,
    pub prior: f64,
    /// Fréquence observée k/n sur la fenêtre.
    pub likelihood: f64,
    /// Postérieur Beta normalisé sur les 45 numéros.
    pub posterior: f64,
    pub recent_count: u32,
    pub expected_count: f64,
    pub deviation: f64,
    pub status: HotColdStatus,
    pub last_appear_draw_no: u32,
    pub gap_since_last: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct HotColdStats {
    /// Trié par postérieur décroissant.
    pub numbers: Vec<HotColdNumber>,
    pub hot: Vec<HotColdNumber>,
    pub cold: Vec<HotColdNumber>,
    pub window: usize,
    pub total_draws: usize,
    pub latest_draw_no: u32,
}

pub fn classify(deviation: f64, expected: f64, threshold: f64) -> HotColdStatus {
    if expected <= 0.0 {
        return HotColdStatus::Neutral;
    }
    let relative = deviation / expected;
    if relative > threshold {
        HotColdStatus::Hot
    } else if relative < -threshold {
        HotColdStatus::Cold
    } else {
        HotColdStatus::Neutral
    }
}

/// Classement HOT/COLD sur les `window` derniers tirages.
///
/// Une fenêtre nulle ou plus grande que l'historique est remplacée par la
/// fenêtre par défaut de la configuration, bornée à la taille de l'historique.
pub fn hot_cold_stats(draws: &[Draw], window: usize, config: &AnalysisConfig) -> Option<HotColdStats> {
    if draws.is_empty() {
        return None;
    }

    let total_draws = draws.len();
    let requested = if window == 0 || window > total_draws {
        config.hot_cold_window
    } else {
        window
    };
    let window = requested.clamp(1, total_draws);

    let mut newest_first: Vec<&Draw> = draws.iter().collect();
    newest_first.sort_by(|a, b| b.draw_no.cmp(&a.draw_no));
    let latest_draw_no = newest_first[0].draw_no;

    let mut recent_counts = [0u32; POOL_SIZE + 1];
    for draw in &newest_first[..window] {
        for &n in &draw.numbers {
            recent_counts[n as usize] += 1;
        }
    }

    let mut last_appear = [0u32; POOL_SIZE + 1];
    for draw in &newest_first {
        for &n in &draw.numbers {
            last_appear[n as usize] = last_appear[n as usize].max(draw.draw_no);
        }
    }

    let trials = (window * PICK_COUNT) as f64;
    let expected = trials / POOL_SIZE as f64;
    let raw: Vec<f64> = (1..=POOL_SIZE)
        .map(|n| (config.alpha + recent_counts[n] as f64) / (config.alpha + config.beta + trials))
        .collect();
    let norm: f64 = raw.iter().sum();

    let mut numbers: Vec<HotColdNumber> = (1..=MAX_NUMBER)
        .map(|number| {
            let idx = number as usize;
            let k = recent_counts[idx] as f64;
            let deviation = k - expected;
            HotColdNumber {
                number,
                prior: 1.0 / POOL_SIZE as f64,
                likelihood: k / trials,
                posterior: raw[idx - 1] / norm,
                recent_count: recent_counts[idx],
                expected_count: expected,
                deviation,
                status: classify(deviation, expected, config.hot_cold_threshold),
                last_appear_draw_no: last_appear[idx],
                gap_since_last: latest_draw_no - last_appear[idx],
            }
        })
        .collect();

    numbers.sort_by(|a, b| b.posterior.total_cmp(&a.posterior).then(a.number.cmp(&b.number)));

    let top = TOP_LIST.min(numbers.len());
    let hot = numbers[..top].to_vec();
    let cold = numbers.iter().rev().take(top).cloned().collect();

    Some(HotColdStats {
        numbers,
        hot,
        cold,
        window,
        total_draws,
        latest_draw_no,
    })
}
