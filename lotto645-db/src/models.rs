use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub const MIN_NUMBER: u8 = 1;
pub const MAX_NUMBER: u8 = 45;
pub const POOL_SIZE: usize = 45;
pub const PICK_COUNT: usize = 6;

/// Tirage finalisé : six numéros principaux (ordre croissant par convention) + complémentaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draw {
    pub draw_no: u32,
    pub date: String,
    pub numbers: [u8; 6],
    pub bonus: u8,
    pub first_prize: i64,
    pub first_winners: u32,
}

impl Draw {
    pub fn contains(&self, number: u8) -> bool {
        self.numbers.contains(&number)
    }

    /// Num1 : le plus petit numéro d'un tirage trié.
    pub fn first(&self) -> u8 {
        self.numbers[0]
    }

    /// Num6 : le plus grand numéro d'un tirage trié.
    pub fn last(&self) -> u8 {
        self.numbers[PICK_COUNT - 1]
    }

    /// Masque de présence indexé par numéro (index 0 inutilisé).
    pub fn presence(&self) -> [bool; POOL_SIZE + 1] {
        let mut mask = [false; POOL_SIZE + 1];
        for &n in &self.numbers {
            mask[n as usize] = true;
        }
        mask
    }
}

pub fn validate_draw(numbers: &[u8; 6], bonus: u8) -> Result<(), StoreError> {
    for &n in numbers {
        if !(MIN_NUMBER..=MAX_NUMBER).contains(&n) {
            return Err(StoreError::InvalidDraw(format!("Numéro {} hors limites (1-45)", n)));
        }
    }
    if !(MIN_NUMBER..=MAX_NUMBER).contains(&bonus) {
        return Err(StoreError::InvalidDraw(format!("Complémentaire {} hors limites (1-45)", bonus)));
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                return Err(StoreError::InvalidDraw(format!("Numéro en double : {}", numbers[i])));
            }
        }
    }
    if numbers.contains(&bonus) {
        return Err(StoreError::InvalidDraw(format!(
            "Le complémentaire {} figure déjà parmi les numéros",
            bonus
        )));
    }
    Ok(())
}

/// Tables de statistiques incrémentales (une ligne par couple tirage × numéro).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatTable {
    Posterior,
    Analysis,
}

impl StatTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            StatTable::Posterior => "posterior_stats",
            StatTable::Analysis => "analysis_stats",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberStat {
    pub number: u8,
    pub total_count: u32,
    pub bonus_count: u32,
    pub last_draw_no: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReappearStat {
    pub number: u8,
    pub total_appear: u32,
    pub reappear_count: u32,
    pub probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PosteriorRow {
    pub draw_no: u32,
    pub number: u8,
    pub total_count: u32,
    pub total_draws: u32,
    pub prior: f64,
    pub posterior: f64,
    pub appeared: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRow {
    pub draw_no: u32,
    pub number: u8,
    pub total_count: u32,
    pub total_prob: f64,
    pub bonus_count: u32,
    pub bonus_prob: f64,
    pub first_count: u32,
    pub first_prob: f64,
    pub last_count: u32,
    pub last_prob: f64,
    pub reappear_total: u32,
    pub reappear_count: u32,
    pub reappear_prob: f64,
    pub bayesian_prior: f64,
    pub bayesian_post: f64,
    pub appeared: bool,
}

/// Colonnes de probabilité de `analysis_stats` qui dérivent d'un compteur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbField {
    Total,
    Bonus,
    First,
    Last,
}

impl ProbField {
    pub const ALL: [ProbField; 4] = [ProbField::Total, ProbField::Bonus, ProbField::First, ProbField::Last];

    pub fn prob_column(&self) -> &'static str {
        match self {
            ProbField::Total => "total_prob",
            ProbField::Bonus => "bonus_prob",
            ProbField::First => "first_prob",
            ProbField::Last => "last_prob",
        }
    }

    pub fn count_column(&self) -> &'static str {
        match self {
            ProbField::Total => "total_count",
            ProbField::Bonus => "bonus_count",
            ProbField::First => "first_count",
            ProbField::Last => "last_count",
        }
    }

    pub fn count_of(&self, row: &AnalysisRow) -> u32 {
        match self {
            ProbField::Total => row.total_count,
            ProbField::Bonus => row.bonus_count,
            ProbField::First => row.first_count,
            ProbField::Last => row.last_count,
        }
    }

    pub fn prob_of(&self, row: &AnalysisRow) -> f64 {
        match self {
            ProbField::Total => row.total_prob,
            ProbField::Bonus => row.bonus_prob,
            ProbField::First => row.first_prob,
            ProbField::Last => row.last_prob,
        }
    }

    pub fn set_prob(&self, row: &mut AnalysisRow, value: f64) {
        match self {
            ProbField::Total => row.total_prob = value,
            ProbField::Bonus => row.bonus_prob = value,
            ProbField::First => row.first_prob = value,
            ProbField::Last => row.last_prob = value,
        }
    }
}

impl std::fmt::Display for ProbField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prob_column())
    }
}

/// Tirages synthétiques valides, draw_no = 1..=n en ordre croissant.
pub fn make_test_draws(n: usize) -> Vec<Draw> {
    (0..n)
        .map(|i| {
            let base = ((i * 5) % 37) as u8;
            Draw {
                draw_no: (i + 1) as u32,
                date: format!("2024-{:02}-{:02}", (i / 28) % 12 + 1, (i % 28) + 1),
                numbers: [base + 1, base + 2, base + 4, base + 5, base + 6, base + 8],
                bonus: base + 3,
                first_prize: 1_000_000_000,
                first_winners: (i % 12) as u32,
            }
        })
        .collect()
}
