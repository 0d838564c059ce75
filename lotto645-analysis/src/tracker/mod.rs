//! Tables incrémentales : une ligne par couple (tirage, numéro), avancées
//! tirage par tirage depuis le dernier point de reprise.

pub mod posterior;
pub mod repair;
pub mod unified;

use lotto645_db::db;
use lotto645_db::models::{StatTable, PICK_COUNT, POOL_SIZE};
use lotto645_db::rusqlite::Connection;
use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

/// Position d'une table incrémentale par rapport au dernier tirage connu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Checkpoint {
    /// Table vide : reconstruction complète depuis le premier tirage.
    Uninitialized,
    /// Tirages `from..=to` à calculer à partir des lignes du point de reprise.
    Behind { from: u32, to: u32 },
    UpToDate,
}

impl Checkpoint {
    /// `None` quand la base ne contient aucun tirage.
    pub fn evaluate(checkpoint: u32, latest_draw_no: u32) -> Option<Self> {
        if latest_draw_no == 0 {
            return None;
        }
        Some(if checkpoint == 0 {
            Checkpoint::Uninitialized
        } else if checkpoint < latest_draw_no {
            Checkpoint::Behind {
                from: checkpoint + 1,
                to: latest_draw_no,
            }
        } else {
            Checkpoint::UpToDate
        })
    }
}

impl std::fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Checkpoint::Uninitialized => write!(f, "non initialisée"),
            Checkpoint::Behind { from, to } => write!(f, "en retard ({from}..={to})"),
            Checkpoint::UpToDate => write!(f, "à jour"),
        }
    }
}

/// Bilan d'un passage de tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackerRun {
    pub checkpoint: Option<Checkpoint>,
    pub draws_written: u32,
}

impl TrackerRun {
    fn skipped(checkpoint: Option<Checkpoint>) -> Self {
        Self {
            checkpoint,
            draws_written: 0,
        }
    }
}

/// Point de reprise d'une table. Des lignes calculées avec un autre prior
/// que celui de `config` ne peuvent pas être prolongées : la table est vidée.
pub(crate) fn load_checkpoint(
    conn: &Connection,
    table: StatTable,
    config: &AnalysisConfig,
) -> Result<u32, AnalysisError> {
    let checkpoint = db::latest_checkpoint_draw_no(conn, table)?;
    if checkpoint == 0 {
        return Ok(0);
    }
    let current = (config.alpha, config.beta);
    let stored = db::tracker_prior(conn, table)?;
    if stored != Some(current) {
        log::warn!(
            "{} : prior {:?} au lieu de {:?}, reconstruction complète",
            table.table_name(),
            stored,
            current
        );
        db::clear_table(conn, table)?;
        return Ok(0);
    }
    Ok(checkpoint)
}

/// Moyenne a posteriori Beta-Binomiale après `draw_no` tirages de six numéros.
pub fn beta_posterior(config: &AnalysisConfig, count: u32, draw_no: u32) -> f64 {
    let trials = draw_no as f64 * PICK_COUNT as f64;
    (config.alpha + count as f64) / (config.alpha + config.beta + trials)
}

/// État d'un numéro reporté d'un tirage au suivant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberState {
    pub count: u32,
    pub posterior: f64,
}

impl NumberState {
    pub fn initial() -> Self {
        Self {
            count: 0,
            posterior: 1.0 / POOL_SIZE as f64,
        }
    }

    /// Intègre le tirage `draw_no` ; renvoie (prior, posterior).
    pub fn advance(&mut self, appeared: bool, draw_no: u32, config: &AnalysisConfig) -> (f64, f64) {
        let prior = self.posterior;
        if appeared {
            self.count += 1;
        }
        self.posterior = beta_posterior(config, self.count, draw_no);
        (prior, self.posterior)
    }
}
