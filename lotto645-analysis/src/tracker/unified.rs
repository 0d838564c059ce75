use lotto645_db::db;
use lotto645_db::models::{AnalysisRow, Draw, StatTable, MAX_NUMBER, PICK_COUNT, POOL_SIZE};
use lotto645_db::rusqlite::Connection;

use super::{load_checkpoint, Checkpoint, NumberState, TrackerRun};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

/// Compteurs cumulés d'un numéro pour la table d'analyse unifiée.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnifiedState {
    pub bayes: NumberState,
    pub bonus_count: u32,
    pub first_count: u32,
    pub last_count: u32,
    pub reappear_total: u32,
    pub reappear_count: u32,
}

impl UnifiedState {
    pub fn initial() -> Self {
        Self {
            bayes: NumberState::initial(),
            bonus_count: 0,
            first_count: 0,
            last_count: 0,
            reappear_total: 0,
            reappear_count: 0,
        }
    }

    fn from_row(row: &AnalysisRow) -> Self {
        Self {
            bayes: NumberState {
                count: row.total_count,
                posterior: row.bayesian_post,
            },
            bonus_count: row.bonus_count,
            first_count: row.first_count,
            last_count: row.last_count,
            reappear_total: row.reappear_total,
            reappear_count: row.reappear_count,
        }
    }
}

fn share(count: u32, denominator: f64) -> f64 {
    if denominator > 0.0 {
        count as f64 / denominator
    } else {
        0.0
    }
}

/// Calcule les 45 lignes du tirage. `previous` est le tirage de numéro
/// `draw.draw_no - 1` s'il existe ; il alimente les compteurs de réapparition.
pub fn advance_draw(
    states: &mut [UnifiedState; POOL_SIZE],
    draw: &Draw,
    previous: Option<&Draw>,
    config: &AnalysisConfig,
) -> Vec<AnalysisRow> {
    let present = draw.presence();
    let previous_present = previous.map(Draw::presence);
    let draws = draw.draw_no as f64;

    (1..=MAX_NUMBER)
        .map(|number| {
            let appeared = present[number as usize];
            let state = &mut states[(number - 1) as usize];

            if draw.bonus == number {
                state.bonus_count += 1;
            }
            if draw.first() == number {
                state.first_count += 1;
            }
            if draw.last() == number {
                state.last_count += 1;
            }
            if previous_present.is_some_and(|p| p[number as usize]) {
                state.reappear_total += 1;
                if appeared {
                    state.reappear_count += 1;
                }
            }
            let (prior, posterior) = state.bayes.advance(appeared, draw.draw_no, config);

            AnalysisRow {
                draw_no: draw.draw_no,
                number,
                total_count: state.bayes.count,
                total_prob: share(state.bayes.count, draws * PICK_COUNT as f64),
                bonus_count: state.bonus_count,
                bonus_prob: share(state.bonus_count, draws),
                first_count: state.first_count,
                first_prob: share(state.first_count, draws),
                last_count: state.last_count,
                last_prob: share(state.last_count, draws),
                reappear_total: state.reappear_total,
                reappear_count: state.reappear_count,
                reappear_prob: share(state.reappear_count, state.reappear_total as f64),
                bayesian_prior: prior,
                bayesian_post: posterior,
                appeared,
            }
        })
        .collect()
}

/// Met la table `analysis_stats` à jour selon son point de reprise.
pub fn update_analysis_stats(conn: &Connection, config: &AnalysisConfig) -> Result<TrackerRun, AnalysisError> {
    let checkpoint = load_checkpoint(conn, StatTable::Analysis, config)?;
    let latest = db::latest_draw_no(conn)?;
    let state = Checkpoint::evaluate(checkpoint, latest);

    let draws_written = match state {
        None => {
            log::info!("analyse unifiée : aucun tirage, rien à calculer");
            return Ok(TrackerRun::skipped(state));
        }
        Some(Checkpoint::UpToDate) => {
            log::info!("analyse unifiée : déjà à jour (tirage {checkpoint})");
            return Ok(TrackerRun::skipped(state));
        }
        Some(Checkpoint::Uninitialized) => {
            log::info!("analyse unifiée : table vide, reconstruction complète");
            rebuild_analysis_stats(conn, config)?
        }
        Some(Checkpoint::Behind { from, to }) => {
            log::info!("analyse unifiée : rattrapage des tirages {from} à {to}");
            catch_up(conn, config, checkpoint, to)?
        }
    };
    db::set_tracker_prior(conn, StatTable::Analysis, config.alpha, config.beta)?;

    Ok(TrackerRun {
        checkpoint: state,
        draws_written,
    })
}

pub fn rebuild_analysis_stats(conn: &Connection, config: &AnalysisConfig) -> Result<u32, AnalysisError> {
    let draws = db::all_draws(conn)?;
    let mut states = [UnifiedState::initial(); POOL_SIZE];
    let mut previous: Option<&Draw> = None;
    for draw in &draws {
        let adjacent = previous.filter(|p| p.draw_no + 1 == draw.draw_no);
        let rows = advance_draw(&mut states, draw, adjacent, config);
        db::upsert_analysis_rows(conn, &rows)?;
        previous = Some(draw);
    }
    log::info!("analyse unifiée : {} tirages calculés", draws.len());
    Ok(draws.len() as u32)
}

fn catch_up(conn: &Connection, config: &AnalysisConfig, checkpoint: u32, to: u32) -> Result<u32, AnalysisError> {
    let stored = db::analysis_rows_at(conn, checkpoint)?;
    if stored.len() != POOL_SIZE {
        log::warn!(
            "analyse unifiée : {} lignes au tirage {checkpoint} au lieu de {POOL_SIZE}, reconstruction complète",
            stored.len()
        );
        db::clear_table(conn, StatTable::Analysis)?;
        return rebuild_analysis_stats(conn, config);
    }

    let mut states = [UnifiedState::initial(); POOL_SIZE];
    for row in &stored {
        states[(row.number - 1) as usize] = UnifiedState::from_row(row);
    }

    let mut previous = db::draw_by_no(conn, checkpoint)?;
    let mut written = 0;
    for draw_no in (checkpoint + 1)..=to {
        let draw = db::draw_by_no(conn, draw_no)?.ok_or(AnalysisError::MissingDraw(draw_no))?;
        let rows = advance_draw(&mut states, &draw, previous.as_ref(), config);
        db::upsert_analysis_rows(conn, &rows)?;
        previous = Some(draw);
        written += 1;
    }
    Ok(written)
}
