use lotto645_db::db;
use lotto645_db::models::{Draw, PosteriorRow, StatTable, MAX_NUMBER, POOL_SIZE};
use lotto645_db::rusqlite::Connection;

use super::{load_checkpoint, Checkpoint, NumberState, TrackerRun};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

/// Calcule les 45 lignes du tirage et fait avancer l'état de chaque numéro.
pub fn advance_draw(
    states: &mut [NumberState; POOL_SIZE],
    draw: &Draw,
    config: &AnalysisConfig,
) -> Vec<PosteriorRow> {
    let present = draw.presence();
    (1..=MAX_NUMBER)
        .map(|number| {
            let appeared = present[number as usize];
            let state = &mut states[(number - 1) as usize];
            let (prior, posterior) = state.advance(appeared, draw.draw_no, config);
            PosteriorRow {
                draw_no: draw.draw_no,
                number,
                total_count: state.count,
                total_draws: draw.draw_no,
                prior,
                posterior,
                appeared,
            }
        })
        .collect()
}

/// Met la table `posterior_stats` à jour selon son point de reprise.
pub fn update_posterior_stats(conn: &Connection, config: &AnalysisConfig) -> Result<TrackerRun, AnalysisError> {
    let checkpoint = load_checkpoint(conn, StatTable::Posterior, config)?;
    let latest = db::latest_draw_no(conn)?;
    let state = Checkpoint::evaluate(checkpoint, latest);

    let draws_written = match state {
        None => {
            log::info!("posterior : aucun tirage, rien à calculer");
            return Ok(TrackerRun::skipped(state));
        }
        Some(Checkpoint::UpToDate) => {
            log::info!("posterior : déjà à jour (tirage {checkpoint})");
            return Ok(TrackerRun::skipped(state));
        }
        Some(Checkpoint::Uninitialized) => {
            log::info!("posterior : table vide, reconstruction complète");
            rebuild_posterior_stats(conn, config)?
        }
        Some(Checkpoint::Behind { from, to }) => {
            log::info!("posterior : rattrapage des tirages {from} à {to}");
            catch_up(conn, config, checkpoint, to)?
        }
    };
    db::set_tracker_prior(conn, StatTable::Posterior, config.alpha, config.beta)?;

    Ok(TrackerRun {
        checkpoint: state,
        draws_written,
    })
}

/// Recalcule toute la table depuis le premier tirage stocké.
pub fn rebuild_posterior_stats(conn: &Connection, config: &AnalysisConfig) -> Result<u32, AnalysisError> {
    let draws = db::all_draws(conn)?;
    let mut states = [NumberState::initial(); POOL_SIZE];
    for draw in &draws {
        let rows = advance_draw(&mut states, draw, config);
        db::upsert_posterior_rows(conn, &rows)?;
    }
    log::info!("posterior : {} tirages calculés", draws.len());
    Ok(draws.len() as u32)
}

fn catch_up(conn: &Connection, config: &AnalysisConfig, checkpoint: u32, to: u32) -> Result<u32, AnalysisError> {
    let previous = db::posterior_rows_at(conn, checkpoint)?;
    if previous.len() != POOL_SIZE {
        log::warn!(
            "posterior : {} lignes au tirage {checkpoint} au lieu de {POOL_SIZE}, reconstruction complète",
            previous.len()
        );
        db::clear_table(conn, StatTable::Posterior)?;
        return rebuild_posterior_stats(conn, config);
    }

    let mut states = [NumberState::initial(); POOL_SIZE];
    for row in &previous {
        states[(row.number - 1) as usize] = NumberState {
            count: row.total_count,
            posterior: row.posterior,
        };
    }

    let mut written = 0;
    for draw_no in (checkpoint + 1)..=to {
        let draw = db::draw_by_no(conn, draw_no)?.ok_or(AnalysisError::MissingDraw(draw_no))?;
        let rows = advance_draw(&mut states, &draw, config);
        db::upsert_posterior_rows(conn, &rows)?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotto645_db::models::make_test_draws;

    fn conn_with_draws(n: usize) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::migrate(&conn).unwrap();
        for draw in make_test_draws(n) {
            db::insert_draw(&conn, &draw).unwrap();
        }
        conn
    }

    #[test]
    fn test_no_draws_is_noop() {
        let conn = conn_with_draws(0);
        let run = update_posterior_stats(&conn, &AnalysisConfig::default()).unwrap();
        assert_eq!(run.checkpoint, None);
        assert_eq!(run.draws_written, 0);
        assert_eq!(db::latest_checkpoint_draw_no(&conn, StatTable::Posterior).unwrap(), 0);
    }

    #[test]
    fn test_full_rebuild_then_up_to_date() {
        let conn = conn_with_draws(12);
        let config = AnalysisConfig::default();

        let run = update_posterior_stats(&conn, &config).unwrap();
        assert_eq!(run.checkpoint, Some(Checkpoint::Uninitialized));
        assert_eq!(run.draws_written, 12);
        assert_eq!(db::latest_checkpoint_draw_no(&conn, StatTable::Posterior).unwrap(), 12);

        let again = update_posterior_stats(&conn, &config).unwrap();
        assert_eq!(again.checkpoint, Some(Checkpoint::UpToDate));
        assert_eq!(again.draws_written, 0);
    }

    #[test]
    fn test_first_draw_prior_uniform() {
        let conn = conn_with_draws(3);
        update_posterior_stats(&conn, &AnalysisConfig::default()).unwrap();
        let rows = db::posterior_rows_at(&conn, 1).unwrap();
        assert_eq!(rows.len(), 45);
        for row in &rows {
            assert!((row.prior - 1.0 / 45.0).abs() < 1e-12);
            let expected = if row.appeared { 2.0 / 8.0 } else { 1.0 / 8.0 };
            assert!((row.posterior - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_prior_is_previous_posterior() {
        let conn = conn_with_draws(6);
        update_posterior_stats(&conn, &AnalysisConfig::default()).unwrap();
        for draw_no in 2..=6 {
            let prev = db::posterior_rows_at(&conn, draw_no - 1).unwrap();
            let cur = db::posterior_rows_at(&conn, draw_no).unwrap();
            for (p, c) in prev.iter().zip(&cur) {
                assert_eq!(p.number, c.number);
                assert_eq!(c.prior, p.posterior);
            }
        }
    }

    #[test]
    fn test_posterior_in_open_unit_interval() {
        let conn = conn_with_draws(150);
        update_posterior_stats(&conn, &AnalysisConfig::default()).unwrap();
        for draw_no in [1, 75, 150] {
            for row in db::posterior_rows_at(&conn, draw_no).unwrap() {
                assert!(row.posterior > 0.0 && row.posterior < 1.0, "{:?}", row);
            }
        }
    }

    #[test]
    fn test_catch_up_matches_rebuild() {
        let config = AnalysisConfig::default();
        let draws = make_test_draws(10);

        // Reconstruction sur 9 tirages puis rattrapage du 10e
        let incremental = conn_with_draws(9);
        update_posterior_stats(&incremental, &config).unwrap();
        db::insert_draw(&incremental, &draws[9]).unwrap();
        let run = update_posterior_stats(&incremental, &config).unwrap();
        assert_eq!(run.checkpoint, Some(Checkpoint::Behind { from: 10, to: 10 }));
        assert_eq!(run.draws_written, 1);

        let full = conn_with_draws(10);
        update_posterior_stats(&full, &config).unwrap();

        for draw_no in 1..=10 {
            assert_eq!(
                db::posterior_rows_at(&incremental, draw_no).unwrap(),
                db::posterior_rows_at(&full, draw_no).unwrap(),
                "tirage {draw_no}"
            );
        }
    }

    #[test]
    fn test_multi_draw_catch_up_matches_rebuild() {
        let config = AnalysisConfig::default();
        let draws = make_test_draws(20);

        let incremental = conn_with_draws(5);
        update_posterior_stats(&incremental, &config).unwrap();
        for draw in &draws[5..] {
            db::insert_draw(&incremental, draw).unwrap();
        }
        let run = update_posterior_stats(&incremental, &config).unwrap();
        assert_eq!(run.checkpoint, Some(Checkpoint::Behind { from: 6, to: 20 }));
        assert_eq!(run.draws_written, 15);

        let full = conn_with_draws(20);
        update_posterior_stats(&full, &config).unwrap();
        for draw_no in 1..=20 {
            assert_eq!(
                db::posterior_rows_at(&incremental, draw_no).unwrap(),
                db::posterior_rows_at(&full, draw_no).unwrap(),
                "tirage {draw_no}"
            );
        }
    }

    #[test]
    fn test_prior_change_forces_rebuild() {
        let draws = make_test_draws(10);
        let flat = AnalysisConfig::default();
        let strong = AnalysisConfig { alpha: 5.0, beta: 5.0, ..Default::default() };

        let conn = conn_with_draws(9);
        update_posterior_stats(&conn, &flat).unwrap();
        assert_eq!(db::tracker_prior(&conn, StatTable::Posterior).unwrap(), Some((1.0, 1.0)));
        db::insert_draw(&conn, &draws[9]).unwrap();

        let run = update_posterior_stats(&conn, &strong).unwrap();
        assert_eq!(run.checkpoint, Some(Checkpoint::Uninitialized));
        assert_eq!(run.draws_written, 10);
        assert_eq!(db::tracker_prior(&conn, StatTable::Posterior).unwrap(), Some((5.0, 5.0)));

        let full = conn_with_draws(10);
        update_posterior_stats(&full, &strong).unwrap();
        for draw_no in 1..=10 {
            assert_eq!(
                db::posterior_rows_at(&conn, draw_no).unwrap(),
                db::posterior_rows_at(&full, draw_no).unwrap(),
                "tirage {draw_no}"
            );
        }

        // Même prior : simple constat
        let again = update_posterior_stats(&conn, &strong).unwrap();
        assert_eq!(again.checkpoint, Some(Checkpoint::UpToDate));
    }

    #[test]
    fn test_missing_draw_in_range() {
        let config = AnalysisConfig::default();
        let draws = make_test_draws(5);
        let conn = conn_with_draws(2);
        update_posterior_stats(&conn, &config).unwrap();
        // Le tirage 3 manque
        db::insert_draw(&conn, &draws[3]).unwrap();
        db::insert_draw(&conn, &draws[4]).unwrap();

        let err = update_posterior_stats(&conn, &config).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingDraw(3)));
        assert_eq!(db::latest_checkpoint_draw_no(&conn, StatTable::Posterior).unwrap(), 2);
    }
}
