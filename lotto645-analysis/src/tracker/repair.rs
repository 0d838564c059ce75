use lotto645_db::db;
use lotto645_db::models::{AnalysisRow, ProbField, PICK_COUNT};
use lotto645_db::rusqlite::Connection;
use serde::Serialize;

use crate::error::AnalysisError;

#[derive(Debug, Clone, Serialize)]
pub struct RepairReport {
    /// Lignes corrigées par colonne de probabilité.
    pub repaired: Vec<(String, usize)>,
}

impl RepairReport {
    pub fn total(&self) -> usize {
        self.repaired.iter().map(|(_, n)| n).sum()
    }
}

/// Probabilité attendue pour `field` à partir du compteur stocké.
pub fn expected_prob(field: ProbField, row: &AnalysisRow) -> f64 {
    let draws = row.draw_no as f64;
    let denominator = match field {
        ProbField::Total => draws * PICK_COUNT as f64,
        ProbField::Bonus | ProbField::First | ProbField::Last => draws,
    };
    if denominator > 0.0 {
        field.count_of(row) as f64 / denominator
    } else {
        0.0
    }
}

/// Corrige les lignes dont la probabilité vaut 0 alors que le compteur ne l'est pas.
pub fn repair_field(conn: &Connection, field: ProbField) -> Result<usize, AnalysisError> {
    let mut rows = db::analysis_rows_with_zero_prob(conn, field)?;
    if rows.is_empty() {
        log::debug!("réparation {field} : rien à corriger");
        return Ok(0);
    }

    for row in &mut rows {
        let value = expected_prob(field, row);
        field.set_prob(row, value);
    }
    let updated = db::update_analysis_prob(conn, field, &rows)?;
    log::info!("réparation {field} : {updated} lignes corrigées");
    Ok(updated)
}

pub fn repair_zero_probabilities(conn: &Connection) -> Result<RepairReport, AnalysisError> {
    let mut repaired = Vec::with_capacity(ProbField::ALL.len());
    for field in ProbField::ALL {
        repaired.push((field.prob_column().to_string(), repair_field(conn, field)?));
    }
    Ok(RepairReport { repaired })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::tracker::unified::update_analysis_stats;
    use lotto645_db::models::make_test_draws;

    fn analysed_conn(n: usize) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::migrate(&conn).unwrap();
        for draw in make_test_draws(n) {
            db::insert_draw(&conn, &draw).unwrap();
        }
        update_analysis_stats(&conn, &AnalysisConfig::default()).unwrap();
        conn
    }

    #[test]
    fn test_nothing_to_repair() {
        let conn = analysed_conn(8);
        let report = repair_zero_probabilities(&conn).unwrap();
        assert_eq!(report.total(), 0);
        assert_eq!(report.repaired.len(), 4);
    }

    #[test]
    fn test_repair_only_zeroed_column() {
        let conn = analysed_conn(8);
        let original = db::analysis_rows_at(&conn, 8).unwrap();

        conn.execute(
            "UPDATE analysis_stats SET total_prob = 0, first_prob = 0 WHERE draw_no = 8 AND total_count > 0",
            [],
        )
        .unwrap();

        let fixed = repair_field(&conn, ProbField::Total).unwrap();
        assert!(fixed > 0);

        let after = db::analysis_rows_at(&conn, 8).unwrap();
        for (before, now) in original.iter().zip(&after) {
            assert!((before.total_prob - now.total_prob).abs() < 1e-12);
            assert_eq!(before.bonus_prob, now.bonus_prob);
            assert_eq!(before.bayesian_post, now.bayesian_post);
            if before.total_count > 0 {
                // first_prob n'a pas été touché par la réparation de total_prob
                assert_eq!(now.first_prob, 0.0);
            }
        }

        let report = repair_zero_probabilities(&conn).unwrap();
        let first = report.repaired.iter().find(|(c, _)| c == "first_prob").unwrap();
        assert_eq!(
            first.1,
            original.iter().filter(|r| r.total_count > 0 && r.first_count > 0).count()
        );
        let restored = db::analysis_rows_at(&conn, 8).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_expected_prob() {
        let row = AnalysisRow {
            draw_no: 10,
            number: 1,
            total_count: 6,
            total_prob: 0.0,
            bonus_count: 2,
            bonus_prob: 0.0,
            first_count: 5,
            first_prob: 0.0,
            last_count: 0,
            last_prob: 0.0,
            reappear_total: 0,
            reappear_count: 0,
            reappear_prob: 0.0,
            bayesian_prior: 0.0,
            bayesian_post: 0.0,
            appeared: false,
        };
        assert!((expected_prob(ProbField::Total, &row) - 0.1).abs() < 1e-12);
        assert!((expected_prob(ProbField::Bonus, &row) - 0.2).abs() < 1e-12);
        assert!((expected_prob(ProbField::First, &row) - 0.5).abs() < 1e-12);
    }
}
