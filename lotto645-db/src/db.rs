use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::models::{
    AnalysisRow, Draw, NumberStat, PosteriorRow, ProbField, ReappearStat, StatTable,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    draw_no        INTEGER PRIMARY KEY,
    date           TEXT NOT NULL,
    num_1          INTEGER NOT NULL,
    num_2          INTEGER NOT NULL,
    num_3          INTEGER NOT NULL,
    num_4          INTEGER NOT NULL,
    num_5          INTEGER NOT NULL,
    num_6          INTEGER NOT NULL,
    bonus          INTEGER NOT NULL,
    first_prize    INTEGER NOT NULL DEFAULT 0,
    first_winners  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS number_stats (
    number         INTEGER PRIMARY KEY CHECK (number BETWEEN 1 AND 45),
    total_count    INTEGER NOT NULL,
    bonus_count    INTEGER NOT NULL,
    last_draw_no   INTEGER NOT NULL,
    calculated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS reappear_stats (
    number          INTEGER PRIMARY KEY CHECK (number BETWEEN 1 AND 45),
    total_appear    INTEGER NOT NULL,
    reappear_count  INTEGER NOT NULL,
    probability     REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS posterior_stats (
    draw_no      INTEGER NOT NULL,
    number       INTEGER NOT NULL CHECK (number BETWEEN 1 AND 45),
    total_count  INTEGER NOT NULL,
    total_draws  INTEGER NOT NULL,
    prior        REAL NOT NULL,
    posterior    REAL NOT NULL,
    appeared     INTEGER NOT NULL,
    PRIMARY KEY (draw_no, number)
);

CREATE TABLE IF NOT EXISTS analysis_stats (
    draw_no         INTEGER NOT NULL,
    number          INTEGER NOT NULL CHECK (number BETWEEN 1 AND 45),
    total_count     INTEGER NOT NULL,
    total_prob      REAL NOT NULL,
    bonus_count     INTEGER NOT NULL,
    bonus_prob      REAL NOT NULL,
    first_count     INTEGER NOT NULL,
    first_prob      REAL NOT NULL,
    last_count      INTEGER NOT NULL,
    last_prob       REAL NOT NULL,
    reappear_total  INTEGER NOT NULL,
    reappear_count  INTEGER NOT NULL,
    reappear_prob   REAL NOT NULL,
    bayesian_prior  REAL NOT NULL,
    bayesian_post   REAL NOT NULL,
    appeared        INTEGER NOT NULL,
    PRIMARY KEY (draw_no, number)
);

CREATE TABLE IF NOT EXISTS tracker_prior (
    table_name  TEXT PRIMARY KEY,
    alpha       REAL NOT NULL,
    beta        REAL NOT NULL
);
";

const DRAW_COLUMNS: &str =
    "draw_no, date, num_1, num_2, num_3, num_4, num_5, num_6, bonus, first_prize, first_winners";

const ANALYSIS_COLUMNS: &str = "draw_no, number, total_count, total_prob, bonus_count, bonus_prob, \
     first_count, first_prob, last_count, last_prob, reappear_total, reappear_count, reappear_prob, \
     bayesian_prior, bayesian_post, appeared";

/// Résultat d'une écriture de tirage (upsert par numéro de tirage).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawUpsert {
    Inserted,
    Updated,
    Unchanged,
}

pub fn db_path() -> PathBuf {
    if let Ok(path) = std::env::var("LOTTO645_DB") {
        return PathBuf::from(path);
    }
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lotto645.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    log::debug!("base ouverte : {}", path.display());
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

// ── Tirages ──────────────────────────────────────────────────────────

fn draw_from_row(row: &Row<'_>) -> rusqlite::Result<Draw> {
    Ok(Draw {
        draw_no: row.get(0)?,
        date: row.get(1)?,
        numbers: [
            row.get::<_, u8>(2)?,
            row.get::<_, u8>(3)?,
            row.get::<_, u8>(4)?,
            row.get::<_, u8>(5)?,
            row.get::<_, u8>(6)?,
            row.get::<_, u8>(7)?,
        ],
        bonus: row.get(8)?,
        first_prize: row.get(9)?,
        first_winners: row.get(10)?,
    })
}

/// Insère ou corrige un tirage. Un tirage identique déjà présent n'est pas réécrit.
pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<DrawUpsert, StoreError> {
    let existing = draw_by_no(conn, draw.draw_no)?;
    if existing.as_ref() == Some(draw) {
        return Ok(DrawUpsert::Unchanged);
    }

    conn.execute(
        &format!(
            "INSERT INTO draws ({DRAW_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(draw_no) DO UPDATE SET
                date = excluded.date,
                num_1 = excluded.num_1, num_2 = excluded.num_2, num_3 = excluded.num_3,
                num_4 = excluded.num_4, num_5 = excluded.num_5, num_6 = excluded.num_6,
                bonus = excluded.bonus,
                first_prize = excluded.first_prize,
                first_winners = excluded.first_winners"
        ),
        params![
            draw.draw_no,
            draw.date,
            draw.numbers[0],
            draw.numbers[1],
            draw.numbers[2],
            draw.numbers[3],
            draw.numbers[4],
            draw.numbers[5],
            draw.bonus,
            draw.first_prize,
            draw.first_winners,
        ],
    )?;

    Ok(if existing.is_some() {
        DrawUpsert::Updated
    } else {
        DrawUpsert::Inserted
    })
}

pub fn latest_draw_no(conn: &Connection) -> Result<u32, StoreError> {
    let n: u32 = conn.query_row("SELECT COALESCE(MAX(draw_no), 0) FROM draws", [], |row| row.get(0))?;
    Ok(n)
}

pub fn draw_by_no(conn: &Connection, draw_no: u32) -> Result<Option<Draw>, StoreError> {
    let draw = conn
        .query_row(
            &format!("SELECT {DRAW_COLUMNS} FROM draws WHERE draw_no = ?1"),
            [draw_no],
            draw_from_row,
        )
        .optional()?;
    Ok(draw)
}

/// Historique complet, ordre croissant de numéro de tirage.
pub fn all_draws(conn: &Connection) -> Result<Vec<Draw>, StoreError> {
    let mut stmt = conn.prepare(&format!("SELECT {DRAW_COLUMNS} FROM draws ORDER BY draw_no ASC"))?;
    let draws = stmt
        .query_map([], draw_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

/// Derniers tirages, le plus récent en premier.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DRAW_COLUMNS} FROM draws ORDER BY draw_no DESC LIMIT ?1"
    ))?;
    let draws = stmt
        .query_map([limit], draw_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn count_draws(conn: &Connection) -> Result<u32, StoreError> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

// ── Statistiques agrégées (remplacées en bloc) ───────────────────────

pub fn replace_number_stats(conn: &Connection, stats: &[NumberStat]) -> Result<(), StoreError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM number_stats", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO number_stats (number, total_count, bonus_count, last_draw_no)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for s in stats {
            stmt.execute(params![s.number, s.total_count, s.bonus_count, s.last_draw_no])?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn fetch_number_stats(conn: &Connection) -> Result<Vec<NumberStat>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT number, total_count, bonus_count, last_draw_no FROM number_stats ORDER BY number",
    )?;
    let stats = stmt
        .query_map([], |row| {
            Ok(NumberStat {
                number: row.get(0)?,
                total_count: row.get(1)?,
                bonus_count: row.get(2)?,
                last_draw_no: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(stats)
}

pub fn replace_reappear_stats(conn: &Connection, stats: &[ReappearStat]) -> Result<(), StoreError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM reappear_stats", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO reappear_stats (number, total_appear, reappear_count, probability)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for s in stats {
            stmt.execute(params![s.number, s.total_appear, s.reappear_count, s.probability])?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn fetch_reappear_stats(conn: &Connection) -> Result<Vec<ReappearStat>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT number, total_appear, reappear_count, probability FROM reappear_stats ORDER BY number",
    )?;
    let stats = stmt
        .query_map([], |row| {
            Ok(ReappearStat {
                number: row.get(0)?,
                total_appear: row.get(1)?,
                reappear_count: row.get(2)?,
                probability: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(stats)
}

// ── Tables incrémentales ─────────────────────────────────────────────

/// Dernier tirage déjà calculé pour une table incrémentale (0 si vide).
pub fn latest_checkpoint_draw_no(conn: &Connection, table: StatTable) -> Result<u32, StoreError> {
    let n: u32 = conn.query_row(
        &format!("SELECT COALESCE(MAX(draw_no), 0) FROM {}", table.table_name()),
        [],
        |row| row.get(0),
    )?;
    Ok(n)
}

/// Vide une table incrémentale et oublie le prior qui l'a produite.
pub fn clear_table(conn: &Connection, table: StatTable) -> Result<(), StoreError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(&format!("DELETE FROM {}", table.table_name()), [])?;
    tx.execute(
        "DELETE FROM tracker_prior WHERE table_name = ?1",
        params![table.table_name()],
    )?;
    tx.commit()?;
    Ok(())
}

/// Prior Beta (alpha, beta) avec lequel la table a été calculée.
pub fn tracker_prior(conn: &Connection, table: StatTable) -> Result<Option<(f64, f64)>, StoreError> {
    let prior: Option<(f64, f64)> = conn
        .query_row(
            "SELECT alpha, beta FROM tracker_prior WHERE table_name = ?1",
            params![table.table_name()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(prior)
}

pub fn set_tracker_prior(conn: &Connection, table: StatTable, alpha: f64, beta: f64) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO tracker_prior (table_name, alpha, beta) VALUES (?1, ?2, ?3)
         ON CONFLICT(table_name) DO UPDATE SET alpha = excluded.alpha, beta = excluded.beta",
        params![table.table_name(), alpha, beta],
    )?;
    Ok(())
}

fn posterior_from_row(row: &Row<'_>) -> rusqlite::Result<PosteriorRow> {
    Ok(PosteriorRow {
        draw_no: row.get(0)?,
        number: row.get(1)?,
        total_count: row.get(2)?,
        total_draws: row.get(3)?,
        prior: row.get(4)?,
        posterior: row.get(5)?,
        appeared: row.get(6)?,
    })
}

pub fn posterior_rows_at(conn: &Connection, draw_no: u32) -> Result<Vec<PosteriorRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT draw_no, number, total_count, total_draws, prior, posterior, appeared
         FROM posterior_stats WHERE draw_no = ?1 ORDER BY number",
    )?;
    let rows = stmt
        .query_map([draw_no], posterior_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Écrit un lot de lignes dans une seule transaction : tout ou rien.
pub fn upsert_posterior_rows(conn: &Connection, rows: &[PosteriorRow]) -> Result<(), StoreError> {
    let draw_no = rows.first().map(|r| r.draw_no).unwrap_or(0);
    let persist = || -> rusqlite::Result<()> {
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO posterior_stats (draw_no, number, total_count, total_draws, prior, posterior, appeared)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(draw_no, number) DO UPDATE SET
                    total_count = excluded.total_count,
                    total_draws = excluded.total_draws,
                    prior = excluded.prior,
                    posterior = excluded.posterior,
                    appeared = excluded.appeared",
            )?;
            for r in rows {
                stmt.execute(params![
                    r.draw_no,
                    r.number,
                    r.total_count,
                    r.total_draws,
                    r.prior,
                    r.posterior,
                    r.appeared,
                ])?;
            }
        }
        tx.commit()
    };
    persist().map_err(|source| StoreError::Persistence {
        table: StatTable::Posterior.table_name(),
        draw_no,
        source,
    })
}

fn analysis_from_row(row: &Row<'_>) -> rusqlite::Result<AnalysisRow> {
    Ok(AnalysisRow {
        draw_no: row.get(0)?,
        number: row.get(1)?,
        total_count: row.get(2)?,
        total_prob: row.get(3)?,
        bonus_count: row.get(4)?,
        bonus_prob: row.get(5)?,
        first_count: row.get(6)?,
        first_prob: row.get(7)?,
        last_count: row.get(8)?,
        last_prob: row.get(9)?,
        reappear_total: row.get(10)?,
        reappear_count: row.get(11)?,
        reappear_prob: row.get(12)?,
        bayesian_prior: row.get(13)?,
        bayesian_post: row.get(14)?,
        appeared: row.get(15)?,
    })
}

pub fn analysis_rows_at(conn: &Connection, draw_no: u32) -> Result<Vec<AnalysisRow>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ANALYSIS_COLUMNS} FROM analysis_stats WHERE draw_no = ?1 ORDER BY number"
    ))?;
    let rows = stmt
        .query_map([draw_no], analysis_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Les 45 lignes du dernier tirage calculé (vide si la table n'est pas initialisée).
pub fn latest_analysis_rows(conn: &Connection) -> Result<Vec<AnalysisRow>, StoreError> {
    let checkpoint = latest_checkpoint_draw_no(conn, StatTable::Analysis)?;
    if checkpoint == 0 {
        return Ok(Vec::new());
    }
    analysis_rows_at(conn, checkpoint)
}

pub fn upsert_analysis_rows(conn: &Connection, rows: &[AnalysisRow]) -> Result<(), StoreError> {
    let draw_no = rows.first().map(|r| r.draw_no).unwrap_or(0);
    let persist = || -> rusqlite::Result<()> {
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO analysis_stats ({ANALYSIS_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
            ))?;
            for r in rows {
                stmt.execute(params![
                    r.draw_no,
                    r.number,
                    r.total_count,
                    r.total_prob,
                    r.bonus_count,
                    r.bonus_prob,
                    r.first_count,
                    r.first_prob,
                    r.last_count,
                    r.last_prob,
                    r.reappear_total,
                    r.reappear_count,
                    r.reappear_prob,
                    r.bayesian_prior,
                    r.bayesian_post,
                    r.appeared,
                ])?;
            }
        }
        tx.commit()
    };
    persist().map_err(|source| StoreError::Persistence {
        table: StatTable::Analysis.table_name(),
        draw_no,
        source,
    })
}

/// Lignes dont la probabilité vaut 0 alors que le compteur associé ne l'est pas.
pub fn analysis_rows_with_zero_prob(
    conn: &Connection,
    field: ProbField,
) -> Result<Vec<AnalysisRow>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ANALYSIS_COLUMNS} FROM analysis_stats
         WHERE {} = 0 AND {} > 0 ORDER BY draw_no, number",
        field.prob_column(),
        field.count_column(),
    ))?;
    let rows = stmt
        .query_map([], analysis_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Réécrit uniquement la colonne de probabilité `field` des lignes données.
pub fn update_analysis_prob(
    conn: &Connection,
    field: ProbField,
    rows: &[AnalysisRow],
) -> Result<usize, StoreError> {
    let tx = conn.unchecked_transaction()?;
    let mut updated = 0;
    {
        let mut stmt = tx.prepare(&format!(
            "UPDATE analysis_stats SET {} = ?1 WHERE draw_no = ?2 AND number = ?3",
            field.prob_column()
        ))?;
        for r in rows {
            updated += stmt.execute(params![field.prob_of(r), r.draw_no, r.number])?;
        }
    }
    tx.commit()?;
    Ok(updated)
}
