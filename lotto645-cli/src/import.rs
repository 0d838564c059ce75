use anyhow::{bail, Context, Result};
use chrono::{Days, NaiveDate};
use lotto645_db::db::{insert_draw, DrawUpsert};
use lotto645_db::models::{validate_draw, Draw, PICK_COUNT};
use lotto645_db::rusqlite::Connection;
use std::path::Path;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const MIN_COLUMNS: usize = 12;

/// Ne garde que les chiffres : "5,001,713,625 원" -> "5001713625".
fn digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Date d'un tirage déduite de son numéro : un tirage par semaine depuis le samedi 7 décembre 2002.
pub fn draw_date(draw_no: u32) -> Result<String> {
    if draw_no == 0 {
        bail!("Numéro de tirage nul");
    }
    let first = NaiveDate::from_ymd_opt(2002, 12, 7).context("Date du premier tirage invalide")?;
    let date = first
        .checked_add_days(Days::new(u64::from(draw_no - 1) * 7))
        .with_context(|| format!("Date hors limites pour le tirage {}", draw_no))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

pub fn parse_record(record: &csv::StringRecord) -> Result<Draw> {
    if record.len() < MIN_COLUMNS {
        bail!("{} colonnes au lieu de {} minimum", record.len(), MIN_COLUMNS);
    }

    let get_num = |idx: usize| -> Result<u64> {
        let raw = record.get(idx).unwrap_or_default();
        digits(raw)
            .parse::<u64>()
            .with_context(|| format!("Impossible de parser '{}' (index {})", raw, idx))
    };
    let get_ball = |idx: usize| -> Result<u8> {
        let v = get_num(idx)?;
        u8::try_from(v).with_context(|| format!("Numéro {} hors limites (index {})", v, idx))
    };

    let draw_no = u32::try_from(get_num(1)?).context("Numéro de tirage trop grand")?;

    let mut numbers = [0u8; PICK_COUNT];
    for (i, slot) in numbers.iter_mut().enumerate() {
        *slot = get_ball(2 + i)?;
    }
    numbers.sort_unstable();
    let bonus = get_ball(8)?;
    validate_draw(&numbers, bonus)?;

    // Index 9 : rang ("1등"), non conservé
    let first_winners = u32::try_from(get_num(10)?).context("Nombre de gagnants trop grand")?;
    let first_prize = i64::try_from(get_num(11)?).context("Gain trop grand")?;

    Ok(Draw {
        draw_no,
        date: draw_date(draw_no)?,
        numbers,
        bonus,
        first_prize,
        first_winners,
    })
}

#[derive(Debug, Default)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub updated: u32,
    pub unchanged: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let content = std::fs::read(path).with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    import_bytes(conn, &content)
}

/// Import d'un export CSV (en-tête + une ligne par tirage) dans une seule transaction.
pub fn import_bytes(conn: &Connection, content: &[u8]) -> Result<ImportResult> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let tx = conn
        .unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult::default();

    for record_result in reader.records() {
        result.total_records += 1;
        // La ligne 1 est l'en-tête
        let line = result.total_records + 1;
        let draw = match record_result
            .context("lecture impossible")
            .and_then(|record| parse_record(&record))
        {
            Ok(draw) => draw,
            Err(e) => {
                log::error!("ligne {} ignorée : {:#}", line, e);
                result.errors += 1;
                continue;
            }
        };
        match insert_draw(&tx, &draw) {
            Ok(DrawUpsert::Inserted) => result.inserted += 1,
            Ok(DrawUpsert::Updated) => result.updated += 1,
            Ok(DrawUpsert::Unchanged) => result.unchanged += 1,
            Err(e) => {
                log::error!("insertion du tirage {} impossible : {}", draw.draw_no, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    log::info!(
        "import : {} lignes, {} insérées, {} corrigées, {} erreurs",
        result.total_records,
        result.inserted,
        result.updated,
        result.errors
    );
    Ok(result)
}
