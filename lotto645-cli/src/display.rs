use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::import::ImportResult;
use lotto645_analysis::aggregate::{
    ColorStats, ConsecutiveStats, GridStats, LineStat, PairStat, PairStats, PositionStat,
    PositionStats, RatioStat, RatioStats,
};
use lotto645_analysis::hot_cold::{HotColdNumber, HotColdStats, HotColdStatus};
use lotto645_analysis::service::{AnalysisSummary, StatisticResponse};
use lotto645_analysis::tracker::repair::RepairReport;
use lotto645_analysis::tracker::TrackerRun;
use lotto645_db::models::{Draw, NumberStat, ReappearStat};
use lotto645_recommend::combine::CombineInfo;
use lotto645_recommend::methods::MethodInfo;
use lotto645_recommend::Recommendation;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

fn pct(p: f64) -> String {
    format!("{:.2} %", p * 100.0)
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Tirage", "Date", "Numéros", "Bonus", "Gagnants 1er rang", "Gain 1er rang"]);
    for draw in draws {
        let prize = if draw.first_prize > 0 {
            format!("{} ₩", draw.first_prize)
        } else {
            "—".to_string()
        };
        table.add_row(vec![
            draw.draw_no.to_string(),
            draw.date.clone(),
            join_numbers(&draw.numbers),
            format!("{:2}", draw.bonus),
            draw.first_winners.to_string(),
            prize,
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Corrigés          : {}", result.updated);
    println!("  Inchangés         : {}", result.unchanged);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

fn tracker_line(run: &TrackerRun) -> String {
    match run.checkpoint {
        None => "aucun tirage".to_string(),
        Some(cp) => format!("{cp}, {} tirage(s) écrits", run.draws_written),
    }
}

pub fn display_analysis_summary(summary: &AnalysisSummary) {
    println!("Analyse terminée ({} tirages, dernier : {}) :", summary.total_draws, summary.latest_draw_no);
    println!("  Fréquences        : {} numéros", summary.number_stats);
    println!("  Réapparitions     : {} numéros", summary.reappear_stats);
    println!("  Postérieurs       : {}", tracker_line(&summary.posterior));
    println!("  Table d'analyse   : {}", tracker_line(&summary.analysis));
}

pub fn display_repair_report(report: &RepairReport) {
    if report.total() == 0 {
        println!("Aucune probabilité à corriger.");
        return;
    }
    let mut table = new_table(vec!["Colonne", "Lignes corrigées"]);
    for (column, count) in &report.repaired {
        table.add_row(vec![column.clone(), count.to_string()]);
    }
    println!("{table}");
}

pub fn display_statistic(response: &StatisticResponse) {
    match response {
        StatisticResponse::Numbers(stats) => display_number_stats(stats),
        StatisticResponse::Reappear(stats) => display_reappear_stats(stats),
        StatisticResponse::Position(stats) => display_position_stats(stats),
        StatisticResponse::Pairs(stats) => display_pair_stats(stats),
        StatisticResponse::Consecutive(stats) => display_consecutive_stats(stats),
        StatisticResponse::Ratio(stats) => display_ratio_stats(stats),
        StatisticResponse::Color(stats) => display_color_stats(stats),
        StatisticResponse::Grid(stats) => display_grid_stats(stats),
        StatisticResponse::HotCold(stats) => display_hot_cold(stats),
    }
}

fn display_number_stats(stats: &[NumberStat]) {
    println!("\n── Fréquences (1-45) ──");
    let mut table = new_table(vec!["Numéro", "Sorties", "Bonus", "Dernier tirage"]);
    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| b.total_count.cmp(&a.total_count).then(a.number.cmp(&b.number)));
    for stat in &sorted {
        table.add_row(vec![
            format!("{:2}", stat.number),
            stat.total_count.to_string(),
            stat.bonus_count.to_string(),
            stat.last_draw_no.to_string(),
        ]);
    }
    println!("{table}");
}

fn display_reappear_stats(stats: &[ReappearStat]) {
    println!("\n── Réapparition au tirage suivant ──");
    let mut table = new_table(vec!["Numéro", "Sorties", "Réapparitions", "Probabilité"]);
    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| b.probability.total_cmp(&a.probability).then(a.number.cmp(&b.number)));
    for stat in &sorted {
        table.add_row(vec![
            format!("{:2}", stat.number),
            stat.total_appear.to_string(),
            stat.reappear_count.to_string(),
            pct(stat.probability),
        ]);
    }
    println!("{table}");
}

fn position_table(title: &str, stats: &[PositionStat]) {
    println!("\n── {title} ──");
    let mut table = new_table(vec!["Numéro", "Occurrences", "Probabilité"]);
    for stat in stats.iter().filter(|s| s.count > 0) {
        table.add_row(vec![format!("{:2}", stat.number), stat.count.to_string(), pct(stat.probability)]);
    }
    println!("{table}");
}

fn display_position_stats(stats: &PositionStats) {
    println!("\n📊 Positions sur {} tirages (dernier : {})", stats.total_draws, stats.latest_draw_no);
    position_table("Plus petit numéro", &stats.first);
    position_table("Plus grand numéro", &stats.last);
}

fn pair_table(title: &str, pairs: &[PairStat]) {
    println!("\n── {title} ──");
    let mut table = new_table(vec!["Paire", "Occurrences", "Probabilité"]);
    for pair in pairs {
        table.add_row(vec![
            format!("{:2} - {:2}", pair.first, pair.second),
            pair.count.to_string(),
            pct(pair.probability),
        ]);
    }
    println!("{table}");
}

fn display_pair_stats(stats: &PairStats) {
    println!(
        "\n📊 Paires sur {} tirages : {} paires, {} distinctes",
        stats.total_draws, stats.total_pairs, stats.distinct_pairs
    );
    pair_table("Paires les plus fréquentes", &stats.top);
    pair_table("Paires les moins fréquentes", &stats.bottom);
}

fn display_consecutive_stats(stats: &ConsecutiveStats) {
    println!("\n📊 Suites de numéros consécutifs sur {} tirages", stats.total_draws);
    let mut table = new_table(vec!["Plus longue suite", "Tirages", "Probabilité"]);
    for bucket in &stats.buckets {
        table.add_row(vec![
            bucket.run_length.to_string(),
            bucket.draw_count.to_string(),
            pct(bucket.probability),
        ]);
    }
    println!("{table}");

    if !stats.recent_examples.is_empty() {
        println!("\n── Exemples récents ──");
        let mut table = new_table(vec!["Tirage", "Numéros", "Suite"]);
        for ex in &stats.recent_examples {
            table.add_row(vec![ex.draw_no.to_string(), join_numbers(&ex.numbers), ex.run_length.to_string()]);
        }
        println!("{table}");
    }
}

fn ratio_table(title: &str, stats: &[RatioStat]) {
    println!("\n── {title} ──");
    let mut table = new_table(vec!["Répartition", "Tirages", "Probabilité"]);
    for stat in stats {
        table.add_row(vec![stat.ratio.clone(), stat.count.to_string(), pct(stat.probability)]);
    }
    println!("{table}");
}

fn display_ratio_stats(stats: &RatioStats) {
    println!("\n📊 Répartitions sur {} tirages", stats.total_draws);
    ratio_table("Impairs : pairs", &stats.odd_even);
    ratio_table("Hauts (23-45) : bas (1-22)", &stats.high_low);
}

fn display_color_stats(stats: &ColorStats) {
    println!("\n📊 Couleurs sur {} tirages", stats.total_draws);
    let mut table = new_table(vec!["Couleur", "Numéros tirés"]);
    for color in &stats.color_counts {
        table.add_row(vec![color.band.to_string(), color.count.to_string()]);
    }
    println!("{table}");

    println!("\n── Motifs les plus fréquents ──");
    let mut table = new_table(vec!["Motif", "Tirages", "Probabilité"]);
    for pattern in &stats.top_patterns {
        table.add_row(vec![pattern.pattern.clone(), pattern.count.to_string(), pct(pattern.probability)]);
    }
    println!("{table}");
}

fn line_table(title: &str, lines: &[LineStat]) {
    println!("\n── {title} ──");
    let mut table = new_table(vec!["Ligne", "Numéros tirés", "Part"]);
    for line in lines {
        table.add_row(vec![line.line.to_string(), line.count.to_string(), pct(line.probability)]);
    }
    println!("{table}");
}

fn display_grid_stats(stats: &GridStats) {
    println!("\n📊 Grille 7 colonnes sur {} tirages", stats.total_draws);
    line_table("Lignes", &stats.rows);
    line_table("Colonnes", &stats.cols);

    println!("\n── Distributions fréquentes ──");
    let mut table = new_table(vec!["Lignes", "Tirages", "Colonnes", "Tirages"]);
    let depth = stats.top_row_patterns.len().max(stats.top_col_patterns.len());
    for i in 0..depth {
        let row = stats.top_row_patterns.get(i);
        let col = stats.top_col_patterns.get(i);
        table.add_row(vec![
            row.map(|r| r.distribution.clone()).unwrap_or_default(),
            row.map(|r| r.count.to_string()).unwrap_or_default(),
            col.map(|c| c.distribution.clone()).unwrap_or_default(),
            col.map(|c| c.count.to_string()).unwrap_or_default(),
        ]);
    }
    println!("{table}");
}

fn hot_cold_table(title: &str, numbers: &[HotColdNumber]) {
    println!("\n── {title} ──");
    let mut table = new_table(vec!["Numéro", "Sorties", "Attendu", "Écart", "Postérieur", "Retard", "Statut"]);
    for n in numbers {
        let color = match n.status {
            HotColdStatus::Hot => Color::Green,
            HotColdStatus::Cold => Color::Red,
            HotColdStatus::Neutral => Color::White,
        };
        table.add_row(vec![
            Cell::new(format!("{:2}", n.number)),
            Cell::new(n.recent_count),
            Cell::new(format!("{:.2}", n.expected_count)),
            Cell::new(format!("{:+.2}", n.deviation)),
            Cell::new(format!("{:.4}", n.posterior)),
            Cell::new(n.gap_since_last),
            Cell::new(n.status.to_string()).fg(color),
        ]);
    }
    println!("{table}");
}

fn display_hot_cold(stats: &HotColdStats) {
    println!(
        "\n🔥 Chaud/froid sur les {} derniers tirages (dernier : {})",
        stats.window, stats.latest_draw_no
    );
    hot_cold_table("Numéros chauds", &stats.hot);
    hot_cold_table("Numéros froids", &stats.cold);
}

pub fn display_methods(methods: &[MethodInfo]) {
    let mut table = new_table(vec!["Code", "Nom", "Description", "Colonne"]);
    for m in methods {
        table.add_row(vec![m.code, m.name, m.description, m.field]);
    }
    println!("{table}");
}

pub fn display_combiners(combiners: &[CombineInfo]) {
    let mut table = new_table(vec!["Code", "Nom", "Description", "Actif"]);
    for c in combiners {
        let active = if c.is_active {
            Cell::new("oui").fg(Color::Green)
        } else {
            Cell::new("non").fg(Color::Red)
        };
        table.add_row(vec![Cell::new(c.code), Cell::new(c.name), Cell::new(c.description), active]);
    }
    println!("{table}");
}

pub fn display_recommendations(recommendations: &[Recommendation]) {
    let Some(first) = recommendations.first() else {
        println!("Aucune grille générée.");
        return;
    };
    println!(
        "\n🎲 Grilles recommandées ({} via {})\n",
        first.methods_used.join(" + "),
        first.combine
    );

    let mut table = new_table(vec!["#", "Numéros", "Bonus", "Confiance"]);
    for (i, rec) in recommendations.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            join_numbers(&rec.numbers),
            rec.bonus.map(|b| format!("{:2}", b)).unwrap_or_else(|| "—".to_string()),
            pct(rec.confidence),
        ]);
    }
    println!("{table}");
}
