use lotto645_db::db;
use lotto645_db::models::{NumberStat, ReappearStat, StatTable};
use lotto645_db::rusqlite::Connection;
use serde::Serialize;

use crate::aggregate::{self, ColorStats, ConsecutiveStats, GridStats, PairStats, PositionStats, RatioStats};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::hot_cold::{hot_cold_stats, HotColdStats};
use crate::tracker::posterior::update_posterior_stats;
use crate::tracker::unified::update_analysis_stats;
use crate::tracker::TrackerRun;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub total_draws: u32,
    pub latest_draw_no: u32,
    pub number_stats: usize,
    pub reappear_stats: usize,
    pub posterior: TrackerRun,
    pub analysis: TrackerRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticKind {
    Numbers,
    Reappear,
    Position,
    Pairs,
    Consecutive,
    Ratio,
    Color,
    Grid,
    HotCold,
}

impl StatisticKind {
    pub const ALL: [StatisticKind; 9] = [
        StatisticKind::Numbers,
        StatisticKind::Reappear,
        StatisticKind::Position,
        StatisticKind::Pairs,
        StatisticKind::Consecutive,
        StatisticKind::Ratio,
        StatisticKind::Color,
        StatisticKind::Grid,
        StatisticKind::HotCold,
    ];
}

#[derive(Debug, Clone, Copy)]
pub struct StatisticParams {
    pub top_n: usize,
    /// 0 : fenêtre par défaut.
    pub window: usize,
}

impl StatisticParams {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            top_n: config.top_n,
            window: config.hot_cold_window,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum StatisticResponse {
    Numbers(Vec<NumberStat>),
    Reappear(Vec<ReappearStat>),
    Position(PositionStats),
    Pairs(PairStats),
    Consecutive(ConsecutiveStats),
    Ratio(RatioStats),
    Color(ColorStats),
    Grid(GridStats),
    HotCold(HotColdStats),
}

/// Analyse complète : fréquences et réapparitions remplacées en bloc, puis
/// avancement des deux tables incrémentales.
pub fn recalculate_all(conn: &Connection, config: &AnalysisConfig) -> Result<AnalysisSummary, AnalysisError> {
    config.validate()?;
    let draws = db::all_draws(conn)?;
    log::info!("analyse : {} tirages en base", draws.len());

    let mut number_count = 0;
    if let Some(stats) = aggregate::number_stats(&draws) {
        db::replace_number_stats(conn, &stats)?;
        number_count = stats.len();
    }
    let mut reappear_count = 0;
    if let Some(stats) = aggregate::reappear_stats(&draws) {
        db::replace_reappear_stats(conn, &stats)?;
        reappear_count = stats.len();
    }

    let posterior = update_posterior_stats(conn, config)?;
    let analysis = update_analysis_stats(conn, config)?;

    Ok(AnalysisSummary {
        total_draws: draws.len() as u32,
        latest_draw_no: draws.last().map(|d| d.draw_no).unwrap_or(0),
        number_stats: number_count,
        reappear_stats: reappear_count,
        posterior,
        analysis,
    })
}

/// Vide les tables incrémentales puis relance l'analyse complète.
pub fn rebuild_all(conn: &Connection, config: &AnalysisConfig) -> Result<AnalysisSummary, AnalysisError> {
    log::warn!("reconstruction : suppression des tables incrémentales");
    db::clear_table(conn, StatTable::Posterior)?;
    db::clear_table(conn, StatTable::Analysis)?;
    recalculate_all(conn, config)
}

/// Calcule une statistique à la demande ; `None` si l'historique ne suffit pas.
pub fn get_statistic(
    conn: &Connection,
    kind: StatisticKind,
    params: &StatisticParams,
    config: &AnalysisConfig,
) -> Result<Option<StatisticResponse>, AnalysisError> {
    let draws = db::all_draws(conn)?;
    let top_n = params.top_n;

    let response = match kind {
        StatisticKind::Numbers => aggregate::number_stats(&draws).map(StatisticResponse::Numbers),
        StatisticKind::Reappear => aggregate::reappear_stats(&draws).map(StatisticResponse::Reappear),
        StatisticKind::Position => aggregate::position_stats(&draws).map(StatisticResponse::Position),
        StatisticKind::Pairs => aggregate::pair_stats(&draws, top_n).map(StatisticResponse::Pairs),
        StatisticKind::Consecutive => aggregate::consecutive_stats(&draws).map(StatisticResponse::Consecutive),
        StatisticKind::Ratio => aggregate::ratio_stats(&draws).map(StatisticResponse::Ratio),
        StatisticKind::Color => aggregate::color_stats(&draws, top_n).map(StatisticResponse::Color),
        StatisticKind::Grid => aggregate::grid_stats(&draws, top_n).map(StatisticResponse::Grid),
        StatisticKind::HotCold => hot_cold_stats(&draws, params.window, config).map(StatisticResponse::HotCold),
    };
    Ok(response)
}
