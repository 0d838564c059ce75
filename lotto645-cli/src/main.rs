mod display;
mod import;

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use lotto645_analysis::service::{
    get_statistic, rebuild_all, recalculate_all, StatisticKind, StatisticParams,
};
use lotto645_analysis::tracker::repair::repair_zero_probabilities;
use lotto645_analysis::AnalysisConfig;
use lotto645_db::db::{count_draws, db_path, fetch_last_draws, insert_draw, migrate, open_db, DrawUpsert};
use lotto645_db::models::{validate_draw, Draw, PICK_COUNT};
use lotto645_db::rusqlite::Connection;
use lotto645_recommend::{
    list_combine_algorithms, list_methods, CombineAlgorithm, RecommendRequest, Recommender,
};

use crate::display::{
    display_analysis_summary, display_combiners, display_draws, display_import_summary,
    display_methods, display_recommendations, display_repair_report, display_statistic,
};

const EMPTY_DB: &str = "Base vide. Lancez d'abord : lotto645 import";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatKind {
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

impl From<StatKind> for StatisticKind {
    fn from(kind: StatKind) -> Self {
        match kind {
            StatKind::Numbers => StatisticKind::Numbers,
            StatKind::Reappear => StatisticKind::Reappear,
            StatKind::Position => StatisticKind::Position,
            StatKind::Pairs => StatisticKind::Pairs,
            StatKind::Consecutive => StatisticKind::Consecutive,
            StatKind::Ratio => StatisticKind::Ratio,
            StatKind::Color => StatisticKind::Color,
            StatKind::Grid => StatisticKind::Grid,
            StatKind::HotCold => StatisticKind::HotCold,
        }
    }
}

#[derive(Parser)]
#[command(name = "lotto645", about = "Statistiques et recommandations Lotto 6/45")]
struct Cli {
    /// Fichier de configuration JSON (valeurs par défaut s'il est absent)
    #[arg(long, global = true, default_value = "lotto645.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer les tirages depuis un export CSV
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long, default_value = "assets/lotto645.csv")]
        file: PathBuf,
    },

    /// Ajouter ou corriger un tirage manuellement
    Add,

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Mettre à jour les statistiques et les tables incrémentales
    Analyze {
        /// Vider les tables incrémentales et tout recalculer
        #[arg(long)]
        rebuild: bool,
    },

    /// Corriger les probabilités nulles de la table d'analyse
    Repair,

    /// Afficher une statistique
    Stats {
        /// Statistique à calculer
        kind: StatKind,

        /// Taille des classements (défaut : configuration)
        #[arg(short, long)]
        top: Option<usize>,

        /// Fenêtre chaud/froid en tirages (défaut : configuration)
        #[arg(short, long)]
        window: Option<usize>,

        /// Sortie JSON
        #[arg(long)]
        json: bool,
    },

    /// Lister les méthodes de recommandation
    Methods,

    /// Lister les algorithmes de combinaison
    Combiners,

    /// Générer des grilles recommandées
    Recommend {
        /// Codes de méthode (1 à 3)
        #[arg(short, long = "method", required = true, num_args = 1..)]
        methods: Vec<String>,

        /// Algorithme de combinaison
        #[arg(short, long, default_value = "SIMPLE_AVG")]
        combine: CombineAlgorithm,

        /// Poids d'une méthode pour WEIGHTED_AVG (CODE=POIDS)
        #[arg(short, long = "weight", value_parser = parse_weight)]
        weights: Vec<(String, f64)>,

        /// Nombre de grilles (1 à 10)
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,

        /// Ajouter un numéro complémentaire
        #[arg(long)]
        bonus: bool,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,

        /// Sortie JSON
        #[arg(long)]
        json: bool,
    },

    /// Écrire la configuration par défaut
    InitConfig,
}

fn parse_weight(s: &str) -> Result<(String, f64), String> {
    let (code, weight) = s
        .split_once('=')
        .ok_or_else(|| format!("format attendu CODE=POIDS : '{s}'"))?;
    let weight = weight
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("poids invalide '{weight}' : {e}"))?;
    if !weight.is_finite() {
        return Err(format!("poids non fini : {weight}"));
    }
    Ok((code.trim().to_ascii_uppercase(), weight))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = AnalysisConfig::load(&cli.config)
        .with_context(|| format!("Configuration illisible : {:?}", cli.config))?;
    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::Add => cmd_add(&conn),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last),
        Command::Analyze { rebuild } => cmd_analyze(&conn, &config, rebuild),
        Command::Repair => cmd_repair(&conn),
        Command::Stats { kind, top, window, json } => cmd_stats(&conn, &config, kind, top, window, json),
        Command::Methods => {
            display_methods(&list_methods());
            Ok(())
        }
        Command::Combiners => {
            display_combiners(&list_combine_algorithms());
            Ok(())
        }
        Command::Recommend { methods, combine, weights, count, bonus, seed, json } => {
            let mut request = RecommendRequest::new(
                methods.iter().map(|m| m.trim().to_ascii_uppercase()).collect(),
                combine,
            );
            request.weights = weights.into_iter().collect::<HashMap<_, _>>();
            request.count = count;
            request.include_bonus = bonus;
            cmd_recommend(&conn, &request, seed, json)
        }
        Command::InitConfig => cmd_init_config(&cli.config),
    }
}

fn cmd_init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{:?} existe déjà", path);
    }
    AnalysisConfig::default().save(path)?;
    println!("Configuration écrite dans {}", path.display());
    Ok(())
}

fn cmd_import(conn: &Connection, file: &Path) -> Result<()> {
    let result = import::import_csv(conn, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    if count_draws(conn)? == 0 {
        println!("{EMPTY_DB}");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_analyze(conn: &Connection, config: &AnalysisConfig, rebuild: bool) -> Result<()> {
    if count_draws(conn)? == 0 {
        println!("{EMPTY_DB}");
        return Ok(());
    }
    let summary = if rebuild {
        rebuild_all(conn, config)?
    } else {
        recalculate_all(conn, config)?
    };
    display_analysis_summary(&summary);
    Ok(())
}

fn cmd_repair(conn: &Connection) -> Result<()> {
    let report = repair_zero_probabilities(conn)?;
    display_repair_report(&report);
    Ok(())
}

fn cmd_stats(
    conn: &Connection,
    config: &AnalysisConfig,
    kind: StatKind,
    top: Option<usize>,
    window: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut params = StatisticParams::from_config(config);
    if let Some(top) = top {
        params.top_n = top;
    }
    if let Some(window) = window {
        params.window = window;
    }

    let Some(response) = get_statistic(conn, kind.into(), &params, config)? else {
        println!("Historique insuffisant pour cette statistique. Lancez d'abord : lotto645 import");
        return Ok(());
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        display_statistic(&response);
    }
    Ok(())
}

fn cmd_recommend(conn: &Connection, request: &RecommendRequest, seed: Option<u64>, json: bool) -> Result<()> {
    let mut recommender = Recommender::new(seed);
    let recommendations = recommender
        .recommend_from_store(conn, request)
        .context("Recommandation impossible")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
    } else {
        display_recommendations(&recommendations);
    }
    Ok(())
}

fn cmd_add(conn: &Connection) -> Result<()> {
    println!("Ajout d'un tirage manuellement\n");

    let draw_no: u32 = prompt("Numéro du tirage (ex: 1154) : ")?
        .parse()
        .context("Numéro de tirage invalide")?;
    if draw_no == 0 {
        bail!("Le numéro de tirage commence à 1");
    }

    let raw_date = prompt("Date (AAAA-MM-JJ, vide = calculée) : ")?;
    let date = if raw_date.is_empty() {
        import::draw_date(draw_no)?
    } else {
        NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
            .with_context(|| format!("Format de date invalide : '{}'", raw_date))?
            .format("%Y-%m-%d")
            .to_string()
    };

    let (numbers, bonus) = prompt_numbers()?;
    let first_winners = prompt_optional("Gagnants au 1er rang (vide = 0) : ")?;
    let first_prize = prompt_optional("Gain au 1er rang en wons (vide = 0) : ")?;

    let draw = Draw {
        draw_no,
        date,
        numbers,
        bonus,
        first_prize,
        first_winners,
    };

    println!("\nTirage à enregistrer :");
    display_draws(std::slice::from_ref(&draw));

    let confirm = prompt("\nConfirmer ? (o/n) : ")?;
    if confirm.trim().to_lowercase() == "o" {
        match insert_draw(conn, &draw)? {
            DrawUpsert::Inserted => println!("Tirage inséré avec succès."),
            DrawUpsert::Updated => println!("Tirage existant corrigé."),
            DrawUpsert::Unchanged => println!("Ce tirage existe déjà à l'identique."),
        }
    } else {
        println!("Insertion annulée.");
    }

    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    Ok(input.trim().to_string())
}

fn prompt_optional<T: std::str::FromStr + Default>(msg: &str) -> Result<T> {
    loop {
        let input = prompt(msg)?;
        if input.is_empty() {
            return Ok(T::default());
        }
        match input.replace([',', ' '], "").parse::<T>() {
            Ok(v) => return Ok(v),
            Err(_) => println!("Valeur invalide. Réessayez."),
        }
    }
}

fn prompt_numbers() -> Result<([u8; PICK_COUNT], u8)> {
    loop {
        let input = prompt("6 numéros puis le complémentaire (séparés par des espaces, 1-45) : ")?;
        let nums: Result<Vec<u8>, _> = input.split_whitespace().map(|s| s.parse::<u8>()).collect();
        match nums {
            Ok(v) if v.len() == PICK_COUNT + 1 => {
                let mut numbers = [0u8; PICK_COUNT];
                numbers.copy_from_slice(&v[..PICK_COUNT]);
                numbers.sort_unstable();
                let bonus = v[PICK_COUNT];
                match validate_draw(&numbers, bonus) {
                    Ok(()) => return Ok((numbers, bonus)),
                    Err(e) => println!("{}. Réessayez.", e),
                }
            }
            _ => println!("Entrez exactement 7 numéros. Réessayez."),
        }
    }
}
