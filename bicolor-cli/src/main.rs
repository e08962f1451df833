mod display;
mod import;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use bicolor_db::db::{
    self, count_draws, db_path, fetch_last_draws, insert_prediction, list_unresolved, migrate,
    open_db, search_draws, search_predictions, update_prediction_result, DrawFilter,
};
use bicolor_db::history::SqliteHistory;
use bicolor_db::models::{Pick, Pool};
use bicolor_db::rusqlite::Connection;
use bicolor_engine::constraints::{parse_num_set, PredictOptions, ZoneRatio, DEFAULT_MAX_TRY};
use bicolor_engine::engine::{DEFAULT_STATS_WINDOW, DEFAULT_TREND_WINDOW, MAX_PICKS};
use bicolor_engine::reconcile::reconcile;
use bicolor_engine::{Engine, EngineConfig};
use crate::display::{
    display_backtest, display_disclaimer, display_draw_page, display_draws, display_import_summary,
    display_number_stats, display_predict, display_predictions, display_recommend, display_reconcile,
};

#[derive(Parser)]
#[command(name = "bicolor", about = "Analyse statistique des tirages du double chromosphère")]
struct Cli {
    /// Chemin de la base SQLite (défaut : data/bicolor.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Fichier de configuration JSON du moteur
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Sortie JSON au lieu des tableaux
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

/// Contraintes de génération ; une valeur mal formée équivaut à aucune contrainte.
#[derive(Args, Debug)]
struct ConstraintArgs {
    #[arg(long)]
    min_sum: Option<u32>,
    #[arg(long)]
    max_sum: Option<u32>,
    #[arg(long)]
    min_span: Option<u32>,
    #[arg(long)]
    max_span: Option<u32>,
    #[arg(long)]
    min_odd: Option<u32>,
    #[arg(long)]
    max_odd: Option<u32>,

    /// Répartition par zone, ex. 2:2:2
    #[arg(long)]
    zone: Option<String>,

    /// Rouges imposés, ex. "1,33"
    #[arg(long)]
    dan_reds: Option<String>,
    /// Rouges exclus
    #[arg(long)]
    kill_reds: Option<String>,
    /// Bleus autorisés
    #[arg(long)]
    dan_blues: Option<String>,
    /// Bleus exclus
    #[arg(long)]
    kill_blues: Option<String>,

    /// Essais maximum (10 à 500)
    #[arg(long, default_value_t = DEFAULT_MAX_TRY)]
    max_try: u32,
}

impl ConstraintArgs {
    fn to_options(&self) -> PredictOptions {
        let set = |raw: &Option<String>, pool| raw.as_deref().map(|s| parse_num_set(s, pool)).unwrap_or_default();
        PredictOptions {
            min_sum: self.min_sum,
            max_sum: self.max_sum,
            min_span: self.min_span,
            max_span: self.max_span,
            min_odd: self.min_odd,
            max_odd: self.max_odd,
            zone_ratio: self.zone.as_deref().and_then(ZoneRatio::parse),
            dan_reds: set(&self.dan_reds, Pool::Red),
            kill_reds: set(&self.kill_reds, Pool::Red),
            dan_blues: set(&self.dan_blues, Pool::Blue),
            kill_blues: set(&self.kill_blues, Pool::Blue),
            max_try: DEFAULT_MAX_TRY,
        }
        .with_max_try(self.max_try)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Importer les tirages depuis un fichier CSV (draw_id;date;r1..r6;bleu)
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Rechercher des tirages
    Search {
        #[arg(long)]
        from_id: Option<String>,
        #[arg(long)]
        to_id: Option<String>,
        /// Date de début (AAAA-MM-JJ)
        #[arg(long)]
        from_date: Option<NaiveDate>,
        /// Date de fin (AAAA-MM-JJ)
        #[arg(long)]
        to_date: Option<NaiveDate>,
        /// Tirages contenant ce rouge
        #[arg(long)]
        red: Option<u8>,
        /// Tirages avec ce bleu
        #[arg(long)]
        blue: Option<u8>,
        /// Page, à partir de 1
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "20")]
        size: u32,
    },

    /// Numéros chauds et froids
    HotCold {
        /// Fenêtre d'analyse (20 à 1000 tirages)
        #[arg(short, long, default_value_t = DEFAULT_STATS_WINDOW)]
        latest: usize,
    },

    /// Retard courant de chaque numéro
    Omission {
        /// Fenêtre d'analyse (20 à 2000 tirages)
        #[arg(short, long, default_value_t = DEFAULT_STATS_WINDOW)]
        latest: usize,
    },

    /// Historique chronologique des derniers tirages
    Trend {
        /// Fenêtre d'analyse (10 à 5000 tirages)
        #[arg(short, long, default_value_t = DEFAULT_TREND_WINDOW)]
        latest: usize,
    },

    /// Générer des grilles
    Predict {
        /// Fenêtre d'analyse (20 à 2000 tirages)
        #[arg(short, long, default_value_t = DEFAULT_STATS_WINDOW)]
        latest: usize,

        /// frequency_top, omission_top, hybrid, weighted_random, zone_balanced, markov, bayes, ml
        #[arg(short, long, default_value = "frequency_top")]
        strategy: String,

        /// Nombre de grilles (1 à 20)
        #[arg(short, long, default_value = "1")]
        count: usize,

        #[command(flatten)]
        constraints: ConstraintArgs,
    },

    /// Évaluer une stratégie sur l'historique
    Backtest {
        #[arg(short, long, default_value = "frequency_top")]
        strategy: String,

        /// Fenêtre d'entraînement (50 minimum)
        #[arg(long, default_value = "200")]
        train: usize,

        /// Points de test (10 minimum)
        #[arg(long, default_value = "50")]
        test: usize,

        #[command(flatten)]
        constraints: ConstraintArgs,
    },

    /// Comparer les stratégies candidates et retenir la meilleure
    Recommend {
        #[arg(long, default_value = "200")]
        train: usize,

        #[arg(long, default_value = "80")]
        test: usize,
    },

    /// Enregistrer une prédiction pour un tirage à venir
    SavePrediction {
        /// Identifiant du tirage visé
        #[arg(long)]
        draw_id: String,

        /// Six rouges, ex. "3,8,12,19,27,33"
        #[arg(long)]
        reds: String,

        #[arg(long)]
        blue: u8,
    },

    /// Lister les prédictions enregistrées
    Predictions {
        #[arg(long)]
        draw_id: Option<String>,
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "20")]
        size: u32,
    },

    /// Rapprocher les prédictions des tirages publiés
    Reconcile {
        /// Nombre maximum de prédictions traitées (1 à 5000)
        #[arg(long, default_value_t = db::MAX_UNRESOLVED)]
        limit: u32,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let path = cli.db.clone().unwrap_or_else(db_path);
    let conn = open_db(&path)?;
    migrate(&conn)?;

    let config = match &cli.config {
        Some(file) => EngineConfig::load(file)?,
        None => EngineConfig::default(),
    };
    let engine = Engine::new(config);
    let history = SqliteHistory::new(&conn);
    let json = cli.json;

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file, json),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last, json),
        Command::Search { from_id, to_id, from_date, to_date, red, blue, page, size } => {
            let filter = DrawFilter {
                from_id,
                to_id,
                from_date,
                to_date,
                include_red: red,
                include_blue: blue,
                page: page.saturating_sub(1),
                size,
            };
            let result = search_draws(&conn, &filter)?;
            if json {
                return print_json(&result);
            }
            display_draw_page(&result);
            Ok(())
        }
        Command::HotCold { latest } => {
            let report = engine.hot_cold(&history, latest.clamp(20, 1000))?;
            if json {
                return print_json(&report);
            }
            display_number_stats("Fréquences", "Sorties", &report.report);
            display_disclaimer(report.disclaimer);
            Ok(())
        }
        Command::Omission { latest } => {
            let report = engine.omission(&history, latest.clamp(20, 2000))?;
            if json {
                return print_json(&report);
            }
            display_number_stats("Retards", "Retard", &report.report);
            display_disclaimer(report.disclaimer);
            Ok(())
        }
        Command::Trend { latest } => {
            let report = engine.trend(&history, latest.clamp(10, 5000))?;
            if json {
                return print_json(&report);
            }
            display_draws(&report.report.draws);
            display_disclaimer(report.disclaimer);
            Ok(())
        }
        Command::Predict { latest, strategy, count, constraints } => {
            let options = constraints.to_options();
            let spinner = spinner("Génération des grilles...")?;
            let report = engine.predict(&history, latest.clamp(20, 2000), &strategy, count.clamp(1, MAX_PICKS), &options);
            spinner.finish_and_clear();
            let report = report?;
            if json {
                return print_json(&report);
            }
            display_predict(&report.report);
            display_disclaimer(report.disclaimer);
            Ok(())
        }
        Command::Backtest { strategy, train, test, constraints } => {
            let options = constraints.to_options();
            let spinner = spinner(&format!("Backtest {} ({}+{})...", strategy.trim(), train, test))?;
            let report = engine.backtest(&history, &strategy, train, test, &options);
            spinner.finish_and_clear();
            let report = report?;
            if json {
                return print_json(&report);
            }
            display_backtest(&report.report);
            display_disclaimer(report.disclaimer);
            Ok(())
        }
        Command::Recommend { train, test } => {
            let spinner = spinner("Évaluation des stratégies candidates...")?;
            let report = engine.recommend(&history, train, test);
            spinner.finish_and_clear();
            let report = report?;
            if json {
                return print_json(&report);
            }
            display_recommend(&report.report);
            display_disclaimer(report.disclaimer);
            Ok(())
        }
        Command::SavePrediction { draw_id, reds, blue } => cmd_save_prediction(&conn, &draw_id, &reds, blue),
        Command::Predictions { draw_id, page, size } => {
            let result = search_predictions(&conn, draw_id.as_deref(), page.saturating_sub(1), size)?;
            if json {
                return print_json(&result);
            }
            display_predictions(&result);
            Ok(())
        }
        Command::Reconcile { limit } => {
            let unresolved = list_unresolved(&conn, limit.clamp(1, db::MAX_UNRESOLVED))?;
            let summary = reconcile(&unresolved, &history, |record, outcome| {
                update_prediction_result(&conn, record.id, outcome)
            })?;
            if json {
                return print_json(&summary);
            }
            display_reconcile(&summary);
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Échec de la sérialisation JSON")?);
    Ok(())
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn cmd_import(conn: &Connection, file: &Path, json: bool) -> Result<()> {
    let result = import::import_csv(conn, file)?;
    if json {
        return print_json(&result);
    }
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32, json: bool) -> Result<()> {
    let n = count_draws(conn)?;
    if n == 0 && !json {
        println!("Base vide. Lancez d'abord : bicolor import --file <csv>");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    if json {
        return print_json(&draws);
    }
    display_draws(&draws);
    Ok(())
}

fn cmd_save_prediction(conn: &Connection, draw_id: &str, reds: &str, blue: u8) -> Result<()> {
    let draw_id = draw_id.trim();
    if draw_id.is_empty() {
        bail!("Identifiant de tirage vide");
    }
    let reds: Vec<u8> = parse_num_set(reds, Pool::Red).into_iter().collect();
    if reds.len() != 6 || !Pool::Blue.contains(blue) {
        bail!("Il faut 6 rouges distincts (1-33) et un bleu (1-16)");
    }
    let Some(pick) = Pick::from_slice(&reds, blue) else {
        bail!("Grille invalide");
    };

    if insert_prediction(conn, draw_id, &pick)? {
        println!("Prédiction {} enregistrée pour le tirage {}.", pick, draw_id);
    } else {
        println!("Cette prédiction existe déjà pour le tirage {} (doublon ignoré).", draw_id);
    }
    Ok(())
}
