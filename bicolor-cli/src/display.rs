use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};

use crate::import::ImportResult;
use bicolor_db::db::Page;
use bicolor_db::models::{format_reds, Draw, NumberCount, PredictionRecord};
use bicolor_engine::backtest::BacktestReport;
use bicolor_engine::engine::{NumberStats, PredictReport, RecommendReport};
use bicolor_engine::reconcile::ReconcileSummary;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "—".to_string())
}

pub fn display_disclaimer(disclaimer: &str) {
    println!("\n⚠️  {disclaimer}");
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Tirage", "Date", "Rouges", "Bleu"]);
    for draw in draws {
        table.add_row(vec![
            Cell::new(&draw.draw_id),
            Cell::new(or_dash(draw.date)),
            Cell::new(format_reds(&draw.reds)).fg(Color::Red),
            Cell::new(format!("{:02}", draw.blue)).fg(Color::Blue),
        ]);
    }
    println!("{table}");
}

pub fn display_draw_page(page: &Page<Draw>) {
    display_draws(&page.rows);
    println!("Page {} ({} par page), {} tirages au total", page.page + 1, page.size, page.total);
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

fn display_counts(title: &str, value_label: &str, counts: &[NumberCount]) {
    println!("\n── {title} ──");
    let mut table = new_table(vec!["Numéro", value_label]);
    for nc in counts {
        table.add_row(vec![format!("{:02}", nc.number), nc.count.to_string()]);
    }
    println!("{table}");
}

pub fn display_number_stats(heading: &str, value_label: &str, stats: &NumberStats) {
    println!("\n📊 {} sur les {} derniers tirages", heading, stats.draws);
    display_counts("Rouges (1-33)", value_label, &stats.red);
    display_counts("Bleus (1-16)", value_label, &stats.blue);
}

pub fn display_predict(report: &PredictReport) {
    let strategy = match &report.alias {
        Some(alias) => format!("{} ({})", report.strategy, alias),
        None => report.strategy.to_string(),
    };
    println!("\n🎲 Stratégie {} sur {} tirages", strategy, report.latest_n);

    if let Some(explain) = &report.explain {
        println!(
            "   Mode {} : poids {} (cache {} min)",
            explain.mode, explain.weights, explain.cache_ttl_minutes
        );
    }
    if let Some(error) = &report.error {
        println!("❌ {error}");
        return;
    }

    let mut table = new_table(vec!["#", "Rouges", "Bleu"]);
    for (i, pick) in report.picks.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(format_reds(&pick.reds)).fg(Color::Red),
            Cell::new(format!("{:02}", pick.blue)).fg(Color::Blue),
        ]);
    }
    println!("{table}");
}

pub fn display_backtest(report: &BacktestReport) {
    println!(
        "\n📈 Backtest {} : entraînement {} tirages, {} points de test",
        report.strategy, report.train_window, report.test_count
    );
    if let Some(error) = &report.error {
        println!("❌ {error}");
        return;
    }
    let Some(summary) = &report.summary else {
        return;
    };

    println!("  Rouges trouvés     : {} (moyenne {:.3})", summary.red_hit_total, summary.avg_red_hits);
    println!("  Bleus trouvés      : {} (taux {:.3})", summary.blue_hit_total, summary.blue_hit_rate);
    println!("  Bleu + rouge(s)    : {}", summary.both_hit_count);
    println!("  Taux ≥ 2 rouges    : {:.3}", summary.red2plus_rate);
    println!("  Score              : {:.4}", summary.score);

    let mut dist = new_table(vec!["Rouges trouvés", "Tirages"]);
    for (hits, count) in summary.red_hit_dist.iter().enumerate() {
        dist.add_row(vec![hits.to_string(), count.to_string()]);
    }
    println!("{dist}");

    let mut samples = new_table(vec!["Tirage", "Prédit", "Réel", "Rouges", "Bleu"]);
    for s in &summary.samples {
        let blue = if s.blue_hit { Cell::new("✓").fg(Color::Green) } else { Cell::new("✗") };
        samples.add_row(vec![
            Cell::new(&s.actual_draw_id),
            Cell::new(s.predicted.to_string()),
            Cell::new(format!("{} + {:02}", format_reds(&s.actual_reds), s.actual_blue)),
            Cell::new(s.red_hits),
            blue,
        ]);
    }
    println!("{samples}");
}

pub fn display_recommend(report: &RecommendReport) {
    println!(
        "\n🏆 Recommandation : entraînement {} tirages, {} points de test\n",
        report.train_window, report.test_count
    );

    let mut table = new_table(vec!["#", "Stratégie", "Zones", "Somme", "Écart", "Score"]);
    for (i, candidate) in report.candidates.iter().enumerate() {
        let is_best = report.best.as_ref().is_some_and(|b| {
            b.strategy == candidate.strategy && b.options == candidate.options
        });
        let score = match (&candidate.summary, &candidate.error) {
            (Some(s), _) => format!("{:.4}", s.score),
            (None, Some(e)) => e.to_string(),
            (None, None) => "—".to_string(),
        };
        let opt = &candidate.options;
        let bound = |lo: Option<u32>, hi: Option<u32>| match (lo, hi) {
            (None, None) => "—".to_string(),
            (lo, hi) => format!("{}..{}", or_dash(lo), or_dash(hi)),
        };
        let score_cell = if is_best { Cell::new(score).fg(Color::Green) } else { Cell::new(score) };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(candidate.strategy),
            Cell::new(or_dash(opt.zone_ratio)),
            Cell::new(bound(opt.min_sum, opt.max_sum)),
            Cell::new(bound(opt.min_span, opt.max_span)),
            score_cell,
        ]);
    }
    println!("{table}");

    match &report.best {
        Some(best) => println!("Meilleur candidat : {} ({:.4})", best.strategy, best.score().unwrap_or_default()),
        None => println!("Aucun candidat n'a pu être évalué."),
    }
}

pub fn display_predictions(page: &Page<PredictionRecord>) {
    if page.rows.is_empty() {
        println!("Aucune prédiction enregistrée.");
        return;
    }

    let mut table = new_table(vec!["Id", "Tirage", "Prédit", "Réel", "Rouges", "Bleu", "Taux"]);
    for r in &page.rows {
        let actual = match (&r.actual_reds, r.actual_blue) {
            (Some(reds), Some(blue)) => format!("{} + {:02}", reds, blue),
            _ => "en attente".to_string(),
        };
        table.add_row(vec![
            r.id.to_string(),
            r.draw_id.clone(),
            format!("{} + {:02}", r.predict_reds, r.predict_blue),
            actual,
            or_dash(r.red_hit),
            or_dash(r.blue_hit.map(|b| if b { "✓" } else { "✗" })),
            or_dash(r.hit_rate.map(|h| format!("{:.4}", h))),
        ]);
    }
    println!("{table}");
    println!("Page {} ({} par page), {} prédictions au total", page.page + 1, page.size, page.total);
}

pub fn display_reconcile(summary: &ReconcileSummary) {
    println!("Rapprochement terminé :");
    println!("  Prédictions lues      : {}", summary.scanned);
    println!("  Mises à jour          : {}", summary.updated);
    println!("  Tirages introuvables  : {}", summary.not_found);
}
