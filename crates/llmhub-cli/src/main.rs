use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use llmhub_core::{
    api::{StoreClient, DEFAULT_LIMIT},
    config::{load_config, EngineConfig},
    engine::{Recommendation, RecommendationRequest, Recommender},
    filter::{HardFilters, Rejection},
    model::{CandidateModel, Confidence},
    pricing::fmt_usd_cny,
    profile::{OptimizationProfile, SpeedPreference},
    provider::Region,
    scenario::{load_weight_table, Scenario, ScenarioWeightResolver},
    simple::{evaluate_with_snapshots, SimplePayload, SimpleResponse},
    snapshot::{self, latest_per_slug, SnapshotOrigin},
};
use tracing_subscriber::EnvFilter;

// ── Palette ──────────────────────────────────────────────────────────

fn s_header() -> Style { Style::new().color256(252).bold() }  // bright gray, bold
fn s_dim() -> Style    { Style::new().color256(248) }         // light gray
fn s_tree() -> Style   { Style::new().color256(245) }         // mid gray
fn s_hint() -> Style   { Style::new().color256(243) }         // soft gray
fn s_hot() -> Style    { Style::new().color256(114) }         // green
fn s_warm() -> Style   { Style::new().color256(214) }         // amber
fn s_err() -> Style    { Style::new().color256(167) }         // red
fn s_price() -> Style  { Style::new().color256(109) }         // teal
fn s_bold() -> Style   { Style::new().bold() }
fn s_label() -> Style  { Style::new().color256(146) }         // muted lavender

fn sep(width: usize) -> String {
    s_tree().apply_to("\u{2500}".repeat(width)).to_string()
}

fn score_color(v: f64) -> Color {
    if v >= 70.0 {
        Color::AnsiValue(114)
    } else if v >= 40.0 {
        Color::AnsiValue(248)
    } else {
        Color::AnsiValue(214)
    }
}

fn confidence_str(c: Confidence) -> String {
    match c {
        Confidence::High   => format!("{}", s_hot().apply_to("\u{25cf} high")),
        Confidence::Medium => format!("{}", s_warm().apply_to("\u{25d0} medium")),
        Confidence::Low    => format!("{}", s_dim().apply_to("\u{25cb} low")),
    }
}

fn header_cells(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|n| Cell::new(n).fg(Color::AnsiValue(243)))
        .collect()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

// ── CLI Args ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "llmhub",
    about = "Rank AI models for a usage scenario from benchmark, speed and price telemetry",
    version,
    after_help = "examples:\n  \
        llmhub recommend code --sub generation\n  \
        llmhub recommend agent --sub tool_use --tools --region cn\n  \
        llmhub recommend rag --sub long_doc --min-context 200000 --profile best_value\n  \
        llmhub evaluate --input payload.json --top-k 3\n  \
        llmhub scenarios\n  \
        llmhub sync                              (refresh cached snapshots)"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print JSON instead of tables.
    #[arg(long, short, global = true)]
    json: bool,

    /// Debug logging (RUST_LOG overrides).
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Engine settings TOML.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Scenario weight table TOML (defaults to the bundled table).
    #[arg(long, global = true)]
    weights: Option<PathBuf>,

    /// Snapshot JSON file (defaults to the sync cache, then the bundled sample).
    #[arg(long, global = true)]
    snapshots: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank snapshot models for a scenario.
    Recommend {
        /// Scenario category, e.g. code, rag, agent
        category: String,
        /// Sub-category; repeat to blend several.
        #[arg(long = "sub", short)]
        subs: Vec<String>,
        #[arg(long, short, default_value = "global")]
        region: Region,
        #[arg(long, short, default_value = "balanced")]
        profile: OptimizationProfile,
        #[arg(long, default_value = "balanced")]
        speed: SpeedPreference,
        /// Minimum context window in tokens.
        #[arg(long)]
        min_context: Option<u64>,
        #[arg(long)]
        tools: bool,
        #[arg(long)]
        json_schema: bool,
        #[arg(long)]
        multimodal: bool,
        /// Maximum time to first token, seconds.
        #[arg(long)]
        max_ttft: Option<f64>,
        /// Maximum blended USD per 1M tokens.
        #[arg(long)]
        max_price: Option<f64>,
        #[arg(long, short = 'k')]
        top_k: Option<usize>,
        /// End of the recent reference window (YYYY-MM-DD).
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Score a simplified payload (pre-shaped candidates on 0-10 scales).
    Evaluate {
        /// Payload JSON file; candidates come from snapshots when omitted.
        #[arg(long, short)]
        input: PathBuf,
        #[arg(long, short = 'k')]
        top_k: Option<usize>,
    },
    /// List scenario categories, sub-categories and profiles.
    Scenarios,
    /// Download the latest snapshots into the local cache.
    Sync {
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Recommend {
            ref category,
            ref subs,
            region,
            profile,
            speed,
            min_context,
            tools,
            json_schema,
            multimodal,
            max_ttft,
            max_price,
            top_k,
            as_of,
        } => {
            let request = RecommendationRequest {
                scenario: Scenario {
                    category: category.clone(),
                    sub_categories: subs.clone(),
                },
                region,
                profile,
                speed,
                filters: HardFilters {
                    min_context_window: min_context,
                    require_tools: tools,
                    require_structured_output: json_schema,
                    require_multimodal: multimodal,
                    max_ttft_seconds: max_ttft,
                    max_price_per_m: max_price,
                },
                top_k,
                as_of,
            };
            cmd_recommend(&cli, &request)?;
        }
        Commands::Evaluate { ref input, top_k } => {
            cmd_evaluate(&cli, input, top_k)?;
        }
        Commands::Scenarios => {
            cmd_scenarios(&cli)?;
        }
        Commands::Sync { limit } => {
            cmd_sync(limit).await?;
        }
    }
    Ok(())
}

// ── Setup ────────────────────────────────────────────────────────────

fn build_recommender(cli: &Cli) -> anyhow::Result<Recommender> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    let resolver = match &cli.weights {
        Some(path) => ScenarioWeightResolver::new(Arc::new(load_weight_table(path)?)),
        None => ScenarioWeightResolver::bundled()?,
    };
    Ok(Recommender::new(resolver, config))
}

fn load_rows(cli: &Cli) -> anyhow::Result<(Vec<CandidateModel>, SnapshotOrigin)> {
    let (rows, origin) = snapshot::resolve_snapshots(cli.snapshots.as_deref())?;
    tracing::debug!(rows = rows.len(), origin = %origin, "loaded snapshots");
    Ok((rows, origin))
}

// ── Recommend ────────────────────────────────────────────────────────

fn cmd_recommend(cli: &Cli, request: &RecommendationRequest) -> anyhow::Result<()> {
    let recommender = build_recommender(cli)?;
    let (rows, origin) = load_rows(cli)?;
    let candidates: Vec<CandidateModel> = latest_per_slug(&rows).into_iter().cloned().collect();

    let out = recommender.recommend(&candidates, request)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    print_recommendation(&out, request, recommender.config(), &origin);
    Ok(())
}

fn print_recommendation(
    out: &Recommendation,
    request: &RecommendationRequest,
    config: &EngineConfig,
    origin: &SnapshotOrigin,
) {
    println!();
    println!(
        "{}  {}",
        s_header().apply_to(format!("recommendations for {}", request.scenario.label())),
        s_label().apply_to(format!(
            "{} \u{00b7} {} \u{00b7} {}",
            request.profile,
            request.region,
            match request.speed {
                SpeedPreference::Balanced => "balanced speed",
                SpeedPreference::LowLatency => "low latency",
                SpeedPreference::HighThroughput => "high throughput",
            }
        ))
    );
    println!("{}", sep(72));

    if out.no_feasible_candidates() {
        println!(
            "  {}",
            s_warm().apply_to("no matches, adjust filters")
        );
        print_rejections(&out.rejected);
        println!("{}", sep(72));
        println!();
        return;
    }

    let mut table = new_table();
    table.set_header(header_cells(&[
        "  #", "Model", "Total", "Quality", "Cost", "Latency", "Throughput", "Confidence",
    ]));
    for r in &out.results {
        let s = &r.scores;
        table.add_row(vec![
            Cell::new(format!("  {}", r.rank)).fg(Color::AnsiValue(248)),
            Cell::new(r.candidate.display_name()).fg(Color::AnsiValue(252)),
            Cell::new(format!("{:.1}", s.total)).fg(score_color(s.total)),
            Cell::new(format!("{:.1}", s.quality)).fg(score_color(s.quality)),
            Cell::new(format!("{:.1}", s.cost)).fg(score_color(s.cost)),
            Cell::new(format!("{:.1}", s.latency)).fg(score_color(s.latency)),
            Cell::new(format!("{:.1}", s.throughput)).fg(score_color(s.throughput)),
            Cell::new(confidence_str(r.confidence)),
        ]);
    }
    println!("{table}");
    println!("{}", sep(72));

    for r in &out.results {
        let price = r
            .candidate
            .blended_price()
            .map(|p| format!("{}/1M", fmt_usd_cny(p, config.usd_to_cny)))
            .unwrap_or_default();
        let ctx = r
            .candidate
            .context_window()
            .map(CandidateModel::fmt_context)
            .unwrap_or_default();
        println!(
            "  {} {}  {}  {}",
            s_dim().apply_to(format!("#{}", r.rank)),
            s_bold().apply_to(r.candidate.display_name()),
            s_price().apply_to(price),
            s_label().apply_to(ctx)
        );
        for e in &r.explanations {
            println!("    {} {}", s_tree().apply_to("\u{2022}"), e);
        }
        for t in &r.tradeoffs {
            println!("    {} {}", s_warm().apply_to("!"), s_dim().apply_to(t));
        }
        println!();
    }

    println!("{}", sep(72));
    println!(
        "{}",
        s_hint().apply_to(format!(
            "  reference pool: {:?} ({} models)   {} rejected   source: {origin}",
            out.reference_pool.tier,
            out.reference_pool.size,
            out.rejected.len()
        ))
    );
    println!();
}

fn print_rejections(rejected: &[Rejection]) {
    if rejected.is_empty() {
        return;
    }
    let mut table = new_table();
    table.set_header(header_cells(&["  Rejected", "Reasons"]));
    for r in rejected {
        let reasons: Vec<&str> = r.reasons.iter().map(|x| x.code()).collect();
        table.add_row(vec![
            Cell::new(format!("  {}", r.name)).fg(Color::AnsiValue(248)),
            Cell::new(reasons.join(", ")).fg(Color::AnsiValue(167)),
        ]);
    }
    println!("{table}");
}

// ── Evaluate ─────────────────────────────────────────────────────────

fn cmd_evaluate(cli: &Cli, input: &Path, top_k: Option<usize>) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(input)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", input.display()))?;
    let payload = SimplePayload::from_value(serde_json::from_str(&text)?)?;

    let mut out = if payload.candidates.is_empty() {
        let (rows, origin) = load_rows(cli)?;
        evaluate_with_snapshots(payload, &rows, &origin.to_string())?
    } else {
        evaluate_with_snapshots(payload, &[], "")?
    };
    if let Some(k) = top_k {
        out.ranking.truncate(k);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    print_evaluation(&out);
    Ok(())
}

fn print_evaluation(out: &SimpleResponse) {
    let w = &out.weights_normalized;
    println!();
    println!(
        "{}  {}",
        s_header().apply_to("evaluation"),
        s_label().apply_to(format!(
            "quality {:.2} \u{00b7} cost {:.2} \u{00b7} latency {:.2} \u{00b7} reliability {:.2} \u{00b7} fit {:.2}",
            w.quality, w.cost, w.latency, w.reliability, w.integration_fit
        ))
    );
    println!("{}", sep(72));

    if out.no_feasible_candidates() {
        println!("  {}", s_warm().apply_to("no matches, adjust filters"));
    } else {
        let mut table = new_table();
        table.set_header(header_cells(&[
            "  #", "Model", "Provider", "Score", "Quality", "Cost", "Latency", "Reliab.", "Fit", "$/1K",
        ]));
        for (i, r) in out.ranking.iter().enumerate() {
            let d = &r.dimension_scores_0_10;
            table.add_row(vec![
                Cell::new(format!("  {}", i + 1)).fg(Color::AnsiValue(248)),
                Cell::new(&r.name).fg(Color::AnsiValue(252)),
                Cell::new(&r.provider).fg(Color::AnsiValue(146)),
                Cell::new(format!("{:.2}", r.weighted_score_0_10))
                    .fg(score_color(r.weighted_score_0_10 * 10.0)),
                Cell::new(format!("{:.1}", d.quality)).fg(Color::AnsiValue(248)),
                Cell::new(format!("{:.1}", d.cost)).fg(Color::AnsiValue(248)),
                Cell::new(format!("{:.1}", d.latency)).fg(Color::AnsiValue(248)),
                Cell::new(format!("{:.1}", d.reliability)).fg(Color::AnsiValue(248)),
                Cell::new(format!("{:.1}", d.integration_fit)).fg(Color::AnsiValue(248)),
                Cell::new(format!("${:.6}", r.estimated_cost_per_1k_usd)).fg(Color::AnsiValue(109)),
            ]);
        }
        println!("{table}");
    }
    print_rejections(&out.rejected);
    println!("{}", sep(72));

    for a in &out.assumptions {
        println!("{}", s_hint().apply_to(format!("  assumption: {a}")));
    }
    if let Some(src) = &out.source {
        println!(
            "{}",
            s_hint().apply_to(format!(
                "  source: {}   snapshot {}   {}/{} rows kept",
                src.source,
                src.snapshot_date.map(|d| d.to_string()).unwrap_or_else(|| "?".into()),
                src.filtered_rows,
                src.total_rows
            ))
        );
    }
    println!();
}

// ── Scenarios ────────────────────────────────────────────────────────

fn cmd_scenarios(cli: &Cli) -> anyhow::Result<()> {
    let recommender = build_recommender(cli)?;
    let table = recommender.resolver().table();

    if cli.json {
        let catalog: serde_json::Map<String, serde_json::Value> = table
            .catalog()
            .map(|(c, subs)| (c.to_string(), serde_json::json!(subs)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    println!();
    println!("{}", s_header().apply_to("scenarios"));
    println!("{}", sep(64));
    for (category, subs) in table.catalog() {
        println!(
            "  {:<12} {}",
            s_bold().apply_to(category),
            s_dim().apply_to(subs.join("  "))
        );
    }
    println!("{}", sep(64));

    println!();
    println!("{}", s_header().apply_to("profiles"));
    println!("{}", sep(64));
    for p in OptimizationProfile::ALL {
        let w = p.weights();
        println!(
            "  {:<14} {}",
            s_bold().apply_to(p.to_string()),
            s_dim().apply_to(format!(
                "quality {:.2}  cost {:.2}  latency {:.2}  throughput {:.2}",
                w.quality, w.cost, w.latency, w.throughput
            ))
        );
    }
    println!("{}", sep(64));
    println!(
        "{}",
        s_hint().apply_to(format!(
            "  {} weight vectors   llmhub recommend <category> --sub <name>",
            table.len()
        ))
    );
    println!();
    Ok(())
}

// ── Sync ─────────────────────────────────────────────────────────────

async fn cmd_sync(limit: u32) -> anyhow::Result<()> {
    let term = Term::stderr();
    let client = match StoreClient::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", s_err().apply_to(format!("error: {e}")));
            return Err(e.into());
        }
    };
    term.write_line(&format!("{}", s_dim().apply_to("downloading latest snapshots...")))?;

    let result = llmhub_core::sync::sync_snapshots(&client, limit).await?;

    term.clear_last_lines(1)?;
    println!();
    println!("  {}", s_hot().apply_to("synced"));
    println!(
        "  {}",
        s_dim().apply_to(format!(
            "{} rows ({} complete)   newest record {}",
            result.rows,
            result.complete_rows,
            result
                .newest_record
                .map(|d| d.to_string())
                .unwrap_or_else(|| "?".into())
        ))
    );
    println!(
        "  {}",
        s_hint().apply_to(format!("cached in {}", result.path.display()))
    );
    println!();
    Ok(())
}
