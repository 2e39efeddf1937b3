//! Tournament CLI
//!
//! Run elimination tournaments over a photo directory and inspect stored rounds.

use anyhow::{bail, Context, Result};
use bracket_core::{Algorithm, Judge, TournamentConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};
use openrouter_judge::OpenRouterJudge;
use random_judge::RandomJudge;
use std::path::PathBuf;
use tournament::{
    discover_photos, render_judgments, render_outcome, render_report, rounds_with_judgments,
    FileSnapshotStore, JudgmentQuery, RunOptions, SnapshotStore, Tournament,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tournament", about = "Photo elimination tournament runner", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run (or resume) a tournament over a photo directory
    Run(RunArgs),
    /// Standings of the latest stored round
    Report(ReportArgs),
    /// Browse the judgment history of a stored tournament
    Judgments(JudgmentArgs),
    /// List stored tournaments
    List(ListArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Inline JSON config, e.g. '{"algorithm":"nwise","rounds":2}'
    #[arg(value_name = "CONFIG_JSON")]
    config_json: Option<String>,
    /// JSON or TOML config file
    #[arg(long, conflicts_with = "config_json")]
    config: Option<PathBuf>,
    #[arg(long)]
    algorithm: Option<Algorithm>,
    #[arg(long)]
    rounds: Option<u32>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    elimination_rate: Option<f64>,
    #[arg(long)]
    batch_size: Option<usize>,
    #[arg(long)]
    tournament_id: Option<String>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value = "./photos")]
    photos: PathBuf,
    #[arg(long, default_value = "./results")]
    results: PathBuf,
    #[arg(long, value_enum, default_value_t = JudgeKind::Openrouter)]
    judge: JudgeKind,
    /// Run eliminations only: no judge calls, nothing written
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Continue from the latest stored round of --tournament-id
    #[arg(long, default_value_t = false)]
    resume: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum JudgeKind {
    Openrouter,
    Random,
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[arg(long)]
    tournament: String,
    #[arg(long, default_value = "./results")]
    results: PathBuf,
}

#[derive(Args, Debug)]
struct JudgmentArgs {
    #[arg(long)]
    tournament: String,
    #[arg(long)]
    round: Option<u32>,
    #[arg(long)]
    item: Option<String>,
    #[arg(long, default_value = "./results")]
    results: PathBuf,
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long, default_value = "./results")]
    results: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Report(args) => report(args),
        Commands::Judgments(args) => judgments(args),
        Commands::List(args) => list(args),
    }
}

fn load_config(args: &RunArgs) -> Result<TournamentConfig> {
    let mut config = match (&args.config_json, &args.config) {
        (Some(json), _) => TournamentConfig::from_json_str(json).context("invalid inline config")?,
        (None, Some(path)) => TournamentConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        (None, None) => TournamentConfig::default(),
    };

    if let Some(algorithm) = args.algorithm {
        config.algorithm = algorithm;
    }
    if let Some(rounds) = args.rounds {
        config.rounds = rounds;
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if args.elimination_rate.is_some() {
        config.elimination_rate = args.elimination_rate;
    }
    if args.batch_size.is_some() {
        config.batch_size = args.batch_size;
    }
    if args.tournament_id.is_some() {
        config.tournament_id = args.tournament_id.clone();
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    Ok(config)
}

fn create_judge(kind: JudgeKind, seed: Option<u64>) -> Result<Box<dyn Judge>> {
    let judge: Box<dyn Judge> = match kind {
        JudgeKind::Openrouter => {
            Box::new(OpenRouterJudge::from_env().context("cannot create OpenRouter judge")?)
        }
        JudgeKind::Random => match seed {
            Some(seed) => Box::new(RandomJudge::new(seed)),
            None => Box::new(RandomJudge::default()),
        },
    };
    Ok(judge)
}

fn run(args: RunArgs) -> Result<()> {
    let config = load_config(&args)?;
    if args.resume && config.tournament_id.is_none() {
        bail!("--resume needs a tournament id (config tournamentId or --tournament-id)");
    }

    let judge = if args.dry_run {
        None
    } else {
        Some(create_judge(args.judge, config.seed)?)
    };
    let options = RunOptions {
        dry_run: args.dry_run,
        resume: args.resume,
    };

    let store = FileSnapshotStore::new(&args.results);
    let mut tournament = Tournament::new(config, store, judge, options)?;

    // A stored tournament resumes without its photo directory.
    let stored = args.resume
        && match tournament.store().latest_round(tournament.tournament_id()) {
            Ok(latest) => latest.is_some(),
            Err(e) => {
                warn!(error = %e, "cannot read stored rounds");
                false
            }
        };
    let sources = match discover_photos(&args.photos) {
        Ok(sources) => sources,
        Err(e) if stored => {
            warn!(error = %e, "no photos available, relying on stored round");
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };
    tournament.initialize(&sources)?;

    info!(
        tournament = tournament.tournament_id(),
        algorithm = %tournament.config().algorithm,
        rounds = tournament.config().rounds,
        dry_run = args.dry_run,
        "tournament ready"
    );

    let outcome = tournament
        .run()
        .with_context(|| format!("tournament {} failed", tournament.tournament_id()))?;

    println!();
    println!("{}", render_report(&tournament.snapshot()));
    println!("{}", render_outcome(&outcome));
    if !args.dry_run {
        println!("Results saved under {}", args.results.display());
    }
    Ok(())
}

fn report(args: ReportArgs) -> Result<()> {
    let store = FileSnapshotStore::new(&args.results);
    let Some(snapshot) = store.load_latest(&args.tournament)? else {
        bail!("no stored rounds for tournament {}", args.tournament);
    };
    println!("{}", render_report(&snapshot));
    Ok(())
}

fn judgments(args: JudgmentArgs) -> Result<()> {
    let store = FileSnapshotStore::new(&args.results);
    let Some(snapshot) = store.load_latest(&args.tournament)? else {
        bail!("no stored rounds for tournament {}", args.tournament);
    };

    let rounds: Vec<String> = rounds_with_judgments(&snapshot.judgments)
        .iter()
        .map(|round| round.to_string())
        .collect();
    println!(
        "{}: {} judgments in rounds [{}]",
        snapshot.tournament_id,
        snapshot.judgments.len(),
        rounds.join(", ")
    );
    println!();

    let query = JudgmentQuery {
        round: args.round,
        item: args.item,
    };
    print!("{}", render_judgments(&query.select(&snapshot.judgments)));
    Ok(())
}

fn list(args: ListArgs) -> Result<()> {
    let store = FileSnapshotStore::new(&args.results);
    let tournaments = store.tournaments()?;
    if tournaments.is_empty() {
        println!("No tournaments found in {}", args.results.display());
        return Ok(());
    }

    println!("{:<50} {:>6}", "Tournament", "Round");
    println!("{}", "-".repeat(57));
    for id in tournaments {
        let round = store.latest_round(&id)?.unwrap_or(0);
        println!("{:<50} {:>6}", id, round);
    }
    Ok(())
}
