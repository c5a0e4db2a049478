//! ronda CLI binary.
//!
//! Loads an OHLCV universe from CSV files, runs the research pipeline (or
//! a prefix of it), and writes the reports as CSV.

mod data;
mod report;

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ronda::{compute_factors, evaluate_factors, run, OhlcvPanels, ResearchConfig, UnitOutcome};
use ronda_factors::{factors_by_category, FactorCategory};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "ronda")]
#[command(about = "Cross-sectional factor research pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every data-driven subcommand.
#[derive(Args)]
struct IoArgs {
    /// Research configuration file (YAML); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding open.csv, high.csv, low.csv, close.csv, volume.csv
    #[arg(short, long)]
    data: PathBuf,

    /// Directory the reports are written to
    #[arg(short, long, default_value = "out")]
    out: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the factor library and write the standardized panels
    Factors {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Evaluate factor information coefficients
    Ic {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Fuse factors into composite signals
    Fuse {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Run the full pipeline: factors, ICs, fusion, and validation
    Run {
        #[command(flatten)]
        io: IoArgs,
    },

    /// List available factors
    List {
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,

        /// Show descriptions and default parameters
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() {
    init_tracing();
    if let Err(e) = dispatch() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn dispatch() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Factors { io } => cmd_factors(&io),
        Commands::Ic { io } => cmd_ic(&io),
        Commands::Fuse { io } => cmd_fuse(&io),
        Commands::Run { io } => cmd_run(&io),
        Commands::List { category, verbose } => {
            list_factors(category.as_deref(), verbose);
            Ok(())
        }
    }
}

fn load_inputs(io: &IoArgs) -> Result<(ResearchConfig, OhlcvPanels)> {
    let cfg = match &io.config {
        Some(path) => ronda::load_config(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => ResearchConfig::default(),
    };
    let data = data::load_ohlcv(&io.data)?;
    info!(
        n_dates = data.close.n_dates(),
        n_instruments = data.close.n_instruments(),
        "loaded universe"
    );
    std::fs::create_dir_all(&io.out)
        .with_context(|| format!("creating output directory {}", io.out.display()))?;
    Ok((cfg, data))
}

fn log_outcomes(outcomes: &std::collections::BTreeMap<String, UnitOutcome>, kind: &str) {
    for (name, outcome) in outcomes {
        match outcome {
            UnitOutcome::Succeeded => {}
            UnitOutcome::AllAbsent => warn!(%name, "{kind} produced no defined values"),
            UnitOutcome::Failed(e) => warn!(%name, error = %e, "{kind} failed"),
        }
    }
}

fn cmd_factors(io: &IoArgs) -> Result<()> {
    let (cfg, data) = load_inputs(io)?;
    let factors = compute_factors(&cfg, &data)?;
    log_outcomes(&factors.outcomes, "factor");
    report::write_factor_panels(&io.out, &factors)
}

fn cmd_ic(io: &IoArgs) -> Result<()> {
    let (cfg, data) = load_inputs(io)?;
    let factors = compute_factors(&cfg, &data)?;
    log_outcomes(&factors.outcomes, "factor");
    let ic = evaluate_factors(&cfg, &factors.standardized, &data.close)?;
    report::write_ic_reports(&io.out, &ic, &std::collections::BTreeMap::new())
}

fn cmd_fuse(io: &IoArgs) -> Result<()> {
    let (cfg, data) = load_inputs(io)?;
    let pipeline = run(&cfg, &data)?;
    log_outcomes(&pipeline.fusion_outcomes, "fusion strategy");
    report::write_fusion_reports(&io.out, &pipeline.fusion)
}

fn cmd_run(io: &IoArgs) -> Result<()> {
    let (cfg, data) = load_inputs(io)?;
    let pipeline = run(&cfg, &data)?;
    log_outcomes(&pipeline.factors.outcomes, "factor");
    log_outcomes(&pipeline.fusion_outcomes, "fusion strategy");

    report::write_factor_panels(&io.out, &pipeline.factors)?;
    report::write_ic_reports(&io.out, &pipeline.ic, &pipeline.composite_ic)?;
    report::write_fusion_reports(&io.out, &pipeline.fusion)?;
    report::write_run_summary(&io.out, &pipeline.summary)?;

    let s = &pipeline.summary;
    info!(
        factors_succeeded = s.factors_succeeded,
        factors_failed = s.factors_failed,
        strategies_succeeded = s.strategies_succeeded,
        best_factor = s.best_factor.as_deref().unwrap_or("none"),
        "run complete"
    );
    Ok(())
}

fn list_factors(filter: Option<&str>, verbose: bool) {
    let categories = [
        (FactorCategory::Price, "Price"),
        (FactorCategory::Oscillator, "Oscillator"),
        (FactorCategory::Overlap, "Overlap"),
        (FactorCategory::Volume, "Volume"),
        (FactorCategory::Pattern, "Pattern"),
    ];

    for (category, name) in categories {
        if let Some(f) = filter {
            if !name.to_lowercase().contains(&f.to_lowercase()) {
                continue;
            }
        }
        let defs = factors_by_category(category);
        if defs.is_empty() {
            continue;
        }

        println!("{name}: {}", category.description());
        println!("{}", "-".repeat(60));
        for def in defs {
            if verbose {
                let params: Vec<String> = def
                    .defaults
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect();
                println!("  {:24} {} [{}]", def.name, def.description, params.join(", "));
            } else {
                println!("  {}", def.name);
            }
        }
        println!();
    }

    if !verbose {
        println!("Use --verbose for descriptions and default parameters.");
    }
}
