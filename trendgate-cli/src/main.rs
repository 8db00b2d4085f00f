//! TrendGate CLI — run sessions and inspect their artifacts.
//!
//! Commands:
//! - `run`: execute a session from a TOML config file (or defaults)
//! - `show`: print the Markdown report of a saved run
//! - `config`: print the default configuration as TOML

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trendgate_runner::export::generate_report;
use trendgate_runner::{load_artifacts, run_from_config, save_artifacts, RunConfig, SessionReport};

#[derive(Parser)]
#[command(
    name = "trendgate",
    about = "TrendGate CLI — trend-gated bracket position manager"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a session from a TOML config file.
    Run {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// CSV file with Datetime,Open,High,Low,Close,Volume rows.
        #[arg(long)]
        data: Option<PathBuf>,

        /// First day (YYYY-MM-DD, inclusive).
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last day (YYYY-MM-DD, inclusive).
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Run on this many synthetic bars instead of the CSV.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed label for synthetic bars.
        #[arg(long)]
        seed: Option<String>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Skip writing artifacts.
        #[arg(long, default_value_t = false)]
        no_artifacts: bool,
    },
    /// Print the Markdown report of a saved run directory.
    Show {
        /// Directory containing report.json.
        run_dir: PathBuf,
    },
    /// Print the default configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            data,
            start,
            end,
            synthetic,
            seed,
            output_dir,
            no_artifacts,
        } => {
            let mut run_config = match config {
                Some(path) => RunConfig::from_file(&path)?,
                None => RunConfig::default(),
            };
            if let Some(path) = data {
                run_config.data.path = path;
            }
            if let Some(start) = start {
                run_config.data.start = start;
            }
            if let Some(end) = end {
                run_config.data.end = end;
            }
            if synthetic.is_some() {
                run_config.data.synthetic = synthetic;
            }
            if let Some(seed) = seed {
                run_config.data.seed = seed;
            }
            run_session_cmd(&run_config, (!no_artifacts).then_some(output_dir))
        }
        Commands::Show { run_dir } => {
            let report = load_artifacts(&run_dir)?;
            print!("{}", generate_report(&report));
            Ok(())
        }
        Commands::Config => {
            let text = toml::to_string_pretty(&RunConfig::default())
                .context("failed to render default config")?;
            print!("{text}");
            Ok(())
        }
    }
}

fn run_session_cmd(config: &RunConfig, output_dir: Option<PathBuf>) -> Result<()> {
    println!("Starting Portfolio Value: {:.2}", config.initial_cash);
    let report = run_from_config(config)?;
    println!("Final Portfolio Value: {:.2}", report.final_value);

    print_summary(&report);

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&report, &dir)?;
        info!(dir = %run_dir.display(), "artifacts saved");
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn print_summary(report: &SessionReport) {
    let m = &report.metrics;
    let date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
    println!();
    println!("=== Session Result ===");
    println!(
        "Period:         {} to {}",
        date(report.start_date),
        date(report.end_date)
    );
    println!(
        "Bars:           {} ({} warmup)",
        report.bar_count, report.warmup_bars
    );
    println!("Trades:         {}", m.trade_count);
    println!("Fills:          {}", report.fill_count);
    println!();
    println!("--- Performance ---");
    println!("Total Return:   {:.2}%", m.total_return * 100.0);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown * 100.0);
    println!("Realized PnL:   {:.2}", m.realized_pnl);
    println!("Win Rate:       {:.1}%", m.win_rate * 100.0);
    println!("Profit Factor:  {:.2}", m.profit_factor);
    println!("Max Consec Win: {}", m.max_consecutive_wins);
    println!("Max Consec Loss:{}", m.max_consecutive_losses);
    println!(
        "Multipliers:    long {:.4}, short {:.4}",
        report.final_sizing.long_multiplier, report.final_sizing.short_multiplier
    );
    if report.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
}
