//! MarketLens CLI: download, analyze and export stock price data.
//!
//! Commands:
//! - `analyze`: full pipeline with statistics, correlations, CSV/XLSX tables, heatmap
//! - `validate`: download and check data quality only; exits 1 on failure
//! - `init-config`: write a starter TOML config

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use marketlens_core::data::{StdoutProgress, YahooProvider};
use marketlens_runner::{prepare_data, run_analysis, AnalysisConfig, AnalysisOutcome};

#[derive(Parser)]
#[command(
    name = "marketlens",
    about = "MarketLens CLI: stock return statistics and correlation analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download prices and run the full analysis.
    Analyze {
        #[command(flatten)]
        run: RunArgs,

        /// Annual risk-free rate in percent (e.g. 4.0).
        #[arg(long)]
        risk_free_rate: Option<f64>,

        /// Folder for CSV, workbook and heatmap output.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// strftime pattern for exported dates (e.g. %d/%m/%Y).
        #[arg(long)]
        date_format: Option<String>,

        /// File name of the heatmap inside the output folder.
        #[arg(long)]
        heatmap_file: Option<String>,

        /// Stop after validation if any value is missing.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Download prices and report data quality without writing anything.
    Validate {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Write a default config file.
    InitConfig {
        /// Destination path.
        #[arg(default_value = "marketlens.toml")]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

/// Arguments shared by commands that download data.
#[derive(Args)]
struct RunArgs {
    /// Path to a TOML config file. Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Symbols to analyze (e.g., AAPL MSFT GOOGL).
    #[arg(long, num_args = 1..)]
    symbols: Vec<String>,

    /// Start date (YYYY-MM-DD). Defaults to 5 years ago.
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            run,
            risk_free_rate,
            output_dir,
            date_format,
            heatmap_file,
            strict,
        } => {
            let mut config = build_config(&run)?;
            if let Some(rate) = risk_free_rate {
                config.risk_free_rate = rate;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(fmt) = date_format {
                config.date_format = fmt;
            }
            if let Some(file) = heatmap_file {
                config.heatmap_file = file;
            }
            if strict {
                config.strict = true;
            }
            run_analyze_cmd(&config)
        }
        Commands::Validate { run } => run_validate_cmd(&build_config(&run)?),
        Commands::InitConfig { path, force } => run_init_config(path, force),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

/// Start from the config file (or defaults), then apply flags.
fn build_config(run: &RunArgs) -> Result<AnalysisConfig> {
    let mut config = match &run.config {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            if run.symbols.is_empty() {
                bail!("no symbols given; pass --symbols or --config");
            }
            let today = chrono::Local::now().date_naive();
            AnalysisConfig::new(
                Vec::new(),
                today - chrono::Duration::days(365 * 5),
                today,
            )
        }
    };

    if !run.symbols.is_empty() {
        config.symbols = run.symbols.clone();
    }
    if let Some(s) = &run.start {
        config.start_date = parse_date(s)?;
    }
    if let Some(s) = &run.end {
        config.end_date = parse_date(s)?;
    }

    config.validate()?;
    Ok(config)
}

fn run_analyze_cmd(config: &AnalysisConfig) -> Result<()> {
    info!(
        symbols = ?config.symbols,
        start = %config.start_date,
        end = %config.end_date,
        output = %config.output_dir.display(),
        "starting analysis"
    );
    let provider = YahooProvider::new()?;
    let outcome = match run_analysis(config, &provider, &StdoutProgress) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    print_outcome(&outcome);
    if outcome.halted() {
        println!("Data validation failed; stopping (strict mode).");
        std::process::exit(1);
    }
    Ok(())
}

fn run_validate_cmd(config: &AnalysisConfig) -> Result<()> {
    let provider = YahooProvider::new()?;
    let prepared = match prepare_data(config, &provider, &StdoutProgress) {
        Ok(prepared) => prepared,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    println!();
    print_lines(&prepared.diagnostics.report_lines());
    print_skipped(&prepared.data.skipped);
    println!();
    print_lines(&prepared.validation.report_lines());

    if !prepared.validation.passed() {
        std::process::exit(1);
    }
    println!();
    println!("Data validation passed.");
    Ok(())
}

fn run_init_config(path: PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (pass --force to overwrite)", path.display());
    }
    let text = AnalysisConfig::default().to_toml()?;
    std::fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Config written to: {}", path.display());
    Ok(())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

fn print_skipped(skipped: &[String]) {
    for symbol in skipped {
        println!("Warning: No data found for ticker {symbol}. Skipping.");
    }
}

fn print_outcome(outcome: &AnalysisOutcome) {
    let prepared = &outcome.prepared;
    println!();
    print_lines(&prepared.diagnostics.report_lines());
    print_skipped(&prepared.data.skipped);

    println!();
    println!("=== Data Validation ===");
    print_lines(&prepared.validation.report_lines());

    let Some(results) = &outcome.results else {
        return;
    };

    println!();
    println!("=== Summary Statistics ===");
    print!("{}", results.summary.to_text());

    println!();
    println!("=== Correlation Analysis ===");
    print_lines(&results.correlation.report_lines());

    println!();
    print_lines(&results.tables.notices());
    println!("{}", results.heatmap.notice());
    println!();
}
