//! BER sweep for a trellis code over a binary symmetric channel
//!
//! # Usage
//!
//! ```bash
//! # Default sweep: reference rate-1/3 code, p = 0.00..0.49, 100 trials each
//! cargo run --release -p trellis-sim --bin trellis-sweep
//!
//! # Config file plus overrides, CSV to a file
//! cargo run --release -p trellis-sim --bin trellis-sweep -- \
//!     --config sweep.json --trials 20 --format csv --output ber.csv
//! ```

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::{error, info};

use trellis_core::observe::{init_logging, LogConfig, LogLevel};
use trellis_sim::{MonteCarloEngine, SimResult, SweepConfig, SweepReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "trellis-sweep")]
#[command(version, about = "Monte Carlo BER sweep of a convolutional code over a BSC")]
struct Args {
    /// JSON sweep config; missing fields use defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random message bits per trial
    #[arg(long)]
    message_bits: Option<usize>,

    /// Flush zeros appended to each message
    #[arg(long)]
    flush_bits: Option<usize>,

    /// Trials per crossover probability
    #[arg(long)]
    trials: Option<usize>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// First crossover probability
    #[arg(long)]
    p_start: Option<f64>,

    /// End of the sweep (exclusive)
    #[arg(long)]
    p_stop: Option<f64>,

    /// Probability step
    #[arg(long)]
    p_step: Option<f64>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// trace, debug, info, warn or error (RUST_LOG takes precedence)
    #[arg(long, default_value = "info")]
    log_level: LogLevel,

    /// Log errors only, overriding --log-level
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn sweep_config(&self) -> SimResult<SweepConfig> {
        let mut config = match &self.config {
            Some(path) => SweepConfig::load(path)?,
            None => SweepConfig::default(),
        };
        if let Some(v) = self.message_bits {
            config.message_bits = v;
        }
        if let Some(v) = self.flush_bits {
            config.flush_bits = v;
        }
        if let Some(v) = self.trials {
            config.trials = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        if let Some(v) = self.p_start {
            config.p_start = v;
        }
        if let Some(v) = self.p_stop {
            config.p_stop = v;
        }
        if let Some(v) = self.p_step {
            config.p_step = v;
        }
        Ok(config)
    }
}

fn render(report: &SweepReport, format: OutputFormat) -> SimResult<String> {
    Ok(match format {
        OutputFormat::Table => report.to_table(),
        OutputFormat::Csv => report.to_csv(),
        OutputFormat::Json => report.to_json()?,
    })
}

fn run(args: &Args) -> SimResult<()> {
    let config = args.sweep_config()?;
    let engine = MonteCarloEngine::new(config)?;
    let report = engine.run()?;
    let text = render(&report, args.format)?;

    match &args.output {
        Some(path) => {
            fs::write(path, text)?;
            info!(path = %path.display(), "report written");
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let log_config = if args.quiet {
        LogConfig::quiet()
    } else {
        LogConfig::default().with_level(args.log_level)
    };
    init_logging(&log_config);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = e.exit_code(), "{}", e);
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
