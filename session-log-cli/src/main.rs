//! Session Log Processor CLI Application
//!
//! Command-line front end for the session-log-decoder library. It adds:
//! - Batch processing of input directories
//! - Container conversion and the per-stage output layout
//! - Pairing and bridging of the two channel groups
//! - The count summary and the end-of-run report

use anyhow::Result;
use clap::{Parser, ValueEnum};
use session_log_decoder::{BridgePolicy, ProcessingMode};
use std::path::PathBuf;

mod bridge;
mod config;
mod layout;
mod pipeline;
mod report;

use config::AppConfig;
use layout::OutputLayout;
use pipeline::GroupProcessor;
use report::BatchReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Eight channels, tags 1, 2 and 6
    MultiTag,
    /// Sixteen channels, tag 1 only
    SingleTag,
}

impl From<ModeArg> for ProcessingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::MultiTag => ProcessingMode::MultiTag,
            ModeArg::SingleTag => ProcessingMode::SingleTag,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BridgeArg {
    Count,
    Stacked,
    None,
}

impl From<BridgeArg> for BridgePolicy {
    fn from(policy: BridgeArg) -> Self {
        match policy {
            BridgeArg::Count => BridgePolicy::Count,
            BridgeArg::Stacked => BridgePolicy::Stacked,
            BridgeArg::None => BridgePolicy::None,
        }
    }
}

/// Session Log Processor - Decode and align operant-chamber session records
#[derive(Parser, Debug)]
#[command(name = "session-log-cli")]
#[command(about = "Decode, align and bridge operant-chamber session records", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory with the raw records of the low channel range
    #[arg(short, long, value_name = "DIR")]
    input: Option<PathBuf>,

    /// Directory with the raw records of the high channel range
    #[arg(long, value_name = "DIR")]
    high_range_input: Option<PathBuf>,

    /// Root of the output directories
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Processing mode
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// How the two channel groups are combined
    #[arg(long, value_enum)]
    bridge: Option<BridgeArg>,

    /// Start of the counting window (minutes, inclusive)
    #[arg(long, value_name = "MINUTES")]
    window_start: Option<f64>,

    /// End of the counting window (minutes, inclusive)
    #[arg(long, value_name = "MINUTES")]
    window_end: Option<f64>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("Session Log Processor CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", session_log_decoder::VERSION);

    if args.config.is_none() && args.input.is_none() {
        println!("Session Log Processor - No input specified");
        println!("\nQuick Start:");
        println!("  session-log-cli --input records/ --output results/");
        println!("  session-log-cli --input records/1-8 --high-range-input records/9-16");
        println!("\nWith a configuration file:");
        println!("  session-log-cli --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    let config = resolve_config(&args)?;
    let report = run(&config)?;

    if !args.quiet {
        print_summary(&config, &report);
    }
    Ok(())
}

/// Load the configuration file (if any) and apply command-line overrides
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(input) = &args.input {
        config.input.dir = input.clone();
    }
    if let Some(high) = &args.high_range_input {
        config.input.high_range_dir = Some(high.clone());
    }
    if let Some(output) = &args.output {
        config.output.dir = output.clone();
    }
    if let Some(mode) = args.mode {
        config.processing.mode = mode.into();
    }
    if let Some(policy) = args.bridge {
        config.bridge.policy = policy.into();
    }
    if args.window_start.is_some() {
        config.bridge.window_start = args.window_start;
    }
    if args.window_end.is_some() {
        config.bridge.window_end = args.window_end;
    }

    config.validate()?;
    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Process both channel groups and bridge them
fn run(config: &AppConfig) -> Result<BatchReport> {
    let layout = OutputLayout::new(&config.output.dir);
    layout.create()?;

    let mut report = BatchReport::new();

    GroupProcessor::new(config, &layout, "").process_dir(&config.input.dir, &mut report)?;
    if let Some(high_dir) = &config.input.high_range_dir {
        GroupProcessor::new(config, &layout, config.suffix_marker())
            .process_dir(high_dir, &mut report)?;
    }

    if config.bridging_enabled() {
        bridge::bridge_groups(config, &layout, &mut report)?;
    } else {
        log::info!("Bridging disabled");
    }

    report.log_summary();
    Ok(report)
}

fn print_summary(config: &AppConfig, report: &BatchReport) {
    println!("═══════════════════════════════════════════════");
    println!("  Session Log Processor - Summary");
    println!("═══════════════════════════════════════════════\n");
    println!("  Records processed: {}", report.processed.len());
    println!("  Sessions bridged:  {}", report.bridged.len());
    println!("  Warnings:          {}", report.warnings.len());
    println!("  Skipped:           {}", report.skipped.len());
    for skip in &report.skipped {
        println!("    ✗ {}", skip);
    }
    println!("\nOutput written to {:?}", config.output.dir);
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
