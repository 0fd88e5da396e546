use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use scoutpool::{
    pool::serve, CliOverrides, Comparison, EncodingMode, ScanConfig, ScanReport, Scanner,
    SubstrateKind,
};
use std::io;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CliScanArgs {
    /// Pattern to search for
    #[arg(short = 'p', long)]
    pattern: Option<String>,

    /// Root directory to scan
    #[arg(short = 'd', long)]
    root: Option<PathBuf>,

    /// File extensions to include (e.g. txt,md)
    #[arg(short = 'e', long)]
    extensions: Option<String>,

    /// Patterns to ignore (glob format, relative to the root)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Maximum number of files searched at once
    #[arg(short = 'j', long)]
    capacity: Option<NonZeroUsize>,

    /// Execution substrate
    #[arg(long, value_enum)]
    substrate: Option<CliSubstrate>,

    /// Text encoding of the files (any WHATWG label, e.g. windows-1251)
    #[arg(long)]
    encoding: Option<String>,

    /// Replace malformed text instead of skipping the file
    #[arg(long)]
    lossy: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum CliSubstrate {
    Lightweight,
    Isolated,
}

impl From<CliSubstrate> for SubstrateKind {
    fn from(value: CliSubstrate) -> Self {
        match value {
            CliSubstrate::Lightweight => SubstrateKind::Lightweight,
            CliSubstrate::Isolated => SubstrateKind::Isolated,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory tree for a pattern
    Scan(Box<CliScanArgs>),

    /// Scan with both substrates and check that they agree
    Compare(Box<CliScanArgs>),

    /// Run a single task read from stdin (used by the isolated substrate)
    #[command(hide = true)]
    Worker {
        #[arg(long, default_value = "warn")]
        log_level: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => {
            let format = args.format;
            let config = build_config(*args)?;
            init_logging(&config.log_level);

            let scanner = Scanner::new(config)?;
            let report = scanner.scan()?;
            print_report(&report, format)?;
            Ok(())
        }
        Commands::Compare(args) => {
            let format = args.format;
            let config = build_config(*args)?;
            init_logging(&config.log_level);

            let scanner = Scanner::new(config)?;
            let files = scanner.discover()?;
            let comparison = scanner.compare(&files)?;
            print_comparison(&comparison, format)?;
            if !comparison.agrees() {
                bail!("substrates disagree on the matching files");
            }
            Ok(())
        }
        Commands::Worker { log_level } => {
            init_logging(&log_level);
            serve(io::stdin().lock(), io::stdout().lock()).context("worker failed")?;
            Ok(())
        }
    }
}

fn build_config(args: CliScanArgs) -> Result<ScanConfig> {
    let file_config = ScanConfig::load_from(args.config.as_deref())
        .context("failed to load configuration")?;

    let file_extensions = args.extensions.as_ref().map(|e| {
        e.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
    });

    let config = file_config.merge_with_cli(CliOverrides {
        pattern: args.pattern,
        root_path: args.root,
        file_extensions,
        ignore_patterns: args.ignore,
        capacity: args.capacity,
        substrate: args.substrate.map(Into::into),
        encoding: args.encoding,
        encoding_mode: args.lossy.then_some(EncodingMode::Lossy),
        log_level: args.log_level,
    });

    if config.pattern.is_empty() {
        bail!("a non-empty pattern is required (-p/--pattern or `pattern` in the config file)");
    }
    Ok(config)
}

/// Logs go to stderr; stdout carries results (and worker replies)
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_writer(io::stderr)
        .try_init();
    debug!("Logging initialised at {}", level);
}

fn print_report(report: &ScanReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report.results)?);
        }
        OutputFormat::Text => {
            let paths = report.results.paths(&report.pattern);
            for path in paths {
                println!("{}", path.display().to_string().blue());
            }
            println!(
                "\nPattern {} found in {} of {} files ({} substrate)",
                report.pattern.green(),
                paths.len(),
                report.files_scanned,
                report.substrate
            );
            if report.stats.unreadable > 0 || report.stats.faulted > 0 {
                println!(
                    "{}",
                    format!(
                        "{} unreadable, {} faulted",
                        report.stats.unreadable, report.stats.faulted
                    )
                    .yellow()
                );
            }
        }
    }
    Ok(())
}

fn print_comparison(comparison: &Comparison, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "lightweight": comparison.lightweight.results,
                "isolated": comparison.isolated.results,
                "agree": comparison.agrees(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            print_report(&comparison.lightweight, format)?;
            println!();
            print_report(&comparison.isolated, format)?;
            if comparison.agrees() {
                println!("\n{}", "Substrates agree".green());
            } else {
                println!("\n{}", "Substrates disagree".red());
            }
        }
    }
    Ok(())
}
