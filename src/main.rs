//! TrackAnalyzer - GPX track analysis
//!
//! Command line entry point.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use std::path::{Path, PathBuf};
use trackanalyzer::analyzer::{analyze_batch, TrackAnalyzer};
use trackanalyzer::integrations::{download_activities_by_date, DirectoryProvider, ReturnCode};
use trackanalyzer::storage::{load_config, load_config_from, AnalyzerConfig};
use trackanalyzer::track::merge_track_files;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "GPX track analysis", long_about = None)]
struct Cli {
    /// Configuration file (defaults to config.toml in the data directory)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Annotate one track and write its summary
    Analyze(AnalyzeArgs),
    /// Merge several recordings into one track
    Merge(MergeArgs),
    /// Analyze many tracks, continuing past failures
    Batch(BatchArgs),
    /// Copy activities from an activity folder
    Download(DownloadArgs),
}

#[derive(Parser, Debug)]
struct AnalyzeArgs {
    /// GPX file to analyze
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Annotated GPX output (defaults to `<stem>_analyzed.gpx`)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Split files to take velocities from
    #[arg(long = "splits", value_hint = ValueHint::FilePath)]
    splits: Vec<PathBuf>,

    /// Use ratios instead of regression for slope and vertical velocity
    #[arg(long, action = ArgAction::SetTrue)]
    force_fallback: bool,

    /// Also write the elevation-simplified track
    #[arg(long, action = ArgAction::SetTrue)]
    simplified: bool,
}

#[derive(Parser, Debug)]
struct MergeArgs {
    /// GPX files to merge
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    inputs: Vec<PathBuf>,

    /// Merged GPX output
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Name of the merged track
    #[arg(short, long)]
    name: String,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// GPX files to analyze
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    inputs: Vec<PathBuf>,

    /// Folder for annotated tracks and summaries
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    output_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct DownloadArgs {
    /// Folder holding `activity_<id>.json` documents
    #[arg(long, value_hint = ValueHint::DirPath)]
    source: PathBuf,

    /// Destination folder
    #[arg(long, value_hint = ValueHint::DirPath)]
    folder: PathBuf,

    /// First day, `YYYY-MM-DD`
    #[arg(long)]
    start: NaiveDate,

    /// Last day, `YYYY-MM-DD` (defaults to today)
    #[arg(long)]
    end: Option<NaiveDate>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    tracing::info!("Starting TrackAnalyzer v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => load_config_from(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => load_config().context("failed to load config")?,
    };

    match cli.command {
        Command::Analyze(args) => handle_analyze(args, config),
        Command::Merge(args) => handle_merge(args),
        Command::Batch(args) => handle_batch(args, &config),
        Command::Download(args) => handle_download(args),
    }
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("track");
    input.with_file_name(format!("{}_analyzed.gpx", stem))
}

fn handle_analyze(args: AnalyzeArgs, mut config: AnalyzerConfig) -> Result<()> {
    if args.simplified {
        config.output.write_simplified = true;
    }
    let output = args.output.unwrap_or_else(|| default_output(&args.input));

    let mut analyzer = TrackAnalyzer::new(&args.input, config).with_split_files(args.splits);
    let result = if args.force_fallback {
        analyzer.analyze(true)
    } else {
        analyzer.analyze_with_fallback().map(|_| ())
    };
    result.with_context(|| format!("failed to analyze {}", args.input.display()))?;

    let written = analyzer
        .write(&output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    for (key, value) in analyzer.summary().iter() {
        println!("{:<28} {:.3}", key, value);
    }
    tracing::info!(
        "Wrote {} and {}",
        written.track.display(),
        written.summary.display()
    );
    Ok(())
}

fn handle_merge(args: MergeArgs) -> Result<()> {
    let merged = merge_track_files(&args.inputs, &args.output, &args.name)
        .context("failed to merge tracks")?;
    println!(
        "{} points, {:.0} m",
        merged.len(),
        merged.final_distance()
    );
    Ok(())
}

fn handle_batch(args: BatchArgs, config: &AnalyzerConfig) -> Result<()> {
    let report = analyze_batch(&args.inputs, config, &args.output_dir);
    println!(
        "Processed {}, succeeded {}",
        report.processed, report.succeeded
    );
    for failure in &report.failures {
        println!("  {}: {}", failure.path.display(), failure.error);
    }
    Ok(())
}

fn handle_download(args: DownloadArgs) -> Result<()> {
    let provider = DirectoryProvider::new(args.source);
    let end = args
        .end
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let status = download_activities_by_date(&provider, &args.folder, args.start, end);
    println!("{}", status);
    match ReturnCode::parse(&status) {
        Some((ReturnCode::Success, _)) => Ok(()),
        _ => bail!("download failed"),
    }
}
