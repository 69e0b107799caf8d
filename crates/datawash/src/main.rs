//! CLI entry point for the cleaning and EDA tool.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use datawash::{
    CleaningConfig, EXPORT_MIME_TYPE, MissingStrategy, OutlierMethod, Session, Shell,
};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// CLI-compatible missing-value strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMissingStrategy {
    /// Leave missing values as they are
    None,
    /// Drop every row containing a missing value
    Drop,
    /// Fill numeric columns with their mean
    Mean,
    /// Fill numeric columns with their median
    Median,
    /// Fill every column with its most frequent value
    Mode,
}

impl From<CliMissingStrategy> for Option<MissingStrategy> {
    fn from(cli: CliMissingStrategy) -> Self {
        match cli {
            CliMissingStrategy::None => None,
            CliMissingStrategy::Drop => Some(MissingStrategy::Drop),
            CliMissingStrategy::Mean => Some(MissingStrategy::Mean),
            CliMissingStrategy::Median => Some(MissingStrategy::Median),
            CliMissingStrategy::Mode => Some(MissingStrategy::Mode),
        }
    }
}

/// CLI-compatible outlier method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutlierMethod {
    /// Keep every row
    None,
    /// Remove rows outside [Q1 - k*IQR, Q3 + k*IQR]
    Iqr,
    /// Remove rows whose z-score reaches the threshold
    Zscore,
}

impl From<CliOutlierMethod> for Option<OutlierMethod> {
    fn from(cli: CliOutlierMethod) -> Self {
        match cli {
            CliOutlierMethod::None => None,
            CliOutlierMethod::Iqr => Some(OutlierMethod::Iqr),
            CliOutlierMethod::Zscore => Some(OutlierMethod::ZScore),
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Missing-value handling, outlier filtering and EDA for tabular files",
    long_about = "Loads a CSV or spreadsheet, cleans it and describes it.\n\n\
                  EXAMPLES:\n  \
                  # Fill gaps with the median, drop IQR outliers, export\n  \
                  datawash -i titanic.csv --missing median --outliers iqr --export\n\n  \
                  # Print the EDA report as JSON\n  \
                  datawash -i titanic.csv --json | jq .missing_values\n\n  \
                  # Interactive shell\n  \
                  datawash --interactive"
)]
struct Args {
    /// Path to the .csv, .xlsx or .xls file to process
    ///
    /// Without an input the interactive shell starts.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Strategy for handling missing values
    #[arg(long, value_enum, default_value = "none")]
    missing: CliMissingStrategy,

    /// Method for removing outlier rows
    #[arg(long, value_enum, default_value = "none")]
    outliers: CliOutlierMethod,

    /// IQR multiplier k for the bounds [Q1 - k*IQR, Q3 + k*IQR]
    #[arg(long, default_value_t = datawash::config::DEFAULT_IQR_MULTIPLIER)]
    iqr_threshold: f64,

    /// Z-score at or above which a row is removed
    #[arg(long, default_value_t = datawash::config::DEFAULT_ZSCORE_THRESHOLD)]
    zscore_threshold: f64,

    /// Print the exploratory data analysis report
    #[arg(long)]
    eda: bool,

    /// Write the cleaned data as CSV to the output directory
    #[arg(long)]
    export: bool,

    /// Output directory for exported data and reports
    #[arg(short, long, default_value = "./outputs")]
    output: PathBuf,

    /// Exported file name (without extension)
    #[arg(long, default_value = datawash::config::DEFAULT_OUTPUT_NAME)]
    output_name: String,

    /// Number of rows shown in previews
    #[arg(long, default_value_t = datawash::config::DEFAULT_PREVIEW_ROWS)]
    preview_rows: usize,

    /// Output the EDA report as JSON to stdout instead of text
    ///
    /// Disables all logs so stdout only holds the JSON document.
    #[arg(long)]
    json: bool,

    /// Write the EDA report as <input_name>_eda_report.json to the output directory
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Write the correlation heatmap as SVG to this path
    #[arg(long)]
    heatmap: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Start the interactive shell (after loading --input, if given)
    #[arg(long)]
    interactive: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let config = CleaningConfig::builder()
        .missing_strategy(args.missing.into())
        .outlier_method(args.outliers.into())
        .iqr_multiplier(args.iqr_threshold)
        .zscore_threshold(args.zscore_threshold)
        .preview_rows(args.preview_rows)
        .output_dir(&args.output)
        .output_name(&args.output_name)
        .build()?;
    let mut session = Session::new(config);

    match (&args.input, args.interactive) {
        (Some(input), false) => run_batch(&mut session, input, &args),
        (input, _) => {
            if let Some(input) = input
                && let Err(e) = session.load(input)
            {
                error!("Failed to load {}: {}", input.display(), e);
            }
            run_interactive(session)
        }
    }
}

/// Run the command loop on stdin/stdout.
fn run_interactive(session: Session) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut shell = Shell::new(session, stdin.lock(), stdout.lock());
    shell.run().context("Interactive shell failed")
}

/// Load, clean, report and export in one pass.
///
/// Output behavior:
/// - Default: Print a human-readable summary to stdout
/// - `--json`: Print the EDA report as JSON to stdout only (no logs)
/// - `--emit-report`: Write the EDA report as JSON to a file
fn run_batch(session: &mut Session, input: &Path, args: &Args) -> Result<()> {
    session
        .load(input)
        .map_err(|e| anyhow!("Failed to load {}: {}", input.display(), e))?;

    let wants_report = args.eda || args.json || args.emit_report;
    if wants_report {
        session.run_eda()?;
    }

    if let Some(report) = session.report() {
        if args.emit_report {
            let stem = extract_file_stem(input);
            let report_path = report.write_to_file(&args.output, &stem)?;
            info!("Report written to: {}", report_path.display());
        }
        if args.json {
            println!("{}", report.to_json()?);
        }
    }

    if let Some(heatmap) = &args.heatmap {
        match session.write_heatmap(heatmap)? {
            Some(path) => info!("Heatmap written to: {}", path.display()),
            None => info!("{}", datawash::reporting::NO_NUMERIC_COLUMNS_NOTE),
        }
    }

    let exported = if args.export {
        Some(session.export(None)?)
    } else {
        None
    };

    if args.json {
        return Ok(());
    }

    print_human_readable_summary(session, input, exported.as_deref(), args);
    Ok(())
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// Print what the run did.
///
/// This is the default output when `--json` is not given.
fn print_human_readable_summary(
    session: &Session,
    input: &Path,
    exported: Option<&Path>,
    args: &Args,
) {
    if args.eda
        && let Some(report) = session.report()
    {
        println!("{}", report.render_text());
    }

    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    if let Some((rows, cols)) = session.original().map(|d| d.shape()) {
        println!("Input:  {} ({} rows x {} columns)", input.display(), rows, cols);
    }
    if let Some((rows, cols)) = session.current().map(|d| d.shape()) {
        match exported {
            Some(path) => println!(
                "Output: {} ({} rows x {} columns, {})",
                path.display(),
                rows,
                cols,
                EXPORT_MIME_TYPE
            ),
            None => println!("Result: {} rows x {} columns (not exported)", rows, cols),
        }
    }
    println!();

    if let Some(summary) = session.summary() {
        println!("Processing Summary:");
        println!("  Duration: {}ms", summary.duration_ms);
        println!(
            "  Rows: {} -> {} ({} removed, {:.1}%)",
            summary.rows_before,
            summary.rows_after,
            summary.rows_removed,
            summary.rows_removed_percentage()
        );
        println!(
            "  Missing cells: {} -> {}",
            summary.missing_before, summary.missing_after
        );
        println!();
    }

    if !session.outliers().is_empty() {
        println!("Outlier Detection:");
        for column in session.outliers() {
            println!("  - {}: {} rows flagged", column.column, column.flagged);
        }
        println!();
    }

    if !session.processing_steps().is_empty() {
        println!("Actions Taken:");
        for step in session.processing_steps() {
            println!("  - {}", step);
        }
        println!();
    }

    if !args.eda
        && let Ok(preview) = session.preview()
    {
        println!("Preview:");
        println!("{}", preview.render_text());
    }

    if !args.export {
        println!("Add --export to save the cleaned data as CSV");
    }
    if !args.eda {
        println!("Add --eda to print the exploratory data analysis");
    }
}
