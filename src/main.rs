//! Data Sweeper - command line host
//!
//! Runs uploaded CSV / XLSX files through cleaning, column selection,
//! charting and conversion, writing results to an output directory.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use data_sweeper::charts::StaticChartRenderer;
use data_sweeper::{run_batch, BatchReport, CleanOp, Level, Plan, Settings, TargetFormat, Upload};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CleanArg {
    /// Drop rows identical to an earlier row
    RemoveDuplicates,
    /// Replace missing numeric cells with the column mean
    FillMissing,
}

impl From<CleanArg> for CleanOp {
    fn from(arg: CleanArg) -> Self {
        match arg {
            CleanArg::RemoveDuplicates => CleanOp::RemoveDuplicates,
            CleanArg::FillMissing => CleanOp::FillMissing,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Csv,
    Xlsx,
}

impl From<FormatArg> for TargetFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => TargetFormat::Csv,
            FormatArg::Xlsx => TargetFormat::Xlsx,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "data-sweeper",
    version,
    about = "Clean, chart and convert CSV / Excel files",
    long_about = "Clean, chart and convert CSV / Excel files.\n\n\
                  EXAMPLES:\n  \
                  # Dedupe then impute, convert to Excel\n  \
                  data-sweeper sales.csv --clean remove-duplicates --clean fill-missing --to xlsx\n\n  \
                  # Keep two columns and write a chart\n  \
                  data-sweeper book.xlsx --columns price,qty --chart -o out/"
)]
struct Args {
    /// CSV or XLSX files to process
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Cleaning operation, applied in the order given
    #[arg(long, value_enum)]
    clean: Vec<CleanArg>,

    /// Comma-separated columns to keep, in output order
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Write a bar chart of the first two numeric columns as `<stem>_chart.png`
    #[arg(long)]
    chart: bool,

    /// Convert to this format
    #[arg(long, value_enum)]
    to: Option<FormatArg>,

    /// Directory for converted files and charts
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the batch report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every file was processed without error.
fn run(args: Args) -> Result<bool> {
    let settings = match &args.config {
        Some(path) => Settings::from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    let uploads = args
        .files
        .iter()
        .map(read_upload)
        .collect::<Result<Vec<_>>>()?;

    let plan = Plan {
        cleaning: args.clean.iter().map(|c| CleanOp::from(*c)).collect(),
        columns: args.columns.clone(),
        chart: args.chart,
        convert_to: args.to.map(TargetFormat::from),
    };

    let report = run_batch(uploads, &plan, &settings);
    write_outputs(&report, &args.out_dir, &settings)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(report.succeeded())
}

fn read_upload(path: &PathBuf) -> Result<Upload> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Upload::new(name, bytes))
}

/// Save downloads and chart images next to each other in `out_dir`.
fn write_outputs(report: &BatchReport, out_dir: &Path, settings: &Settings) -> Result<()> {
    let has_output = report
        .files
        .iter()
        .any(|f| f.download.is_some() || f.chart.is_some());
    if !has_output {
        return Ok(());
    }

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    for file in &report.files {
        if let Some(download) = &file.download {
            let path = out_dir.join(&download.file_name);
            fs::write(&path, download.bytes())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }

        if let Some(chart) = &file.chart {
            let stem = Path::new(&file.name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.name.clone());
            let path = out_dir.join(format!("{}_chart.png", stem));
            let png = StaticChartRenderer::render_png(chart, &settings.chart)
                .with_context(|| format!("Failed to render chart for {}", file.name))?;
            fs::write(&path, png).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
    }

    Ok(())
}

fn print_report(report: &BatchReport) {
    for file in &report.files {
        println!("== {} ({})", file.name, file.size);

        if let Some(preview) = &file.preview {
            println!("{} rows x {} columns", file.rows, file.columns.len());
            println!("{}", preview);
        }

        for notice in &file.notices {
            let tag = match notice.level {
                Level::Success => "ok",
                Level::Info => "info",
                Level::Warning => "warn",
                Level::Error => "error",
            };
            println!("[{}] {}", tag, notice.message);
        }

        if let Some(chart) = &file.chart {
            println!(
                "[chart] {} vs {} over {} rows",
                chart.series[0].name,
                chart.series[1].name,
                chart.len()
            );
        }
        println!();
    }

    let failed = report.files.iter().filter(|f| f.has_errors()).count();
    if failed == 0 {
        println!("All files processed successfully!");
    } else {
        println!("{} of {} files had errors", failed, report.files.len());
    }
}
