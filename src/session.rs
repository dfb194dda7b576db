//! Session Module
//! Runs a batch of uploads through the pipeline and collects per-file reports.

use crate::charts::{ChartData, NOT_ENOUGH_DATA};
use crate::config::Settings;
use crate::data::{ColumnKind, FillOutcome, Table};
use crate::export::{Download, TargetFormat};
use crate::job::FileJob;
use log::{error, info, warn};
use serde::Serialize;

/// Raw file as delivered by the host.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// A cleaning operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleanOp {
    RemoveDuplicates,
    FillMissing,
}

/// What to do with every file of a batch.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    /// Applied in order.
    pub cleaning: Vec<CleanOp>,
    /// `None` keeps all columns.
    pub columns: Option<Vec<String>>,
    pub chart: bool,
    pub convert_to: Option<TargetFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

/// A status line shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Outcome of processing one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub name: String,
    pub size: String,
    pub rows: usize,
    pub columns: Vec<(String, ColumnKind)>,
    #[serde(skip)]
    pub preview: Option<Table>,
    pub notices: Vec<Notice>,
    pub chart: Option<ChartData>,
    pub download: Option<Download>,
}

impl FileReport {
    fn new(name: &str, size: String) -> Self {
        Self {
            name: name.to_string(),
            size,
            rows: 0,
            columns: Vec::new(),
            preview: None,
            notices: Vec::new(),
            chart: None,
            download: None,
        }
    }

    fn notice(&mut self, level: Level, message: impl Into<String>) {
        let notice = Notice::new(level, message);
        match notice.level {
            Level::Error => error!("{}: {}", self.name, notice.message),
            Level::Warning => warn!("{}: {}", self.name, notice.message),
            Level::Success | Level::Info => info!("{}: {}", self.name, notice.message),
        }
        self.notices.push(notice);
    }

    pub fn has_errors(&self) -> bool {
        self.notices.iter().any(|n| n.level == Level::Error)
    }
}

/// Reports for a whole batch, in upload order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    /// True when no file reported an error.
    pub fn succeeded(&self) -> bool {
        self.files.iter().all(|f| !f.has_errors())
    }
}

/// Process every upload in order. A failing file never stops the batch.
pub fn run_batch(uploads: Vec<Upload>, plan: &Plan, settings: &Settings) -> BatchReport {
    let files = uploads
        .into_iter()
        .map(|upload| process(upload, plan, settings))
        .collect();
    BatchReport { files }
}

fn process(upload: Upload, plan: &Plan, settings: &Settings) -> FileReport {
    let size = format!("{:.2} KB", upload.bytes.len() as f64 / 1024.0);
    let mut report = FileReport::new(&upload.name, size);

    let mut job = match FileJob::open(upload.name, upload.bytes, &settings.load) {
        Ok(job) => job,
        Err(err) => {
            report.notice(Level::Error, err.to_string());
            return report;
        }
    };
    report.size = job.size_label();

    for op in &plan.cleaning {
        let result = match op {
            CleanOp::RemoveDuplicates => job.remove_duplicates().map(|outcome| {
                report.notice(
                    Level::Success,
                    format!("Duplicates removed ({} rows)", outcome.removed),
                )
            }),
            CleanOp::FillMissing => job.fill_missing().map(|outcome| match outcome {
                FillOutcome::NoNumericColumns => report.notice(
                    Level::Warning,
                    "No numeric columns found to fill missing values",
                ),
                filled => report.notice(
                    Level::Success,
                    format!("Missing values filled ({} cells)", filled.cells_filled()),
                ),
            }),
        };

        if let Err(err) = result {
            report.notice(Level::Error, format!("Failed to clean {}: {}", job.name(), err));
            return report;
        }
    }

    report.rows = job.table().height();
    report.columns = job.table().kinds();
    report.preview = Some(job.preview(settings.preview_rows));

    if let Some(columns) = &plan.columns {
        let ignored = job.select_columns(columns);
        if !ignored.is_empty() {
            report.notice(
                Level::Info,
                format!("Ignored unknown columns: {}", ignored.join(", ")),
            );
        }
    }

    if plan.chart {
        match job.chart() {
            Ok(Some(chart)) => report.chart = Some(chart),
            Ok(None) => report.notice(Level::Warning, NOT_ENOUGH_DATA),
            Err(err) => report.notice(
                Level::Error,
                format!("Failed to chart {}: {}", job.name(), err),
            ),
        }
    }

    if let Some(format) = plan.convert_to {
        match job.convert(format, &settings.export) {
            Ok(download) => {
                report.notice(
                    Level::Success,
                    format!("Converted to {}: {}", format.label(), download.file_name),
                );
                report.download = Some(download);
            }
            Err(err) => report.notice(
                Level::Error,
                format!("Failed to convert {}: {}", job.name(), err),
            ),
        }
    }

    report
}
