//! Data Loader Module
//! Turns uploaded CSV / XLSX bytes into a typed Table.

use super::table::{format_number, Table, TableError};
use crate::config::LoadSettings;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx, XlsxError};
use log::{debug, info};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Unsupported file type: {extension}")]
    UnsupportedFormat { extension: String },
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to load workbook: {0}")]
    WorkbookError(#[from] XlsxError),
    #[error("Workbook has no worksheet")]
    NoWorksheet,
    #[error("Failed to build table: {0}")]
    TableError(#[from] TableError),
}

/// Formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

impl SourceFormat {
    /// Match an extension, with or without the leading dot, ignoring case.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Some(SourceFormat::Csv),
            "xlsx" => Some(SourceFormat::Xlsx),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SourceFormat::Csv => "CSV",
            SourceFormat::Xlsx => "Excel",
        }
    }
}

/// Lower-cased extension of a file name including the dot, or `""` when there is none.
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Load with default settings.
pub fn load(bytes: &[u8], extension: &str) -> Result<Table, LoaderError> {
    DataLoader::new(&LoadSettings::default()).load(bytes, extension)
}

/// Parses raw uploads into tables.
pub struct DataLoader<'a> {
    settings: &'a LoadSettings,
}

impl<'a> DataLoader<'a> {
    pub fn new(settings: &'a LoadSettings) -> Self {
        Self { settings }
    }

    /// Dispatch on the extension. Unknown extensions fail before any parsing.
    pub fn load(&self, bytes: &[u8], extension: &str) -> Result<Table, LoaderError> {
        let format =
            SourceFormat::from_extension(extension).ok_or_else(|| LoaderError::UnsupportedFormat {
                extension: extension.to_string(),
            })?;
        self.load_format(bytes, format)
    }

    pub fn load_format(&self, bytes: &[u8], format: SourceFormat) -> Result<Table, LoaderError> {
        let table = match format {
            SourceFormat::Csv => self.load_csv(bytes)?,
            SourceFormat::Xlsx => self.load_xlsx(bytes)?,
        };
        info!(
            "Loaded {} table: {} rows, {} columns",
            format.label(),
            table.height(),
            table.width()
        );
        Ok(table)
    }

    /// Read CSV with every column as text, then classify explicitly.
    ///
    /// The header line is parsed as an ordinary row so that blank and repeated
    /// names reach header normalization exactly as written.
    pub fn load_csv(&self, bytes: &[u8]) -> Result<Table, LoaderError> {
        let df = CsvReadOptions::default()
            .with_has_header(false)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish()?;

        let height = df.height().saturating_sub(1);
        let mut columns = Vec::with_capacity(df.width());

        for column in df.get_columns() {
            let text = column.cast(&DataType::String)?;
            let mut values = text.str()?.into_iter().map(|v| v.map(str::to_string));
            let header = values.next().flatten().unwrap_or_default();
            columns.push((header, values.collect::<Vec<_>>()));
        }

        debug!("CSV parsed: {} raw columns", columns.len());
        Ok(Table::from_text_columns(columns, height, self.settings)?)
    }

    /// Read the first worksheet; its first used row is the header.
    pub fn load_xlsx(&self, bytes: &[u8]) -> Result<Table, LoaderError> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(LoaderError::NoWorksheet)??;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            return Ok(Table::from_text_columns(Vec::new(), 0, self.settings)?);
        };

        let mut columns: Vec<(String, Vec<Option<String>>)> = header
            .iter()
            .map(|cell| (cell_text(cell).unwrap_or_default(), Vec::new()))
            .collect();

        let mut height = 0;
        for row in rows {
            height += 1;
            for ((_, cells), cell) in columns.iter_mut().zip(row.iter()) {
                cells.push(cell_text(cell));
            }
        }

        debug!("Worksheet parsed: {} raw columns", columns.len());
        Ok(Table::from_text_columns(columns, height, self.settings)?)
    }
}

/// Render a worksheet cell as raw text; empty cells have none.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(f) => Some(format_number(*f)),
        Data::Int(i) => Some(i.to_string()),
        other => Some(other.to_string()),
    }
}
