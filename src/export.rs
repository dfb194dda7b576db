//! Export Module
//! Serializes tables to CSV or XLSX into an in-memory download buffer.

use crate::config::ExportSettings;
use crate::data::{Table, TableError};
use crate::xlsx::XlsxGenerator;
use log::info;
use polars::prelude::*;
use serde::Serialize;
use std::io::{Cursor, Seek, SeekFrom};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Column '{column}' row {row} contains character U+{code:04X}, which XLSX cannot store")]
    IllegalCharacter { column: String, row: usize, code: u32 },
    #[error("Column '{column}' row {row} holds {length} characters, over the cell limit")]
    TextTooLong {
        column: String,
        row: usize,
        length: usize,
    },
    #[error("Column '{column}' row {row} holds {value}, which XLSX cannot store")]
    NonFiniteNumber { column: String, row: usize, value: f64 },
    #[error("Table of {rows} rows x {columns} columns exceeds the worksheet limits")]
    TooLarge { rows: usize, columns: usize },
    #[error("Invalid sheet name: '{0}'")]
    InvalidSheetName(String),
    #[error("Table error: {0}")]
    Table(#[from] TableError),
    #[error("CSV write failed: {0}")]
    Csv(#[from] PolarsError),
    #[error("Archive write failed: {0}")]
    Zip(#[from] ::zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Formats a table can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Csv,
    Xlsx,
}

impl TargetFormat {
    /// Extension including the dot.
    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Csv => ".csv",
            TargetFormat::Xlsx => ".xlsx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            TargetFormat::Csv => "text/csv",
            TargetFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TargetFormat::Csv => "CSV",
            TargetFormat::Xlsx => "Excel",
        }
    }
}

/// A converted file, ready to be saved or offered for download.
#[derive(Debug, Clone, Serialize)]
pub struct Download {
    pub file_name: String,
    pub mime_type: String,
    pub format: TargetFormat,
    /// Serialized bytes, positioned at the start.
    #[serde(skip)]
    pub buffer: Cursor<Vec<u8>>,
}

impl Download {
    pub fn bytes(&self) -> &[u8] {
        self.buffer.get_ref()
    }

    pub fn len(&self) -> usize {
        self.buffer.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.get_ref().is_empty()
    }
}

/// Name of the converted file: the final extension of `source_name` is replaced,
/// or appended when there is none.
pub fn converted_file_name(source_name: &str, format: TargetFormat) -> String {
    let extension = format.extension().trim_start_matches('.');
    Path::new(source_name)
        .with_extension(extension)
        .to_string_lossy()
        .into_owned()
}

/// Table exporter
pub struct DataExporter;

impl DataExporter {
    /// Serialize the table in the requested format.
    pub fn export(
        table: &Table,
        format: TargetFormat,
        source_name: &str,
        settings: &ExportSettings,
    ) -> Result<Download, ExportError> {
        let buffer = Cursor::new(Vec::new());
        let mut buffer = match format {
            TargetFormat::Csv => Self::write_csv(table, buffer)?,
            TargetFormat::Xlsx => XlsxGenerator::write(table, &settings.sheet_name, buffer)?,
        };
        buffer.seek(SeekFrom::Start(0))?;

        let download = Download {
            file_name: converted_file_name(source_name, format),
            mime_type: format.mime_type().to_string(),
            format,
            buffer,
        };

        info!(
            "Exported '{}' as {} ({} bytes)",
            download.file_name,
            format.label(),
            download.len()
        );
        Ok(download)
    }

    fn write_csv(
        table: &Table,
        mut buffer: Cursor<Vec<u8>>,
    ) -> Result<Cursor<Vec<u8>>, ExportError> {
        if table.width() == 0 {
            return Ok(buffer);
        }

        let mut rendered = table.rendered_frame()?;
        CsvWriter::new(&mut buffer)
            .include_header(true)
            .with_separator(b',')
            .finish(&mut rendered)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::load;

    fn csv_text(download: &Download) -> String {
        String::from_utf8(download.bytes().to_vec()).expect("utf8")
    }

    #[test]
    fn file_name_replaces_final_extension() {
        assert_eq!(converted_file_name("data.xlsx", TargetFormat::Csv), "data.csv");
        assert_eq!(converted_file_name("data.csv", TargetFormat::Xlsx), "data.xlsx");
        assert_eq!(converted_file_name("a.b.csv", TargetFormat::Xlsx), "a.b.xlsx");
        assert_eq!(converted_file_name("README", TargetFormat::Csv), "README.csv");
    }

    #[test]
    fn csv_export_renders_numbers_compactly() {
        let table = load(b"a,b,t\n1,2.5,x\n3,,\"y, z\"\n", ".csv").expect("load");
        let download =
            DataExporter::export(&table, TargetFormat::Csv, "in.csv", &ExportSettings::default())
                .expect("export");

        assert_eq!(download.mime_type, "text/csv");
        assert_eq!(download.buffer.position(), 0);
        assert_eq!(csv_text(&download), "a,b,t\n1,2.5,x\n3,,\"y, z\"\n");
    }

    #[test]
    fn xlsx_export_sets_mime_and_rewinds() {
        let table = load(b"a\n1\n", ".csv").expect("load");
        let download =
            DataExporter::export(&table, TargetFormat::Xlsx, "in.csv", &ExportSettings::default())
                .expect("export");

        assert_eq!(download.file_name, "in.xlsx");
        assert_eq!(
            download.mime_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(download.buffer.position(), 0);
        assert!(!download.is_empty());
    }

    #[test]
    fn xlsx_export_rejects_infinite_numbers() {
        let table = load(b"a\n1\ninf\n", ".csv").expect("load");
        let err =
            DataExporter::export(&table, TargetFormat::Xlsx, "in.csv", &ExportSettings::default())
                .unwrap_err();
        assert!(matches!(err, ExportError::NonFiniteNumber { row: 3, .. }));
    }

    #[test]
    fn bad_sheet_name_is_rejected() {
        let table = load(b"a\n1\n", ".csv").expect("load");
        let settings = ExportSettings {
            sheet_name: "a[1]".to_string(),
        };
        let err =
            DataExporter::export(&table, TargetFormat::Xlsx, "in.csv", &settings).unwrap_err();
        assert!(matches!(err, ExportError::InvalidSheetName(_)));
    }
}
