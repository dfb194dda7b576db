//! File Job Module
//! Processing state of one uploaded file, driven by explicit method calls.

use crate::charts::{ChartData, ChartPlotter};
use crate::config::{ExportSettings, LoadSettings};
use crate::data::{
    extension_of, DataCleaner, DataLoader, DedupOutcome, FillOutcome, LoaderError, Projector,
    SourceFormat, Table, TableError,
};
use crate::export::{DataExporter, Download, ExportError, TargetFormat};
use log::info;

/// One uploaded file and its evolving table.
///
/// Cleaning mutates the table in place. Column selection is remembered
/// separately and only applied when the table is charted or converted.
#[derive(Debug, Clone)]
pub struct FileJob {
    name: String,
    bytes: Vec<u8>,
    format: SourceFormat,
    table: Table,
    selection: Option<Vec<String>>,
}

impl FileJob {
    /// Load an upload. Fails on an unsupported extension or unparsable content.
    pub fn open(
        name: impl Into<String>,
        bytes: Vec<u8>,
        settings: &LoadSettings,
    ) -> Result<Self, LoaderError> {
        let name = name.into();
        let extension = extension_of(&name);
        let format = SourceFormat::from_extension(&extension)
            .ok_or(LoaderError::UnsupportedFormat { extension })?;

        let table = DataLoader::new(settings).load_format(&bytes, format)?;
        info!("Opened '{}' ({})", name, format.label());

        Ok(Self {
            name,
            bytes,
            format,
            table,
            selection: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// Upload size in KiB.
    pub fn size_kib(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }

    /// Upload size for display, e.g. `1.50 KB`.
    pub fn size_label(&self) -> String {
        format!("{:.2} KB", self.size_kib())
    }

    /// Current table, cleaning applied, selection not applied.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// First `n` rows of the current table.
    pub fn preview(&self, n: usize) -> Table {
        self.table.head(n)
    }

    pub fn remove_duplicates(&mut self) -> Result<DedupOutcome, TableError> {
        DataCleaner::remove_duplicates(&mut self.table)
    }

    pub fn fill_missing(&mut self) -> Result<FillOutcome, TableError> {
        DataCleaner::fill_missing(&mut self.table)
    }

    /// Choose the columns later stages see, in order. Returns the requested
    /// names that do not exist in the table.
    pub fn select_columns(&mut self, columns: &[String]) -> Vec<String> {
        let resolved = Projector::resolve(&self.table, columns);
        let ignored = columns
            .iter()
            .filter(|name| !self.table.has_column(name))
            .cloned()
            .collect();
        self.selection = Some(resolved);
        ignored
    }

    /// Effective selection: the chosen columns, or all columns in table order.
    pub fn selection(&self) -> Vec<String> {
        match &self.selection {
            Some(columns) => columns.clone(),
            None => self.table.column_names(),
        }
    }

    /// Current table restricted to the selection.
    pub fn projected(&self) -> Result<Table, TableError> {
        Projector::project(&self.table, &self.selection())
    }

    /// Chart of the projected table, if it has two numeric columns.
    pub fn chart(&self) -> Result<Option<ChartData>, TableError> {
        ChartPlotter::chart(&self.projected()?)
    }

    /// Serialize the projected table.
    pub fn convert(
        &self,
        format: TargetFormat,
        settings: &ExportSettings,
    ) -> Result<Download, ExportError> {
        DataExporter::export(&self.projected()?, format, &self.name, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(name: &str, text: &str) -> FileJob {
        FileJob::open(name, text.as_bytes().to_vec(), &LoadSettings::default()).expect("open")
    }

    #[test]
    fn open_rejects_unknown_extension() {
        let err = FileJob::open("notes.txt", b"a\n1\n".to_vec(), &LoadSettings::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type: .txt");
    }

    #[test]
    fn size_label_has_two_decimals() {
        let job = FileJob::open(
            "big.csv",
            format!("a\n{}\n", "1".repeat(1533)).into_bytes(),
            &LoadSettings::default(),
        )
        .expect("open");
        assert_eq!(job.size_label(), "1.50 KB");
    }

    #[test]
    fn preview_is_first_rows() {
        let job = job("p.csv", "a\n1\n2\n3\n4\n5\n6\n7\n");
        let preview = job.preview(5);
        assert_eq!(preview.height(), 5);
        assert_eq!(job.table().height(), 7);
    }

    #[test]
    fn selection_defaults_to_all_columns() {
        let job = job("s.csv", "a,b,c\n1,2,3\n");
        assert_eq!(job.selection(), vec!["a", "b", "c"]);
    }

    #[test]
    fn select_columns_reports_unknown_names() {
        let mut job = job("s.csv", "a,b,c\n1,2,3\n");
        let ignored = job.select_columns(&["c".to_string(), "nope".to_string(), "a".to_string()]);
        assert_eq!(ignored, vec!["nope"]);
        assert_eq!(job.projected().expect("projected").column_names(), vec!["c", "a"]);
        assert_eq!(job.table().width(), 3);
    }

    #[test]
    fn chart_sees_only_selected_columns() {
        let mut job = job("c.csv", "x,y,z\n1,2,3\n4,5,6\n");
        assert!(job.chart().expect("chart").is_some());

        job.select_columns(&["z".to_string()]);
        assert!(job.chart().expect("chart").is_none());
    }

    #[test]
    fn convert_uses_projected_table() {
        let mut job = job("data.csv", "a,b\n1,x\n2,y\n");
        job.select_columns(&["b".to_string()]);
        let download = job
            .convert(TargetFormat::Csv, &ExportSettings::default())
            .expect("convert");
        assert_eq!(download.file_name, "data.csv");
        assert_eq!(download.bytes(), b"b\nx\ny\n");
    }
}
