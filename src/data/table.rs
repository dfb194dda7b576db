//! Table Module
//! In-memory table backed by a Polars DataFrame, with explicit column typing.

use crate::config::LoadSettings;
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Unknown column: {0}")]
    UnknownColumn(String),
    #[error("Column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Every present value is a number.
    Numeric,
    /// Anything else, including partially numeric columns.
    Text,
}

/// A single cell value, rendered the way exports write it.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Missing,
    Number(f64),
    Text(String),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => Ok(()),
            CellValue::Number(v) => write!(f, "{}", format_number(*v)),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Parse a raw cell as a number. Surrounding whitespace is ignored; NaN never counts.
pub fn parse_number(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// Classify a column from its present values (`None` = missing).
///
/// A column is numeric only when every present value parses as a number, so a
/// column with nothing present is numeric too.
pub fn infer_kind<'a, I>(values: I) -> ColumnKind
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    if values
        .into_iter()
        .flatten()
        .all(|v| parse_number(v).is_some())
    {
        ColumnKind::Numeric
    } else {
        ColumnKind::Text
    }
}

/// Shortest decimal form that reads back to the same number (`2.0` -> `2`).
pub fn format_number(value: f64) -> String {
    format!("{value}")
}

/// Blank headers become `Unnamed: {index}`, repeats get `.1`, `.2`, ... suffixes.
pub fn normalize_headers<'a, I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::new();

    for (idx, header) in raw.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            header.to_string()
        };

        let mut name = base.clone();
        let mut suffix = 0;
        while seen.contains(&name) {
            suffix += 1;
            name = format!("{base}.{suffix}");
        }
        seen.insert(name.clone());
        names.push(name);
    }

    names
}

fn kind_of(column: &Column) -> ColumnKind {
    if matches!(
        column.dtype(),
        DataType::Float32
            | DataType::Float64
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt32
            | DataType::UInt64
    ) {
        ColumnKind::Numeric
    } else {
        ColumnKind::Text
    }
}

/// Ordered, named, typed columns of equal length.
///
/// The row count is kept alongside the frame so that a table narrowed to zero
/// columns still knows how many rows it has.
#[derive(Debug, Clone)]
pub struct Table {
    frame: DataFrame,
    height: usize,
}

impl Table {
    /// Build a table from raw text columns, classifying each one.
    ///
    /// Cells matching a missing-value token become missing before classification.
    /// Numeric columns are stored as floats, text columns keep their values verbatim.
    /// A table without rows has only text columns.
    pub fn from_text_columns(
        columns: Vec<(String, Vec<Option<String>>)>,
        height: usize,
        settings: &LoadSettings,
    ) -> Result<Self, TableError> {
        let names = normalize_headers(columns.iter().map(|(name, _)| name.as_str()));
        let mut built = Vec::with_capacity(columns.len());

        for (name, (_, cells)) in names.into_iter().zip(columns) {
            if cells.len() != height {
                return Err(TableError::LengthMismatch {
                    column: name,
                    expected: height,
                    actual: cells.len(),
                });
            }

            let cells: Vec<Option<String>> = cells
                .into_iter()
                .map(|cell| cell.filter(|raw| !settings.is_missing(raw)))
                .collect();

            // Without rows there is no evidence of numbers
            let kind = if height == 0 {
                ColumnKind::Text
            } else {
                infer_kind(cells.iter().map(|c| c.as_deref()))
            };

            let column = match kind {
                ColumnKind::Numeric => {
                    let values: Vec<Option<f64>> = cells
                        .iter()
                        .map(|c| c.as_deref().and_then(parse_number))
                        .collect();
                    Column::new(name.into(), values)
                }
                ColumnKind::Text => Column::new(name.into(), cells),
            };
            built.push(column);
        }

        Self::from_columns(built, height)
    }

    /// Wrap already-typed columns. `height` is only used when there are no columns.
    pub fn from_columns(columns: Vec<Column>, height: usize) -> Result<Self, TableError> {
        let height = columns.first().map(|c| c.len()).unwrap_or(height);
        let frame = DataFrame::new(columns)?;
        Ok(Self { frame, height })
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.get_columns().iter().any(|c| c.name().as_str() == name)
    }

    /// Kind of a column, if it exists.
    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.column(name).ok().map(kind_of)
    }

    /// Names and kinds of all columns, in order.
    pub fn kinds(&self) -> Vec<(String, ColumnKind)> {
        self.frame
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), kind_of(c)))
            .collect()
    }

    /// Names of numeric columns, in table order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.kinds()
            .into_iter()
            .filter(|(_, kind)| *kind == ColumnKind::Numeric)
            .map(|(name, _)| name)
            .collect()
    }

    /// Missing cells in a column.
    pub fn missing_count(&self, name: &str) -> Result<usize, TableError> {
        Ok(self.column(name)?.null_count())
    }

    /// Underlying DataFrame.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    fn column(&self, name: &str) -> Result<&Column, TableError> {
        self.frame
            .get_columns()
            .iter()
            .find(|c| c.name().as_str() == name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    /// Values of a numeric column (`None` = missing).
    pub fn numbers(&self, name: &str) -> Result<Vec<Option<f64>>, TableError> {
        let column = self.column(name)?;
        let cast = column.cast(&DataType::Float64)?;
        Ok(cast.f64()?.into_iter().collect())
    }

    /// Replace a column with fully present numbers.
    pub fn replace_numbers(&mut self, name: &str, values: Vec<f64>) -> Result<(), TableError> {
        if values.len() != self.height {
            return Err(TableError::LengthMismatch {
                column: name.to_string(),
                expected: self.height,
                actual: values.len(),
            });
        }

        let mut columns = self.frame.get_columns().to_vec();
        let slot = columns
            .iter_mut()
            .find(|c| c.name().as_str() == name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))?;
        *slot = Column::new(name.into(), values);
        self.frame = DataFrame::new(columns)?;
        Ok(())
    }

    /// Cells of the column at `idx`.
    pub fn column_cells(&self, idx: usize) -> Result<Vec<CellValue>, TableError> {
        let column = self
            .frame
            .get_columns()
            .get(idx)
            .ok_or_else(|| TableError::UnknownColumn(format!("#{idx}")))?;

        let cells = match kind_of(column) {
            ColumnKind::Numeric => {
                let cast = column.cast(&DataType::Float64)?;
                cast.f64()?
                    .into_iter()
                    .map(|v| v.map_or(CellValue::Missing, CellValue::Number))
                    .collect()
            }
            ColumnKind::Text => {
                let cast = column.cast(&DataType::String)?;
                cast.str()?
                    .into_iter()
                    .map(|v| v.map_or(CellValue::Missing, |s| CellValue::Text(s.to_string())))
                    .collect()
            }
        };
        Ok(cells)
    }

    /// All rows, each as cells in column order.
    pub fn rows(&self) -> Result<Vec<Vec<CellValue>>, TableError> {
        let mut rows: Vec<Vec<CellValue>> = (0..self.height)
            .map(|_| Vec::with_capacity(self.width()))
            .collect();

        for idx in 0..self.width() {
            for (row, cell) in rows.iter_mut().zip(self.column_cells(idx)?) {
                row.push(cell);
            }
        }

        Ok(rows)
    }

    /// Keep only the rows whose mask entry is true, preserving order.
    pub fn retain_rows(&mut self, keep: &[bool]) -> Result<(), TableError> {
        if keep.len() != self.height {
            return Err(TableError::LengthMismatch {
                column: "<row mask>".to_string(),
                expected: self.height,
                actual: keep.len(),
            });
        }

        let mask = BooleanChunked::from_slice(PlSmallStr::EMPTY, keep);
        self.frame = self.frame.filter(&mask)?;
        self.height = keep.iter().filter(|k| **k).count();
        Ok(())
    }

    /// New table with the named columns in the given order.
    pub fn select(&self, names: &[String]) -> Result<Self, TableError> {
        let columns = names
            .iter()
            .map(|name| self.column(name).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_columns(columns, self.height)
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Self {
        Self {
            frame: self.frame.head(Some(n)),
            height: self.height.min(n),
        }
    }

    /// Copy of the frame with numeric columns rendered as text, ready for CSV output.
    pub fn rendered_frame(&self) -> Result<DataFrame, TableError> {
        let mut columns = Vec::with_capacity(self.width());

        for column in self.frame.get_columns() {
            match kind_of(column) {
                ColumnKind::Text => columns.push(column.clone()),
                ColumnKind::Numeric => {
                    let cast = column.cast(&DataType::Float64)?;
                    let values: Vec<Option<String>> = cast
                        .f64()?
                        .into_iter()
                        .map(|v| v.map(format_number))
                        .collect();
                    columns.push(Column::new(column.name().clone(), values));
                }
            }
        }

        Ok(DataFrame::new(columns)?)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.frame)
    }
}
