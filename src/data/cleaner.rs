//! Data Cleaner Module
//! In-place cleaning operations: duplicate removal and mean imputation.

use super::table::{CellValue, Table, TableError};
use log::{debug, info, warn};
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::HashSet;

/// Result of a duplicate-removal pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DedupOutcome {
    pub removed: usize,
}

/// One numeric column touched by mean imputation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilledColumn {
    pub column: String,
    pub cells: usize,
    pub mean: f64,
}

/// Result of a fill-missing pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FillOutcome {
    /// Numeric columns exist; lists the ones that actually had gaps.
    Filled { columns: Vec<FilledColumn> },
    /// Nothing to do: the table has no numeric column.
    NoNumericColumns,
}

impl FillOutcome {
    /// Total number of cells replaced.
    pub fn cells_filled(&self) -> usize {
        match self {
            FillOutcome::Filled { columns } => columns.iter().map(|c| c.cells).sum(),
            FillOutcome::NoNumericColumns => 0,
        }
    }
}

/// Hashable identity of a cell for row comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CellKey {
    Missing,
    Number(u64),
    Text(String),
}

impl From<CellValue> for CellKey {
    fn from(cell: CellValue) -> Self {
        match cell {
            CellValue::Missing => CellKey::Missing,
            // -0.0 and 0.0 compare equal, so they must share a key
            CellValue::Number(v) => {
                let v = if v == 0.0 { 0.0 } else { v };
                CellKey::Number(v.to_bits())
            }
            CellValue::Text(s) => CellKey::Text(s),
        }
    }
}

/// Cleaning operations on a table.
pub struct DataCleaner;

impl DataCleaner {
    /// Drop rows identical to an earlier row across all columns.
    ///
    /// The first occurrence survives and survivors keep their relative order.
    pub fn remove_duplicates(table: &mut Table) -> Result<DedupOutcome, TableError> {
        if table.width() == 0 {
            return Ok(DedupOutcome { removed: 0 });
        }

        let mut seen: HashSet<Vec<CellKey>> = HashSet::with_capacity(table.height());
        let keep: Vec<bool> = table
            .rows()?
            .into_iter()
            .map(|row| seen.insert(row.into_iter().map(CellKey::from).collect()))
            .collect();

        let removed = keep.iter().filter(|k| !**k).count();
        if removed > 0 {
            table.retain_rows(&keep)?;
        }

        info!("Removed {} duplicate rows, {} remain", removed, table.height());
        Ok(DedupOutcome { removed })
    }

    /// Replace missing numeric cells with their column mean.
    ///
    /// Each mean is taken over the column's present values before anything is
    /// replaced. Text columns are left alone.
    pub fn fill_missing(table: &mut Table) -> Result<FillOutcome, TableError> {
        let numeric = table.numeric_columns();
        if numeric.is_empty() {
            warn!("No numeric columns to fill");
            return Ok(FillOutcome::NoNumericColumns);
        }

        let mut filled = Vec::new();

        for name in &numeric {
            let values = table.numbers(name)?;
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            let missing = values.len() - present.len();

            if missing == 0 || present.is_empty() {
                continue;
            }

            let mean = present.iter().mean();
            if mean.is_nan() {
                debug!("Column '{}' mean is undefined, left as is", name);
                continue;
            }

            let replaced: Vec<f64> = values.iter().map(|v| v.unwrap_or(mean)).collect();
            table.replace_numbers(name, replaced)?;
            debug!("Filled {} cells in '{}' with {}", missing, name, mean);

            filled.push(FilledColumn {
                column: name.clone(),
                cells: missing,
                mean,
            });
        }

        let outcome = FillOutcome::Filled { columns: filled };
        info!("Filled {} missing cells", outcome.cells_filled());
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::load;

    fn csv(text: &str) -> Table {
        load(text.as_bytes(), ".csv").expect("csv")
    }

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let mut table = csv("k,v\nb,1\na,2\nb,1\nc,3\na,2\n");
        let outcome = DataCleaner::remove_duplicates(&mut table).expect("dedup");
        assert_eq!(outcome.removed, 2);

        let keys: Vec<String> = table
            .column_cells(0)
            .expect("cells")
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn dedup_is_idempotent() {
        let mut table = csv("a,b\n1,2\n1,2\n3,\n3,\n");
        DataCleaner::remove_duplicates(&mut table).expect("first");
        let once = table.rows().expect("rows");
        let again = DataCleaner::remove_duplicates(&mut table).expect("second");
        assert_eq!(again.removed, 0);
        assert_eq!(table.rows().expect("rows"), once);
        assert_eq!(table.height(), 2);
    }

    #[test]
    fn dedup_treats_missing_as_equal() {
        let mut table = csv("a,b\nx,\nx,\n");
        let outcome = DataCleaner::remove_duplicates(&mut table).expect("dedup");
        assert_eq!(outcome.removed, 1);
    }

    #[test]
    fn fill_uses_mean_of_present_values() {
        let mut table = csv("k,v\na,1\nb,\nc,3\n");
        let outcome = DataCleaner::fill_missing(&mut table).expect("fill");
        assert_eq!(outcome.cells_filled(), 1);
        assert_eq!(
            table.numbers("v").expect("v"),
            vec![Some(1.0), Some(2.0), Some(3.0)]
        );
    }

    #[test]
    fn fill_leaves_text_columns_alone() {
        let mut table = csv("n,t\n2,\n,x\n4,y\n");
        DataCleaner::fill_missing(&mut table).expect("fill");
        assert_eq!(
            table.numbers("n").expect("n"),
            vec![Some(2.0), Some(3.0), Some(4.0)]
        );
        assert_eq!(table.missing_count("t").expect("t"), 1);
    }

    #[test]
    fn fill_without_numeric_columns_warns_and_keeps_table() {
        let mut table = csv("t,u\nx,\n,y\n");
        let before = table.rows().expect("rows");
        let outcome = DataCleaner::fill_missing(&mut table).expect("fill");
        assert_eq!(outcome, FillOutcome::NoNumericColumns);
        assert_eq!(table.rows().expect("rows"), before);
    }

    #[test]
    fn fill_on_header_only_csv_finds_no_numeric_columns() {
        let mut table = csv("a,b\n");
        assert_eq!(table.height(), 0);
        let outcome = DataCleaner::fill_missing(&mut table).expect("fill");
        assert_eq!(outcome, FillOutcome::NoNumericColumns);
    }

    #[test]
    fn fill_is_idempotent() {
        let mut table = csv("a,b\n1,\n,4\n5,6\n");
        DataCleaner::fill_missing(&mut table).expect("first");
        let once = table.rows().expect("rows");
        let again = DataCleaner::fill_missing(&mut table).expect("second");
        assert_eq!(again.cells_filled(), 0);
        assert_eq!(table.rows().expect("rows"), once);
    }

    #[test]
    fn all_missing_numeric_column_stays_missing() {
        let mut table = csv("a,b\n1,\n2,\n");
        DataCleaner::fill_missing(&mut table).expect("fill");
        assert_eq!(table.missing_count("b").expect("b"), 2);
    }

    #[test]
    fn fill_before_dedup_uses_full_row_set() {
        let mut table = csv("k,v\na,1\na,1\nb,4\nc,\n");
        DataCleaner::fill_missing(&mut table).expect("fill");
        assert_eq!(table.numbers("v").expect("v")[3], Some(2.0));

        let mut table = csv("k,v\na,1\na,1\nb,4\nc,\n");
        DataCleaner::remove_duplicates(&mut table).expect("dedup");
        DataCleaner::fill_missing(&mut table).expect("fill");
        assert_eq!(table.numbers("v").expect("v")[2], Some(2.5));
    }
}
