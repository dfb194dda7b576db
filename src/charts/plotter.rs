//! Chart Plotter Module
//! Derives paired-series bar chart data from a table.

use crate::data::{Table, TableError};
use log::{info, warn};
use serde::Serialize;

/// Message reported when a table cannot be charted.
pub const NOT_ENOUGH_DATA: &str = "Not enough numeric data for visualization";

/// One value series, named after its source column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Two series sharing a row-position axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub index: Vec<usize>,
    pub series: [ChartSeries; 2],
}

impl ChartData {
    /// Number of categories (rows).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Smallest and largest present value across both series, always spanning zero.
    pub fn value_range(&self) -> (f64, f64) {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().flatten())
            .filter(|v| v.is_finite())
            .fold((0.0, 0.0), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}

/// Builds chart data.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Chart the first two numeric columns over all rows.
    ///
    /// Returns `None` when the table has no rows or fewer than two numeric columns.
    pub fn chart(table: &Table) -> Result<Option<ChartData>, TableError> {
        if table.is_empty() {
            warn!("{} (no rows)", NOT_ENOUGH_DATA);
            return Ok(None);
        }

        let numeric = table.numeric_columns();
        if numeric.len() < 2 {
            warn!("{} ({} numeric columns)", NOT_ENOUGH_DATA, numeric.len());
            return Ok(None);
        }

        let first = ChartSeries {
            name: numeric[0].clone(),
            values: table.numbers(&numeric[0])?,
        };
        let second = ChartSeries {
            name: numeric[1].clone(),
            values: table.numbers(&numeric[1])?,
        };

        info!(
            "Chart: '{}' vs '{}' over {} rows",
            first.name,
            second.name,
            table.height()
        );

        Ok(Some(ChartData {
            index: (0..table.height()).collect(),
            series: [first, second],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::load;

    #[test]
    fn one_numeric_column_yields_no_chart() {
        let table = load(b"name,v\na,1\nb,2\n", ".csv").expect("load");
        assert!(ChartPlotter::chart(&table).expect("chart").is_none());
    }

    #[test]
    fn table_without_rows_yields_no_chart() {
        let table = load(b"x,y
1,2
", ".csv").expect("load").head(0);
        assert_eq!(table.numeric_columns(), vec!["x", "y"]);
        assert!(ChartPlotter::chart(&table).expect("chart").is_none());
    }

    #[test]
    fn takes_first_two_numeric_columns_in_order() {
        let table = load(b"x,label,y,z\n1,a,10,100\n2,b,,200\n3,c,30,300\n", ".csv").expect("load");
        let chart = ChartPlotter::chart(&table).expect("chart").expect("some chart");

        assert_eq!(chart.index, vec![0, 1, 2]);
        assert_eq!(chart.series[0].name, "x");
        assert_eq!(chart.series[1].name, "y");
        assert_eq!(chart.series[0].values, vec![Some(1.0), Some(2.0), Some(3.0)]);
        assert_eq!(chart.series[1].values, vec![Some(10.0), None, Some(30.0)]);
    }

    #[test]
    fn value_range_spans_zero() {
        let chart = ChartData {
            index: vec![0, 1],
            series: [
                ChartSeries {
                    name: "a".into(),
                    values: vec![Some(3.0), Some(5.0)],
                },
                ChartSeries {
                    name: "b".into(),
                    values: vec![None, Some(1.0)],
                },
            ],
        };
        assert_eq!(chart.value_range(), (0.0, 5.0));
    }
}
