//! Column Projector Module
//! Restricts a table to a chosen, ordered subset of columns.

use super::table::{Table, TableError};
use log::warn;
use std::collections::HashSet;

/// Selects and reorders columns.
pub struct Projector;

impl Projector {
    /// Reduce a requested selection to existing, distinct names in request order.
    pub fn resolve(table: &Table, requested: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        requested
            .iter()
            .filter(|name| {
                let known = table.has_column(name);
                if !known {
                    warn!("Ignoring unknown column '{}'", name);
                }
                known && seen.insert(name.as_str())
            })
            .cloned()
            .collect()
    }

    /// Table restricted to `selection`, ordered as in `selection`.
    ///
    /// Unknown and repeated names are dropped. An empty selection yields zero
    /// columns with the original row count. The input table is not modified.
    pub fn project(table: &Table, selection: &[String]) -> Result<Table, TableError> {
        let names = Self::resolve(table, selection);
        table.select(&names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::load;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn follows_selection_order() {
        let table = load(b"a,b,c\n1,2,3\n", ".csv").expect("load");
        let projected = Projector::project(&table, &names(&["c", "a"])).expect("project");
        assert_eq!(projected.column_names(), vec!["c", "a"]);
        assert_eq!(table.column_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn drops_unknown_and_repeated_names() {
        let table = load(b"a,b\n1,2\n", ".csv").expect("load");
        let resolved = Projector::resolve(&table, &names(&["b", "zz", "b", "a"]));
        assert_eq!(resolved, vec!["b", "a"]);
    }

    #[test]
    fn empty_selection_keeps_row_count() {
        let table = load(b"a,b\n1,2\n3,4\n5,6\n", ".csv").expect("load");
        let projected = Projector::project(&table, &[]).expect("project");
        assert_eq!(projected.width(), 0);
        assert_eq!(projected.height(), 3);
    }
}
