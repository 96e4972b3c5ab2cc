use std::collections::{BTreeMap, BTreeSet};

use super::model::{Table, Value};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Filter predicate: which values are selected per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of selected values.
/// A column absent from the map is not constrained.
pub type FilterState = BTreeMap<String, BTreeSet<Value>>;

/// Return indices of rows that pass all active filters.
///
/// A row passes a column filter when its value for that column is in the
/// selected set. An empty set selects nothing. Filtering on a column the
/// table lacks is a schema error.
pub fn filtered_indices(table: &Table, filters: &FilterState) -> Result<Vec<usize>> {
    let active: Vec<(usize, &BTreeSet<Value>)> = filters
        .iter()
        .map(|(col, selected)| Ok((table.column_index(col)?, selected)))
        .collect::<Result<_>>()?;

    Ok(table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            active
                .iter()
                .all(|(idx, selected)| selected.contains(&row[*idx]))
        })
        .map(|(i, _)| i)
        .collect())
}

/// Apply a [`FilterState`] and return the matching rows in input order.
pub fn apply_filters(table: &Table, filters: &FilterState) -> Result<Table> {
    let indices = filtered_indices(table, filters)?;
    Ok(table.select_rows(&indices))
}

/// Rows whose `year` equals `year`. Float-typed years compare numerically.
pub fn select_year(table: &Table, year: i64) -> Result<Table> {
    let idx = table.column_index("year")?;
    Ok(table.filter_rows(|row| row[idx].as_i64() == Some(year)))
}

/// Rows of the given continents only.
pub fn select_continents<I, S>(table: &Table, continents: I) -> Result<Table>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let selected: BTreeSet<Value> = continents
        .into_iter()
        .map(|c| Value::String(c.into()))
        .collect();
    let mut filters = FilterState::new();
    filters.insert("continent".to_string(), selected);
    apply_filters(table, &filters)
}

/// Drop rows with a missing value in `column`.
pub fn drop_missing(table: &Table, column: &str) -> Result<Table> {
    let idx = table.column_index(column)?;
    Ok(table.filter_rows(|row| !row[idx].is_missing()))
}

/// Distinct non-missing values of `column`, in order of first appearance.
pub fn distinct_values(table: &Table, column: &str) -> Result<Vec<Value>> {
    let idx = table.column_index(column)?;
    let mut seen = BTreeSet::new();
    Ok(table
        .rows()
        .iter()
        .map(|row| &row[idx])
        .filter(|v| !v.is_missing() && seen.insert((*v).clone()))
        .cloned()
        .collect())
}
