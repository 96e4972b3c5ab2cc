//! Continent time series: group → reorder → widen → reselect → narrow.
//!
//! Each step is a public function so it can be exercised on its own;
//! [`continent_time_series`] chains them.

use std::collections::BTreeMap;

use super::order::{apply_continent_order, CONTINENT_COLUMN};
use crate::catalog::ContinentCatalog;
use crate::data::model::{Table, Value};
use crate::error::{ReshapeError, Result};

/// Name of the year column.
pub const YEAR_COLUMN: &str = "year";

/// Mean of `metric` per (year, continent) for every catalog continent, in
/// long format, ordered continent-major (catalog order) then by year.
///
/// The output has columns `year`, `continent`, `<metric>` and exactly one
/// row per distinct year × catalog continent observed anywhere in the
/// input; a continent with no value in some year gets a `Null` there.
/// Continents the catalog does not know are left out.
pub fn continent_time_series(
    table: &Table,
    catalog: &ContinentCatalog,
    metric: &str,
) -> Result<Table> {
    let grouped = group_mean_by_year_continent(table, metric)?;
    let ordered = apply_continent_order(&grouped, catalog, CONTINENT_COLUMN)?;
    let wide = widen(&ordered, YEAR_COLUMN, CONTINENT_COLUMN, metric)?;
    let wide = reselect_columns(wide, catalog);
    narrow(&wide, CONTINENT_COLUMN)
}

// ---------------------------------------------------------------------------
// Step 1: group
// ---------------------------------------------------------------------------

/// Whole-number years collapse to `Integer`, so `2000` and `2000.0` from a
/// loosely typed source land in one group.
fn year_key(year: &Value) -> Value {
    year.as_i64().map_or_else(|| year.clone(), Value::Integer)
}

#[derive(Default)]
struct Mean {
    sum: f64,
    count: usize,
}

/// Mean of `metric` per (year, continent), ignoring missing values.
///
/// Rows with a missing year or continent are skipped, and a group whose
/// metric is missing on every row is omitted. Output rows are sorted by
/// year, then by continent name.
pub fn group_mean_by_year_continent(table: &Table, metric: &str) -> Result<Table> {
    let year_idx = table.column_index(YEAR_COLUMN)?;
    let continent_idx = table.column_index(CONTINENT_COLUMN)?;
    let metric_idx = table.column_index(metric)?;

    let mut groups: BTreeMap<(Value, Value), Mean> = BTreeMap::new();
    for row in table.rows() {
        let (year, continent) = (&row[year_idx], &row[continent_idx]);
        if year.is_missing() || continent.is_missing() {
            continue;
        }
        let Some(v) = row[metric_idx].metric(metric)? else {
            continue;
        };
        let acc = groups.entry((year_key(year), continent.clone())).or_default();
        acc.sum += v;
        acc.count += 1;
    }

    let mut out = Table::new([YEAR_COLUMN, CONTINENT_COLUMN, metric])?;
    for ((year, continent), acc) in groups {
        out.push_row(vec![
            year,
            continent,
            Value::Float(acc.sum / acc.count as f64),
        ])?;
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Step 3: widen
// ---------------------------------------------------------------------------

/// Wide-format table: one row per index value, one column per category.
///
/// Every row of `cells` has one entry per column and there is one row per
/// index value.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    /// Name of the index column (e.g. `year`).
    index_name: String,
    /// Name of the values being spread (e.g. `gdp`).
    value_name: String,
    index: Vec<Value>,
    columns: Vec<String>,
    /// `cells[i][j]` is the value at `index[i]`, `columns[j]`.
    cells: Vec<Vec<Option<f64>>>,
}

impl WideTable {
    pub fn new(
        index_name: impl Into<String>,
        value_name: impl Into<String>,
        index: Vec<Value>,
        columns: Vec<String>,
        cells: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        if cells.len() != index.len() {
            return Err(ReshapeError::IndexLength {
                expected: index.len(),
                found: cells.len(),
            });
        }
        if let Some((row, cells_row)) = cells
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(ReshapeError::RowWidth {
                row,
                expected: columns.len(),
                found: cells_row.len(),
            });
        }
        Ok(Self {
            index_name: index_name.into(),
            value_name: value_name.into(),
            index,
            columns,
            cells,
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn value_name(&self) -> &str {
        &self.value_name
    }

    /// Sorted distinct index values.
    pub fn index(&self) -> &[Value] {
        &self.index
    }

    /// Category columns.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn cells(&self) -> &[Vec<Option<f64>>] {
        &self.cells
    }

    /// Cell at (`index`, `column`); `None` when either is absent or the
    /// cell is empty.
    pub fn get(&self, index: &Value, column: &str) -> Option<f64> {
        let i = self.index.iter().position(|v| v == index)?;
        let j = self.columns.iter().position(|c| c == column)?;
        self.cells[i][j]
    }
}

/// Pivot a long table into a [`WideTable`].
///
/// Category columns appear in order of first appearance in `long`, so an
/// ordered input yields ordered columns. Index values are sorted. A
/// (index, category) pair without a row leaves an empty cell; a pair seen
/// twice is an error.
pub fn widen(long: &Table, index: &str, columns: &str, values: &str) -> Result<WideTable> {
    let index_idx = long.column_index(index)?;
    let column_idx = long.column_index(columns)?;
    let value_idx = long.column_index(values)?;

    let mut index_values: Vec<Value> = Vec::new();
    let mut column_names: Vec<String> = Vec::new();
    let mut entries: BTreeMap<(Value, usize), Option<f64>> = BTreeMap::new();

    for row in long.rows() {
        let key = &row[index_idx];
        let category = &row[column_idx];
        if key.is_missing() || category.is_missing() {
            continue;
        }
        let name = category.as_str().ok_or_else(|| ReshapeError::Type {
            column: columns.to_string(),
            expected: "a string",
            found: category.kind().to_string(),
        })?;
        let j = match column_names.iter().position(|c| c == name) {
            Some(j) => j,
            None => {
                column_names.push(name.to_string());
                column_names.len() - 1
            }
        };
        if !index_values.contains(key) {
            index_values.push(key.clone());
        }
        let value = row[value_idx].metric(values)?;
        if entries.insert((key.clone(), j), value).is_some() {
            return Err(ReshapeError::DuplicateEntry {
                index: key.to_string(),
                column: name.to_string(),
            });
        }
    }

    index_values.sort();
    let cells = index_values
        .iter()
        .map(|key| {
            (0..column_names.len())
                .map(|j| entries.get(&(key.clone(), j)).copied().flatten())
                .collect()
        })
        .collect();

    Ok(WideTable {
        index_name: index.to_string(),
        value_name: values.to_string(),
        index: index_values,
        columns: column_names,
        cells,
    })
}

// ---------------------------------------------------------------------------
// Step 4: reselect
// ---------------------------------------------------------------------------

/// Reorder category columns into catalog order.
///
/// Only catalog continents present in `wide` are kept: no empty column is
/// added for a catalog continent without data, and columns the catalog
/// does not know are dropped. The index is left as is.
pub fn reselect_columns(wide: WideTable, catalog: &ContinentCatalog) -> WideTable {
    let mut order: Vec<(usize, usize)> = wide
        .columns
        .iter()
        .enumerate()
        .filter_map(|(j, name)| catalog.position(name).map(|pos| (pos, j)))
        .collect();
    order.sort_unstable();
    let order: Vec<usize> = order.into_iter().map(|(_, j)| j).collect();

    let columns = order.iter().map(|&j| wide.columns[j].clone()).collect();
    let cells = wide
        .cells
        .iter()
        .map(|row| order.iter().map(|&j| row[j]).collect())
        .collect();

    WideTable {
        columns,
        cells,
        ..wide
    }
}

// ---------------------------------------------------------------------------
// Step 5: narrow
// ---------------------------------------------------------------------------

/// Melt a [`WideTable`] back to long format.
///
/// Output columns are `<index_name>`, `var_name`, `<value_name>`; rows run
/// column by column, index ascending within each column, with empty cells
/// as `Null`.
pub fn narrow(wide: &WideTable, var_name: &str) -> Result<Table> {
    let mut out = Table::new([wide.index_name.as_str(), var_name, wide.value_name.as_str()])?;
    for (j, column) in wide.columns.iter().enumerate() {
        for (i, key) in wide.index.iter().enumerate() {
            out.push_row(vec![
                key.clone(),
                Value::from(column.as_str()),
                Value::from(wide.cells[i][j]),
            ])?;
        }
    }
    Ok(out)
}
