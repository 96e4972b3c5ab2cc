use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::order::{apply_continent_order, CONTINENT_COLUMN};
use crate::catalog::ContinentCatalog;
use crate::data::model::{Table, Value};
use crate::error::Result;

/// Reduction applied to a metric within each continent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    Mean,
    Max,
    Sum,
    /// Number of non-missing values.
    Count,
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reduction::Mean => "mean",
            Reduction::Max => "max",
            Reduction::Sum => "sum",
            Reduction::Count => "count",
        };
        f.write_str(name)
    }
}

impl FromStr for Reduction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mean" => Ok(Reduction::Mean),
            "max" => Ok(Reduction::Max),
            "sum" => Ok(Reduction::Sum),
            "count" => Ok(Reduction::Count),
            other => Err(format!("unknown reduction '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Ignore missing values. When unset, a continent with any missing
    /// value reduces to `Null` (except for [`Reduction::Count`]).
    pub drop_missing: bool,
    /// Sort the result into catalog order instead of first appearance.
    pub ordered: bool,
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: usize,
    max: Option<f64>,
    saw_missing: bool,
}

impl Accumulator {
    fn push(&mut self, value: Option<f64>) {
        match value {
            Some(v) => {
                self.sum += v;
                self.count += 1;
                self.max = Some(self.max.map_or(v, |m| m.max(v)));
            }
            None => self.saw_missing = true,
        }
    }

    fn finish(&self, reduction: Reduction, drop_missing: bool) -> Value {
        if reduction == Reduction::Count {
            return Value::Integer(self.count as i64);
        }
        if self.saw_missing && !drop_missing {
            return Value::Null;
        }
        match reduction {
            Reduction::Mean if self.count > 0 => Value::Float(self.sum / self.count as f64),
            Reduction::Mean => Value::Null,
            Reduction::Max => Value::from(self.max),
            Reduction::Sum => Value::Float(self.sum),
            Reduction::Count => Value::Integer(self.count as i64),
        }
    }
}

/// Reduce `metric` per continent.
///
/// Returns columns `continent`, `<metric>` with one row per continent
/// present in `table`. Rows with a missing continent are not grouped.
pub fn aggregate_by_continent(
    table: &Table,
    catalog: &ContinentCatalog,
    metric: &str,
    reduction: Reduction,
    options: AggregateOptions,
) -> Result<Table> {
    let continent_idx = table.column_index(CONTINENT_COLUMN)?;
    let metric_idx = table.column_index(metric)?;

    // First-appearance order of continents, then their accumulators.
    let mut slots: BTreeMap<Value, usize> = BTreeMap::new();
    let mut groups: Vec<(Value, Accumulator)> = Vec::new();

    for row in table.rows() {
        let continent = &row[continent_idx];
        if continent.is_missing() {
            continue;
        }
        let value = row[metric_idx].metric(metric)?;
        let slot = *slots.entry(continent.clone()).or_insert_with(|| {
            groups.push((continent.clone(), Accumulator::default()));
            groups.len() - 1
        });
        groups[slot].1.push(value);
    }

    let mut out = Table::new([CONTINENT_COLUMN, metric])?;
    for (continent, acc) in &groups {
        out.push_row(vec![
            continent.clone(),
            acc.finish(reduction, options.drop_missing),
        ])?;
    }

    if options.ordered {
        apply_continent_order(&out, catalog, CONTINENT_COLUMN)
    } else {
        Ok(out)
    }
}

/// For each continent, the input row holding the largest `metric`.
///
/// Missing values never win. On a tie the row appearing first in `table`
/// is kept. A continent whose metric is missing everywhere is left out.
/// The result keeps every input column and is in catalog order.
pub fn max_row_by_continent(
    table: &Table,
    catalog: &ContinentCatalog,
    metric: &str,
) -> Result<Table> {
    let continent_idx = table.column_index(CONTINENT_COLUMN)?;
    let metric_idx = table.column_index(metric)?;

    let mut best: Vec<(Value, usize, f64)> = Vec::new();
    for (i, row) in table.rows().iter().enumerate() {
        let continent = &row[continent_idx];
        if continent.is_missing() {
            continue;
        }
        let Some(v) = row[metric_idx].metric(metric)? else {
            continue;
        };
        match best.iter_mut().find(|entry| &entry.0 == continent) {
            // Strictly greater: an equal later value does not displace.
            Some(entry) if v > entry.2 => *entry = (continent.clone(), i, v),
            Some(_) => {}
            None => best.push((continent.clone(), i, v)),
        }
    }

    let indices: Vec<usize> = best.iter().map(|(_, i, _)| *i).collect();
    apply_continent_order(&table.select_rows(&indices), catalog, CONTINENT_COLUMN)
}

/// The metric value of the single output row for `continent`, if any.
pub fn lookup(table: &Table, continent: &str, metric: &str) -> Result<Option<Value>> {
    let continent_idx = table.column_index(CONTINENT_COLUMN)?;
    let metric_idx = table.column_index(metric)?;
    Ok(table
        .rows()
        .iter()
        .find(|row| row[continent_idx].as_str() == Some(continent))
        .map(|row| row[metric_idx].clone()))
}
