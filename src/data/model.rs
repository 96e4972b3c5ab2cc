use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ReshapeError, Result};

/// Column names every raw indicator dataset must expose.
pub const RAW_COLUMNS: [&str; 7] = [
    "year",
    "continent",
    "country",
    "gdp",
    "life_exp",
    "hdi_index",
    "co2_consump",
];

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the common Pandas dtypes.
/// `Null` is the missing marker.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

// -- Manual Eq/Ord so Value can key a BTreeMap / BTreeSet --

impl Value {
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Integer(_) => 2,
            Value::Float(_) => 3,
            Value::String(_) => 4,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(v) if v.is_nan() => serializer.serialize_none(),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::String(s) => serializer.serialize_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl Value {
    /// Whether the value counts as missing. A float `NaN` is missing too.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the value; `None` for non-numeric and missing cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) if !v.is_nan() => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read the value as a metric: numeric cells yield `Some`, missing
    /// cells yield `None`, anything else is a type error naming `column`.
    pub fn metric(&self, column: &str) -> Result<Option<f64>> {
        if self.is_missing() {
            return Ok(None);
        }
        self.as_f64().map(Some).ok_or_else(|| ReshapeError::Type {
            column: column.to_string(),
            expected: "a number",
            found: self.kind().to_string(),
        })
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Integer(_) => "an integer",
            Value::Float(_) => "a float",
            Value::String(_) => "a string",
        }
    }
}

// ---------------------------------------------------------------------------
// Table – an in-memory, row-major DataFrame
// ---------------------------------------------------------------------------

/// One row of a [`Table`], positionally aligned with its columns.
pub type Row = Vec<Value>;

/// Ordered columns plus rows of equal width.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// An empty table with the given columns.
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = BTreeSet::new();
        for col in &columns {
            if !seen.insert(col.as_str()) {
                return Err(ReshapeError::DuplicateColumn(col.clone()));
            }
        }
        Ok(Table {
            columns,
            rows: Vec::new(),
        })
    }

    /// Build a table, checking that every row matches the column count.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Row>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Table::new(columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ReshapeError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Same columns, different rows. Callers guarantee the row width.
    pub(crate) fn with_rows(&self, rows: Vec<Row>) -> Table {
        debug_assert!(rows.iter().all(|r| r.len() == self.columns.len()));
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Position of `name`, or a schema error naming it.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ReshapeError::schema(name))
    }

    /// Cell at (`row`, `column`), if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// All cells of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// A numeric column with missing cells as `None`.
    pub fn metric_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        self.rows.iter().map(|r| r[idx].metric(name)).collect()
    }

    /// Rows at `indices`, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        self.with_rows(indices.iter().map(|&i| self.rows[i].clone()).collect())
    }

    /// Keep the rows for which `keep` returns true.
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.with_rows(self.rows.iter().filter(|r| keep(r)).cloned().collect())
    }

    /// Keep only `names`, in that order.
    pub fn project(&self, names: &[&str]) -> Result<Table> {
        let indices = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Result<Vec<_>>>()?;
        let mut out = Table::new(names.iter().copied())?;
        out.rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(out)
    }

    /// Append a column. `values` must have one entry per row.
    pub fn with_column(mut self, name: &str, values: Vec<Value>) -> Result<Table> {
        if self.has_column(name) {
            return Err(ReshapeError::DuplicateColumn(name.to_string()));
        }
        if values.len() != self.rows.len() {
            return Err(ReshapeError::RowWidth {
                row: values.len().min(self.rows.len()),
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Observation – one typed (country, year) record
// ---------------------------------------------------------------------------

/// A typed row of the raw dataset, as written by the sample generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub country: String,
    pub continent: String,
    pub year: i64,
    pub life_exp: f64,
    pub hdi_index: Option<f64>,
    pub co2_consump: Option<f64>,
    pub gdp: f64,
    pub services: Option<f64>,
}

impl Table {
    /// Build a raw-dataset table from typed observations.
    pub fn from_observations(observations: &[Observation]) -> Table {
        let rows = observations
            .iter()
            .map(|o| {
                vec![
                    Value::from(o.country.as_str()),
                    Value::from(o.continent.as_str()),
                    Value::Integer(o.year),
                    Value::Float(o.life_exp),
                    Value::from(o.hdi_index),
                    Value::from(o.co2_consump),
                    Value::Float(o.gdp),
                    Value::from(o.services),
                ]
            })
            .collect();
        Table {
            columns: [
                "country",
                "continent",
                "year",
                "life_exp",
                "hdi_index",
                "co2_consump",
                "gdp",
                "services",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            ["continent", "gdp"],
            vec![
                vec!["Asia".into(), Value::Float(10.0)],
                vec!["Africa".into(), Value::Null],
                vec!["Europe".into(), Value::Integer(7)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_row_width_is_checked() {
        let err = Table::from_rows(["a", "b"], vec![vec![Value::Null]]).unwrap_err();
        assert_eq!(
            err,
            ReshapeError::RowWidth {
                row: 0,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let err = Table::new(["a", "a"]).unwrap_err();
        assert_eq!(err, ReshapeError::DuplicateColumn("a".into()));
    }

    #[test]
    fn test_metric_column_treats_null_as_missing() {
        let t = sample();
        assert_eq!(
            t.metric_column("gdp").unwrap(),
            vec![Some(10.0), None, Some(7.0)]
        );
    }

    #[test]
    fn test_metric_column_rejects_strings() {
        let t = sample();
        let err = t.metric_column("continent").unwrap_err();
        assert!(matches!(err, ReshapeError::Type { ref column, .. } if column == "continent"));
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let t = sample();
        assert_eq!(
            t.column_index("co2_consump").unwrap_err(),
            ReshapeError::Schema {
                column: "co2_consump".into()
            }
        );
    }

    #[test]
    fn test_project_reorders_columns() {
        let t = sample().project(&["gdp", "continent"]).unwrap();
        assert_eq!(t.columns(), &["gdp", "continent"]);
        assert_eq!(t.rows()[0], vec![Value::Float(10.0), Value::from("Asia")]);
        assert!(sample().project(&["life_exp"]).is_err());
    }

    #[test]
    fn test_nan_is_missing() {
        assert!(Value::Float(f64::NAN).is_missing());
        assert_eq!(Value::Float(f64::NAN).metric("x").unwrap(), None);
    }

    #[test]
    fn test_with_column_appends() {
        let t = sample()
            .with_column("flag", vec![Value::Bool(true), Value::Null, Value::Null])
            .unwrap();
        assert_eq!(t.columns(), &["continent", "gdp", "flag"]);
        assert_eq!(t.value(0, "flag"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_value_ordering_groups_variants() {
        let mut vals = vec![
            Value::from("b"),
            Value::Integer(3),
            Value::Null,
            Value::from("a"),
            Value::Integer(1),
        ];
        vals.sort();
        assert_eq!(
            vals,
            vec![
                Value::Null,
                Value::Integer(1),
                Value::Integer(3),
                Value::from("a"),
                Value::from("b"),
            ]
        );
    }
}
